use crate::colors::SpeakerColorMap;
use crate::convert::WrapOptions;

/// Which grouping policy the presentation layer asked for.
///
/// `Transcript` produces strict per-sentence blocks from normalized segments;
/// `Feed` produces denser chat-like blocks straight from cues. The two policies
/// are intentionally distinct (see [`crate::grouping::SentencePolicy`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupingMode {
    #[default]
    Transcript,
    Feed,
}

/// Options that control how captions are built and synchronized.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (embeds, tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone, Default)]
pub struct Opts {
    /// Grouping policy for caption blocks.
    pub grouping: GroupingMode,

    /// Line-wrapping budget used when emitting cue text from segments.
    pub wrap: WrapOptions,

    /// Preset speaker palette; exhausted palettes fall back to synthesized hues.
    pub palette: Vec<String>,
}

impl Opts {
    /// Build a fresh speaker color map from the configured palette.
    pub(crate) fn color_map(&self) -> SpeakerColorMap {
        SpeakerColorMap::new(self.palette.clone())
    }
}
