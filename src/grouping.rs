//! Re-segmentation of timed text into speaker-grouped caption blocks.
//!
//! Two-stage reduction:
//! 1. [`coalesce_segments`] folds adjacent, same-speaker, time-contiguous segments
//!    into contiguous spoken runs.
//! 2. [`group_segments`] / [`group_cues`] group runs into display blocks, using
//!    punctuation, pause, and speaker-change heuristics.
//!
//! The two grouping entry points implement deliberately distinct policies (see
//! [`SentencePolicy`]): transcript grouping produces per-sentence blocks, feed
//! grouping produces denser chat-like blocks. They are kept separate on purpose;
//! unifying them would change observable grouping.

use serde::Serialize;

use crate::colors::SpeakerColorMap;
use crate::convert::cue_to_segment;
use crate::cue::Cue;
use crate::segment::TimedSegment;

/// Maximum cues per feed block before terminal punctuation may close it.
const FEED_MAX_RUN: usize = 3;

/// Speech gap, in seconds, beyond which terminal punctuation closes a feed block.
const FEED_GAP_SECONDS: f64 = 1.0;

/// Which punctuation set ends a "sentence" for grouping decisions.
///
/// The two policies differ in whether `!` is sentence-terminal. They are kept as
/// two named policies rather than unified: transcript grouping splits
/// single-speaker text on `.` and `?` only, while feed grouping also treats `!`
/// as terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentencePolicy {
    /// Per-sentence transcript blocks: `.` and `?` are terminal.
    Transcript,

    /// Chat-like feed blocks: `.`, `?`, and `!` are terminal.
    Feed,
}

impl SentencePolicy {
    /// Whether `text` ends with sentence-terminal punctuation under this policy.
    pub fn is_terminal(self, text: &str) -> bool {
        let trimmed = text.trim_end();
        match self {
            SentencePolicy::Transcript => trimmed.ends_with(['.', '?']),
            SentencePolicy::Feed => trimmed.ends_with(['.', '?', '!']),
        }
    }
}

/// Display side for a caption block in the alternating layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

impl Position {
    fn flipped(self) -> Self {
        match self {
            Position::Left => Position::Right,
            Position::Right => Position::Left,
        }
    }
}

/// A run of cues/segments grouped for unified display and synchronization.
///
/// Blocks are ephemeral: owned by the sync controller for the lifetime of one
/// track, discarded and rebuilt whenever the underlying cue list changes.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionBlock {
    /// Stable identifier within one rebuild, used by the view model and viewport.
    pub id: String,

    /// Speaker attribution for the block, when known.
    pub speaker: Option<String>,

    /// Resolved display color for the speaker.
    pub color: Option<String>,

    /// Display side in the alternating layout.
    pub position: Position,

    /// The cues belonging to this block (empty for segment-grouped blocks).
    pub cues: Vec<Cue>,

    /// The normalized segments belonging to this block.
    pub segments: Vec<TimedSegment>,
}

impl CaptionBlock {
    /// Start time of the block: its first cue, falling back to its first segment.
    pub fn start_seconds(&self) -> f64 {
        self.cues
            .first()
            .map(|c| c.start_seconds)
            .or_else(|| self.segments.first().map(|s| s.start_seconds))
            .unwrap_or(0.0)
    }

    /// End time of the block: its last cue, falling back to its last segment.
    pub fn end_seconds(&self) -> f64 {
        self.cues
            .last()
            .map(|c| c.end_seconds)
            .or_else(|| self.segments.last().map(|s| s.end_seconds))
            .unwrap_or(0.0)
    }

    /// The block's display text: segment bodies joined, with punctuation-leading
    /// pieces attached without a space.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            let piece = segment.body.trim();
            if piece.is_empty() {
                continue;
            }
            if !out.is_empty() && !piece.starts_with(['.', ',', '?', '!']) {
                out.push(' ');
            }
            out.push_str(piece);
        }
        out
    }

    /// Whether the block contains a cue with the given id.
    pub fn contains_cue(&self, cue_id: &str) -> bool {
        self.cues.iter().any(|c| c.id == cue_id)
    }
}

/// Fold adjacent, same-speaker, time-contiguous segments into spoken runs.
///
/// Segment `n+1` folds into segment `n` when it is not whitespace-only, has the
/// same speaker, and `start(n+1) <= end(n)` (no speech gap): bodies concatenate
/// and the end time extends. Whitespace-only segments are preserved as their own
/// segments and break adjacency.
pub fn coalesce_segments(segments: &[TimedSegment]) -> Vec<TimedSegment> {
    let mut out: Vec<TimedSegment> = Vec::new();

    for segment in segments {
        if let Some(last) = out.last_mut() {
            let contiguous = !segment.is_space()
                && !last.is_space()
                && last.speaker == segment.speaker
                && segment.start_seconds <= last.end_seconds;
            if contiguous {
                last.body.push_str(&segment.body);
                last.end_seconds = last.end_seconds.max(segment.end_seconds);
                continue;
            }
        }
        out.push(segment.clone());
    }

    out
}

/// Group normalized segments into per-sentence caption blocks
/// ([`SentencePolicy::Transcript`]).
///
/// A new block starts when:
/// - it's the first segment
/// - the speaker differs from the current block's speaker, and the transcript
///   has more than one distinct speaker overall
/// - the transcript is single-speaker and the current block's last spoken
///   segment ends a sentence
///
/// Whitespace-only segments are carried in the current block but are skipped
/// for all grouping decisions.
pub fn group_segments(segments: &[TimedSegment], colors: &mut SpeakerColorMap) -> Vec<CaptionBlock> {
    let policy = SentencePolicy::Transcript;

    let mut speakers: Vec<Option<&str>> = Vec::new();
    for segment in segments {
        if !segment.is_space() {
            let speaker = segment.speaker.as_deref();
            if !speakers.contains(&speaker) {
                speakers.push(speaker);
            }
        }
    }
    let multi_speaker = speakers.len() > 1;

    let mut builder = BlockBuilder::new(colors);
    let mut last_spoken: Option<&TimedSegment> = None;
    let mut prev_speaker: Option<Option<String>> = None;

    for segment in segments {
        if segment.is_space() {
            // Preserved for display, invisible to grouping decisions. A space
            // before any spoken word has no block to attach to and is dropped.
            if !builder.is_empty() {
                builder.push_segment(segment.clone(), false);
            }
            continue;
        }

        // Position flips on speaker change between consecutive spoken units,
        // independent of block boundaries.
        let speaker_changed = prev_speaker
            .as_ref()
            .is_some_and(|prev| prev.as_deref() != segment.speaker.as_deref());
        if speaker_changed {
            builder.flip_position();
        }
        prev_speaker = Some(segment.speaker.clone());

        let split = if builder.is_empty() {
            true
        } else if multi_speaker {
            speaker_changed
        } else {
            last_spoken.is_some_and(|prev| policy.is_terminal(&prev.body))
        };

        builder.push_segment(segment.clone(), split);
        last_spoken = Some(segment);
    }

    builder.finish()
}

/// Group raw cues into dense feed blocks ([`SentencePolicy::Feed`]).
///
/// A new block starts when:
/// - the speaker changes from the previous cue
/// - the current block already holds more than three cues and its last cue ends
///   a sentence
/// - the gap since the previous cue's end exceeds one second and the previous
///   cue ends a sentence
pub fn group_cues(cues: &[Cue], colors: &mut SpeakerColorMap) -> Vec<CaptionBlock> {
    let policy = SentencePolicy::Feed;

    let mut builder = BlockBuilder::new(colors);
    let mut prev: Option<&Cue> = None;

    for cue in cues {
        let speaker_changed = prev.is_some_and(|p| p.speaker() != cue.speaker());
        if speaker_changed {
            builder.flip_position();
        }

        let split = match prev {
            None => true,
            Some(prev_cue) => {
                let prev_terminal = policy.is_terminal(prev_cue.spoken_text());
                let long_run = builder.current_cue_count() > FEED_MAX_RUN && prev_terminal;
                let long_gap = cue.start_seconds - prev_cue.end_seconds > FEED_GAP_SECONDS
                    && prev_terminal;
                speaker_changed || long_run || long_gap
            }
        };

        builder.push_cue(cue.clone(), split);
        prev = Some(cue);
    }

    builder.finish()
}

/// Shared accumulator for both grouping policies: tracks the alternating
/// position while scanning and resolves speaker colors on first sight.
struct BlockBuilder<'a> {
    colors: &'a mut SpeakerColorMap,
    blocks: Vec<CaptionBlock>,
    position: Position,
}

impl<'a> BlockBuilder<'a> {
    fn new(colors: &'a mut SpeakerColorMap) -> Self {
        Self {
            colors,
            blocks: Vec::new(),
            position: Position::Left,
        }
    }

    fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    fn current_cue_count(&self) -> usize {
        self.blocks.last().map_or(0, |b| b.cues.len())
    }

    fn flip_position(&mut self) {
        self.position = self.position.flipped();
    }

    fn start_block(&mut self, speaker: Option<String>) {
        let color = speaker.as_deref().map(|s| self.colors.color_for(s).to_string());
        self.blocks.push(CaptionBlock {
            id: format!("block-{}", self.blocks.len() + 1),
            speaker,
            color,
            position: self.position,
            cues: Vec::new(),
            segments: Vec::new(),
        });
    }

    fn push_segment(&mut self, segment: TimedSegment, split: bool) {
        if split || self.blocks.is_empty() {
            self.start_block(segment.speaker.clone());
        }
        if let Some(block) = self.blocks.last_mut() {
            block.segments.push(segment);
        }
    }

    fn push_cue(&mut self, cue: Cue, split: bool) {
        if split || self.blocks.is_empty() {
            self.start_block(cue.speaker().map(str::to_string));
        }
        if let Some(block) = self.blocks.last_mut() {
            block.segments.push(cue_to_segment(&cue));
            block.cues.push(cue);
        }
    }

    fn finish(self) -> Vec<CaptionBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(speaker: &str, start: f64, end: f64, body: &str) -> TimedSegment {
        TimedSegment {
            speaker: Some(speaker.to_string()),
            start_seconds: start,
            end_seconds: end,
            body: body.to_string(),
        }
    }

    fn cue(id: &str, start: f64, end: f64, text: &str) -> Cue {
        Cue {
            id: id.to_string(),
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
        }
    }

    fn vader_fixture() -> Vec<TimedSegment> {
        vec![
            seg("V", 0.5, 0.75, "I"),
            seg("V", 1.0, 1.25, "am"),
            seg("V", 1.5, 2.0, "your"),
            seg("V", 2.25, 2.5, "father."),
            seg("L", 2.75, 3.0, "Nooooo"),
        ]
    }

    #[test]
    fn grouping_is_deterministic_for_the_two_speaker_fixture() {
        let mut colors = SpeakerColorMap::default();
        let blocks = group_segments(&vader_fixture(), &mut colors);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].speaker.as_deref(), Some("V"));
        assert_eq!(blocks[0].text(), "I am your father.");
        assert_eq!(blocks[0].start_seconds(), 0.5);
        assert_eq!(blocks[0].end_seconds(), 2.5);
        assert_eq!(blocks[1].speaker.as_deref(), Some("L"));
        assert_eq!(blocks[1].text(), "Nooooo");
        assert_eq!(blocks[1].start_seconds(), 2.75);
        assert_eq!(blocks[1].end_seconds(), 3.0);
    }

    #[test]
    fn positions_alternate_on_speaker_change() {
        let mut colors = SpeakerColorMap::default();
        let segments = vec![
            seg("A", 0.0, 1.0, "one."),
            seg("B", 1.5, 2.0, "two."),
            seg("A", 2.5, 3.0, "three."),
        ];
        let blocks = group_segments(&segments, &mut colors);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].position, Position::Left);
        assert_eq!(blocks[1].position, Position::Right);
        assert_eq!(blocks[2].position, Position::Left);
    }

    #[test]
    fn single_speaker_transcripts_split_on_sentence_ends() {
        let mut colors = SpeakerColorMap::default();
        let segments = vec![
            seg("A", 0.0, 1.0, "First sentence."),
            seg("A", 1.5, 2.0, "Second"),
            seg("A", 2.5, 3.0, "sentence?"),
            seg("A", 3.5, 4.0, "Third"),
        ];
        let blocks = group_segments(&segments, &mut colors);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].text(), "First sentence.");
        assert_eq!(blocks[1].text(), "Second sentence?");
        assert_eq!(blocks[2].text(), "Third");
    }

    #[test]
    fn exclamation_is_not_terminal_for_transcript_policy() {
        let mut colors = SpeakerColorMap::default();
        let segments = vec![
            seg("A", 0.0, 1.0, "Watch out!"),
            seg("A", 1.5, 2.0, "now"),
        ];
        let blocks = group_segments(&segments, &mut colors);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn multi_speaker_transcripts_do_not_split_on_punctuation_alone() {
        let mut colors = SpeakerColorMap::default();
        let segments = vec![
            seg("A", 0.0, 1.0, "One."),
            seg("A", 1.5, 2.0, "Two."),
            seg("B", 2.5, 3.0, "Three."),
        ];
        let blocks = group_segments(&segments, &mut colors);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "One. Two.");
    }

    #[test]
    fn whitespace_segments_are_carried_but_ignored_for_decisions() {
        let mut colors = SpeakerColorMap::default();
        let segments = vec![
            seg("A", 0.0, 1.0, "Hello."),
            seg("A", 1.0, 1.1, " "),
            seg("A", 1.5, 2.0, "World"),
        ];
        let blocks = group_segments(&segments, &mut colors);
        // Single speaker, previous spoken segment ends a sentence: new block,
        // with the space segment still attached to the first.
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].segments.len(), 2);
        assert_eq!(blocks[0].text(), "Hello.");
    }

    #[test]
    fn coalesce_folds_contiguous_same_speaker_segments() {
        let segments = vec![
            seg("A", 0.0, 0.5, "Hel"),
            seg("A", 0.5, 1.0, "lo"),
            seg("A", 1.5, 2.0, "there"),
        ];
        let out = coalesce_segments(&segments);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].body, "Hello");
        assert_eq!(out[0].end_seconds, 1.0);
        assert_eq!(out[1].body, "there");
    }

    #[test]
    fn coalesce_respects_speaker_boundaries_and_spaces() {
        let mut segments = vec![
            seg("A", 0.0, 0.5, "one"),
            seg("B", 0.5, 1.0, "two"),
        ];
        assert_eq!(coalesce_segments(&segments).len(), 2);

        segments = vec![
            seg("A", 0.0, 0.5, "one"),
            seg("A", 0.5, 0.6, " "),
            seg("A", 0.6, 1.0, "two"),
        ];
        // The space segment is preserved and breaks adjacency.
        assert_eq!(coalesce_segments(&segments).len(), 3);
    }

    #[test]
    fn feed_grouping_splits_on_long_runs_with_terminal_punctuation() {
        let mut colors = SpeakerColorMap::default();
        let cues: Vec<Cue> = (0..8)
            .map(|i| {
                cue(
                    &format!("{i}"),
                    i as f64,
                    i as f64 + 0.9,
                    &format!("sentence {i}."),
                )
            })
            .collect();
        let blocks = group_cues(&cues, &mut colors);
        // Runs close after exceeding three cues.
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].cues.len(), 4);
        assert_eq!(blocks[1].cues.len(), 4);
    }

    #[test]
    fn feed_grouping_splits_on_gaps_only_after_terminal_punctuation() {
        let mut colors = SpeakerColorMap::default();
        let cues = vec![
            cue("1", 0.0, 1.0, "trailing off"),
            cue("2", 3.0, 4.0, "still the same thought."),
            cue("3", 7.0, 8.0, "new thought"),
        ];
        let blocks = group_cues(&cues, &mut colors);
        // First gap: no terminal punctuation, no split. Second gap: split.
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].cues.len(), 2);
    }

    #[test]
    fn feed_grouping_treats_exclamation_as_terminal() {
        let mut colors = SpeakerColorMap::default();
        let cues = vec![
            cue("1", 0.0, 1.0, "Wow!"),
            cue("2", 3.0, 4.0, "later"),
        ];
        let blocks = group_cues(&cues, &mut colors);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn feed_grouping_splits_on_speaker_change_and_assigns_colors() {
        let mut colors = SpeakerColorMap::new(vec!["red".to_string(), "blue".to_string()]);
        let cues = vec![
            cue("1", 0.0, 1.0, "<v A>hi"),
            cue("2", 1.0, 2.0, "<v B>hello"),
            cue("3", 2.0, 3.0, "<v A>again"),
        ];
        let blocks = group_cues(&cues, &mut colors);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].color.as_deref(), Some("red"));
        assert_eq!(blocks[1].color.as_deref(), Some("blue"));
        assert_eq!(blocks[2].color.as_deref(), Some("red"));
        assert_eq!(blocks[0].position, Position::Left);
        assert_eq!(blocks[1].position, Position::Right);
        assert_eq!(blocks[2].position, Position::Left);
    }
}
