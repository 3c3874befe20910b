//! The platform-level timed-text unit and its voice-tag convention.
//!
//! Cues are owned by a text track external to this crate; we only read them. Speaker
//! attribution travels inside the cue text as a WebVTT voice tag (`<v Speaker Name>`)
//! prefixing the spoken text. At most one voice tag appears, as the first token.

use std::sync::LazyLock;

use regex::Regex;

/// Matches a voice tag anchored at the start of cue text, capturing the speaker name.
static VOICE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<v\s+([^>]+)>\s*").expect("voice tag regex is valid"));

/// A single timed-text cue.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    /// Cue identifier. Parsers carry source labels through; synthesized ids are the
    /// 1-based ordinal rendered as a string.
    pub id: String,

    /// Start time in seconds.
    pub start_seconds: f64,

    /// End time in seconds.
    pub end_seconds: f64,

    /// Raw cue text, possibly beginning with a voice tag.
    pub text: String,
}

impl Cue {
    /// The speaker named by a leading voice tag, if present.
    pub fn speaker(&self) -> Option<&str> {
        VOICE_TAG
            .captures(&self.text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    /// The cue text with any leading voice tag stripped.
    pub fn spoken_text(&self) -> &str {
        match VOICE_TAG.find(&self.text) {
            Some(m) => &self.text[m.end()..],
            None => &self.text,
        }
    }
}

/// Render cue text carrying a voice tag for `speaker`, or the bare body when absent.
pub fn with_voice_tag(speaker: Option<&str>, body: &str) -> String {
    match speaker {
        Some(speaker) => format!("<v {speaker}>{body}"),
        None => body.to_string(),
    }
}
