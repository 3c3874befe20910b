use serde::{Deserialize, Serialize};

/// The smallest normalized unit of a transcript: one speaker-attributed span of timed text.
///
/// Invariants (established by the parsers, relied on by `grouping` and `locator`):
/// - `start_seconds <= end_seconds`
/// - segments within one [`Transcript`] are non-decreasing by `start_seconds`
///
/// A body may be whitespace-only (a "space" segment) or punctuation-only. Both are preserved
/// for display but excluded from "has spoken words" checks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TimedSegment {
    /// Speaker attribution, when the source format carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,

    /// Start time in seconds.
    #[serde(rename = "startTime")]
    pub start_seconds: f64,

    /// End time in seconds.
    #[serde(rename = "endTime")]
    pub end_seconds: f64,

    /// The text of the segment.
    pub body: String,
}

impl TimedSegment {
    /// Whether the body contains no non-whitespace characters.
    pub fn is_space(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Whether the body consists only of punctuation (and whitespace).
    pub fn is_punctuation_only(&self) -> bool {
        let trimmed = self.body.trim();
        !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_punctuation())
    }

    /// Whether the segment contributes spoken words (not a space or punctuation run).
    pub fn has_spoken_words(&self) -> bool {
        !self.is_space() && !self.is_punctuation_only()
    }
}

/// A parsed transcript: immutable once produced, rebuilt fresh per fetch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Transcript {
    /// Schema version of the JSON segment format.
    pub version: String,

    /// Time-ordered segments.
    pub segments: Vec<TimedSegment>,
}

impl Transcript {
    /// Current JSON segment schema version.
    pub const VERSION: &'static str = "1.0.0";

    /// Build a transcript from already-ordered segments.
    pub fn new(segments: Vec<TimedSegment>) -> Self {
        Self {
            version: Self::VERSION.to_string(),
            segments,
        }
    }

    /// Whether the transcript has no segments at all.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
