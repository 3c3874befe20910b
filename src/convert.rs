//! Conversions between the three transcript wire formats.
//!
//! All roads go through the normalized cue representation: SubRip and WebVTT text
//! parse into cues, cues convert to JSON segments, and segments convert back into
//! cues. There is deliberately no direct SubRip↔JSON shortcut, so voice-tag
//! handling has a single source of truth ([`crate::cue`]).
//!
//! Every function here is total: malformed input produces `None` or an empty
//! result, never an error. See the crate docs for the recovery taxonomy.

use tracing::debug;

use crate::classify::{TranscriptFormat, classify};
use crate::cue::{Cue, with_voice_tag};
use crate::segment::{TimedSegment, Transcript};
use crate::{srt, vtt};

/// Controls the line-wrapping merge performed by [`segments_to_cues`].
///
/// The defaults reflect a two-line caption rendering at 32 columns; the merge
/// budget is `max_lines * max_cols + 1` characters, the extra character covering
/// one join space.
#[derive(Debug, Clone)]
pub struct WrapOptions {
    /// Maximum rendered lines per cue.
    pub max_lines: usize,

    /// Maximum characters per rendered line.
    pub max_cols: usize,
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self {
            max_lines: 2,
            max_cols: 32,
        }
    }
}

impl WrapOptions {
    /// The character budget for one merged cue body.
    pub fn budget(&self) -> usize {
        self.max_lines * self.max_cols + 1
    }
}

/// Convert one cue into a normalized segment, pulling the voice tag out into
/// the `speaker` field.
pub fn cue_to_segment(cue: &Cue) -> TimedSegment {
    TimedSegment {
        speaker: cue.speaker().map(str::to_string),
        start_seconds: cue.start_seconds,
        end_seconds: cue.end_seconds,
        body: cue.spoken_text().to_string(),
    }
}

/// Convert a cue list into normalized segments.
///
/// Ordering is preserved from the input; the cue list being time-ordered is a
/// caller invariant, not enforced here.
pub fn cues_to_segments(cues: &[Cue]) -> Vec<TimedSegment> {
    cues.iter().map(cue_to_segment).collect()
}

/// Convert normalized segments back into cues, merging consecutive same-speaker
/// segments while the running body stays within the wrap budget.
///
/// Merge rules:
/// - a speaker change always starts a new cue
/// - a segment beginning with `.`, `,`, or `?` attaches without a preceding
///   space and never triggers a budget break
/// - otherwise the segment joins with a single space, unless that would exceed
///   the budget, in which case a new cue starts
pub fn segments_to_cues(segments: &[TimedSegment], wrap: &WrapOptions) -> Vec<Cue> {
    struct Pending {
        speaker: Option<String>,
        start_seconds: f64,
        end_seconds: f64,
        body: String,
    }

    fn flush(pending: &mut Option<Pending>, cues: &mut Vec<Cue>) {
        if let Some(p) = pending.take() {
            cues.push(Cue {
                id: (cues.len() + 1).to_string(),
                start_seconds: p.start_seconds,
                end_seconds: p.end_seconds,
                text: with_voice_tag(p.speaker.as_deref(), &p.body),
            });
        }
    }

    let budget = wrap.budget();
    let mut cues: Vec<Cue> = Vec::new();
    let mut pending: Option<Pending> = None;

    for segment in segments {
        let piece = segment.body.trim();
        if piece.is_empty() {
            // Space segments carry no text worth wrapping; they only pad timing,
            // which the surrounding segments already cover.
            continue;
        }

        let attaches_bare = piece.starts_with(['.', ',', '?']);

        // The budget counts characters, not bytes, so non-ASCII transcripts
        // wrap at the same rendered width as ASCII ones.
        let extends_current = match &pending {
            Some(p) if p.speaker == segment.speaker => {
                attaches_bare || p.body.chars().count() + 1 + piece.chars().count() <= budget
            }
            _ => false,
        };

        if extends_current {
            if let Some(p) = pending.as_mut() {
                if !attaches_bare {
                    p.body.push(' ');
                }
                p.body.push_str(piece);
                p.end_seconds = segment.end_seconds;
            }
            continue;
        }

        flush(&mut pending, &mut cues);
        pending = Some(Pending {
            speaker: segment.speaker.clone(),
            start_seconds: segment.start_seconds,
            end_seconds: segment.end_seconds,
            body: piece.to_string(),
        });
    }
    flush(&mut pending, &mut cues);

    cues
}

/// Serialize a transcript into the JSON segment format.
pub fn transcript_to_json(transcript: &Transcript) -> String {
    serde_json::to_string(transcript).unwrap_or_default()
}

/// Parse the JSON segment format.
///
/// Accepts either the versioned object schema or a bare segment array (feeds in
/// the wild serve both). Returns `None` on anything unparsable.
pub fn transcript_from_json(text: &str) -> Option<Transcript> {
    if let Ok(transcript) = serde_json::from_str::<Transcript>(text) {
        return Some(transcript);
    }
    serde_json::from_str::<Vec<TimedSegment>>(text)
        .ok()
        .map(Transcript::new)
}

/// Classify raw transcript text and parse it into a normalized transcript.
///
/// This is the single entry point the player uses: declared content type first,
/// then sniffing, then the matching parser, with SubRip and WebVTT composing
/// through the cue representation. Unclassifiable input and transcripts that
/// parse to zero segments both yield `None`: callers must treat "no transcript"
/// and "unusable transcript" identically.
pub fn ingest(content_type: Option<&str>, text: &str) -> Option<Transcript> {
    let format = classify(content_type, text)?;

    let transcript = match format {
        TranscriptFormat::Json => transcript_from_json(text)?,
        TranscriptFormat::WebVtt => Transcript::new(cues_to_segments(&vtt::parse(text))),
        TranscriptFormat::SubRip => Transcript::new(cues_to_segments(&srt::parse(text))),
    };

    if transcript.is_empty() {
        debug!(?format, "transcript parsed to zero segments");
        return None;
    }

    Some(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(speaker: Option<&str>, start: f64, end: f64, body: &str) -> TimedSegment {
        TimedSegment {
            speaker: speaker.map(str::to_string),
            start_seconds: start,
            end_seconds: end,
            body: body.to_string(),
        }
    }

    #[test]
    fn cue_to_segment_strips_voice_tag() {
        let cue = Cue {
            id: "1".to_string(),
            start_seconds: 0.5,
            end_seconds: 2.5,
            text: "<v Vader>I am your father.".to_string(),
        };
        let s = cue_to_segment(&cue);
        assert_eq!(s.speaker.as_deref(), Some("Vader"));
        assert_eq!(s.body, "I am your father.");
        assert_eq!(s.start_seconds, 0.5);
        assert_eq!(s.end_seconds, 2.5);
    }

    #[test]
    fn merges_same_speaker_segments_within_budget() {
        let segments = vec![
            seg(Some("V"), 0.5, 0.75, "I"),
            seg(Some("V"), 1.0, 1.25, "am"),
            seg(Some("V"), 1.5, 2.0, "your"),
            seg(Some("V"), 2.25, 2.5, "father."),
        ];
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "<v V>I am your father.");
        assert_eq!(cues[0].start_seconds, 0.5);
        assert_eq!(cues[0].end_seconds, 2.5);
    }

    #[test]
    fn speaker_change_starts_a_new_cue() {
        let segments = vec![
            seg(Some("V"), 0.0, 1.0, "father."),
            seg(Some("L"), 1.5, 2.0, "Nooooo"),
        ];
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].speaker(), Some("V"));
        assert_eq!(cues[1].speaker(), Some("L"));
    }

    #[test]
    fn budget_overflow_starts_a_new_cue() {
        let word = "twelve-chars"; // 12 chars
        let segments: Vec<_> = (0..10)
            .map(|i| seg(Some("A"), i as f64, i as f64 + 0.5, word))
            .collect();
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert!(cues.len() > 1);
        for cue in &cues {
            // The voice tag is not part of the rendered body budget.
            assert!(cue.spoken_text().chars().count() <= WrapOptions::default().budget());
        }
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // Two 20-character runs of a two-byte character: 41 characters joined,
        // well within the default budget even though the byte count is not.
        let word = "é".repeat(20);
        let segments = vec![
            seg(Some("A"), 0.0, 0.5, &word),
            seg(Some("A"), 1.0, 1.5, &word),
        ];
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert_eq!(cues.len(), 1);
    }

    #[test]
    fn punctuation_attaches_without_a_space_and_never_breaks() {
        let segments = vec![
            seg(None, 0.0, 0.5, "wait"),
            seg(None, 0.5, 0.6, "?"),
            seg(None, 1.0, 1.5, "ok"),
        ];
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "wait? ok");
    }

    #[test]
    fn space_segments_do_not_affect_wrapping() {
        let segments = vec![
            seg(Some("A"), 0.0, 0.5, "hello"),
            seg(Some("A"), 0.5, 0.6, " "),
            seg(Some("A"), 1.0, 1.5, "there"),
        ];
        let cues = segments_to_cues(&segments, &WrapOptions::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].spoken_text(), "hello there");
    }

    #[test]
    fn json_round_trip_preserves_speakers_and_text() {
        let original = Transcript::new(vec![
            seg(Some("V"), 0.5, 0.75, "I"),
            seg(Some("V"), 1.0, 1.25, "am"),
            seg(Some("V"), 1.5, 2.0, "your"),
            seg(Some("V"), 2.25, 2.5, "father."),
            seg(Some("L"), 2.75, 3.0, "Nooooo"),
        ]);

        let cues = segments_to_cues(&original.segments, &WrapOptions::default());
        let back = Transcript::new(cues_to_segments(&cues));

        // Bodies may re-wrap, but per speaker the concatenated characters must match.
        let concat = |t: &Transcript, who: &str| {
            t.segments
                .iter()
                .filter(|s| s.speaker.as_deref() == Some(who))
                .map(|s| s.body.split_whitespace().collect::<String>())
                .collect::<String>()
        };
        assert_eq!(concat(&original, "V"), concat(&back, "V"));
        assert_eq!(concat(&original, "L"), concat(&back, "L"));

        // Time bounds survive the merge.
        assert_eq!(back.segments[0].start_seconds, 0.5);
        assert_eq!(back.segments[0].end_seconds, 2.5);
    }

    #[test]
    fn parses_object_and_bare_array_json() {
        let object = r#"{"version":"1.0.0","segments":[{"startTime":0.0,"endTime":1.0,"body":"hi"}]}"#;
        let array = r#"[{"startTime":0.0,"endTime":1.0,"body":"hi"}]"#;
        assert!(transcript_from_json(object).is_some());
        let t = transcript_from_json(array).unwrap();
        assert_eq!(t.version, Transcript::VERSION);
        assert!(transcript_from_json("not json").is_none());
    }

    #[test]
    fn ingest_classifies_and_parses_each_format() {
        let json = r#"{"version":"1.0.0","segments":[{"startTime":0.0,"endTime":1.0,"body":"hi"}]}"#;
        assert!(ingest(None, json).is_some());

        let vtt = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<v A>hello\n";
        let t = ingest(None, vtt).unwrap();
        assert_eq!(t.segments[0].speaker.as_deref(), Some("A"));

        let srt = "1\n00:00:01,000 --> 00:00:02,000\nA: hello\n";
        let t = ingest(None, srt).unwrap();
        assert_eq!(t.segments[0].speaker.as_deref(), Some("A"));
        assert_eq!(t.segments[0].body, "hello");
    }

    #[test]
    fn ingest_treats_unusable_input_as_no_transcript() {
        assert!(ingest(None, "plain prose with no format markers").is_none());
        // Classifiable but empty after parsing.
        assert!(ingest(None, "WEBVTT\n").is_none());
        assert!(ingest(Some("application/json"), "{\"bad\": true}").is_none());
    }
}
