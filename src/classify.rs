//! Classification of raw transcript bytes into one of the three wire formats.

/// The transcript wire formats this crate understands.
///
/// Why this exists:
/// - We want a single, strongly-typed representation of transcript formats
///   across the CLI and library code.
/// - Using an enum avoids stringly-typed conditionals and keeps format
///   selection explicit and discoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TranscriptFormat {
    /// The normalized JSON segment format.
    Json,

    /// WebVTT timed text.
    WebVtt,

    /// SubRip (`.srt`) subtitle text.
    SubRip,
}

/// Classify transcript content, preferring a declared content type over sniffing.
///
/// Order of evidence:
/// 1. `content_type` (MIME-like, matched by substring so parameters don't interfere)
/// 2. content sniffing: leading `{`/`[` → JSON, leading `WEBVTT` → WebVTT,
///    a `-->` anywhere → SubRip
///
/// Returns `None` when neither source of evidence matches: the caller treats this
/// as "no transcript", never as a hard failure.
pub fn classify(content_type: Option<&str>, text: &str) -> Option<TranscriptFormat> {
    if let Some(content_type) = content_type {
        let declared = content_type.to_ascii_lowercase();
        if declared.contains("json") {
            return Some(TranscriptFormat::Json);
        }
        if declared.contains("vtt") {
            return Some(TranscriptFormat::WebVtt);
        }
        if declared.contains("srt") || declared.contains("subrip") {
            return Some(TranscriptFormat::SubRip);
        }
    }

    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(TranscriptFormat::Json);
    }
    if trimmed.starts_with("WEBVTT") {
        return Some(TranscriptFormat::WebVtt);
    }
    if trimmed.contains("-->") {
        return Some(TranscriptFormat::SubRip);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_content_type_wins_over_sniffing() {
        // The body looks like SubRip, but the declared type says JSON.
        assert_eq!(
            classify(Some("application/json"), "00:00:01,000 --> 00:00:02,000"),
            Some(TranscriptFormat::Json)
        );
        assert_eq!(
            classify(Some("text/vtt; charset=utf-8"), "{}"),
            Some(TranscriptFormat::WebVtt)
        );
        assert_eq!(
            classify(Some("application/x-subrip"), "{}"),
            Some(TranscriptFormat::SubRip)
        );
    }

    #[test]
    fn sniffs_json_from_leading_brace_or_bracket() {
        assert_eq!(
            classify(None, "{\"version\":\"1.0.0\"}"),
            Some(TranscriptFormat::Json)
        );
        assert_eq!(classify(None, "[]"), Some(TranscriptFormat::Json));
    }

    #[test]
    fn sniffs_webvtt_from_header() {
        assert_eq!(
            classify(None, "WEBVTT\n\n00:00.000 --> 00:01.000\nhi"),
            Some(TranscriptFormat::WebVtt)
        );
    }

    #[test]
    fn sniffs_subrip_from_arrow() {
        assert_eq!(
            classify(None, "1\n00:00:01,000 --> 00:00:02,000\nhi"),
            Some(TranscriptFormat::SubRip)
        );
    }

    #[test]
    fn unknown_content_is_unclassifiable() {
        assert_eq!(classify(None, "just some prose"), None);
        assert_eq!(classify(Some("text/plain"), "just some prose"), None);
        assert_eq!(classify(None, ""), None);
    }
}
