//! SubRip ("subtitle rip", `.srt`) parsing into the normalized cue representation.
//!
//! SubRip is the loosest of the three wire formats, so the parser is built around
//! recovery: a block with a missing `-->` line or unparsable timestamps is skipped
//! (with a warning) rather than aborting the whole transcript.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::Result;
use crate::cue::Cue;
use crate::cue_writer::CueWriter;
use crate::timestamp::{parse_timestamp, srt_timestamp};

/// Matches a `Speaker Name: ` prefix at the start of a cue body.
static SPEAKER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:\n]+?):\s+").expect("speaker prefix regex is valid"));

/// Parse SubRip text into cues.
///
/// Block structure:
/// - blocks are delimited by blank lines
/// - an optional integer label line comes first (synthesized as the 1-based block
///   index when omitted)
/// - a `start --> end` timing line (comma decimal separators, per SubRip)
/// - one or more body lines
///
/// A `Speaker Name: ` prefix on the body is rewritten into a `<v Speaker Name>`
/// voice tag so speaker handling has a single representation downstream.
pub fn parse(text: &str) -> Vec<Cue> {
    let mut cues = Vec::new();

    for (block_idx, block) in split_blocks(text).into_iter().enumerate() {
        match parse_block(&block, block_idx + 1) {
            Some(cue) => cues.push(cue),
            None => {
                warn!(block = block_idx + 1, "skipping malformed SubRip block");
            }
        }
    }

    cues
}

/// Split input into blank-line-delimited blocks of trimmed, non-empty line groups.
fn split_blocks(text: &str) -> Vec<Vec<String>> {
    let mut blocks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line.to_string());
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_block(lines: &[String], ordinal: usize) -> Option<Cue> {
    let mut iter = lines.iter();
    let first = iter.next()?;

    // The label line is optional. If the first line parses as an integer, it is the
    // label and the timing line follows; otherwise the first line must be the timing
    // line and we synthesize the label from the block's position.
    let (id, timing_line) = match first.trim().parse::<u64>() {
        Ok(label) => (label.to_string(), iter.next()?.as_str()),
        Err(_) => (ordinal.to_string(), first.as_str()),
    };

    let (start_seconds, end_seconds) = parse_timing_line(timing_line)?;

    let body = iter.map(String::as_str).collect::<Vec<_>>().join("\n");
    if body.is_empty() {
        return None;
    }

    Some(Cue {
        id,
        start_seconds,
        end_seconds,
        text: rewrite_speaker_prefix(&body),
    })
}

/// Parse a `start --> end` timing line. Trailing cue settings after the end
/// timestamp are ignored.
pub(crate) fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, end) = line.split_once("-->")?;
    let end = end.trim().split_whitespace().next()?;
    let start_seconds = parse_timestamp(start)?;
    let end_seconds = parse_timestamp(end)?;
    if start_seconds > end_seconds {
        return None;
    }
    Some((start_seconds, end_seconds))
}

/// Rewrite a leading `Speaker Name: ` into a voice tag on the first body line.
fn rewrite_speaker_prefix(body: &str) -> String {
    match SPEAKER_PREFIX.captures(body) {
        Some(caps) => {
            let speaker = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let rest = &body[caps.get(0).map(|m| m.end()).unwrap_or(0)..];
            format!("<v {speaker}>{rest}")
        }
        None => body.to_string(),
    }
}

/// A `CueWriter` that streams cues in SubRip format.
///
/// Voice tags are rewritten back into the `Speaker Name: ` prefix convention,
/// the inverse of what [`parse`] does on the way in.
pub struct SrtWriter<W: Write> {
    w: W,
    next_label: usize,
    closed: bool,
}

impl<W: Write> SrtWriter<W> {
    /// Create a new SubRip writer that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            next_label: 1,
            closed: false,
        }
    }
}

impl<W: Write> CueWriter for SrtWriter<W> {
    fn write_cue(&mut self, cue: &Cue) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write cue: writer is already closed",
            ));
        }

        let body = match cue.speaker() {
            Some(speaker) => format!("{speaker}: {}", cue.spoken_text()),
            None => cue.text.clone(),
        };

        writeln!(&mut self.w, "{}", self.next_label)?;
        writeln!(
            &mut self.w,
            "{} --> {}",
            srt_timestamp(cue.start_seconds),
            srt_timestamp(cue.end_seconds)
        )?;
        writeln!(&mut self.w, "{body}")?;
        writeln!(&mut self.w)?;
        self.w.flush()?;

        self.next_label += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.w.flush()?;
        self.closed = true;
        Ok(())
    }
}
