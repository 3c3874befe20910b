//! WebVTT parsing and a streaming WebVTT writer.
//!
//! Parsing follows the same recovery policy as the SubRip parser: malformed cue
//! blocks are skipped with a warning, never aborting the transcript. `NOTE` and
//! `STYLE` blocks are ignored; cue identifier lines are carried through as cue ids.

use std::io::Write;

use tracing::warn;

use crate::Result;
use crate::cue::Cue;
use crate::cue_writer::CueWriter;
use crate::srt::parse_timing_line;
use crate::timestamp::vtt_timestamp;

/// Parse WebVTT text into cues.
///
/// Input without a `WEBVTT` header yields no cues (the classifier should have
/// routed such input elsewhere, but this function stays total regardless).
pub fn parse(text: &str) -> Vec<Cue> {
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r')).peekable();

    match lines.next() {
        Some(header) if header.trim_start().starts_with("WEBVTT") => {}
        _ => return Vec::new(),
    }

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            flush_block(&mut block, &mut cues);
        } else {
            block.push(line);
        }
    }
    flush_block(&mut block, &mut cues);

    cues
}

fn flush_block(block: &mut Vec<&str>, cues: &mut Vec<Cue>) {
    if block.is_empty() {
        return;
    }
    let lines = std::mem::take(block);

    // NOTE and STYLE blocks are metadata, not cues.
    let first = lines[0].trim_start();
    if first.starts_with("NOTE") || first.starts_with("STYLE") || first.starts_with("REGION") {
        return;
    }

    // An optional cue identifier line precedes the timing line.
    let (id, timing_idx) = if lines[0].contains("-->") {
        (None, 0)
    } else if lines.len() > 1 && lines[1].contains("-->") {
        (Some(lines[0].trim().to_string()), 1)
    } else {
        warn!("skipping WebVTT block without a timing line");
        return;
    };

    let Some((start_seconds, end_seconds)) = parse_timing_line(lines[timing_idx]) else {
        warn!(line = lines[timing_idx], "skipping WebVTT cue with unparsable timing");
        return;
    };

    let body = lines[timing_idx + 1..].join("\n");
    if body.is_empty() {
        return;
    }

    cues.push(Cue {
        id: id.unwrap_or_else(|| (cues.len() + 1).to_string()),
        start_seconds,
        end_seconds,
        text: body,
    });
}

/// A `CueWriter` that streams cues in WebVTT format.
///
/// Design:
/// - We stream output directly to a `Write` implementation.
/// - We write the WebVTT header lazily on the first cue so that:
///   - callers can construct the writer without immediately producing output
///   - even "no cues" runs still emit a valid document (close writes the
///     header if nothing else did)
pub struct VttWriter<W: Write> {
    /// The underlying writer we stream VTT into.
    w: W,

    /// Whether we've written the `WEBVTT` header.
    started: bool,

    /// Whether the writer has been closed.
    closed: bool,
}

impl<W: Write> VttWriter<W> {
    /// Create a new VTT writer that writes to the provided writer.
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            closed: false,
        }
    }

    /// Write the WebVTT header if we haven't written it yet.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            // WebVTT files begin with a mandatory header line followed by a blank line.
            self.w.write_all(b"WEBVTT\n\n")?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> CueWriter for VttWriter<W> {
    /// Write a single cue in WebVTT format.
    fn write_cue(&mut self, cue: &Cue) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write cue: writer is already closed",
            ));
        }

        self.start_if_needed()?;

        // WebVTT timestamps use `HH:MM:SS.mmm`.
        let start = vtt_timestamp(cue.start_seconds);
        let end = vtt_timestamp(cue.end_seconds);

        // Cue timing line.
        writeln!(&mut self.w, "{start} --> {end}")?;

        // Cue text, voice tag and all.
        writeln!(&mut self.w, "{}", cue.text)?;

        // Blank line separates cues.
        writeln!(&mut self.w)?;

        // Flush so streaming consumers (stdout, pipes, sockets) see output promptly.
        self.w.flush()?;

        Ok(())
    }

    /// Flush the underlying writer. This is idempotent.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        // A zero-cue document still needs the header to be valid WebVTT.
        self.start_if_needed()?;

        self.w.flush()?;
        self.closed = true;

        Ok(())
    }
}

/// Render a cue list as one WebVTT document.
pub fn cues_to_vtt(cues: &[Cue]) -> String {
    let mut out = Vec::new();
    let mut writer = VttWriter::new(&mut out);
    for cue in cues {
        // Writing to a Vec cannot fail, and the writer is not closed.
        let _ = writer.write_cue(cue);
    }
    let _ = writer.close();
    String::from_utf8(out).unwrap_or_default()
}
