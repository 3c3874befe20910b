//! High-level API for turning raw transcript bytes into synchronized captions.
//!
//! We expose a single, ergonomic entry point (`CaptionEngine`) that wraps the
//! lower-level classification, conversion, grouping, and sync logic.
//!
//! The intent is:
//! - Callers configure grouping/wrapping once via `Opts`.
//! - The engine ingests any of the three wire formats into one `Transcript`.
//! - The same options drive block building and format conversion, so the CLI,
//!   embeds, and tests all see identical behavior.
//!
//! This module is deliberately "high level": it wires up classify → parse →
//! group → sync, while keeping the lower-level pieces testable in their own
//! modules.

use std::io::{BufWriter, Write};

use crate::Result;
use crate::classify::TranscriptFormat;
use crate::colors::SpeakerColorMap;
use crate::convert::{self, segments_to_cues};
use crate::cue::Cue;
use crate::cue_writer::CueWriter;
use crate::grouping::{CaptionBlock, coalesce_segments, group_cues, group_segments};
use crate::json_writer::JsonSegmentWriter;
use crate::opts::{GroupingMode, Opts};
use crate::segment::Transcript;
use crate::srt::SrtWriter;
use crate::sync::{SyncController, TrackAdapter, ViewModelSink, Viewport};
use crate::vtt::VttWriter;

/// The main high-level entry point.
///
/// Typical usage:
/// - Construct once with the presentation's options.
/// - Call `ingest` per transcript fetch; "no transcript" and "unusable
///   transcript" are both `None`.
/// - Hand the resulting cues to the platform's text track and drive a
///   [`SyncController`] from its events.
pub struct CaptionEngine {
    opts: Opts,
}

impl CaptionEngine {
    pub fn new(opts: Opts) -> Self {
        Self { opts }
    }

    /// Access the configured options.
    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Classify and parse raw transcript text into a normalized transcript.
    pub fn ingest(&self, content_type: Option<&str>, text: &str) -> Option<Transcript> {
        convert::ingest(content_type, text)
    }

    /// Convert a transcript into cues under the configured wrap budget.
    pub fn cues(&self, transcript: &Transcript) -> Vec<Cue> {
        segments_to_cues(&transcript.segments, &self.opts.wrap)
    }

    /// Build display blocks for a transcript under the configured grouping mode.
    ///
    /// Each call uses a fresh speaker color map, matching the controller's
    /// per-track scoping.
    pub fn blocks(&self, transcript: &Transcript) -> Vec<CaptionBlock> {
        let mut colors = self.opts.color_map();
        self.blocks_with_colors(transcript, &mut colors)
    }

    fn blocks_with_colors(
        &self,
        transcript: &Transcript,
        colors: &mut SpeakerColorMap,
    ) -> Vec<CaptionBlock> {
        match self.opts.grouping {
            GroupingMode::Transcript => {
                let segments = coalesce_segments(&transcript.segments);
                group_segments(&segments, colors)
            }
            GroupingMode::Feed => group_cues(&self.cues(transcript), colors),
        }
    }

    /// Build a sync controller wired to the given platform capabilities.
    pub fn controller<A, V, S>(&self, adapter: A, viewport: V, sink: S) -> SyncController<A, V, S>
    where
        A: TrackAdapter,
        V: Viewport,
        S: ViewModelSink,
    {
        SyncController::new(adapter, viewport, sink, self.opts.clone())
    }

    /// Stream a transcript to `w` in the requested wire format.
    ///
    /// We accept a generic `Write` output rather than a filename so callers can
    /// pass stdout, files, or in-memory buffers.
    pub fn write_as<W: Write>(
        &self,
        transcript: &Transcript,
        format: TranscriptFormat,
        w: W,
    ) -> Result<()> {
        // Buffer output for efficiency (especially important for stdout).
        let writer = BufWriter::new(w);

        // Select a cue writer based on the requested format.
        // We keep this explicit (no trait objects) to avoid lifetime surprises.
        match format {
            TranscriptFormat::Json => {
                let mut cw = JsonSegmentWriter::new(writer);
                let run_res = self.write_cues(transcript, &mut cw);
                merge_run_and_close(run_res, cw.close())
            }
            TranscriptFormat::WebVtt => {
                let mut cw = VttWriter::new(writer);
                let run_res = self.write_cues(transcript, &mut cw);
                merge_run_and_close(run_res, cw.close())
            }
            TranscriptFormat::SubRip => {
                let mut cw = SrtWriter::new(writer);
                let run_res = self.write_cues(transcript, &mut cw);
                merge_run_and_close(run_res, cw.close())
            }
        }
    }

    fn write_cues<E: CueWriter>(&self, transcript: &Transcript, cw: &mut E) -> Result<()> {
        for cue in self.cues(transcript) {
            cw.write_cue(&cue)?;
        }
        Ok(())
    }
}

impl Default for CaptionEngine {
    fn default() -> Self {
        Self::new(Opts::default())
    }
}

fn merge_run_and_close(run_res: Result<()>, close_res: Result<()>) -> Result<()> {
    match (run_res, close_res) {
        (Ok(()), close_res) => close_res,
        (Err(err), _) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingests_and_converts_between_formats() -> anyhow::Result<()> {
        let engine = CaptionEngine::default();
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nVader: I am your father.\n";
        let transcript = engine.ingest(None, srt).expect("classifiable transcript");

        let mut vtt = Vec::new();
        engine.write_as(&transcript, TranscriptFormat::WebVtt, &mut vtt)?;
        let vtt = String::from_utf8(vtt)?;
        assert!(vtt.starts_with("WEBVTT"));
        assert!(vtt.contains("<v Vader>I am your father."));

        let mut json = Vec::new();
        engine.write_as(&transcript, TranscriptFormat::Json, &mut json)?;
        let back = engine
            .ingest(Some("application/json"), std::str::from_utf8(&json)?)
            .expect("round-tripped transcript");
        assert_eq!(back.segments[0].speaker.as_deref(), Some("Vader"));
        Ok(())
    }

    #[test]
    fn blocks_respect_the_configured_grouping_mode() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nA: One.\n\n2\n00:00:03,000 --> 00:00:04,000\nB: Two.\n";
        let transcript = CaptionEngine::default().ingest(None, srt).unwrap();

        let transcript_mode = CaptionEngine::default();
        assert_eq!(transcript_mode.blocks(&transcript).len(), 2);

        let feed_mode = CaptionEngine::new(Opts {
            grouping: GroupingMode::Feed,
            ..Opts::default()
        });
        assert_eq!(feed_mode.blocks(&transcript).len(), 2);
    }
}
