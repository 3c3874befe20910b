use std::io::Write;

use crate::Result;
use crate::convert::cue_to_segment;
use crate::cue::Cue;
use crate::cue_writer::CueWriter;
use crate::segment::Transcript;

/// A `CueWriter` that streams cues as a JSON transcript object.
///
/// Design:
/// - We stream output directly to a `Write` implementation to avoid buffering
///   all segments in memory.
/// - The writer is stateful so we can emit a well-formed JSON document incrementally.
/// - Each cue is normalized into a segment on the way out, so the emitted JSON is
///   exactly the schema [`crate::convert::transcript_from_json`] reads back.
///
/// Example output:
/// ```json
/// {"version":"1.0.0","segments":[
///   { "speaker": "A", "startTime": 0.0, "endTime": 1.2, "body": "hello" }
/// ]}
/// ```
pub struct JsonSegmentWriter<W: Write> {
    /// The underlying writer we stream JSON into.
    w: W,

    /// Whether we have written the document preamble.
    started: bool,

    /// Whether the next element will be the first element in the array.
    /// This lets us correctly place commas between elements.
    first: bool,

    /// Whether the writer has been closed.
    /// Once closed, no further writes are allowed.
    closed: bool,
}

impl<W: Write> JsonSegmentWriter<W> {
    /// Create a new JSON segment writer that writes to the given writer.
    ///
    /// The document preamble is written lazily on the first write or on close,
    /// so empty output still results in a valid (zero-segment) transcript.
    pub fn new(w: W) -> Self {
        Self {
            w,
            started: false,
            first: true,
            closed: false,
        }
    }

    /// Write the document preamble if we have not already done so.
    fn start_if_needed(&mut self) -> Result<()> {
        if !self.started {
            write!(
                &mut self.w,
                "{{\"version\":\"{}\",\"segments\":[",
                Transcript::VERSION
            )?;
            self.started = true;
        }
        Ok(())
    }
}

impl<W: Write> CueWriter for JsonSegmentWriter<W> {
    /// Normalize a cue into a segment and append it to the JSON array.
    fn write_cue(&mut self, cue: &Cue) -> Result<()> {
        if self.closed {
            return Err(crate::Error::msg(
                "cannot write cue: writer is already closed",
            ));
        }

        self.start_if_needed()?;

        // Write a comma before every element except the first.
        if !self.first {
            self.w.write_all(b",")?;
        }
        self.first = false;

        serde_json::to_writer(&mut self.w, &cue_to_segment(cue))?;

        // Flush so streaming consumers (stdout, pipes, sockets) see output promptly.
        self.w.flush()?;

        Ok(())
    }

    /// Finalize the JSON document and flush the underlying writer.
    ///
    /// This method is idempotent:
    /// - Calling `close()` multiple times is safe.
    /// - After closing, no further cues may be written.
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        // Ensure we still output a valid document even if no cues were written.
        self.start_if_needed()?;

        self.w.write_all(b"]}")?;
        self.w.flush()?;

        self.closed = true;
        Ok(())
    }
}
