use crate::Result;
use crate::cue::Cue;

/// A streaming sink for cues, implemented by each output format writer.
pub trait CueWriter {
    fn write_cue(&mut self, cue: &Cue) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}
