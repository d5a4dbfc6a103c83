//! Log lines written while the run progress bar is drawn would otherwise leave parts of the
//! bar behind on the same console line.

use log::Record;
use log4rs::encode::{Encode, Write};

use crate::progress::is_run_progress_active;

// Erases the whole line and returns the cursor to its start.
const CLEAR_LINE: &[u8] = b"\x1B[2K\r";

/// Wraps an encoder and clears the console line before each record while the run progress
/// bar is shown. Without a bar, records pass through unchanged.
#[derive(Debug)]
pub struct PBWrapperEncoder {
    inner: Box<dyn Encode>,
}

impl PBWrapperEncoder {
    pub fn new(inner: Box<dyn Encode>) -> Self {
        Self { inner }
    }
}

impl Encode for PBWrapperEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> Result<(), anyhow::Error> {
        if is_run_progress_active() {
            w.write_all(CLEAR_LINE)?;
        }
        self.inner.encode(w, record)
    }
}
