//! Incremental reader over the session log.
//!
//! `screen` appends the REPL's output to the log asynchronously, so a read
//! can hit end of file in the middle of a line. Partial content is held back
//! until its newline arrives.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

/// Reader yielding complete lines as they are appended to a log file.
#[derive(Debug)]
pub struct OutputLogReader {
    reader: BufReader<File>,
    /// Bytes of a line whose newline has not been written yet.
    partial: Vec<u8>,
}

impl OutputLogReader {
    /// Open a log file for reading from its start.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            partial: Vec::new(),
        })
    }

    /// Try to read one complete line, without its line terminator.
    ///
    /// Returns None when no complete line is available yet. Never blocks
    /// waiting for the writer.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.partial)?;
        if read == 0 || self.partial.last() != Some(&b'\n') {
            return Ok(None);
        }

        let mut bytes = std::mem::take(&mut self.partial);
        bytes.pop();
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        // The terminal log can carry stray non-UTF-8 bytes.
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Whether part of an unterminated line is buffered.
    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }
}
