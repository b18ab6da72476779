//! Newline-delimited JSON reader for incoming patient records

use crate::types::patient::PatientRecord;
use anyhow::{Context, Result};
use std::io::BufRead;
use tracing::warn;

/// Consumer yielding patient records from a line-oriented source.
///
/// Blank lines are ignored. Lines that do not parse are logged with their
/// line number and skipped; they never reach the pipeline.
pub struct RecordConsumer<R> {
    reader: R,
    line_number: usize,
    skipped: usize,
}

impl<R: BufRead> RecordConsumer<R> {
    /// Create a new record consumer
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Read the next well-formed record, or `None` at end of input
    pub fn next_record(&mut self) -> Result<Option<PatientRecord>> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .reader
                .read_line(&mut line)
                .with_context(|| format!("Failed to read input line {}", self.line_number + 1))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<PatientRecord>(trimmed) {
                Ok(record) => return Ok(Some(record)),
                Err(e) => {
                    self.skipped += 1;
                    warn!(line = self.line_number, error = %e, "Failed to deserialize patient record");
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for RecordConsumer<R> {
    type Item = Result<PatientRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
