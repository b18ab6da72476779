//! Newline-delimited JSON writer for request outcomes

use crate::types::report::Outcome;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

/// Producer writing one JSON object per request outcome
pub struct ReportProducer<W> {
    writer: W,
    written: u64,
}

impl<W: Write> ReportProducer<W> {
    /// Create a new report producer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Write one outcome as a single JSON line
    pub fn publish(&mut self, outcome: &Outcome) -> Result<()> {
        serde_json::to_writer(&mut self.writer, outcome).context("Failed to serialize outcome")?;
        self.writer
            .write_all(b"\n")
            .context("Failed to write outcome")?;
        self.written += 1;

        debug!(status = outcome.status(), "Published outcome");

        Ok(())
    }

    /// Number of outcomes written
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush output")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::types::report::{RiskReport, Verdict};

    #[test]
    fn test_publish_writes_json_lines() {
        let mut producer = ReportProducer::new(Vec::new());

        let report = RiskReport::new(Some("p-1".to_string()), Verdict::LowRisk, vec![0.0; 11]);
        producer
            .publish(&Outcome::from_result(Some("p-1".to_string()), Ok(report)))
            .unwrap();
        producer
            .publish(&Outcome::from_result(
                None,
                Err(ValidationError::ZeroOrMissingField { field: "age" }.into()),
            ))
            .unwrap();
        assert_eq!(producer.written(), 2);

        let output = String::from_utf8(producer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "reported");
        assert_eq!(lines[0]["verdict"], "low_risk");
        assert_eq!(lines[1]["status"], "rejected");
        assert_eq!(lines[1]["kind"], "zero_or_missing_field");
        assert_eq!(
            lines[1]["message"],
            "Please enter valid non-zero values for all fields."
        );
    }
}
