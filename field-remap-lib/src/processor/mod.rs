use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::error::RemapError;
use crate::mapping::FieldMapping;
use crate::record::Record;
use crate::renamer::{AttributeRenamer, RenameOutcome};

/// Envelope written to the failure channel: the original record (when one
/// could be decoded at all) plus a textual error description.
#[derive(Debug, Serialize)]
pub struct FailedRecord {
    pub record: Option<Record>,
    pub error: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records_in: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives a stream of records through the renamer and routes each result
/// to the success or failure channel. Input is NDJSON, one flat JSON
/// object of strings per line; blank lines are skipped.
pub struct Processor {
    renamer: AttributeRenamer,
    input_path: PathBuf,
    output_path: PathBuf,
}

impl Processor {
    pub fn new<P: Into<PathBuf>>(mapping: Arc<FieldMapping>, input_path: P, output_path: P) -> Self {
        let input_path = input_path.into();
        let output_path = output_path.into();
        tracing::info!("Creating processor with input path: {:?}", input_path);
        Self {
            renamer: AttributeRenamer::new(mapping),
            input_path,
            output_path,
        }
    }

    /// Processes the whole input stream. Per-record errors never abort the
    /// run; each record is classified independently. Results land in
    /// `success.ndjson` and `failure.ndjson` under the output directory.
    pub async fn process(&self) -> Result<RunSummary, RemapError> {
        tracing::info!("Processing records from {:?}", self.input_path);
        let input = tokio::fs::read_to_string(&self.input_path).await?;

        let mut summary = RunSummary::default();
        let mut success_lines = String::new();
        let mut failure_lines = String::new();

        for (line_num, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            summary.records_in += 1;

            let record: Record = match serde_json::from_str(line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("Line {} is not a flat string record: {}", line_num + 1, e);
                    summary.failed += 1;
                    let entry = FailedRecord {
                        record: None,
                        error: format!("undecodable record: {}", e),
                    };
                    failure_lines.push_str(&serde_json::to_string(&entry)?);
                    failure_lines.push('\n');
                    continue;
                }
            };

            match self.renamer.rename(record) {
                RenameOutcome::Success(renamed) => {
                    summary.succeeded += 1;
                    success_lines.push_str(&serde_json::to_string(&renamed)?);
                    success_lines.push('\n');
                }
                RenameOutcome::Failure { record, error } => {
                    summary.failed += 1;
                    let entry = FailedRecord {
                        record: Some(record),
                        error,
                    };
                    failure_lines.push_str(&serde_json::to_string(&entry)?);
                    failure_lines.push('\n');
                }
            }
        }

        tokio::fs::create_dir_all(&self.output_path).await?;
        tokio::fs::write(self.output_path.join("success.ndjson"), success_lines).await?;
        tokio::fs::write(self.output_path.join("failure.ndjson"), failure_lines).await?;

        tracing::info!(
            "Processed {} records: {} succeeded, {} failed",
            summary.records_in,
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }
}
