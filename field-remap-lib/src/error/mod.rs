use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("mapping source unavailable: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },
    #[error("unsupported tabular format: {0}")]
    UnsupportedFormat(String),
    #[error("unsupported character encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("column '{column}' not found in mapping file header")]
    MissingColumn { column: String },
    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid field name: {0}")]
    InvalidFieldName(String),
}

/// A skipped mapping row, kept for diagnostics.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    pub row: u64,
    pub message: String,
}

impl LoadWarning {
    pub fn new(row: u64, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

/// Tallies from the one-time mapping load. Malformed rows are skipped
/// rather than aborting the load, so the counts here are the only trace
/// they leave besides the log.
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    rows_read: usize,
    entries_loaded: usize,
    rows_skipped: usize,
    warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_row(&mut self) {
        self.rows_read += 1;
    }

    pub(crate) fn record_skip(&mut self, row: u64, message: impl Into<String>) {
        self.rows_skipped += 1;
        self.warnings.push(LoadWarning::new(row, message));
    }

    pub(crate) fn set_entries_loaded(&mut self, entries: usize) {
        self.entries_loaded = entries;
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    pub fn entries_loaded(&self) -> usize {
        self.entries_loaded
    }

    pub fn rows_skipped(&self) -> usize {
        self.rows_skipped
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }
}
