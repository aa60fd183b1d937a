use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::RemapError;
use crate::mapping::FieldMapping;
use crate::record::Record;

/// Result of applying the field mapping to one record. The surrounding
/// pipeline performs the routing; a failure carries the original record
/// untouched plus an error description for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Success(Record),
    Failure { record: Record, error: String },
}

impl RenameOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RenameOutcome::Success(_))
    }

    pub fn into_record(self) -> Record {
        match self {
            RenameOutcome::Success(record) => record,
            RenameOutcome::Failure { record, .. } => record,
        }
    }
}

/// Applies a loaded [`FieldMapping`] to one record at a time. Holds no
/// per-record state, so one renamer can serve any number of concurrent
/// callers.
#[derive(Clone)]
pub struct AttributeRenamer {
    mapping: Arc<FieldMapping>,
}

impl AttributeRenamer {
    pub fn new(mapping: Arc<FieldMapping>) -> Self {
        Self { mapping }
    }

    /// Renames the record's fields according to the mapping. A record that
    /// matches no mapping entry passes through unchanged as `Success`. On
    /// error the original record comes back in the `Failure` variant with
    /// no changes applied.
    pub fn rename(&self, record: Record) -> RenameOutcome {
        match self.apply(&record) {
            Ok(renamed) => RenameOutcome::Success(renamed),
            Err(e) => {
                tracing::error!("Failed to rename record fields: {}", e);
                RenameOutcome::Failure {
                    record,
                    error: e.to_string(),
                }
            }
        }
    }

    // Every mapping read goes against the record as it existed before this
    // pass; writes land in a separate working copy. Rename chains (one
    // entry's output is another entry's input) therefore stay deterministic:
    // {a: "1", b: "2"} with {a->b, b->c} yields {b: "1", c: "2"}.
    fn apply(&self, snapshot: &Record) -> Result<Record, RemapError> {
        let mut additions: BTreeMap<&str, &str> = BTreeMap::new();
        let mut matched_inputs: BTreeSet<&str> = BTreeSet::new();

        for (input_name, output_name) in self.mapping.entries() {
            if let Some(value) = snapshot.get(input_name) {
                additions.insert(output_name, value);
                matched_inputs.insert(input_name);
            }
        }

        let mut working = snapshot.clone();
        for input_name in matched_inputs {
            // A matched input that doubles as another entry's output keeps
            // the value written this pass instead of being dropped.
            if !additions.contains_key(input_name) {
                working.remove(input_name);
            }
        }
        for (name, value) in additions {
            working.insert(name, value)?;
        }

        Ok(working)
    }
}
