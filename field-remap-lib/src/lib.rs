//! Field Remap Library
//!
//! This library loads a field-renaming dictionary from a delimited text file
//! and applies it to a stream of records, routing each record to a success
//! or failure channel.

mod config;
mod error;
mod mapping;
mod processor;
mod record;
mod renamer;

pub use config::{CsvDialect, LoaderConfig};
pub use error::{LoadReport, LoadWarning, RemapError};
pub use mapping::{FieldMapping, MappingLoader};
pub use processor::{FailedRecord, Processor, RunSummary};
pub use record::Record;
pub use renamer::{AttributeRenamer, RenameOutcome};
