use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LoaderConfig;
use crate::error::{LoadReport, RemapError};

/// Immutable input-name to output-name lookup table, built once from the
/// tabular source. Never mutated after load, so it can be shared across
/// record-processing threads without synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: HashMap<String, String>,
}

impl FieldMapping {
    pub fn output_for(&self, input_name: &str) -> Option<&str> {
        self.entries.get(input_name).map(String::as_str)
    }

    pub fn contains_input(&self, input_name: &str) -> bool {
        self.entries.contains_key(input_name)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMapping {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parses the configured tabular source into a [`FieldMapping`], exactly
/// once. After `activate` returns, no file handle or other resource from
/// the load is held; the loader only hands out the mapping snapshot.
pub struct MappingLoader {
    mapping: Arc<FieldMapping>,
    report: LoadReport,
}

impl MappingLoader {
    /// Runs the one-time load. Activation-time errors (unreadable source,
    /// unknown format or encoding, configured column missing from the
    /// header) are fatal; the loader never comes up with a partial mapping.
    pub fn activate(config: &LoaderConfig) -> Result<Self, RemapError> {
        config.validate()?;
        let (mapping, report) = load_mapping(config)?;
        tracing::info!(
            "Mapping loaded: {} entries from {} rows ({} skipped)",
            report.entries_loaded(),
            report.rows_read(),
            report.rows_skipped()
        );
        Ok(Self {
            mapping: Arc::new(mapping),
            report,
        })
    }

    /// The read accessor: an immutable snapshot of the loaded mapping,
    /// safe for lock-free concurrent reads.
    pub fn mapping(&self) -> Arc<FieldMapping> {
        Arc::clone(&self.mapping)
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }
}

fn load_mapping(config: &LoaderConfig) -> Result<(FieldMapping, LoadReport), RemapError> {
    let path = config.source_path()?;
    let dialect = config.dialect()?;
    let charset = config.charset()?;

    tracing::debug!("Reading mapping data from {:?}", path);
    // Read the whole file up front; the handle is released here on every
    // exit path, before any parsing starts.
    let bytes = std::fs::read(&path).map_err(|e| RemapError::SourceUnavailable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let (decoded, _, had_errors) = charset.decode(&bytes);
    if had_errors {
        tracing::warn!(
            "Mapping file {:?} contains byte sequences invalid in {}; they were replaced",
            path,
            charset.name()
        );
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(dialect.delimiter())
        .has_headers(true)
        .flexible(true)
        .from_reader(decoded.as_bytes());

    let headers = rdr.headers()?.clone();
    tracing::debug!("Mapping file headers: {:?}", headers);
    let input_idx = column_index(&headers, &config.input_name_column)?;
    let output_idx = column_index(&headers, &config.output_name_column)?;

    let mut entries = HashMap::new();
    let mut report = LoadReport::new();
    for (row_num, result) in rdr.records().enumerate() {
        // Row 1 is the header, so the first data row is row 2.
        let row = (row_num + 2) as u64;
        report.record_row();

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Skipping unparseable row {}: {}", row, e);
                report.record_skip(row, format!("unparseable row: {}", e));
                continue;
            }
        };

        let input_name = record.get(input_idx).unwrap_or("");
        let output_name = record.get(output_idx).unwrap_or("");
        if input_name.is_empty() || output_name.is_empty() {
            tracing::warn!(
                "Skipping malformed row {}: missing '{}' or '{}' value",
                row,
                config.input_name_column,
                config.output_name_column
            );
            report.record_skip(
                row,
                format!(
                    "missing '{}' or '{}' value",
                    config.input_name_column, config.output_name_column
                ),
            );
            continue;
        }

        // Last occurrence wins on duplicate input names.
        entries.insert(input_name.to_string(), output_name.to_string());
    }
    report.set_entries_loaded(entries.len());

    Ok((FieldMapping { entries }, report))
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize, RemapError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| RemapError::MissingColumn {
            column: column.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_mapping(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    fn config_for(file: &NamedTempFile) -> LoaderConfig {
        LoaderConfig {
            source: file.path().display().to_string(),
            format: "default".to_string(),
            encoding: "UTF-8".to_string(),
            input_name_column: "input".to_string(),
            output_name_column: "output".to_string(),
        }
    }

    #[test]
    fn test_unique_rows_produce_one_entry_each() {
        let file = write_mapping(b"input,output\na,x\nb,y\nc,z\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();

        let mapping = loader.mapping();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.output_for("a"), Some("x"));
        assert_eq!(mapping.output_for("b"), Some("y"));
        assert_eq!(mapping.output_for("c"), Some("z"));
        assert_eq!(loader.report().rows_read(), 3);
        assert_eq!(loader.report().rows_skipped(), 0);
    }

    #[test]
    fn test_duplicate_input_name_last_row_wins() {
        let file = write_mapping(b"input,output\na,first\nb,y\na,second\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();

        let mapping = loader.mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.output_for("a"), Some("second"));
        // Duplicates are silent, not warnings.
        assert!(!loader.report().has_warnings());
    }

    #[test]
    fn test_row_missing_output_value_is_skipped() {
        let file = write_mapping(b"input,output\na,x\nb\nc,z\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();

        let mapping = loader.mapping();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.output_for("a"), Some("x"));
        assert_eq!(mapping.output_for("c"), Some("z"));
        assert!(!mapping.contains_input("b"));

        let report = loader.report();
        assert_eq!(report.rows_read(), 3);
        assert_eq!(report.rows_skipped(), 1);
        assert_eq!(report.warnings()[0].row, 3);
    }

    #[test]
    fn test_empty_column_value_is_skipped() {
        let file = write_mapping(b"input,output\na,x\n,y\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();

        assert_eq!(loader.mapping().len(), 1);
        assert_eq!(loader.report().rows_skipped(), 1);
    }

    #[test]
    fn test_missing_source_fails_activation() {
        let mut config = LoaderConfig {
            source: "/no/such/mapping.csv".to_string(),
            format: "default".to_string(),
            encoding: "UTF-8".to_string(),
            input_name_column: "input".to_string(),
            output_name_column: "output".to_string(),
        };
        assert!(matches!(
            MappingLoader::activate(&config),
            Err(RemapError::SourceUnavailable { .. })
        ));

        config.source = "file:///no/such/mapping.csv".to_string();
        assert!(matches!(
            MappingLoader::activate(&config),
            Err(RemapError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_configured_column_missing_from_header_is_fatal() {
        let file = write_mapping(b"from,to\na,x\n");
        let result = MappingLoader::activate(&config_for(&file));
        assert!(matches!(
            result,
            Err(RemapError::MissingColumn { column }) if column == "input"
        ));
    }

    #[test]
    fn test_tab_and_semicolon_dialects() {
        let file = write_mapping(b"input\toutput\na\tx\n");
        let mut config = config_for(&file);
        config.format = "tdf".to_string();
        let loader = MappingLoader::activate(&config).unwrap();
        assert_eq!(loader.mapping().output_for("a"), Some("x"));

        let file = write_mapping(b"input;output\na;x\n");
        let mut config = config_for(&file);
        config.format = "semicolon".to_string();
        let loader = MappingLoader::activate(&config).unwrap();
        assert_eq!(loader.mapping().output_for("a"), Some("x"));
    }

    #[test]
    fn test_quoted_fields_with_embedded_delimiter() {
        let file = write_mapping(b"input,output\n\"last, first\",name\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();
        assert_eq!(loader.mapping().output_for("last, first"), Some("name"));
    }

    #[test]
    fn test_latin1_encoded_source() {
        // "café" with 0xE9 for the e-acute, undecodable as UTF-8.
        let file = write_mapping(b"input,output\ncaf\xe9,coffee\n");
        let mut config = config_for(&file);
        config.encoding = "ISO-8859-1".to_string();
        let loader = MappingLoader::activate(&config).unwrap();
        assert_eq!(loader.mapping().output_for("caf\u{e9}"), Some("coffee"));
    }

    #[test]
    fn test_header_only_source_yields_empty_mapping() {
        let file = write_mapping(b"input,output\n");
        let loader = MappingLoader::activate(&config_for(&file)).unwrap();
        assert!(loader.mapping().is_empty());
        assert_eq!(loader.report().rows_read(), 0);
    }
}
