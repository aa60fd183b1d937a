use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use encoding_rs::Encoding;
use json_comments::StripComments;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RemapError;

/// Recognized tabular dialect presets. `Default`, `Rfc4180` and `Excel` are
/// all comma-delimited; the csv reader handles quoting uniformly, so the
/// presets differ only in delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvDialect {
    Default,
    Rfc4180,
    Excel,
    Tdf,
    Semicolon,
}

impl CsvDialect {
    pub fn delimiter(&self) -> u8 {
        match self {
            CsvDialect::Default | CsvDialect::Rfc4180 | CsvDialect::Excel => b',',
            CsvDialect::Tdf => b'\t',
            CsvDialect::Semicolon => b';',
        }
    }
}

impl FromStr for CsvDialect {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(CsvDialect::Default),
            "rfc4180" => Ok(CsvDialect::Rfc4180),
            "excel" => Ok(CsvDialect::Excel),
            "tdf" | "tab" => Ok(CsvDialect::Tdf),
            "semicolon" => Ok(CsvDialect::Semicolon),
            other => Err(RemapError::UnsupportedFormat(other.to_string())),
        }
    }
}

fn default_format() -> String {
    "default".to_string()
}

fn default_encoding() -> String {
    "UTF-8".to_string()
}

/// Configuration for the one-time mapping load. All fields are validated
/// before any I/O happens; a config that passes `validate` resolves to a
/// readable source, a known dialect and a known charset.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Path or `file://` URI of the mapping file. Must have a header row.
    pub source: String,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(rename = "inputNameColumn")]
    pub input_name_column: String,
    #[serde(rename = "outputNameColumn")]
    pub output_name_column: String,
}

impl LoaderConfig {
    pub fn from_file<P: Into<PathBuf>>(path: P) -> Result<Self, RemapError> {
        let path = path.into();
        tracing::info!("Loading remap configuration from {:?}", path);
        let file = File::open(&path)?;
        // Config files may carry // comments (see the CLI template).
        let config = serde_json::from_reader(StripComments::new(file))?;
        tracing::info!("Successfully loaded configuration: {}", path.display());
        Ok(config)
    }

    pub fn dialect(&self) -> Result<CsvDialect, RemapError> {
        self.format.parse()
    }

    pub fn charset(&self) -> Result<&'static Encoding, RemapError> {
        Encoding::for_label(self.encoding.as_bytes())
            .ok_or_else(|| RemapError::UnsupportedEncoding(self.encoding.clone()))
    }

    /// Resolves `source` to a filesystem path. A bare path is the common
    /// case; `file://` URIs are also accepted. Any other URI scheme cannot
    /// be opened here.
    pub fn source_path(&self) -> Result<PathBuf, RemapError> {
        if let Ok(url) = Url::parse(&self.source) {
            if url.scheme() == "file" {
                return url
                    .to_file_path()
                    .map_err(|_| RemapError::SourceUnavailable {
                        path: self.source.clone(),
                        reason: "file URI has no usable path".to_string(),
                    });
            }
            // Single-letter schemes are Windows drive prefixes, not URIs.
            if url.scheme().len() > 1 {
                return Err(RemapError::SourceUnavailable {
                    path: self.source.clone(),
                    reason: format!("unsupported URI scheme '{}'", url.scheme()),
                });
            }
        }
        Ok(PathBuf::from(&self.source))
    }

    pub fn validate(&self) -> Result<(), RemapError> {
        tracing::debug!("Validating loader configuration: {:?}", self);

        if self.input_name_column.trim().is_empty() {
            return Err(RemapError::InvalidConfig(
                "inputNameColumn must be a non-empty header name".into(),
            ));
        }
        if self.output_name_column.trim().is_empty() {
            return Err(RemapError::InvalidConfig(
                "outputNameColumn must be a non-empty header name".into(),
            ));
        }

        self.dialect()?;
        self.charset()?;

        let path = self.source_path()?;
        if !path.is_file() {
            return Err(RemapError::SourceUnavailable {
                path: path.display().to_string(),
                reason: "file not found or not readable".into(),
            });
        }

        Ok(())
    }
}
