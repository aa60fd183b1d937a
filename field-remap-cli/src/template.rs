pub const CONFIG_TEMPLATE: &str = r#"{
  // Path (or file:// URI) of the CSV mapping dictionary.
  // The file must have a header row.
  "source": "mapping.csv",

  // Tabular dialect preset: default, rfc4180, excel, tdf, semicolon.
  // All comma-delimited presets share quoting rules; tdf is tab-delimited.
  "format": "default",

  // Character set used to decode the mapping file
  "encoding": "UTF-8",

  // Header column holding the field names found on incoming records
  "inputNameColumn": "input",

  // Header column holding the replacement field names
  "outputNameColumn": "output"
}
"#;
