use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use field_remap::{LoaderConfig, MappingLoader, Processor};
use std::{fs, path::PathBuf};
use tracing::{info, warn, Level};

mod template;

/// Field Remap Processor
/// Renames record fields according to a CSV mapping dictionary
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output for detailed processing information
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename record fields according to a remap configuration
    Process {
        /// Path to the remap configuration file
        #[arg(short, long, value_name = "PATH TO CONFIG")]
        config: PathBuf,

        /// Path to the NDJSON file of records to process
        #[arg(short, long, value_name = "PATH TO RECORDS")]
        input: PathBuf,

        /// Output directory for the success and failure channels
        #[arg(short, long, value_name = "OUTPUT DIRECTORY PATH")]
        output: Option<PathBuf>,
    },
    /// Validate a remap configuration file
    Validate {
        /// Path to the remap configuration file to validate
        #[arg(
            short,
            long,
            default_value = "remap.jsonc",
            value_name = "PATH TO CONFIG"
        )]
        config: PathBuf,
    },
    /// Generate a remap configuration template
    GenerateConfig {
        /// Output path for the generated configuration
        #[arg(
            short,
            long,
            default_value = "remap.jsonc",
            value_name = "OUTPUT PATH"
        )]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with appropriate level
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Field Remap Processor starting up...");

    match &cli.command {
        Commands::GenerateConfig { output } => generate_config_command(output),
        Commands::Validate { config } => validate_command(config),
        Commands::Process {
            config,
            input,
            output,
        } => process_command(config, input, output).await,
    }
}

async fn process_command(
    config_path: &PathBuf,
    input: &PathBuf,
    output: &Option<PathBuf>,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Record input file not found: {}", input.display());
    }

    let output_path = match output {
        Some(path) => path.clone(),
        None => input
            .parent()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| anyhow::anyhow!("Could not determine parent directory of input file"))?,
    };

    info!("Loading remap configuration from {}", config_path.display());
    let config = LoaderConfig::from_file(config_path)
        .context("Failed to load configuration. See errors for additional details:")?;

    info!("Loading field mapping...");
    let loader = MappingLoader::activate(&config).context("Failed to load field mapping")?;

    let report = loader.report();
    info!(
        "Field mapping loaded: {} entries from {} rows",
        report.entries_loaded(),
        report.rows_read()
    );
    if report.has_warnings() {
        warn!(
            "{} malformed mapping rows were skipped; rerun with --verbose for details",
            report.rows_skipped()
        );
    }

    info!("Beginning record processing...");
    let processor = Processor::new(loader.mapping(), input.clone(), output_path);
    let summary = processor
        .process()
        .await
        .context("Failed to process records")?;

    info!(
        "Processing completed: {} records in, {} succeeded, {} failed",
        summary.records_in, summary.succeeded, summary.failed
    );
    Ok(())
}

fn validate_command(config_path: &PathBuf) -> Result<()> {
    info!("Validating remap configuration...");

    if !config_path.exists() {
        anyhow::bail!(
            "Configuration file not found: {}. Try using --config <PATH TO CONFIG>",
            config_path.display()
        );
    }

    let config = LoaderConfig::from_file(config_path)
        .context("Failed to parse configuration. See errors for additional details:")?;

    config
        .validate()
        .context("Failed to validate configuration")?;

    info!("Configuration validation successful");
    info!("Source: {}", config.source);
    info!(
        "Columns: '{}' -> '{}'",
        config.input_name_column, config.output_name_column
    );
    Ok(())
}

fn generate_config_command(output: &PathBuf) -> Result<()> {
    info!("Generating remap configuration template...");

    // if output is a directory, append the default file name
    let full_file_output_path = if output.is_dir() {
        output.join("remap.jsonc")
    } else {
        output.into()
    };

    fs::write(&full_file_output_path, template::CONFIG_TEMPLATE)
        .context(format!("Failed to write template to: {}", output.display()))?;

    info!(
        "Successfully generated configuration template at: {}",
        full_file_output_path.display()
    );
    Ok(())
}
