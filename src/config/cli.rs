use crate::config::SourceKind;
use crate::core::batch_pipeline::DEFAULT_BATCH_SIZE;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_path, validate_positive_number, Validate};
use clap::{Parser, ValueEnum};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "batch-etl")]
#[command(about = "Batch ETL for user records: transform, validate and store in fault-isolated batches")]
pub struct CliConfig {
    /// Input file (JSON array, JSON Lines or CSV)
    #[arg(long, conflicts_with = "api_endpoint")]
    pub input: Option<String>,

    #[arg(long, value_enum, default_value = "json")]
    pub format: InputFormat,

    /// Fetch records from an HTTP endpoint instead of a file
    #[arg(long)]
    pub api_endpoint: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "records.jsonl")]
    pub output_file: String,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Fail a batch whose store call takes longer than this
    #[arg(long)]
    pub store_timeout_ms: Option<u64>,

    #[arg(long, help = "Process without writing output")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process CPU and memory usage")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl ConfigProvider for CliConfig {
    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn source(&self) -> Result<SourceKind> {
        match (&self.input, &self.api_endpoint) {
            (_, Some(endpoint)) => Ok(SourceKind::Api {
                endpoint: endpoint.clone(),
            }),
            (Some(path), None) => Ok(match self.format {
                InputFormat::Json => SourceKind::Json { path: path.clone() },
                InputFormat::Csv => SourceKind::Csv { path: path.clone() },
            }),
            (None, None) => Err(EtlError::MissingConfigError {
                field: "--input or --api-endpoint".to_string(),
            }),
        }
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("batch_size", self.batch_size, 1)?;
        self.source()?.validate()?;
        validate_path("output_path", &self.output_path)?;
        validate_path("output_file", &self.output_file)?;
        if let Some(timeout) = self.store_timeout_ms {
            validate_positive_number("store_timeout_ms", timeout, 1)?;
        }
        Ok(())
    }
}
