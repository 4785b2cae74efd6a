use anyhow::Context;
use batch_etl::app::runner::build_engine;
use batch_etl::config::toml_config::TomlConfig;
use batch_etl::core::ConfigProvider;
use batch_etl::utils::error::ErrorSeverity;
use batch_etl::utils::{logger, validation::Validate};
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-etl")]
#[command(about = "Batch ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "batch-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override batch size from config
    #[arg(long)]
    batch_size: Option<usize>,

    /// Dry run - process records without writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based batch ETL");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 套用命令列覆蓋設定
    if let Some(batch_size) = args.batch_size {
        config.pipeline.batch_size = batch_size;
        tracing::info!("🔧 Batch size overridden to: {}", batch_size);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!(
        "✅ Pipeline '{}' loaded: batch size {}, output {}/{}",
        config.pipeline.name,
        config.batch_size(),
        config.output_path(),
        config.output_file()
    );

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let engine = build_engine(&config, args.dry_run, monitor_enabled)?;

    match engine.run().await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
