use clap::Parser;
use osc_tools::core::audit::{AuditPipeline, FairAuditor, ReportFormat};
use osc_tools::utils::{logger, validation::Validate};
use osc_tools::{JobConfig, LocalStorage, PipelineEngine, TomlConfig};

#[derive(Parser)]
#[command(name = "fair-audit")]
#[command(about = "Run FAIR checks over every product in a catalog checkout")]
struct Args {
    /// Path to the catalog checkout root
    #[arg(default_value = "open-science-catalog-metadata")]
    catalog_root: String,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Directory the report is written to
    #[arg(short, long, default_value = "./output")]
    output_path: String,

    /// Report format: json or csv
    #[arg(long, default_value = "json")]
    format: String,

    /// Max assets sampled per product (overrides the config file)
    #[arg(long)]
    max_checks: Option<usize>,

    /// HTTP timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    /// Sampling seed for reproducible runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Enable system monitoring
    #[arg(long)]
    monitor: bool,

    /// Emit logs as JSON (for CI runs)
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting FAIR audit of {}", args.catalog_root);

    let toml_config = match &args.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    if let Err(e) = toml_config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let mut settings = toml_config.audit_settings();
    if let Some(max_checks) = args.max_checks {
        settings.max_asset_checks = max_checks;
    }
    if let Some(timeout) = args.timeout {
        settings.timeout = std::time::Duration::from_secs(timeout);
    }
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let format = match args.format.as_str() {
        "json" => ReportFormat::Json,
        "csv" => ReportFormat::Csv,
        other => {
            eprintln!("❌ Unknown report format '{}'; use json or csv", other);
            std::process::exit(1);
        }
    };

    let config = JobConfig {
        catalog_root: args.catalog_root.clone(),
        output_path: args.output_path.clone(),
        groups: vec!["products".to_string()],
    };
    if let Err(e) = config.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let auditor = match FairAuditor::new(settings) {
        Ok(auditor) => auditor,
        Err(e) => {
            eprintln!("❌ Could not set up the HTTP client: {}", e);
            std::process::exit(3);
        }
    };

    let source = LocalStorage::new(config.catalog_root.clone());
    let sink = LocalStorage::new(config.output_path.clone());
    let pipeline = AuditPipeline::new(source, sink, config, auditor, format);
    let engine = PipelineEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ FAIR audit completed successfully!");
            tracing::info!("📁 Report saved to: {}", output_path);
            println!("✅ FAIR audit completed successfully!");
            println!("📁 Report saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ FAIR audit failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                osc_tools::utils::error::ErrorSeverity::Low => 0,
                osc_tools::utils::error::ErrorSeverity::Medium => 2,
                osc_tools::utils::error::ErrorSeverity::High => 1,
                osc_tools::utils::error::ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
