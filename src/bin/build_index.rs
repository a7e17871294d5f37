use clap::Parser;
use osc_tools::core::index::{IndexPipeline, DEFAULT_GROUPS};
use osc_tools::utils::{logger, validation::Validate};
use osc_tools::{JobConfig, LocalStorage, PipelineEngine};

#[derive(Parser)]
#[command(name = "build-index")]
#[command(about = "Build the search index from a catalog checkout")]
struct Args {
    /// Path to the catalog checkout root
    #[arg(default_value = "open-science-catalog-metadata")]
    catalog_root: String,

    /// Group directories to ingest
    #[arg(long, value_delimiter = ',')]
    groups: Vec<String>,

    /// Directory the index file is written to
    #[arg(short, long, default_value = "./output")]
    output_path: String,

    /// Enable system monitoring
    #[arg(long)]
    monitor: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let groups = if args.groups.is_empty() {
        DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect()
    } else {
        args.groups.clone()
    };

    tracing::info!(
        "🚀 Indexing {} from groups: {}",
        args.catalog_root,
        groups.join(", ")
    );

    let config = JobConfig {
        catalog_root: args.catalog_root.clone(),
        output_path: args.output_path.clone(),
        groups,
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let source = LocalStorage::new(config.catalog_root.clone());
    let sink = LocalStorage::new(config.output_path.clone());
    let pipeline = IndexPipeline::new(source, sink, config);
    let engine = PipelineEngine::new_with_monitoring(pipeline, args.monitor);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Index build completed successfully!");
            println!("✅ Index build completed successfully!");
            println!("📁 Index saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Index build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
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
