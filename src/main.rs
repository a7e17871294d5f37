use clap::Parser;
use osc_tools::core::validator;
use osc_tools::utils::{logger, validation::Validate};
use osc_tools::CliConfig;

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting catalog validation");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let root = std::path::Path::new(&config.catalog_root);
    let report = match validator::validate_tree(root) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(
                "❌ Validation run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(match e.severity() {
                osc_tools::utils::error::ErrorSeverity::Low => 0,
                osc_tools::utils::error::ErrorSeverity::Medium => 2,
                osc_tools::utils::error::ErrorSeverity::High => 1,
                osc_tools::utils::error::ErrorSeverity::Critical => 3,
            });
        }
    };

    if report.is_ok() {
        tracing::info!("✅ {} files checked, no problems found", report.checked);
        println!("✅ Catalog is valid ({} files checked)", report.checked);
        return Ok(());
    }

    println!(
        "❌ {} of {} files have problems ({} errors total):",
        report.files.len(),
        report.checked,
        report.error_count()
    );
    for file in &report.files {
        println!("\n{}", file.path.display());
        for error in &file.errors {
            println!("  - {}", error);
        }
    }

    std::process::exit(1);
}
