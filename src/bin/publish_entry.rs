use clap::Parser;
use osc_tools::core::editor::product_handoff_url_with_base;
use osc_tools::utils::logger;
use osc_tools::{CatalogTree, Collection, TomlConfig};

#[derive(Parser)]
#[command(name = "publish-entry")]
#[command(about = "Add a prepared entry to a catalog checkout, or hand it to the web editor")]
struct Args {
    /// Path to the entry document (collection.json)
    entry: String,

    /// Path to the catalog checkout root
    #[arg(long, default_value = "open-science-catalog-metadata")]
    catalog_root: String,

    /// Optional TOML configuration file (editor base URL)
    #[arg(short, long)]
    config: Option<String>,

    /// Print the web editor hand-off URL instead of writing to the checkout
    #[arg(long)]
    editor: bool,

    /// Re-add missing theme/variable/mission backlinks for a saved product
    #[arg(long)]
    repair_backlinks: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let raw = std::fs::read_to_string(&args.entry)?;
    let collection: Collection = serde_json::from_str(&raw)?;

    let kind = collection
        .field("osc:type")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("")
        .to_string();

    if args.editor {
        let toml_config = match &args.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        let url = product_handoff_url_with_base(toml_config.editor_base_url(), &collection)?;
        println!("To publish your entry, open the following URL in your browser:");
        println!("{}", url);
        return Ok(());
    }

    let tree = CatalogTree::new(args.catalog_root.clone());

    if args.repair_backlinks {
        let added = tree.repair_backlinks(&collection.id)?;
        println!("✅ Added {} missing backlinks for '{}'", added, collection.id);
        return Ok(());
    }

    let saved = match kind.as_str() {
        "project" => tree.save_project(&collection)?,
        "product" => tree.save_product(&collection)?,
        other => {
            eprintln!(
                "❌ Entry has osc:type '{}'; only projects and products can be saved",
                other
            );
            std::process::exit(1);
        }
    };

    println!("✅ Entry saved to: {}", saved.display());
    println!("💡 Validate the checkout before opening a pull request");
    Ok(())
}
