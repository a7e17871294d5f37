use clap::Parser;
use osc_tools::utils::logger;
use osc_tools::{SearchIndex, SearchQuery};

#[derive(Parser)]
#[command(name = "osc-search")]
#[command(about = "Search a prebuilt catalog index")]
struct Args {
    /// Free-text query; omit to list entries matching the filters only
    query: Option<String>,

    /// Path to the index file
    #[arg(short, long, default_value = "./output/index.jsonl")]
    index: String,

    /// Entry group to search
    #[arg(short, long, default_value = "products")]
    group: String,

    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    limit: usize,

    /// Restrict to specific entry ids
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    /// Spatial filter: minx,miny,maxx,maxy
    #[arg(long, value_delimiter = ',')]
    bbox: Vec<f64>,

    /// Require the entry extent to be contained in the bbox instead of
    /// intersecting it
    #[arg(long)]
    contained: bool,

    /// Filter by theme concept id
    #[arg(long)]
    theme: Option<String>,

    /// Filter by output variable id
    #[arg(long)]
    variable: Option<String>,

    /// Filter by exact keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Print full entry documents instead of one line per hit
    #[arg(long)]
    full: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init_cli_logger(args.verbose);

    let index = match SearchIndex::from_file(std::path::Path::new(&args.index)) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("❌ Could not load index '{}': {}", args.index, e);
            eprintln!("💡 Build it first with the build_index tool");
            std::process::exit(1);
        }
    };
    tracing::debug!("Loaded index with {} rows", index.len());

    let query = SearchQuery {
        query: args.query.clone(),
        group: args.group.clone(),
        limit: args.limit,
        ids: if args.ids.is_empty() {
            None
        } else {
            Some(args.ids.clone())
        },
        bbox: match args.bbox.len() {
            0 => None,
            4 => Some([args.bbox[0], args.bbox[1], args.bbox[2], args.bbox[3]]),
            _ => {
                eprintln!("❌ --bbox needs exactly four values: minx,miny,maxx,maxy");
                std::process::exit(1);
            }
        },
        intersects: !args.contained,
        theme: args.theme.clone(),
        variable: args.variable.clone(),
        keyword: args.keyword.clone(),
    };

    let hits = index.search(&query);
    if hits.is_empty() {
        println!("No matches.");
        return Ok(());
    }

    for hit in &hits {
        if args.full {
            println!("{}", serde_json::to_string_pretty(&hit.entry)?);
        } else if query.query.is_some() {
            println!("{:>7.2}  {:<40} {}", hit.score, hit.id, hit.title);
        } else {
            println!("{:<40} {}", hit.id, hit.title);
        }
    }

    Ok(())
}
