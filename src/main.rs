use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use txflow::config::Config;
use txflow::core::TxRecord;
use txflow::db::SharedCache;
use txflow::export;
use txflow::graph::{aggregate_partitioned, bound};
use txflow::render::VisualGraph;
use txflow::source::{self, EtherscanClient, FetchOutcome, SourceError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Parser)]
#[command(name = "txflow", version, about = "Build value-flow graphs from transfer lists")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(flatten)]
    graph: GraphArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch an address's transactions from Etherscan.
    Fetch {
        #[arg(long)]
        address: String,
        #[arg(long)]
        api_key: Option<String>,
        /// Ignore the local record cache.
        #[arg(long)]
        refresh: bool,
    },
    /// Load transactions from a CSV file.
    Csv { path: PathBuf },
    /// Load transactions from a JSON array or Etherscan response dump.
    Json { path: PathBuf },
    /// Use the built-in two-hop sample.
    Sample,
}

#[derive(Debug, Args)]
struct GraphArgs {
    /// Ignore transfers below this many ETH.
    #[arg(long, global = true)]
    min_value: Option<f64>,
    /// Address to center the size bound on and highlight.
    #[arg(long, global = true)]
    focus: Option<String>,
    #[arg(long, global = true)]
    max_nodes: Option<usize>,
    #[arg(long, global = true)]
    partitions: Option<usize>,
    /// Output directory.
    #[arg(long, global = true)]
    out: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Dot,
    None,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("txflow=info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), BoxError> {
    let mut config = Config::load(&cli.config);
    apply_overrides(&mut config, &cli.graph);

    let records = match &cli.command {
        Command::Fetch {
            address,
            api_key,
            refresh,
        } => {
            if config.graph.focus_address.is_none() {
                config.graph.focus_address = Some(address.clone());
            }
            let api_key = api_key.clone().or_else(|| config.api_key()).unwrap_or_default();
            if api_key.is_empty() {
                warn!("No Etherscan API key; requests may be rate limited");
            }
            fetch(&config, address, &api_key, *refresh)?
        }
        Command::Csv { path } => {
            let records = source::file::load_csv(path)?;
            info!("Loaded {} rows from {}", records.len(), path.display());
            records
        }
        Command::Json { path } => {
            let records = source::file::load_json(path)?.into_records()?;
            info!("Loaded {} records from {}", records.len(), path.display());
            records
        }
        Command::Sample => source::sample_records(),
    };

    if records.is_empty() {
        info!("No transactions to graph");
        return Ok(());
    }

    let opts = config.graph.aggregate_options();
    let (graph, report) = aggregate_partitioned(Some(&records), &opts, config.graph.partitions)?;
    info!(
        "Aggregated {} records: {} folded, {} malformed, {} below {} ETH",
        report.records_seen,
        report.records_folded,
        report.skipped_malformed,
        report.skipped_below_minimum,
        opts.minimum_amount
    );

    let focus = config.graph.focus_address.as_deref();
    let full_nodes = graph.node_count();
    let graph = bound(graph, focus, config.graph.max_nodes);
    if graph.node_count() < full_nodes {
        info!(
            "Trimmed {full_nodes} nodes to {} around {}",
            graph.node_count(),
            focus.unwrap_or_default()
        );
    } else if full_nodes > config.graph.max_nodes {
        warn!(
            "Graph has {full_nodes} nodes (max {}) but no focus address in it; not trimmed",
            config.graph.max_nodes
        );
    }

    let summary = graph.summary();
    info!(
        "Graph nodes: {}, edges: {}, total moved: {:.5} ETH",
        summary.node_count, summary.edge_count, summary.total_value
    );

    let out_dir = PathBuf::from(&config.export.dir);
    let paths = export::export_all(&graph, &out_dir)?;
    info!(
        "Exported {}, {}, {}",
        paths.nodes_csv.display(),
        paths.edges_csv.display(),
        paths.graph_json.display()
    );

    let visual = VisualGraph::from_graph(&graph, focus, &config.render);
    if let Some(path) = write_visual(&visual, cli.graph.format, &out_dir)? {
        info!("Render data written to {}", path.display());
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &GraphArgs) {
    if let Some(v) = args.min_value {
        config.graph.minimum_amount = v;
    }
    if let Some(ref focus) = args.focus {
        config.graph.focus_address = Some(focus.clone());
    }
    if let Some(n) = args.max_nodes {
        config.graph.max_nodes = n;
    }
    if let Some(p) = args.partitions {
        config.graph.partitions = p;
    }
    if let Some(ref out) = args.out {
        config.export.dir = out.display().to_string();
    }
}

fn fetch(config: &Config, address: &str, api_key: &str, refresh: bool) -> Result<Vec<TxRecord>, BoxError> {
    let cache = if config.database.cache_enabled {
        open_cache(Path::new(&config.database.path))
    } else {
        None
    };

    if let (Some(cache), false) = (&cache, refresh) {
        if let Some(records) = read_cache(cache, address) {
            return Ok(records);
        }
    }

    let client = EtherscanClient::new(&config.source, api_key)?;
    let rt = tokio::runtime::Runtime::new()?;
    info!("Fetching transactions for {address}...");
    let records = match rt.block_on(client.txlist(address))? {
        FetchOutcome::Empty => {
            info!("No transactions found for {address}");
            Vec::new()
        }
        FetchOutcome::Ok(records) => {
            info!("Fetched {} transactions", records.len());
            records
        }
        FetchOutcome::Err(payload) => return Err(SourceError::Upstream(payload).into()),
    };

    if let Some(cache) = &cache {
        if let Err(e) = cache.store_records(address, &records) {
            warn!("Failed to cache records for {address}: {e}");
        }
    }
    Ok(records)
}

/// Cached records for `address`. Read failures are logged and treated as a miss.
fn read_cache(cache: &SharedCache, address: &str) -> Option<Vec<TxRecord>> {
    match cache.cached_records(address) {
        Ok(Some(records)) => {
            let when = cache
                .cached_at(address)
                .ok()
                .flatten()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            info!("Using {} cached records for {address} (fetched {when})", records.len());
            Some(records)
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Failed to read record cache for {address}: {e}, fetching instead");
            None
        }
    }
}

fn open_cache(path: &Path) -> Option<SharedCache> {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("Failed to create cache directory {}: {e}", parent.display());
            return None;
        }
    }
    match SharedCache::open(path) {
        Ok(cache) => Some(cache),
        Err(e) => {
            warn!("Failed to open record cache {}: {e}", path.display());
            None
        }
    }
}

fn write_visual(visual: &VisualGraph, format: OutputFormat, dir: &Path) -> Result<Option<PathBuf>, BoxError> {
    let (file, contents) = match format {
        OutputFormat::Json => ("render.json", visual.to_json()?),
        OutputFormat::Dot => ("graph.dot", visual.to_dot()),
        OutputFormat::None => return Ok(None),
    };
    let path = dir.join(file);
    std::fs::write(&path, contents)?;
    Ok(Some(path))
}
