use anyhow::Context;
use clap::Parser;
use wallet_history::utils::logging;
use wallet_history::{
    HistoryAggregator, HistoryConfig, HistoryContext, HistoryItem, HistoryPage, SourceLabel,
    SubscanClient,
};

/// Page through an account's merged transfer, reward and extrinsic history
#[derive(Parser, Debug)]
#[command(name = "wallet-history", version)]
struct Cli {
    /// Account address to query
    #[arg(long)]
    address: String,

    /// Explorer base URL (defaults to HISTORY_BASE_URL or Polkadot Subscan)
    #[arg(long)]
    base_url: Option<String>,

    /// Preferred page size per source
    #[arg(long)]
    row: Option<u32>,

    /// Explorer API key
    #[arg(long)]
    api_key: Option<String>,

    /// Only query these sources (transfers, rewards, extrinsics); repeatable
    #[arg(long = "source")]
    sources: Vec<SourceLabel>,

    /// Maximum number of pages to request
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Resume from a context printed by an earlier run (JSON)
    #[arg(long)]
    context: Option<String>,

    /// Print items and the final context as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::set_debug(cli.debug);

    let mut config = HistoryConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    if let Some(row) = cli.row {
        config.default_row = row;
    }
    if cli.api_key.is_some() {
        config.api_key = cli.api_key;
    }

    let mut context = match &cli.context {
        Some(raw) => serde_json::from_str::<HistoryContext>(raw).context("Invalid --context JSON")?,
        None if cli.sources.is_empty() => config.initial_context(),
        None => HistoryContext::for_sources(config.default_row, &cli.sources),
    };

    let aggregator = HistoryAggregator::new(SubscanClient::from_config(&config)?);
    let mut items: Vec<HistoryItem> = Vec::new();

    for _ in 0..cli.pages {
        if context.is_complete() {
            break;
        }
        let page = aggregator.request_next_page(&context, &cli.address).await?;
        items.extend(page.items);
        context = page.context;
    }

    let result = HistoryPage { items, context };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for item in &result.items {
            println!(
                "{:>10}-{:<4} {:<10} {}",
                item.block_number,
                item.extrinsic_index,
                item.label,
                item.identifier()
            );
        }
        println!(
            "{} items, history {}",
            result.items.len(),
            if result.context.is_complete() { "complete" } else { "continues" }
        );
        println!("context: {}", serde_json::to_string(&result.context)?);
    }

    Ok(())
}
