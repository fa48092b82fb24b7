use std::sync::Arc;

use equindex_core::{MarketDataSource, TradeDate, Universe, YahooAdapter};
use equindex_index::{IndexConfig, IndexEngine};
use equindex_store::PriceStore;

use crate::cli::ComputeArgs;
use crate::error::CliError;

pub async fn run(args: &ComputeArgs, store: &PriceStore) -> Result<(), CliError> {
    let start = TradeDate::parse(&args.start)?;
    let end = match &args.end {
        Some(raw) => TradeDate::parse(raw)?,
        None => start,
    };

    let universe_path = args
        .universe
        .clone()
        .unwrap_or_else(|| store.home().join("universe.txt"));
    let universe = Universe::load(&universe_path)?;
    tracing::info!(
        universe = %universe_path.display(),
        tickers = universe.len(),
        "universe loaded"
    );

    let source: Arc<dyn MarketDataSource> = if args.mock {
        Arc::new(YahooAdapter::mock())
    } else {
        Arc::new(YahooAdapter::live()?)
    };

    let config = IndexConfig {
        top_n: args.top,
        ..IndexConfig::default()
    };
    let engine = IndexEngine::new(store.clone(), source, universe, config);
    let summary = engine
        .compute_range(start, end, !args.skip_shares_refresh)
        .await?;

    println!(
        "computed {} day(s), skipped {}, {} rebalance(s)",
        summary.days_computed, summary.days_skipped, summary.rebalances
    );
    Ok(())
}
