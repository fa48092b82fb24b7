//! # Equindex Index
//!
//! The equal-weighted index computation engine.
//!
//! Given a universe of candidate tickers, a market-data source, and a price
//! store, the engine walks a date range day by day: it resolves market caps,
//! selects the top-N constituents, tracks composition changes (rebalancing
//! on drop-outs), values the index, and persists every result. Re-running
//! over unchanged inputs produces identical rows.
//!
//! The weighting scheme is the price-ratio form: at each rebalance every
//! constituent receives the same notional slice of the index value, so
//! between rebalances the index equals the rebalance value times the mean
//! of per-constituent price ratios.

mod engine;
mod error;

pub use engine::{DayOutcome, DayStatus, IndexConfig, IndexEngine, RangeSummary, SkipReason};
pub use error::IndexError;
