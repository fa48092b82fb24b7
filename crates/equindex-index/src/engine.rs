use std::collections::BTreeMap;
use std::sync::Arc;

use equindex_core::{MarketDataSource, TradeDate, Universe};
use equindex_store::{CompositionRow, MarketCapRow, PriceStore, SharesRow};

use crate::IndexError;

/// Tuning knobs for the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexConfig {
    /// Number of constituents selected by market cap.
    pub top_n: usize,
    /// Value a brand-new index starts at.
    pub base_value: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            top_n: 100,
            base_value: 10_000.0,
        }
    }
}

/// Why a day produced no index point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The source returned no closes at all; market was closed.
    NonTradingDay,
    /// Prices existed but no ticker had both a close and shares data.
    NoEligibleConstituents,
    /// A composition exists but none of its constituents were priced.
    UnpricedComposition,
}

/// Result of computing one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayStatus {
    Computed { index_value: f64, rebalanced: bool },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayOutcome {
    pub date: TradeDate,
    pub status: DayStatus,
}

/// Tally for a whole range run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeSummary {
    pub days_computed: usize,
    pub days_skipped: usize,
    pub rebalances: usize,
}

/// The batch computation pipeline.
///
/// Holds explicit handles to its collaborators; nothing here is global.
pub struct IndexEngine {
    store: PriceStore,
    source: Arc<dyn MarketDataSource>,
    universe: Universe,
    config: IndexConfig,
}

impl IndexEngine {
    pub fn new(
        store: PriceStore,
        source: Arc<dyn MarketDataSource>,
        universe: Universe,
        config: IndexConfig,
    ) -> Self {
        Self {
            store,
            source,
            universe,
            config,
        }
    }

    /// Fetch and store quarterly shares reports for the whole universe.
    ///
    /// A ticker that yields nothing is logged and skipped; the return value
    /// is the number of tickers that produced at least one report.
    pub async fn refresh_quarterly_shares(&self) -> Result<usize, IndexError> {
        tracing::info!(
            tickers = self.universe.len(),
            "refreshing quarterly shares reports"
        );

        let mut rows = Vec::new();
        let mut covered = 0usize;
        for symbol in self.universe.symbols() {
            match self.source.quarterly_shares(symbol).await {
                Ok(reports) if !reports.is_empty() => {
                    covered += 1;
                    rows.extend(reports.into_iter().map(|report| SharesRow {
                        ticker: report.symbol.as_str().to_string(),
                        report_date: report.report_date.to_string(),
                        shares_outstanding: report.shares_outstanding,
                    }));
                }
                Ok(_) => {
                    tracing::warn!(symbol = %symbol, "no shares reports available");
                }
                Err(error) => {
                    tracing::warn!(symbol = %symbol, error = %error,
                        "failed to fetch shares reports, skipping ticker");
                }
            }
        }

        self.store.store_quarterly_shares(&rows)?;
        tracing::info!(covered, rows = rows.len(), "stored quarterly shares reports");
        Ok(covered)
    }

    /// Compute every day from `start` through `end`, inclusive.
    pub async fn compute_range(
        &self,
        start: TradeDate,
        end: TradeDate,
        refresh_shares: bool,
    ) -> Result<RangeSummary, IndexError> {
        let dates = TradeDate::range_inclusive(start, end)?;
        tracing::info!(days = dates.len(), %start, %end, "starting index computation");

        if refresh_shares {
            self.refresh_quarterly_shares().await?;
        }

        let mut summary = RangeSummary::default();
        for date in dates {
            let outcome = self.compute_day(date).await?;
            match outcome.status {
                DayStatus::Computed {
                    index_value,
                    rebalanced,
                } => {
                    summary.days_computed += 1;
                    if rebalanced {
                        summary.rebalances += 1;
                    }
                    tracing::info!(%date, index_value, rebalanced, "index value computed");
                }
                DayStatus::Skipped(reason) => {
                    summary.days_skipped += 1;
                    tracing::info!(%date, ?reason, "day skipped");
                }
            }
        }

        tracing::info!(
            computed = summary.days_computed,
            skipped = summary.days_skipped,
            rebalances = summary.rebalances,
            "index computation finished"
        );
        Ok(summary)
    }

    /// Compute and persist one day.
    pub async fn compute_day(&self, date: TradeDate) -> Result<DayOutcome, IndexError> {
        let closes = self
            .source
            .daily_closes(self.universe.symbols(), date)
            .await?;
        if closes.is_empty() {
            return Ok(DayOutcome {
                date,
                status: DayStatus::Skipped(SkipReason::NonTradingDay),
            });
        }

        let date_str = date.to_string();
        let close_by_ticker: BTreeMap<String, f64> = closes
            .iter()
            .map(|(symbol, close)| (symbol.as_str().to_string(), close))
            .collect();

        // 1. Resolve market caps for every ticker with both price and shares.
        let tickers: Vec<String> = self
            .universe
            .symbols()
            .iter()
            .map(|symbol| symbol.as_str().to_string())
            .collect();
        let shares = self.store.effective_shares(&date_str, &tickers)?;

        let mut cap_rows = Vec::new();
        for ticker in &tickers {
            match (close_by_ticker.get(ticker), shares.get(ticker)) {
                (Some(close), Some(outstanding)) => cap_rows.push(MarketCapRow {
                    date: date_str.clone(),
                    ticker: ticker.clone(),
                    shares_outstanding: *outstanding,
                    closing_price: *close,
                    market_cap: close * outstanding,
                }),
                _ => {
                    tracing::warn!(ticker = %ticker, date = %date_str,
                        "missing price or shares data, ticker excluded for the day");
                }
            }
        }

        if cap_rows.is_empty() {
            return Ok(DayOutcome {
                date,
                status: DayStatus::Skipped(SkipReason::NoEligibleConstituents),
            });
        }
        self.store.store_market_caps(&cap_rows)?;

        // 2. Select today's constituents and load the standing composition.
        let new_top = self.store.top_by_market_cap(&date_str, self.config.top_n)?;
        let composition = self.store.latest_composition_before(&date_str)?;

        // 3. Value the index against the standing composition. Constituents
        //    without a close today are excluded and the equal weights are
        //    renormalized over the ones that remain.
        let index_value = if composition.is_empty() {
            self.config.base_value
        } else {
            let mut held_value = 0.0;
            let mut available = 0usize;
            for row in &composition {
                match close_by_ticker.get(&row.ticker) {
                    Some(close) => {
                        held_value += row.ticker_qty * close;
                        available += 1;
                    }
                    None => {
                        tracing::warn!(ticker = %row.ticker, date = %date_str,
                            "constituent has no close today, renormalizing without it");
                    }
                }
            }

            if available == 0 {
                return Ok(DayOutcome {
                    date,
                    status: DayStatus::Skipped(SkipReason::UnpricedComposition),
                });
            }
            held_value * composition.len() as f64 / available as f64
        };

        // 4. Rebalance when a constituent dropped out, or on first run.
        let previous: Vec<&String> = composition.iter().map(|row| &row.ticker).collect();
        let removed: Vec<&String> = previous
            .iter()
            .filter(|ticker| !new_top.contains(*ticker))
            .copied()
            .collect();
        let added: Vec<&String> = new_top
            .iter()
            .filter(|ticker| !previous.contains(ticker))
            .collect();

        let mut rebalanced = false;
        if !removed.is_empty() || previous.is_empty() {
            if !removed.is_empty() {
                tracing::info!(?removed, ?added, date = %date_str,
                    "constituent set changed, rebalancing");
            }

            let slice = index_value / new_top.len() as f64;
            let rows: Vec<CompositionRow> = new_top
                .iter()
                .map(|ticker| CompositionRow {
                    date: date_str.clone(),
                    ticker: ticker.clone(),
                    // Every selected ticker has a close: it came from today's
                    // market_caps rows.
                    ticker_qty: slice / close_by_ticker[ticker],
                })
                .collect();
            self.store.store_composition(&rows)?;
            rebalanced = true;
        }

        // 5. Persist the index point.
        self.store.store_index_point(&date_str, index_value)?;

        Ok(DayOutcome {
            date,
            status: DayStatus::Computed {
                index_value,
                rebalanced,
            },
        })
    }
}
