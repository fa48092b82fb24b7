//! # Equindex Store
//!
//! DuckDB-backed persistence for the equindex pipeline.
//!
//! ## Overview
//!
//! One local database file holds everything the pipeline produces, keyed so
//! that re-ingestion is idempotent (`INSERT OR REPLACE` on natural keys).
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `quarterly_shares` | Shares outstanding per ticker per quarterly report |
//! | `market_caps` | Daily close, shares, and market cap per ticker |
//! | `index_composition` | Notional share count per constituent per rebalance date |
//! | `index_performance` | One index value per trading day |
//! | `schema_migrations` | Applied migration versions |
//!
//! ## Security
//!
//! All values that originate outside this process (tickers, dates) are bound
//! as query parameters, never interpolated into SQL.

mod migrations;
mod pool;

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use duckdb::{Connection, ToSql};
use serde::Serialize;
use thiserror::Error;

pub use pool::{ConnectionPool, PooledConnection};

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database error.
    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),

    /// Filesystem error while preparing the database location.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Location of the store on disk.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for equindex data (reports land under `<home>/stats`).
    pub home: PathBuf,
    /// Path to the DuckDB database file.
    pub db_path: PathBuf,
    /// Idle connections kept around for reuse.
    pub max_idle_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let home = resolve_equindex_home();
        let db_path = home.join("data").join("equindex.duckdb");
        Self {
            home,
            db_path,
            max_idle_connections: 4,
        }
    }
}

impl StoreConfig {
    /// Config for an explicitly chosen database file.
    pub fn at_path(db_path: impl Into<PathBuf>) -> Self {
        let db_path = db_path.into();
        let home = db_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            home,
            db_path,
            max_idle_connections: 4,
        }
    }
}

/// A quarterly shares-outstanding row.
#[derive(Debug, Clone, PartialEq)]
pub struct SharesRow {
    pub ticker: String,
    pub report_date: String,
    pub shares_outstanding: f64,
}

/// A daily price point: close, shares, and the derived market cap.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCapRow {
    pub date: String,
    pub ticker: String,
    pub shares_outstanding: f64,
    pub closing_price: f64,
    pub market_cap: f64,
}

/// Notional share count held per unit of index for one constituent.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionRow {
    pub date: String,
    pub ticker: String,
    pub ticker_qty: f64,
}

/// One computed index value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPointRow {
    pub date: String,
    pub index_value: f64,
}

/// Constituent weight as a percentage of index value on a date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionWeightRow {
    pub date: String,
    pub ticker: String,
    pub weight_pct: f64,
}

/// The price store: durable keyed storage with range retrieval by date.
///
/// Opened once at startup and passed by handle to every component that
/// needs it; there is no process-wide instance.
#[derive(Clone)]
pub struct PriceStore {
    config: StoreConfig,
    pool: ConnectionPool,
}

impl PriceStore {
    /// Open the store at the default location (`$EQUINDEX_HOME`).
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(StoreConfig::default())
    }

    /// Open the store, creating the schema if needed.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path.clone(), config.max_idle_connections)?;
        let store = Self { config, pool };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let connection = self.pool.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    pub fn home(&self) -> &Path {
        self.config.home.as_path()
    }

    /// Store quarterly shares reports, replacing rows with the same key.
    pub fn store_quarterly_shares(&self, rows: &[SharesRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 3] =
                    [&row.ticker, &row.report_date, &row.shares_outstanding];
                connection.execute(
                    "INSERT OR REPLACE INTO quarterly_shares \
                     (ticker, report_date, shares_outstanding, updated_at) \
                     VALUES (?, TRY_CAST(? AS DATE), ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Effective shares outstanding per ticker: the most recent report on or
    /// before `date`. Tickers without any report are absent from the result.
    pub fn effective_shares(
        &self,
        date: &str,
        tickers: &[String],
    ) -> Result<BTreeMap<String, f64>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT shares_outstanding FROM quarterly_shares \
             WHERE ticker = ? AND report_date <= TRY_CAST(? AS DATE) \
             ORDER BY report_date DESC LIMIT 1",
        )?;

        let mut shares = BTreeMap::new();
        for ticker in tickers {
            let params: [&dyn ToSql; 2] = [ticker, &date];
            let mut rows = statement.query(params.as_slice())?;
            if let Some(row) = rows.next()? {
                shares.insert(ticker.clone(), row.get::<_, f64>(0)?);
            }
        }
        Ok(shares)
    }

    /// Store daily price points, replacing rows with the same (date, ticker).
    pub fn store_market_caps(&self, rows: &[MarketCapRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 5] = [
                    &row.date,
                    &row.ticker,
                    &row.shares_outstanding,
                    &row.closing_price,
                    &row.market_cap,
                ];
                connection.execute(
                    "INSERT OR REPLACE INTO market_caps \
                     (date, ticker, shares_outstanding, closing_price, market_cap, updated_at) \
                     VALUES (TRY_CAST(? AS DATE), ?, ?, ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Top `limit` tickers by market cap on `date`, returned alphabetically.
    pub fn top_by_market_cap(&self, date: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT ticker FROM market_caps \
             WHERE date = TRY_CAST(? AS DATE) \
             ORDER BY market_cap DESC, ticker \
             LIMIT ?",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let params: [&dyn ToSql; 2] = [&date, &limit];
        let mut rows = statement.query(params.as_slice())?;

        let mut tickers = Vec::new();
        while let Some(row) = rows.next()? {
            tickers.push(row.get::<_, String>(0)?);
        }
        tickers.sort();
        Ok(tickers)
    }

    /// The most recent composition strictly before `date`.
    pub fn latest_composition_before(
        &self,
        date: &str,
    ) -> Result<Vec<CompositionRow>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT CAST(date AS VARCHAR), ticker, ticker_qty FROM index_composition \
             WHERE date = (SELECT MAX(date) FROM index_composition \
                           WHERE date < TRY_CAST(? AS DATE)) \
             ORDER BY ticker",
        )?;

        let params: [&dyn ToSql; 1] = [&date];
        let mut rows = statement.query(params.as_slice())?;

        let mut composition = Vec::new();
        while let Some(row) = rows.next()? {
            composition.push(CompositionRow {
                date: row.get(0)?,
                ticker: row.get(1)?,
                ticker_qty: row.get(2)?,
            });
        }
        Ok(composition)
    }

    /// Store a rebalanced composition for one date.
    pub fn store_composition(&self, rows: &[CompositionRow]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let connection = self.pool.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<(), StoreError> {
            for row in rows {
                let params: [&dyn ToSql; 3] = [&row.date, &row.ticker, &row.ticker_qty];
                connection.execute(
                    "INSERT OR REPLACE INTO index_composition \
                     (date, ticker, ticker_qty, updated_at) \
                     VALUES (TRY_CAST(? AS DATE), ?, ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }
            Ok(())
        })();

        finalize_transaction(&connection, result)
    }

    /// Store one index value, replacing any previous value for the date.
    pub fn store_index_point(&self, date: &str, index_value: f64) -> Result<(), StoreError> {
        let connection = self.pool.acquire()?;
        let params: [&dyn ToSql; 2] = [&date, &index_value];
        connection.execute(
            "INSERT OR REPLACE INTO index_performance (date, index_value, updated_at) \
             VALUES (TRY_CAST(? AS DATE), ?, CURRENT_TIMESTAMP)",
            params.as_slice(),
        )?;
        Ok(())
    }

    /// Full index series in date order.
    pub fn index_performance(&self) -> Result<Vec<IndexPointRow>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT CAST(date AS VARCHAR), index_value FROM index_performance ORDER BY date",
        )?;
        let mut rows = statement.query([])?;

        let mut points = Vec::new();
        while let Some(row) = rows.next()? {
            points.push(IndexPointRow {
                date: row.get(0)?,
                index_value: row.get(1)?,
            });
        }
        Ok(points)
    }

    /// Distinct rebalance dates in order.
    pub fn composition_dates(&self) -> Result<Vec<String>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT DISTINCT CAST(date AS VARCHAR) FROM index_composition ORDER BY 1",
        )?;
        let mut rows = statement.query([])?;

        let mut dates = Vec::new();
        while let Some(row) = rows.next()? {
            dates.push(row.get(0)?);
        }
        Ok(dates)
    }

    /// Per-constituent weight of the index value on `date`, heaviest first.
    ///
    /// Joins the composition in effect on `date` with that day's closes and
    /// index value; dates without stored prices or index value yield an
    /// empty result.
    pub fn composition_weights(
        &self,
        date: &str,
    ) -> Result<Vec<CompositionWeightRow>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement = connection.prepare(
            "SELECT CAST(m.date AS VARCHAR), c.ticker, \
                    ROUND(100.0 * (c.ticker_qty * m.closing_price) / p.index_value, 2) \
             FROM index_composition AS c \
             JOIN market_caps AS m \
               ON m.ticker = c.ticker AND m.date = TRY_CAST(? AS DATE) \
             JOIN index_performance AS p \
               ON p.date = TRY_CAST(? AS DATE) \
             WHERE c.date = (SELECT MAX(date) FROM index_composition \
                             WHERE date <= TRY_CAST(? AS DATE)) \
             ORDER BY 3 DESC, 2",
        )?;

        let params: [&dyn ToSql; 3] = [&date, &date, &date];
        let mut rows = statement.query(params.as_slice())?;

        let mut weights = Vec::new();
        while let Some(row) = rows.next()? {
            weights.push(CompositionWeightRow {
                date: row.get(0)?,
                ticker: row.get(1)?,
                weight_pct: row.get(2)?,
            });
        }
        Ok(weights)
    }
}

/// Commit on success, roll back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, StoreError>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the equindex home directory from the environment or default.
fn resolve_equindex_home() -> PathBuf {
    if let Some(path) = env::var_os("EQUINDEX_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".equindex");
    }

    PathBuf::from(".equindex")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_store(dir: &Path) -> PriceStore {
        PriceStore::open(StoreConfig {
            home: dir.to_path_buf(),
            db_path: dir.join("data").join("equindex.duckdb"),
            max_idle_connections: 2,
        })
        .expect("store open")
    }

    fn shares_row(ticker: &str, report_date: &str, shares: f64) -> SharesRow {
        SharesRow {
            ticker: ticker.to_string(),
            report_date: report_date.to_string(),
            shares_outstanding: shares,
        }
    }

    fn cap_row(date: &str, ticker: &str, shares: f64, close: f64) -> MarketCapRow {
        MarketCapRow {
            date: date.to_string(),
            ticker: ticker.to_string(),
            shares_outstanding: shares,
            closing_price: close,
            market_cap: shares * close,
        }
    }

    #[test]
    fn effective_shares_picks_most_recent_report_on_or_before_date() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());

        store
            .store_quarterly_shares(&[
                shares_row("AAPL", "2024-09-30", 15_200_000_000.0),
                shares_row("AAPL", "2024-12-31", 15_100_000_000.0),
                shares_row("MSFT", "2025-03-31", 7_400_000_000.0),
            ])
            .expect("store shares");

        let tickers = vec!["AAPL".to_string(), "MSFT".to_string()];
        let shares = store
            .effective_shares("2025-01-06", &tickers)
            .expect("effective shares");

        assert_eq!(shares.get("AAPL"), Some(&15_100_000_000.0));
        // MSFT's only report is after the as-of date.
        assert_eq!(shares.get("MSFT"), None);
    }

    #[test]
    fn top_by_market_cap_ranks_then_sorts_alphabetically() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());

        store
            .store_market_caps(&[
                cap_row("2025-01-06", "AAA", 100.0, 10.0),
                cap_row("2025-01-06", "BBB", 100.0, 50.0),
                cap_row("2025-01-06", "CCC", 100.0, 30.0),
            ])
            .expect("store caps");

        let top = store.top_by_market_cap("2025-01-06", 2).expect("top");
        assert_eq!(top, vec!["BBB".to_string(), "CCC".to_string()]);
    }

    #[test]
    fn composition_lookup_is_strictly_before_date() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());

        store
            .store_composition(&[CompositionRow {
                date: "2025-01-06".to_string(),
                ticker: "AAA".to_string(),
                ticker_qty: 2.5,
            }])
            .expect("store composition");

        assert!(store
            .latest_composition_before("2025-01-06")
            .expect("lookup")
            .is_empty());

        let next_day = store
            .latest_composition_before("2025-01-07")
            .expect("lookup");
        assert_eq!(next_day.len(), 1);
        assert_eq!(next_day[0].ticker, "AAA");
        assert_eq!(next_day[0].ticker_qty, 2.5);
    }

    #[test]
    fn index_points_replace_idempotently() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());

        store
            .store_index_point("2025-01-06", 10_000.0)
            .expect("store point");
        store
            .store_index_point("2025-01-06", 10_000.0)
            .expect("store point again");

        let points = store.index_performance().expect("performance");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].index_value, 10_000.0);
    }

    #[test]
    fn composition_weights_join_prices_and_index_value() {
        let temp = tempdir().expect("tempdir");
        let store = open_store(temp.path());

        store
            .store_market_caps(&[
                cap_row("2025-01-07", "AAA", 100.0, 20.0),
                cap_row("2025-01-07", "BBB", 100.0, 40.0),
            ])
            .expect("store caps");
        store
            .store_composition(&[
                CompositionRow {
                    date: "2025-01-06".to_string(),
                    ticker: "AAA".to_string(),
                    ticker_qty: 250.0,
                },
                CompositionRow {
                    date: "2025-01-06".to_string(),
                    ticker: "BBB".to_string(),
                    ticker_qty: 125.0,
                },
            ])
            .expect("store composition");
        store
            .store_index_point("2025-01-07", 10_000.0)
            .expect("store point");

        let weights = store.composition_weights("2025-01-07").expect("weights");
        assert_eq!(weights.len(), 2);
        // AAA: 250 * 20 = 5000 -> 50%; BBB: 125 * 40 = 5000 -> 50%.
        assert_eq!(weights[0].weight_pct, 50.0);
        assert_eq!(weights[1].weight_pct, 50.0);
    }

    #[test]
    fn reopening_the_store_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        {
            let store = open_store(temp.path());
            store
                .store_index_point("2025-01-06", 10_000.0)
                .expect("store point");
        }

        let store = open_store(temp.path());
        assert_eq!(store.index_performance().expect("performance").len(), 1);
    }
}
