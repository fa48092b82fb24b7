//! # Equindex Core
//!
//! Domain types and market-data plumbing for the equindex toolkit.
//!
//! ## Overview
//!
//! This crate provides the foundational pieces shared by the equindex
//! pipeline:
//!
//! - **Canonical domain types** for tickers, trading dates, closing prices,
//!   and shares-outstanding reports, all validated at construction
//! - **The [`MarketDataSource`] trait** that the fetch step is written
//!   against, with a Yahoo Finance adapter and an in-memory test source
//! - **HTTP transport abstraction** so adapters can run against a real
//!   client or a no-op transport in tests
//! - **Retry and throttling support** for polite upstream access
//! - **Universe loading** for the configurable constituent candidate list
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo Finance) |
//! | [`domain`] | Domain models (Symbol, TradeDate, DailyCloses, ...) |
//! | [`http_client`] | HTTP client abstraction |
//! | [`market_data`] | `MarketDataSource` trait and request/response types |
//! | [`retry`] | Backoff and retry policy |
//! | [`throttle`] | Upstream rate limiting |
//! | [`universe`] | Constituent universe file loading |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use equindex_core::{MarketDataSource, Symbol, TradeDate, YahooAdapter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = YahooAdapter::mock();
//!     let symbols = vec![Symbol::parse("AAPL")?, Symbol::parse("MSFT")?];
//!     let date = TradeDate::parse("2025-01-06")?;
//!
//!     let closes = adapter.daily_closes(&symbols, date).await?;
//!     for symbol in &symbols {
//!         if let Some(close) = closes.close_for(symbol) {
//!             println!("{symbol}: {close:.2}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Construction of domain values returns [`ValidationError`]; adapter calls
//! return [`SourceError`] with a kind/retryable classification that the
//! pipeline uses to decide between skipping a ticker and aborting a run.

pub mod adapters;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod market_data;
pub mod retry;
pub mod throttle;
pub mod universe;

pub use adapters::YahooAdapter;
pub use domain::{DailyCloses, SharesReport, Symbol, TradeDate};
pub use error::ValidationError;
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use market_data::{MarketDataSource, SourceError, SourceErrorKind, StaticMarketData};
pub use retry::{Backoff, RetryConfig};
pub use throttle::RequestThrottle;
pub use universe::{Universe, UniverseError};
