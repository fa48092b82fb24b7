//! The market-data source contract.
//!
//! The index pipeline is written against [`MarketDataSource`]; the Yahoo
//! adapter implements it for production and [`StaticMarketData`] implements
//! it over in-memory fixtures for tests.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{DailyCloses, SharesReport, Symbol, TradeDate};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    Decode,
    Internal,
}

/// Structured error returned by market-data sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Decode,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Decode => "source.decode",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source contract for the two datasets the pipeline needs.
///
/// Implementations must be `Send + Sync`; the fetch loop shares one source
/// across chunked requests.
pub trait MarketDataSource: Send + Sync {
    /// Closing prices for `symbols` on `date`.
    ///
    /// Symbols without a close that day are simply absent from the result;
    /// an empty result means the market was closed. Errors are reserved for
    /// transport or provider failures.
    fn daily_closes<'a>(
        &'a self,
        symbols: &'a [Symbol],
        date: TradeDate,
    ) -> Pin<Box<dyn Future<Output = Result<DailyCloses, SourceError>> + Send + 'a>>;

    /// Historical quarterly shares-outstanding reports for one ticker.
    fn quarterly_shares<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SharesReport>, SourceError>> + Send + 'a>>;
}

/// In-memory source over fixed fixtures.
///
/// Every value returned is exactly what the test inserted, which keeps
/// hand-computed expectations checkable to the last digit.
#[derive(Debug, Default, Clone)]
pub struct StaticMarketData {
    closes: BTreeMap<(TradeDate, Symbol), f64>,
    shares: BTreeMap<Symbol, Vec<(TradeDate, f64)>>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_close(mut self, symbol: &Symbol, date: TradeDate, close: f64) -> Self {
        self.closes.insert((date, symbol.clone()), close);
        self
    }

    pub fn with_shares(mut self, symbol: &Symbol, report_date: TradeDate, shares: f64) -> Self {
        self.shares
            .entry(symbol.clone())
            .or_default()
            .push((report_date, shares));
        self
    }
}

impl MarketDataSource for StaticMarketData {
    fn daily_closes<'a>(
        &'a self,
        symbols: &'a [Symbol],
        date: TradeDate,
    ) -> Pin<Box<dyn Future<Output = Result<DailyCloses, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let mut closes = DailyCloses::new(date);
            for symbol in symbols {
                if let Some(close) = self.closes.get(&(date, symbol.clone())) {
                    closes
                        .insert(symbol.clone(), *close)
                        .map_err(|error| SourceError::internal(error.to_string()))?;
                }
            }
            Ok(closes)
        })
    }

    fn quarterly_shares<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SharesReport>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let reports = self
                .shares
                .get(symbol)
                .map(|entries| {
                    entries
                        .iter()
                        .map(|(report_date, shares)| {
                            SharesReport::new(symbol.clone(), *report_date, *shares)
                                .map_err(|error| SourceError::internal(error.to_string()))
                        })
                        .collect::<Result<Vec<_>, _>>()
                })
                .transpose()?
                .unwrap_or_default();
            Ok(reports)
        })
    }
}
