use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Symbol, TradeDate, ValidationError};

/// One day's closing prices, keyed by symbol.
///
/// Absence of a symbol means the provider had no close for it that day; a
/// `DailyCloses` with no entries at all usually means a non-trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyCloses {
    date: TradeDate,
    closes: BTreeMap<Symbol, f64>,
}

impl DailyCloses {
    pub fn new(date: TradeDate) -> Self {
        Self {
            date,
            closes: BTreeMap::new(),
        }
    }

    /// Record a close for `symbol`. Rejects non-finite and non-positive prices.
    pub fn insert(&mut self, symbol: Symbol, close: f64) -> Result<(), ValidationError> {
        if !close.is_finite() || close <= 0.0 {
            return Err(ValidationError::InvalidPrice {
                field: "close",
                value: close,
            });
        }
        self.closes.insert(symbol, close);
        Ok(())
    }

    pub fn date(&self) -> TradeDate {
        self.date
    }

    pub fn close_for(&self, symbol: &Symbol) -> Option<f64> {
        self.closes.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, f64)> {
        self.closes.iter().map(|(symbol, close)| (symbol, *close))
    }
}

/// Quarterly shares-outstanding report for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharesReport {
    pub symbol: Symbol,
    pub report_date: TradeDate,
    pub shares_outstanding: f64,
}

impl SharesReport {
    pub fn new(
        symbol: Symbol,
        report_date: TradeDate,
        shares_outstanding: f64,
    ) -> Result<Self, ValidationError> {
        if !shares_outstanding.is_finite() || shares_outstanding <= 0.0 {
            return Err(ValidationError::InvalidShares {
                value: shares_outstanding,
            });
        }
        Ok(Self {
            symbol,
            report_date,
            shares_outstanding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> TradeDate {
        TradeDate::parse("2025-01-06").expect("date")
    }

    #[test]
    fn rejects_non_positive_close() {
        let mut closes = DailyCloses::new(date());
        let err = closes
            .insert(Symbol::parse("AAPL").unwrap(), 0.0)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
    }

    #[test]
    fn rejects_nan_shares() {
        let err = SharesReport::new(Symbol::parse("AAPL").unwrap(), date(), f64::NAN)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidShares { .. }));
    }
}
