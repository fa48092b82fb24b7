//! Shared fixtures for the cross-crate behavior tests.

use std::path::Path;

use equindex_core::{StaticMarketData, Symbol, TradeDate, Universe};
use equindex_store::{PriceStore, StoreConfig};

pub const DAY_ONE: &str = "2025-01-06";
pub const DAY_TWO: &str = "2025-01-07";
pub const REPORT_DATE: &str = "2024-12-31";

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("fixture symbol")
}

pub fn date(raw: &str) -> TradeDate {
    TradeDate::parse(raw).expect("fixture date")
}

pub fn open_store(dir: &Path) -> PriceStore {
    PriceStore::open(StoreConfig {
        home: dir.to_path_buf(),
        db_path: dir.join("data").join("equindex.duckdb"),
        max_idle_connections: 2,
    })
    .expect("store open")
}

pub fn three_ticker_universe() -> Universe {
    Universe::from_symbols(vec![symbol("AAA"), symbol("BBB"), symbol("CCC")])
        .expect("fixture universe")
}

/// Three constituents over two days with hand-checkable closes:
/// AAA 100 -> 110 (+10%), BBB 50 -> 45 (-10%), CCC 10 -> 12 (+20%).
/// Every ticker has 1000 shares outstanding since the last quarter of 2024.
pub fn known_market_data() -> StaticMarketData {
    let aaa = symbol("AAA");
    let bbb = symbol("BBB");
    let ccc = symbol("CCC");
    let report = date(REPORT_DATE);

    StaticMarketData::new()
        .with_shares(&aaa, report, 1000.0)
        .with_shares(&bbb, report, 1000.0)
        .with_shares(&ccc, report, 1000.0)
        .with_close(&aaa, date(DAY_ONE), 100.0)
        .with_close(&bbb, date(DAY_ONE), 50.0)
        .with_close(&ccc, date(DAY_ONE), 10.0)
        .with_close(&aaa, date(DAY_TWO), 110.0)
        .with_close(&bbb, date(DAY_TWO), 45.0)
        .with_close(&ccc, date(DAY_TWO), 12.0)
}
