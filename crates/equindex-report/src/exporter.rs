use std::fs;
use std::path::PathBuf;

use equindex_store::PriceStore;

use crate::{excel, pdf, Cell, Frame, ReportError, ReportFormat};

/// Reads stored index data and writes report files.
///
/// Output lands under a `stats/` directory (beside the store by default);
/// the directory is created on first use.
pub struct StatsExporter {
    store: PriceStore,
    output_dir: PathBuf,
}

impl StatsExporter {
    pub fn new(store: PriceStore) -> Self {
        let output_dir = store.home().join("stats");
        Self { store, output_dir }
    }

    pub fn with_output_dir(store: PriceStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            output_dir: output_dir.into(),
        }
    }

    /// Export the full index time series.
    pub fn dump_performance(
        &self,
        format: ReportFormat,
        name: &str,
    ) -> Result<PathBuf, ReportError> {
        let mut frame = Frame::new("Index Performance", vec!["date", "index_value"]);
        for point in self.store.index_performance()? {
            frame.push_row(vec![Cell::Text(point.date), Cell::Number(point.index_value)]);
        }
        self.write(frame, format, name)
    }

    /// Export the constituent weights in effect on `date`.
    pub fn dump_composition(
        &self,
        date: &str,
        format: ReportFormat,
        name: &str,
    ) -> Result<PathBuf, ReportError> {
        let mut frame = Frame::new(
            format!("Index Comp. for {date}"),
            vec!["date", "ticker", "weight_pct"],
        );
        for weight in self.store.composition_weights(date)? {
            frame.push_row(vec![
                Cell::Text(weight.date),
                Cell::Text(weight.ticker),
                Cell::Number(weight.weight_pct),
            ]);
        }
        self.write(frame, format, name)
    }

    fn write(
        &self,
        frame: Frame,
        format: ReportFormat,
        name: &str,
    ) -> Result<PathBuf, ReportError> {
        if frame.is_empty() {
            return Err(ReportError::Empty {
                what: frame.title.clone(),
            });
        }

        fs::create_dir_all(&self.output_dir)?;
        let path = self
            .output_dir
            .join(format!("{name}.{}", format.extension()));

        match format {
            ReportFormat::Excel => excel::write_excel(&frame, &path)?,
            ReportFormat::Pdf => pdf::write_pdf(&frame, &path)?,
        }

        tracing::info!(report = %frame.title, path = %path.display(), "report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use equindex_store::{CompositionRow, MarketCapRow, StoreConfig};
    use tempfile::tempdir;

    fn seeded_store(dir: &Path) -> PriceStore {
        let store = PriceStore::open(StoreConfig {
            home: dir.to_path_buf(),
            db_path: dir.join("equindex.duckdb"),
            max_idle_connections: 2,
        })
        .expect("store open");

        store
            .store_market_caps(&[
                MarketCapRow {
                    date: "2025-01-07".to_string(),
                    ticker: "AAA".to_string(),
                    shares_outstanding: 1000.0,
                    closing_price: 20.0,
                    market_cap: 20_000.0,
                },
                MarketCapRow {
                    date: "2025-01-07".to_string(),
                    ticker: "BBB".to_string(),
                    shares_outstanding: 1000.0,
                    closing_price: 40.0,
                    market_cap: 40_000.0,
                },
            ])
            .expect("caps");
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
            .expect("composition");
        store
            .store_index_point("2025-01-07", 10_000.0)
            .expect("point");
        store
    }

    #[test]
    fn performance_export_writes_an_excel_file() {
        let temp = tempdir().expect("tempdir");
        let exporter = StatsExporter::new(seeded_store(temp.path()));

        let path = exporter
            .dump_performance(ReportFormat::Excel, "performance")
            .expect("dump");

        assert!(path.ends_with("stats/performance.xlsx"));
        let size = fs::metadata(&path).expect("metadata").len();
        assert!(size > 0, "exported file must not be empty");
    }

    #[test]
    fn composition_export_writes_a_pdf_file() {
        let temp = tempdir().expect("tempdir");
        let exporter = StatsExporter::new(seeded_store(temp.path()));

        let path = exporter
            .dump_composition("2025-01-07", ReportFormat::Pdf, "composition")
            .expect("dump");

        assert!(path.ends_with("stats/composition.pdf"));
        assert!(fs::metadata(&path).expect("metadata").len() > 0);
    }

    #[test]
    fn empty_series_is_an_error_and_writes_nothing() {
        let temp = tempdir().expect("tempdir");
        let store = PriceStore::open(StoreConfig {
            home: temp.path().to_path_buf(),
            db_path: temp.path().join("equindex.duckdb"),
            max_idle_connections: 2,
        })
        .expect("store open");
        let exporter = StatsExporter::new(store);

        let error = exporter
            .dump_performance(ReportFormat::Excel, "performance")
            .expect_err("must fail");
        assert!(matches!(error, ReportError::Empty { .. }));
        assert!(!temp.path().join("stats").join("performance.xlsx").exists());
    }
}
