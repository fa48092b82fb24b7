use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use equindex_store::{CompositionWeightRow, IndexPointRow};
use serde::Serialize;

use crate::{AppState, WebError};

const DASHBOARD_PAGE: &str = include_str!("assets/dashboard.html");

/// One row of the summary panel: the stored value plus derived returns and
/// composition-change markers. Derived on read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPoint {
    pub date: String,
    pub index_value: f64,
    pub daily_return_pct: f64,
    pub cumulative_return_pct: f64,
    pub composition_changed: bool,
    pub composition_changes: usize,
}

/// # GET /
pub async fn index_page() -> Html<&'static str> {
    Html(DASHBOARD_PAGE)
}

/// # GET /api/health
pub async fn health() -> &'static str {
    "OK"
}

/// # GET /api/performance
pub async fn performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<IndexPointRow>>, WebError> {
    Ok(Json(state.store.index_performance()?))
}

/// # GET /api/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SummaryPoint>>, WebError> {
    let points = state.store.index_performance()?;
    // The first composition date is the index launch, not a change.
    let change_dates: Vec<String> = state
        .store
        .composition_dates()?
        .into_iter()
        .skip(1)
        .collect();

    Ok(Json(build_summary(&points, &change_dates)))
}

/// # GET /api/composition/dates
pub async fn composition_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, WebError> {
    Ok(Json(state.store.composition_dates()?))
}

/// # GET /api/composition/:date
pub async fn composition_for_date(
    Path(date): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CompositionWeightRow>>, WebError> {
    Ok(Json(state.store.composition_weights(&date)?))
}

fn build_summary(points: &[IndexPointRow], change_dates: &[String]) -> Vec<SummaryPoint> {
    let base = points.first().map(|point| point.index_value);
    let mut previous: Option<f64> = None;
    let mut changes = 0usize;

    points
        .iter()
        .map(|point| {
            let daily = match previous {
                Some(prev) if prev != 0.0 => (point.index_value / prev - 1.0) * 100.0,
                _ => 0.0,
            };
            previous = Some(point.index_value);

            let cumulative = match base {
                Some(base) if base != 0.0 => (point.index_value / base - 1.0) * 100.0,
                _ => 0.0,
            };

            let changed = change_dates.contains(&point.date);
            if changed {
                changes += 1;
            }

            SummaryPoint {
                date: point.date.clone(),
                index_value: point.index_value,
                daily_return_pct: round3(daily),
                cumulative_return_pct: round3(cumulative),
                composition_changed: changed,
                composition_changes: changes,
            }
        })
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, value: f64) -> IndexPointRow {
        IndexPointRow {
            date: date.to_string(),
            index_value: value,
        }
    }

    #[test]
    fn summary_derives_daily_and_cumulative_returns() {
        let points = vec![
            point("2025-01-06", 10_000.0),
            point("2025-01-07", 11_000.0),
            point("2025-01-08", 9_900.0),
        ];
        let summary = build_summary(&points, &["2025-01-08".to_string()]);

        assert_eq!(summary[0].daily_return_pct, 0.0);
        assert_eq!(summary[1].daily_return_pct, 10.0);
        assert_eq!(summary[2].daily_return_pct, -10.0);

        assert_eq!(summary[2].cumulative_return_pct, -1.0);

        assert!(!summary[1].composition_changed);
        assert!(summary[2].composition_changed);
        assert_eq!(summary[2].composition_changes, 1);
    }

    #[test]
    fn summary_of_empty_series_is_empty() {
        assert!(build_summary(&[], &[]).is_empty());
    }
}
