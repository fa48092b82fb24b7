use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Deserialize;
use time::{Date, Month, OffsetDateTime};

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};
use crate::market_data::{MarketDataSource, SourceError};
use crate::retry::RetryConfig;
use crate::throttle::RequestThrottle;
use crate::{DailyCloses, HttpError, SharesReport, Symbol, TradeDate};

const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];

// ============================================================================
// Crumb authentication
// ============================================================================

/// Cookie/crumb handshake for Yahoo's unofficial API.
///
/// The chart endpoint is open, but quoteSummary requires a session cookie
/// plus a crumb token tied to it. The cookie lives in the transport's jar;
/// only the crumb is cached here.
struct YahooAuth {
    crumb: Mutex<Option<String>>,
    last_refresh: Mutex<Option<Instant>>,
    ttl_secs: u64,
}

impl Default for YahooAuth {
    fn default() -> Self {
        Self {
            crumb: Mutex::new(None),
            last_refresh: Mutex::new(None),
            ttl_secs: 3600,
        }
    }
}

impl YahooAuth {
    fn cached_crumb(&self) -> Option<String> {
        let last = *self.last_refresh.lock().expect("auth mutex poisoned");
        let fresh = last.is_some_and(|instant| instant.elapsed().as_secs() < self.ttl_secs);
        if !fresh {
            return None;
        }
        self.crumb.lock().expect("auth mutex poisoned").clone()
    }

    fn invalidate(&self) {
        *self.crumb.lock().expect("auth mutex poisoned") = None;
        *self.last_refresh.lock().expect("auth mutex poisoned") = None;
    }

    async fn crumb(&self, client: &Arc<dyn HttpClient>) -> Result<String, SourceError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }

        // Prime the session cookie jar first; the crumb is tied to it.
        let cookie_request = HttpRequest::get(COOKIE_URL).with_header("referer", REFERER);
        let _ = client.execute(cookie_request).await.map_err(|error| {
            SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", error.message()))
        })?;

        for url in CRUMB_URLS {
            let request = HttpRequest::get(url).with_header("referer", REFERER);
            let Ok(response) = client.execute(request).await else {
                continue;
            };
            if !response.is_success() {
                continue;
            }

            let body = response.body.trim();
            if body.to_lowercase().contains("too many requests") {
                return Err(SourceError::rate_limited(
                    "yahoo rate limited while fetching crumb",
                ));
            }
            if body.is_empty()
                || body.len() >= 100
                || body.contains(' ')
                || body.contains("<html")
                || body.contains("<!DOCTYPE")
            {
                continue;
            }

            *self.crumb.lock().expect("auth mutex poisoned") = Some(body.to_string());
            *self.last_refresh.lock().expect("auth mutex poisoned") = Some(Instant::now());
            return Ok(body.to_string());
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }
}

// ============================================================================
// Yahoo adapter
// ============================================================================

/// Yahoo Finance adapter with real and deterministic mock modes.
///
/// Real mode hits the chart API for daily closes and quoteSummary for
/// quarterly shares outstanding. Mock mode synthesizes stable values from
/// the symbol and date so offline runs and tests are reproducible.
pub struct YahooAdapter {
    http_client: Arc<dyn HttpClient>,
    throttle: Arc<RequestThrottle>,
    retry: RetryConfig,
    auth: YahooAuth,
    use_real_api: bool,
}

impl YahooAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = http_client.is_real();
        Self {
            http_client,
            throttle: Arc::new(RequestThrottle::default()),
            retry: RetryConfig::default(),
            auth: YahooAuth::default(),
            use_real_api,
        }
    }

    /// Adapter over the real network transport.
    pub fn live() -> Result<Self, HttpError> {
        Ok(Self::new(Arc::new(ReqwestHttpClient::new()?)))
    }

    /// Deterministic offline adapter.
    pub fn mock() -> Self {
        Self::new(Arc::new(NoopHttpClient))
    }

    pub fn with_throttle(mut self, throttle: Arc<RequestThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Yahoo spells class shares with a dash (BRK.B -> BRK-B).
    fn api_symbol(symbol: &Symbol) -> String {
        symbol.as_str().replace('.', "-")
    }

    async fn get_with_retry(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let mut attempt = 0u32;
        loop {
            self.throttle.acquire().await;
            let request = HttpRequest::get(url).with_header("referer", REFERER);

            let outcome = self.http_client.execute(request).await;
            match outcome {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => {
                    let out_of_attempts = attempt >= self.retry.max_retries;
                    if !self.retry.should_retry_status(response.status) || out_of_attempts {
                        if response.status == 429 {
                            return Err(SourceError::rate_limited(
                                "yahoo rate limit exhausted retries",
                            ));
                        }
                        return Err(SourceError::unavailable(format!(
                            "yahoo returned status {}",
                            response.status
                        )));
                    }
                    if response.status == 401 {
                        self.auth.invalidate();
                    }
                }
                Err(error) => {
                    if !error.retryable() || attempt >= self.retry.max_retries {
                        return Err(SourceError::unavailable(format!(
                            "yahoo transport error: {}",
                            error.message()
                        )));
                    }
                }
            }

            tokio::time::sleep(self.retry.backoff.delay(attempt)).await;
            attempt += 1;
        }
    }

    async fn fetch_real_closes(
        &self,
        symbols: &[Symbol],
        date: TradeDate,
    ) -> Result<DailyCloses, SourceError> {
        let period1 = date.unix_midnight();
        let period2 = date.next().unix_midnight();

        let mut closes = DailyCloses::new(date);
        for symbol in symbols {
            let url = format!(
                "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={period1}&period2={period2}&interval=1d",
                urlencoding::encode(&Self::api_symbol(symbol)),
            );

            let response = match self.get_with_retry(&url).await {
                Ok(response) => response,
                // A single dead ticker must not sink the whole day.
                Err(error) => {
                    tracing::warn!(symbol = %symbol, date = %date, error = %error,
                        "skipping ticker, chart fetch failed");
                    continue;
                }
            };

            if let Some(close) = parse_chart_close(&response.body, date)? {
                closes
                    .insert(symbol.clone(), close)
                    .map_err(|error| SourceError::decode(error.to_string()))?;
            }
        }
        Ok(closes)
    }

    async fn fetch_real_shares(&self, symbol: &Symbol) -> Result<Vec<SharesReport>, SourceError> {
        let crumb = self.auth.crumb(&self.http_client).await?;
        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{}?modules=balanceSheetHistoryQuarterly&crumb={}",
            urlencoding::encode(&Self::api_symbol(symbol)),
            urlencoding::encode(&crumb),
        );

        let response = self.get_with_retry(&url).await?;
        parse_quarterly_shares(&response.body, symbol)
    }

    // ------------------------------------------------------------------
    // Mock mode
    // ------------------------------------------------------------------

    fn mock_closes(symbols: &[Symbol], date: TradeDate) -> DailyCloses {
        let mut closes = DailyCloses::new(date);
        if date.is_weekend() {
            return closes;
        }
        for symbol in symbols {
            let close = synthetic_close(symbol, date);
            closes
                .insert(symbol.clone(), close)
                .expect("synthetic close is always positive");
        }
        closes
    }

    fn mock_shares(symbol: &Symbol) -> Vec<SharesReport> {
        let base = 200_000_000.0 + (symbol_seed(symbol) % 1_800_000_000) as f64;
        let mut reports = Vec::new();
        for year in 2020..=2025 {
            for (month, day) in [
                (Month::March, 31),
                (Month::June, 30),
                (Month::September, 30),
                (Month::December, 31),
            ] {
                let report_date = Date::from_calendar_date(year, month, day)
                    .expect("quarter end is a valid date");
                let report = SharesReport::new(
                    symbol.clone(),
                    TradeDate::from_date(report_date),
                    base,
                )
                .expect("synthetic shares are always positive");
                reports.push(report);
            }
        }
        reports
    }
}

impl MarketDataSource for YahooAdapter {
    fn daily_closes<'a>(
        &'a self,
        symbols: &'a [Symbol],
        date: TradeDate,
    ) -> Pin<Box<dyn Future<Output = Result<DailyCloses, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if symbols.is_empty() {
                return Err(SourceError::invalid_request(
                    "daily closes request requires at least one symbol",
                ));
            }
            if self.use_real_api {
                self.fetch_real_closes(symbols, date).await
            } else {
                Ok(Self::mock_closes(symbols, date))
            }
        })
    }

    fn quarterly_shares<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SharesReport>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_shares(symbol).await
            } else {
                Ok(Self::mock_shares(symbol))
            }
        })
    }
}

// ============================================================================
// Response parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartPayload,
}

#[derive(Debug, Deserialize)]
struct ChartPayload {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

/// Extract the close for `date` from a chart API payload, if present.
fn parse_chart_close(body: &str, date: TradeDate) -> Result<Option<f64>, SourceError> {
    let response: ChartResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::decode(format!("chart response: {error}")))?;

    if let Some(error) = response.chart.error {
        if !error.is_null() {
            return Err(SourceError::unavailable(format!("yahoo chart error: {error}")));
        }
    }

    let Some(result) = response.chart.result.and_then(|mut r| r.pop()) else {
        return Ok(None);
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(None);
    };
    let Some(quote) = result.indicators.quote.first() else {
        return Ok(None);
    };
    let Some(closes) = &quote.close else {
        return Ok(None);
    };

    for (index, ts) in timestamps.iter().enumerate() {
        let Ok(stamp) = OffsetDateTime::from_unix_timestamp(*ts) else {
            continue;
        };
        if stamp.date() != date.as_date() {
            continue;
        }
        if let Some(Some(close)) = closes.get(index) {
            if close.is_finite() && *close > 0.0 {
                return Ok(Some(*close));
            }
        }
    }
    Ok(None)
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryPayload,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryPayload {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "balanceSheetHistoryQuarterly")]
    balance_sheet_history_quarterly: Option<BalanceSheetHistory>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheetHistory {
    #[serde(rename = "balanceSheetStatements")]
    balance_sheet_statements: Vec<BalanceSheetStatement>,
}

#[derive(Debug, Deserialize)]
struct BalanceSheetStatement {
    #[serde(rename = "endDate")]
    end_date: Option<RawNumber<i64>>,
    #[serde(rename = "ordinarySharesNumber")]
    ordinary_shares_number: Option<RawNumber<f64>>,
}

#[derive(Debug, Deserialize)]
struct RawNumber<T> {
    raw: Option<T>,
}

fn parse_quarterly_shares(body: &str, symbol: &Symbol) -> Result<Vec<SharesReport>, SourceError> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)
        .map_err(|error| SourceError::decode(format!("quoteSummary response: {error}")))?;

    if let Some(error) = response.quote_summary.error {
        if !error.is_null() {
            return Err(SourceError::unavailable(format!(
                "yahoo quoteSummary error: {error}"
            )));
        }
    }

    let statements = response
        .quote_summary
        .result
        .and_then(|mut r| r.pop())
        .and_then(|result| result.balance_sheet_history_quarterly)
        .map(|history| history.balance_sheet_statements)
        .unwrap_or_default();

    let mut reports = Vec::new();
    for statement in statements {
        let Some(end) = statement.end_date.and_then(|v| v.raw) else {
            continue;
        };
        let Some(shares) = statement.ordinary_shares_number.and_then(|v| v.raw) else {
            continue;
        };
        let Ok(stamp) = OffsetDateTime::from_unix_timestamp(end) else {
            continue;
        };
        match SharesReport::new(symbol.clone(), TradeDate::from_date(stamp.date()), shares) {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::warn!(symbol = %symbol, error = %error,
                    "discarding malformed shares statement");
            }
        }
    }
    Ok(reports)
}

// ============================================================================
// Synthetic data
// ============================================================================

/// FNV-1a over the symbol bytes; stable across runs.
fn symbol_seed(symbol: &Symbol) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in symbol.as_str().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn synthetic_close(symbol: &Symbol, date: TradeDate) -> f64 {
    let mixed = symbol_seed(symbol)
        .wrapping_add(date.as_date().to_julian_day() as u64)
        .wrapping_mul(0x9e37_79b9_7f4a_7c15);
    20.0 + (mixed % 48_000) as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("symbol")
    }

    #[tokio::test]
    async fn mock_closes_are_deterministic() {
        let adapter = YahooAdapter::mock();
        let symbols = vec![symbol("AAPL"), symbol("MSFT")];
        let date = TradeDate::parse("2025-01-06").unwrap();

        let first = adapter.daily_closes(&symbols, date).await.expect("closes");
        let second = adapter.daily_closes(&symbols, date).await.expect("closes");
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn mock_returns_no_closes_on_weekends() {
        let adapter = YahooAdapter::mock();
        let symbols = vec![symbol("AAPL")];
        let saturday = TradeDate::parse("2025-01-04").unwrap();

        let closes = adapter.daily_closes(&symbols, saturday).await.expect("closes");
        assert!(closes.is_empty());
    }

    #[tokio::test]
    async fn mock_shares_cover_recent_quarters() {
        let adapter = YahooAdapter::mock();
        let reports = adapter
            .quarterly_shares(&symbol("AAPL"))
            .await
            .expect("shares");
        assert_eq!(reports.len(), 24);
        assert!(reports.iter().all(|r| r.shares_outstanding > 0.0));
    }

    #[test]
    fn parses_chart_close_for_requested_date() {
        // 1736164800 = 2025-01-06T12:00:00Z
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1736164800],
                    "indicators": {"quote": [{"close": [242.21]}]}
                }],
                "error": null
            }
        }"#;
        let date = TradeDate::parse("2025-01-06").unwrap();
        let close = parse_chart_close(body, date).expect("parse");
        assert_eq!(close, Some(242.21));
    }

    #[test]
    fn chart_without_requested_date_yields_none() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1736164800],
                    "indicators": {"quote": [{"close": [242.21]}]}
                }],
                "error": null
            }
        }"#;
        let date = TradeDate::parse("2025-01-07").unwrap();
        let close = parse_chart_close(body, date).expect("parse");
        assert_eq!(close, None);
    }

    #[test]
    fn parses_quarterly_shares_statements() {
        // 1735603200 = 2024-12-31T00:00:00Z
        let body = r#"{
            "quoteSummary": {
                "result": [{
                    "balanceSheetHistoryQuarterly": {
                        "balanceSheetStatements": [
                            {
                                "endDate": {"raw": 1735603200},
                                "ordinarySharesNumber": {"raw": 15100000000.0}
                            },
                            {
                                "endDate": {"raw": 1727654400},
                                "ordinarySharesNumber": null
                            }
                        ]
                    }
                }],
                "error": null
            }
        }"#;
        let reports = parse_quarterly_shares(body, &symbol("AAPL")).expect("parse");
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].report_date.to_string(), "2024-12-31");
        assert_eq!(reports[0].shares_outstanding, 15_100_000_000.0);
    }

    #[test]
    fn class_shares_use_dash_spelling() {
        assert_eq!(YahooAdapter::api_symbol(&symbol("BRK.B")), "BRK-B");
    }
}
