// =============================================================================
// Stooq daily CSV client
// =============================================================================
//
// Stooq serves end-of-day history as plain CSV:
//
//   Date,Open,High,Low,Close,Volume
//   2024-01-02,492.44,492.95,475.95,481.68,41125400
//
// Rows are not guaranteed to be in chronological order and may contain
// placeholder values, so parsing filters and sorts.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, instrument};

use crate::types::Bar;

pub const DEFAULT_BASE_URL: &str = "https://stooq.com";

/// HTTP client for the Stooq CSV download endpoint.
#[derive(Clone)]
pub struct StooqClient {
    base_url: String,
    client: reqwest::Client,
}

impl StooqClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "StooqClient initialised");

        Ok(Self { base_url, client })
    }

    /// Download URL for a symbol's daily history.
    pub fn daily_url(&self, symbol: &str) -> String {
        format!("{}/q/d/l/?s={}&i=d", self.base_url, stooq_ticker(symbol))
    }

    /// GET the daily CSV for `symbol` and parse it into date-sorted bars.
    #[instrument(skip(self), name = "stooq::fetch_daily")]
    pub async fn fetch_daily(&self, symbol: &str) -> Result<Vec<Bar>> {
        let url = self.daily_url(symbol);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url} request failed"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("failed to fetch {} data: {}", symbol.to_uppercase(), status);
        }

        let body = resp
            .text()
            .await
            .context("failed to read CSV response body")?;

        let bars = parse_csv(&body)?;
        debug!(symbol, bars = bars.len(), "daily CSV parsed");
        Ok(bars)
    }
}

/// Map a dashboard symbol to Stooq's ticker notation.
///
/// Plain US equities get the `.us` suffix (`NVDA` => `nvda.us`), pairs such as
/// `BTC-USD` drop the dash (`btcusd`), and symbols that already carry a market
/// suffix are passed through lowercased.
pub fn stooq_ticker(symbol: &str) -> String {
    let lower = symbol.trim().to_lowercase();
    if lower.contains('.') {
        lower
    } else if lower.contains('-') {
        lower.replace('-', "")
    } else {
        format!("{lower}.us")
    }
}

/// Parse Stooq CSV text into bars sorted by ascending date.
///
/// The header line must start with `date` (case-insensitive). Rows with an
/// unparsable date, or a non-finite close or volume, are skipped. Missing
/// open/high/low values fall back to the close.
pub fn parse_csv(text: &str) -> Result<Vec<Bar>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim().as_bytes());

    let header_ok = reader
        .headers()
        .ok()
        .and_then(|h| h.get(0))
        .is_some_and(|first| first.to_lowercase().starts_with("date"));
    if !header_ok {
        anyhow::bail!("unexpected CSV format");
    }

    let mut out = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else {
            continue;
        };

        let Some(date) = record
            .get(0)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        else {
            continue;
        };

        let num = |i: usize| {
            record
                .get(i)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        let (Some(close), Some(volume)) = (num(4), num(5)) else {
            continue;
        };

        out.push(Bar {
            date,
            open: num(1).unwrap_or(close),
            high: num(2).unwrap_or(close),
            low: num(3).unwrap_or(close),
            close,
            volume,
        });
    }

    out.sort_by_key(|b| b.date);
    Ok(out)
}
