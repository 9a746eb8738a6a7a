//! Daily price downloads from the Yahoo Finance chart API
//!
//! This module handles:
//! - Requesting one daily chart per ticker for a date range
//! - Parsing the chart payload into per-field price columns
//! - Joining several tickers on date into a field × ticker table

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::frame::{FieldFrame, FieldSeries, Frame, RawPriceTable, Series};
use crate::normalize::{ADJ_CLOSE, CLOSE};

const OPEN: &str = "Open";
const HIGH: &str = "High";
const LOW: &str = "Low";
const VOLUME: &str = "Volume";

/// One download: which tickers, which dates, adjusted or not
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    /// Exclusive, as with the vendor
    pub end: NaiveDate,
    pub auto_adjust: bool,
}

impl PriceRequest {
    pub fn new(tickers: Vec<String>, start: NaiveDate, end: NaiveDate, auto_adjust: bool) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange { start, end });
        }
        Ok(Self {
            tickers,
            start,
            end,
            auto_adjust,
        })
    }
}

/// Source of raw daily price tables
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Download the requested range. Unresolvable tickers are dropped; if none
    /// resolve, the returned table is empty rather than an error.
    async fn download(&self, request: &PriceRequest) -> Result<RawPriceTable>;
}

// ---- Chart payload ----

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Daily history of a single ticker, fields in display order
#[derive(Debug, Clone, PartialEq)]
pub struct TickerHistory {
    pub dates: Vec<NaiveDate>,
    pub fields: Vec<(String, Vec<Option<f64>>)>,
}

impl TickerHistory {
    fn into_frame(self) -> crate::frame::PriceTable {
        Frame::new(
            self.dates,
            self.fields
                .into_iter()
                .map(|(name, values)| Series::new(name, values))
                .collect(),
        )
    }
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

/// Parse a chart payload. `Ok(None)` means the vendor had no rows for it.
pub fn parse_chart(body: &str, auto_adjust: bool) -> Result<Option<TickerHistory>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        debug!("chart error {}: {}", err.code, err.description);
        return Ok(None);
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(None);
    };
    if result.timestamp.is_empty() {
        return Ok(None);
    }

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose);

    // Keyed by trading day so a duplicated final bar replaces the earlier one
    let mut rows: BTreeMap<NaiveDate, [Option<f64>; 6]> = BTreeMap::new();
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(moment) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        let close = at(&quote.close, i);
        let adj = adjclose.as_deref().and_then(|a| at(a, i));
        rows.insert(
            moment.date_naive(),
            [
                at(&quote.open, i),
                at(&quote.high, i),
                at(&quote.low, i),
                close,
                adj,
                at(&quote.volume, i),
            ],
        );
    }

    let dates: Vec<NaiveDate> = rows.keys().copied().collect();
    let column = |idx: usize| -> Vec<Option<f64>> { rows.values().map(|r| r[idx]).collect() };

    let fields = if auto_adjust {
        // Close becomes the adjusted close; O/H/L scale by the same factor
        let ratio: Vec<Option<f64>> = rows
            .values()
            .map(|r| match (r[3], r[4]) {
                (Some(c), Some(a)) if c != 0.0 => Some(a / c),
                (Some(_), None) => Some(1.0),
                _ => None,
            })
            .collect();
        let scale = |idx: usize| -> Vec<Option<f64>> {
            rows.values()
                .zip(&ratio)
                .map(|(r, k)| Some(r[idx]? * (*k)?))
                .collect()
        };
        vec![
            (OPEN.to_string(), scale(0)),
            (HIGH.to_string(), scale(1)),
            (LOW.to_string(), scale(2)),
            (CLOSE.to_string(), scale(3)),
            (VOLUME.to_string(), column(5)),
        ]
    } else {
        vec![
            (OPEN.to_string(), column(0)),
            (HIGH.to_string(), column(1)),
            (LOW.to_string(), column(2)),
            (CLOSE.to_string(), column(3)),
            (ADJ_CLOSE.to_string(), column(4)),
            (VOLUME.to_string(), column(5)),
        ]
    };

    Ok(Some(TickerHistory { dates, fields }))
}

/// Outer-join several histories on date into a field × ticker table
pub fn join_histories(histories: Vec<(String, TickerHistory)>) -> FieldFrame {
    let dates: Vec<NaiveDate> = histories
        .iter()
        .flat_map(|(_, h)| h.dates.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let field_names: Vec<String> = histories
        .first()
        .map(|(_, h)| h.fields.iter().map(|(f, _)| f.clone()).collect())
        .unwrap_or_default();

    let mut columns = Vec::with_capacity(field_names.len() * histories.len());
    for field in &field_names {
        for (ticker, history) in &histories {
            let Some((_, values)) = history.fields.iter().find(|(f, _)| f == field) else {
                continue;
            };
            let by_date: BTreeMap<NaiveDate, Option<f64>> =
                history.dates.iter().copied().zip(values.iter().copied()).collect();
            columns.push(FieldSeries {
                field: field.clone(),
                ticker: ticker.clone(),
                values: dates.iter().map(|d| by_date.get(d).copied().flatten()).collect(),
            });
        }
    }

    FieldFrame { dates, columns }
}

/// Shape a set of downloaded histories the way the vendor library does:
/// one requested ticker gives a flat table, several give a two-level one.
pub fn assemble(request: &PriceRequest, histories: Vec<(String, TickerHistory)>) -> RawPriceTable {
    if request.tickers.len() == 1 {
        return match histories.into_iter().next() {
            Some((symbol, history)) => RawPriceTable::Flat {
                symbol: Some(symbol),
                frame: history.into_frame(),
            },
            None => RawPriceTable::Flat {
                symbol: None,
                frame: Frame::default(),
            },
        };
    }
    RawPriceTable::FieldByTicker(join_histories(histories))
}

/// Yahoo Finance chart endpoint
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout)
            .user_agent(concat!("stock_ai_dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.price_api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_one(&self, ticker: &str, request: &PriceRequest) -> Result<Option<TickerHistory>> {
        let start_timestamp = midnight_utc(request.start);
        let end_timestamp = midnight_utc(request.end);

        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplits",
            self.base_url, ticker, start_timestamp, end_timestamp
        );

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        // Unknown symbols come back as 404 with a chart.error body
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(Error::Vendor {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_chart(&text, request.auto_adjust)
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn download(&self, request: &PriceRequest) -> Result<RawPriceTable> {
        info!(
            "[API] Fetching {} tickers from {} to {}",
            request.tickers.len(),
            request.start,
            request.end
        );

        let mut histories = Vec::with_capacity(request.tickers.len());
        let mut failed = 0;

        for ticker in &request.tickers {
            match self.fetch_one(ticker, request).await {
                Ok(Some(history)) => {
                    debug!("{}: {} rows", ticker, history.dates.len());
                    histories.push((ticker.clone(), history));
                }
                Ok(None) => {
                    warn!("{}: no price data found, symbol may be delisted", ticker);
                    failed += 1;
                }
                Err(e) => {
                    warn!("{}: download failed: {}", ticker, e);
                    failed += 1;
                }
            }
        }

        info!("[API] Fetch complete: {} success, {} failed", histories.len(), failed);
        Ok(assemble(request, histories))
    }
}
