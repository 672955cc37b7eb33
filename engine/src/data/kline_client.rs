//! HTTP client for the kline endpoint.
//!
//! One `POST` per interval, no retry. Failures come back as [`FetchError`] so the
//! caller can skip the interval instead of aborting the whole cycle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::models::{Candle, Interval};
use shared::utils::from_epoch_millis;
use std::time::Duration;

use crate::config::EngineSettings;
use crate::error::{EngineError, FetchError};

/// Anything that can produce the candles for one interval.
#[async_trait]
pub trait KlineSource: Send + Sync {
    async fn fetch_klines(
        &self,
        pair: &str,
        interval: Interval,
        start_time_ms: i64,
    ) -> Result<Vec<Candle>, FetchError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KlineRequest<'a> {
    pair: &'a str,
    interval: Interval,
    limit: u32,
    start_time: i64,
}

// Pi42 sends numbers as decimal strings; plain JSON numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(serde_json::Number),
    Text(String),
}

impl Numeric {
    fn as_f64(&self, field: &str) -> Result<f64, String> {
        match self {
            Numeric::Number(n) => n.as_f64().ok_or_else(|| format!("'{}' is not a finite number", field)),
            Numeric::Text(s) => {
                let value = s
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| format!("'{}' value '{}' is not a decimal: {}", field, s, e))?;
                if !value.is_finite() {
                    return Err(format!("'{}' value '{}' is not a finite number", field, s));
                }
                Ok(value)
            }
        }
    }

    fn as_i64(&self, field: &str) -> Result<i64, String> {
        match self {
            Numeric::Number(n) => n.as_i64().ok_or_else(|| format!("'{}' is not an integer", field)),
            Numeric::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("'{}' value '{}' is not an integer: {}", field, s, e)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKline {
    start_time: Numeric,
    end_time: Numeric,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
    volume: Numeric,
}

impl TryFrom<RawKline> for Candle {
    type Error = String;

    fn try_from(raw: RawKline) -> Result<Self, Self::Error> {
        let start_ms = raw.start_time.as_i64("startTime")?;
        let end_ms = raw.end_time.as_i64("endTime")?;
        if start_ms >= end_ms {
            return Err(format!("startTime {} is not before endTime {}", start_ms, end_ms));
        }
        Ok(Candle {
            start_time: from_epoch_millis(start_ms).map_err(|e| e.to_string())?,
            end_time: from_epoch_millis(end_ms).map_err(|e| e.to_string())?,
            open: raw.open.as_f64("open")?,
            high: raw.high.as_f64("high")?,
            low: raw.low.as_f64("low")?,
            close: raw.close.as_f64("close")?,
            volume: raw.volume.as_f64("volume")?,
        })
    }
}

/// Parses a kline response body. The order of the array is preserved.
pub fn parse_kline_body(body: &str) -> Result<Vec<Candle>, FetchError> {
    let raw: Vec<RawKline> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    raw.into_iter()
        .enumerate()
        .map(|(idx, kline)| {
            Candle::try_from(kline).map_err(|e| FetchError::Malformed(format!("record {}: {}", idx, e)))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct KlineClient {
    client: reqwest::Client,
    url: String,
    limit: u32,
}

impl KlineClient {
    pub fn new(settings: &EngineSettings) -> Result<Self, EngineError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| EngineError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: settings.kline_url.clone(),
            limit: settings.page_limit,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KlineSource for KlineClient {
    async fn fetch_klines(
        &self,
        pair: &str,
        interval: Interval,
        start_time_ms: i64,
    ) -> Result<Vec<Candle>, FetchError> {
        let payload = KlineRequest {
            pair,
            interval,
            limit: self.limit,
            start_time: start_time_ms,
        };
        tracing::debug!(pair, %interval, start_time_ms, limit = self.limit, url = %self.url, "Requesting klines");

        let response = self.client.post(&self.url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(FetchError::Rejected { status: status.as_u16(), body });
        }

        let body = response.text().await?;
        let candles = parse_kline_body(&body)?;
        tracing::info!(pair, %interval, count = candles.len(), "Kline data fetched");
        Ok(candles)
    }
}
