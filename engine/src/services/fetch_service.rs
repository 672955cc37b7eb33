//! One fetch-then-save pass over the configured interval table.
//!
//! Fetch failures are contained per interval: the interval is reported as
//! skipped and the next one runs. Storage failures end the pass.

use chrono::{DateTime, Duration, Utc};
use shared::models::Interval;
use shared::utils::dataset_file_name;
use std::path::PathBuf;
use thiserror::Error;

use crate::config::EngineSettings;
use crate::data::csv_store::{save_candles, SaveOutcome};
use crate::data::kline_client::KlineSource;
use crate::data::market_data::IntervalDataset;
use crate::error::{EngineError, FetchError};

#[derive(Debug)]
pub enum IntervalStatus {
    Saved { path: PathBuf, rows: usize },
    /// The endpoint answered with an empty array.
    Empty { path: PathBuf },
    Skipped { reason: FetchError },
}

#[derive(Debug)]
pub struct IntervalReport {
    pub interval: Interval,
    pub start_time_ms: i64,
    pub status: IntervalStatus,
}

impl IntervalReport {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status, IntervalStatus::Skipped { .. })
    }
}

#[derive(Debug)]
pub struct FetchCycle {
    pub dataset: IntervalDataset,
    /// One entry per configured interval, in table order.
    pub reports: Vec<IntervalReport>,
}

impl FetchCycle {
    pub fn skipped(&self) -> impl Iterator<Item = &IntervalReport> {
        self.reports.iter().filter(|r| !r.succeeded())
    }
}

/// A cycle stopped by a storage failure. `reports` covers the intervals handled before it.
#[derive(Error, Debug)]
#[error("fetch cycle aborted at {interval}: {source}")]
pub struct FetchAborted {
    pub interval: Interval,
    pub reports: Vec<IntervalReport>,
    pub source: EngineError,
}

pub struct FetchService<S: KlineSource> {
    source: S,
    settings: EngineSettings,
}

impl<S: KlineSource> FetchService<S> {
    pub fn new(source: S, settings: EngineSettings) -> Self {
        FetchService { source, settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Runs the cycle with lookback windows measured back from `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<FetchCycle, FetchAborted> {
        let pair = self.settings.pair.as_str();
        let mut dataset = IntervalDataset::new(pair);
        let mut reports = Vec::with_capacity(self.settings.intervals.len());

        for entry in &self.settings.intervals {
            let interval = entry.interval;
            let start_time_ms = (now - Duration::days(i64::from(entry.lookback_days))).timestamp_millis();
            tracing::info!(pair, %interval, lookback_days = entry.lookback_days, start_time_ms, "Fetching interval");

            let candles = match self.source.fetch_klines(pair, interval, start_time_ms).await {
                Ok(candles) => candles,
                Err(reason) => {
                    tracing::warn!(pair, %interval, error = %reason, "No data fetched for interval, skipping");
                    reports.push(IntervalReport {
                        interval,
                        start_time_ms,
                        status: IntervalStatus::Skipped { reason },
                    });
                    continue;
                }
            };

            let file_name = dataset_file_name(pair, interval);
            let outcome = match save_candles(&self.settings.data_dir, &file_name, &candles) {
                Ok(outcome) => outcome,
                Err(source) => {
                    tracing::error!(pair, %interval, error = %source, "Failed to persist interval data");
                    return Err(FetchAborted { interval, reports, source });
                }
            };

            let status = match outcome {
                SaveOutcome::Written { path, rows } => IntervalStatus::Saved { path, rows },
                SaveOutcome::Empty { path } => IntervalStatus::Empty { path },
            };
            dataset.insert(interval, candles);
            reports.push(IntervalReport { interval, start_time_ms, status });
        }

        tracing::info!(
            pair,
            fetched = dataset.len(),
            skipped = reports.iter().filter(|r| !r.succeeded()).count(),
            "Fetch cycle finished"
        );
        Ok(FetchCycle { dataset, reports })
    }
}
