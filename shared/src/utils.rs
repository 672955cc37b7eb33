// Timestamp and file-naming helpers used by both the fetcher and the CSV store.
use crate::models::Interval;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub fn from_epoch_millis(ts_millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_millis)
        .ok_or_else(|| anyhow!("Timestamp {} ms is out of range", ts_millis))
}

pub fn to_epoch_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// `{pair}_{interval}_data.csv`, e.g. `BTCINR_1h_data.csv`.
pub fn dataset_file_name(pair: &str, interval: Interval) -> String {
    format!("{}_{}_data.csv", pair, interval.as_str())
}
