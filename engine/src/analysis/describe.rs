//! Column statistics for a candle series: count, mean, sample standard
//! deviation, min, quartiles (linear interpolation) and max.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::models::Candle;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Undefined for fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    pub first_start: DateTime<Utc>,
    pub last_start: DateTime<Utc>,
    pub columns: Vec<ColumnStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceChangeStats {
    pub mean: f64,
    pub std: Option<f64>,
}

pub(crate) type Column = (&'static str, fn(&Candle) -> f64);

pub(crate) const COLUMNS: [Column; 5] = [
    ("open", |c: &Candle| c.open),
    ("high", |c: &Candle| c.high),
    ("low", |c: &Candle| c.low),
    ("close", |c: &Candle| c.close),
    ("volume", |c: &Candle| c.volume),
];

/// `None` for an empty series.
pub fn describe(candles: &[Candle]) -> Option<DatasetSummary> {
    let first_start = candles.iter().map(|c| c.start_time).min()?;
    let last_start = candles.iter().map(|c| c.start_time).max()?;

    let columns = COLUMNS
        .iter()
        .filter_map(|&(name, extract)| {
            let values: Vec<f64> = candles.iter().map(extract).collect();
            column_stats(name, values)
        })
        .collect();

    Some(DatasetSummary {
        records: candles.len(),
        first_start,
        last_start,
        columns,
    })
}

/// Mean and spread of `close - open`.
pub fn price_change_stats(candles: &[Candle]) -> Option<PriceChangeStats> {
    let changes: Vec<f64> = candles.iter().map(Candle::price_change).collect();
    let mean = mean(&changes)?;
    Some(PriceChangeStats {
        mean,
        std: sample_std(&changes, mean),
    })
}

fn column_stats(name: &'static str, mut values: Vec<f64>) -> Option<ColumnStats> {
    let mean = mean(&values)?;
    let std = sample_std(&values, mean);
    values.sort_by(f64::total_cmp);
    Some(ColumnStats {
        name,
        count: values.len(),
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sq / (values.len() - 1) as f64).sqrt())
}

// `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
