//! Exploratory statistics over stored candle series.

pub mod correlation;
pub mod daily;
pub mod describe;
pub mod histogram;

pub use correlation::{correlation, CorrelationMatrix};
pub use daily::daily_closes;
pub use describe::{describe, price_change_stats, ColumnStats, DatasetSummary, PriceChangeStats};
pub use histogram::{close_histogram, HistogramBin, CLOSE_HISTOGRAM_BINS};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use shared::models::{Candle, Interval};

use crate::indicators::{latest, IndicatorCalculator, Rsi, Sma};

pub const SHORT_SMA_PERIOD: usize = 7;
pub const LONG_SMA_PERIOD: usize = 30;
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub name: String,
    pub parameters: Value,
    pub latest: Option<f64>,
}

/// Everything the summary command prints for one interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalAnalysis {
    pub interval: Interval,
    pub summary: Option<DatasetSummary>,
    pub price_change: Option<PriceChangeStats>,
    pub indicators: Vec<IndicatorSnapshot>,
    pub correlation: Option<CorrelationMatrix>,
    pub close_histogram: Vec<HistogramBin>,
    /// Last close of each UTC day, oldest first.
    pub daily_closes: Vec<(NaiveDate, f64)>,
}

pub fn default_indicators() -> Vec<Box<dyn IndicatorCalculator>> {
    let mut indicators: Vec<Box<dyn IndicatorCalculator>> = Vec::new();
    indicators.extend(Sma::new(SHORT_SMA_PERIOD).map(|i| Box::new(i) as Box<dyn IndicatorCalculator>));
    indicators.extend(Sma::new(LONG_SMA_PERIOD).map(|i| Box::new(i) as Box<dyn IndicatorCalculator>));
    indicators.extend(Rsi::new(RSI_PERIOD).map(|i| Box::new(i) as Box<dyn IndicatorCalculator>));
    indicators
}

pub fn analyze_interval(
    interval: Interval,
    candles: &[Candle],
    indicators: &[Box<dyn IndicatorCalculator>],
) -> IntervalAnalysis {
    let indicators = indicators
        .iter()
        .map(|indicator| IndicatorSnapshot {
            name: indicator.name().to_string(),
            parameters: indicator.parameters(),
            latest: latest(&indicator.calculate(candles)),
        })
        .collect();

    IntervalAnalysis {
        interval,
        summary: describe(candles),
        price_change: price_change_stats(candles),
        indicators,
        correlation: correlation(candles),
        close_histogram: close_histogram(candles, CLOSE_HISTOGRAM_BINS),
        daily_closes: daily_closes(candles),
    }
}
