// Technical indicators computed over candle closes
pub mod rsi;
pub mod sma;

pub use rsi::Rsi;
pub use sma::Sma;

use serde_json::Value;
use shared::models::Candle;

// Common trait for all indicators
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    /// One entry per input candle; `None` where the window is not yet filled.
    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>>;
}

/// The last defined value of an indicator series.
pub fn latest(values: &[Option<f64>]) -> Option<f64> {
    values.iter().rev().find_map(|v| *v)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone, Utc};
    use shared::models::Candle;

    pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 6, 24, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let start = base + Duration::minutes(5 * i as i64);
                Candle {
                    start_time: start,
                    end_time: start + Duration::minutes(5),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 0.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_skips_trailing_none() {
        assert_eq!(latest(&[None, Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(latest(&[None, None]), None);
    }
}
