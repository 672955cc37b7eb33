// Relative Strength Index (RSI) indicator implementation
use super::IndicatorCalculator;
use serde_json::Value;
use shared::models::Candle;

/// RSI with plain rolling means of gains and losses over the last `period`
/// close-to-close changes (no Wilder smoothing).
pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    /// Returns `None` for a zero period.
    pub fn new(period: usize) -> Option<Self> {
        if period == 0 {
            return None;
        }
        Some(Self {
            name: format!("RSI({})", period),
            period,
        })
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Vec<Option<f64>> {
        if data.len() <= self.period {
            return vec![None; data.len()];
        }

        let mut results = vec![None; self.period];

        for i in self.period..data.len() {
            let (gains, losses) = ((i + 1 - self.period)..=i).fold((0.0, 0.0), |(g, l), j| {
                let change = data[j].close - data[j - 1].close;
                if change > 0.0 {
                    (g + change, l)
                } else {
                    (g, l - change)
                }
            });
            let avg_gain = gains / self.period as f64;
            let avg_loss = losses / self.period as f64;

            let value = if avg_loss == 0.0 && avg_gain == 0.0 {
                None // flat window
            } else if avg_loss == 0.0 {
                Some(100.0)
            } else {
                let rs = avg_gain / avg_loss;
                Some(100.0 - (100.0 / (1.0 + rs)))
            };
            results.push(value);
        }
        results
    }
}
