//! Pearson correlation between the numeric candle columns.

use serde::Serialize;
use shared::models::Candle;

use super::describe::COLUMNS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    /// Row-major, same order as `columns`. `None` where a column has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let row = self.columns.iter().position(|c| *c == a)?;
        let col = self.columns.iter().position(|c| *c == b)?;
        self.values[row][col]
    }
}

/// `None` for an empty series.
pub fn correlation(candles: &[Candle]) -> Option<CorrelationMatrix> {
    if candles.is_empty() {
        return None;
    }
    let series: Vec<Vec<f64>> = COLUMNS
        .iter()
        .map(|&(_, extract)| candles.iter().map(extract).collect())
        .collect();

    let values = series
        .iter()
        .enumerate()
        .map(|(i, x)| {
            series
                .iter()
                .enumerate()
                .map(|(j, y)| {
                    let r = pearson(x, y)?;
                    Some(if i == j { 1.0 } else { r })
                })
                .collect()
        })
        .collect();

    Some(CorrelationMatrix {
        columns: COLUMNS.iter().map(|&(name, _)| name).collect(),
        values,
    })
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}
