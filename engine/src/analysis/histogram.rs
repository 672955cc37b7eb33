use serde::Serialize;
use shared::models::Candle;

pub const CLOSE_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width bins over the close range. Bins are half-open except the last,
/// which includes the maximum. A flat series is spread over `min - 0.5 .. max + 0.5`.
pub fn close_histogram(candles: &[Candle], bins: usize) -> Vec<HistogramBin> {
    if candles.is_empty() || bins == 0 {
        return Vec::new();
    }
    let closes = candles.iter().map(|c| c.close);
    let mut min = closes.clone().fold(f64::INFINITY, f64::min);
    let mut max = closes.clone().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for close in closes {
        let idx = (((close - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}
