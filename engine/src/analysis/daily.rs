use chrono::NaiveDate;
use shared::models::Candle;
use std::collections::BTreeMap;

/// Closing price of the latest candle on each UTC day, oldest day first.
pub fn daily_closes(candles: &[Candle]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, &Candle> = BTreeMap::new();
    for candle in candles {
        let day = candle.start_time.date_naive();
        match by_day.get(&day) {
            Some(existing) if existing.start_time > candle.start_time => {}
            _ => {
                by_day.insert(day, candle);
            }
        }
    }
    by_day.into_iter().map(|(day, candle)| (day, candle.close)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candle_at(hours_from_base: i64, close: f64) -> Candle {
        let start = Utc.with_ymd_and_hms(2024, 6, 24, 0, 0, 0).unwrap() + Duration::hours(hours_from_base);
        Candle {
            start_time: start,
            end_time: start + Duration::hours(6),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_last_close_per_day() {
        let candles = vec![
            candle_at(0, 1.0),
            candle_at(6, 2.0),
            candle_at(18, 3.0),
            candle_at(24, 4.0),
            candle_at(30, 5.0),
        ];
        let daily = daily_closes(&candles);
        assert_eq!(
            daily,
            vec![
                (NaiveDate::from_ymd_opt(2024, 6, 24).unwrap(), 3.0),
                (NaiveDate::from_ymd_opt(2024, 6, 25).unwrap(), 5.0),
            ]
        );
    }

    #[test]
    fn test_out_of_order_input_uses_latest_candle() {
        let candles = vec![candle_at(18, 3.0), candle_at(0, 1.0)];
        assert_eq!(daily_closes(&candles)[0].1, 3.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(daily_closes(&[]).is_empty());
    }
}
