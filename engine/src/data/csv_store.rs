use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use shared::models::{Candle, Interval};
use shared::utils::{dataset_file_name, from_epoch_millis, to_epoch_millis};
use std::fs::{self, File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::data::market_data::IntervalDataset;
use crate::error::EngineError;

// Same column order the kline endpoint uses.
pub const CSV_HEADER: [&str; 7] = ["startTime", "open", "high", "low", "close", "endTime", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Written { path: PathBuf, rows: usize },
    /// Nothing to write; only the directory was ensured.
    Empty { path: PathBuf },
}

/// Appends `candles` to `dir/file_name`, creating `dir` if needed.
///
/// The header row is written only when the file did not exist before this call.
/// Rows are never deduplicated: saving the same candles twice stores them twice.
pub fn save_candles(dir: &Path, file_name: &str, candles: &[Candle]) -> Result<SaveOutcome, EngineError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);

    if candles.is_empty() {
        tracing::info!(path = %path.display(), "No data to save");
        return Ok(SaveOutcome::Empty { path });
    }

    let existed = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if !existed {
        wtr.write_record(CSV_HEADER)?;
    }
    for candle in candles {
        wtr.write_record(&[
            to_epoch_millis(&candle.start_time).to_string(),
            candle.open.to_string(),
            candle.high.to_string(),
            candle.low.to_string(),
            candle.close.to_string(),
            to_epoch_millis(&candle.end_time).to_string(),
            candle.volume.to_string(),
        ])?;
    }
    wtr.flush()?;

    tracing::info!(path = %path.display(), rows = candles.len(), header_written = !existed, "Data saved");
    Ok(SaveOutcome::Written { path, rows: candles.len() })
}

/// Reads one dataset file. Columns are looked up by header name, so their order does not matter.
pub fn load_candles(path: &Path) -> Result<Vec<Candle>, EngineError> {
    let file = File::open(path)?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let mut candles = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        let line = idx + 2;
        let record = result?;

        let start_ms = parse_field::<i64>(&record, &headers, "startTime", line)?;
        let end_ms = parse_field::<i64>(&record, &headers, "endTime", line)?;

        candles.push(Candle {
            start_time: from_epoch_millis(start_ms)
                .map_err(|e| EngineError::CsvDataFormatError(format!("line {}: {}", line, e)))?,
            end_time: from_epoch_millis(end_ms)
                .map_err(|e| EngineError::CsvDataFormatError(format!("line {}: {}", line, e)))?,
            open: parse_price(&record, &headers, "open", line)?,
            high: parse_price(&record, &headers, "high", line)?,
            low: parse_price(&record, &headers, "low", line)?,
            close: parse_price(&record, &headers, "close", line)?,
            volume: parse_price(&record, &headers, "volume", line)?,
        });
    }
    Ok(candles)
}

fn parse_field<T>(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<T, EngineError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = headers
        .iter()
        .position(|header| header == name)
        .and_then(|pos| record.get(pos))
        .ok_or_else(|| EngineError::CsvDataFormatError(format!("Missing '{}' field at line {}", name, line)))?;
    raw.trim().parse::<T>().map_err(|e| {
        EngineError::CsvDataFormatError(format!("Error parsing '{}' value '{}' at line {}: {}", name, raw, line, e))
    })
}

fn parse_price(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<f64, EngineError> {
    let value: f64 = parse_field(record, headers, name, line)?;
    if !value.is_finite() {
        return Err(EngineError::CsvDataFormatError(format!(
            "Non-finite '{}' value '{}' at line {}",
            name, value, line
        )));
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loaded { rows: usize },
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub interval: Interval,
    pub path: PathBuf,
    pub status: LoadStatus,
}

/// Loads every requested interval for `pair` from `dir`.
///
/// A missing or unreadable file is reported and skipped; the other intervals still load.
pub fn load_dataset(dir: &Path, pair: &str, intervals: &[Interval]) -> (IntervalDataset, Vec<LoadReport>) {
    let mut dataset = IntervalDataset::new(pair);
    let mut reports = Vec::with_capacity(intervals.len());

    for &interval in intervals {
        let path = dir.join(dataset_file_name(pair, interval));
        let status = if !path.exists() {
            tracing::warn!(%interval, path = %path.display(), "Dataset file not found");
            LoadStatus::Missing
        } else {
            match load_candles(&path) {
                Ok(candles) => {
                    tracing::info!(%interval, rows = candles.len(), "Dataset loaded");
                    let rows = candles.len();
                    dataset.insert(interval, candles);
                    LoadStatus::Loaded { rows }
                }
                Err(e) => {
                    tracing::error!(%interval, path = %path.display(), error = %e, "Error loading dataset");
                    LoadStatus::Failed { reason: e.to_string() }
                }
            }
        };
        reports.push(LoadReport { interval, path, status });
    }
    (dataset, reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;
    use tempfile::tempdir;

    fn hourly_candles(n: usize) -> Vec<Candle> {
        let base = Utc.with_ymd_and_hms(2024, 6, 24, 11, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let start = base + Duration::hours(i as i64);
                Candle {
                    start_time: start,
                    end_time: start + Duration::hours(1) - Duration::milliseconds(1),
                    open: 5_321_000.0 + i as f64,
                    high: 5_325_000.5,
                    low: 5_318_000.0,
                    close: 5_322_000.25,
                    volume: 0.412,
                }
            })
            .collect()
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_first_save_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("raw");
        let outcome = save_candles(&data_dir, "BTCINR_1h_data.csv", &hourly_candles(3)).unwrap();

        let path = data_dir.join("BTCINR_1h_data.csv");
        assert_eq!(outcome, SaveOutcome::Written { path: path.clone(), rows: 3 });
        let lines = read_lines(&path);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "startTime,open,high,low,close,endTime,volume");
        assert_eq!(lines[1], "1719226800000,5321000,5325000.5,5318000,5322000.25,1719230399999,0.412");
    }

    #[test]
    fn test_second_save_appends_rows_without_second_header() {
        let dir = tempdir().unwrap();
        let candles = hourly_candles(2);
        save_candles(dir.path(), "BTCINR_1h_data.csv", &candles).unwrap();
        save_candles(dir.path(), "BTCINR_1h_data.csv", &candles).unwrap();

        let lines = read_lines(&dir.path().join("BTCINR_1h_data.csv"));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines.iter().filter(|l| l.starts_with("startTime")).count(), 1);
        // Duplicates are kept on purpose.
        assert_eq!(lines[1], lines[3]);
    }

    #[test]
    fn test_empty_save_only_creates_directory() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("nested").join("raw");
        let outcome = save_candles(&data_dir, "BTCINR_5m_data.csv", &[]).unwrap();

        assert!(data_dir.is_dir());
        assert!(!data_dir.join("BTCINR_5m_data.csv").exists());
        assert!(matches!(outcome, SaveOutcome::Empty { .. }));
    }

    #[test]
    fn test_save_then_load_preserves_candles() {
        let dir = tempdir().unwrap();
        let candles = hourly_candles(3);
        save_candles(dir.path(), "BTCINR_1h_data.csv", &candles).unwrap();

        let loaded = load_candles(&dir.path().join("BTCINR_1h_data.csv")).unwrap();
        assert_eq!(loaded, candles);
    }

    #[test]
    fn test_load_with_reordered_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "volume,endTime,close,low,high,open,startTime").unwrap();
        writeln!(file, "2.5,1719230399999,10,9,11,9.5,1719226800000").unwrap();

        let candles = load_candles(&path).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open, 9.5);
        assert_eq!(candles[0].volume, 2.5);
        assert_eq!(candles[0].start_time, Utc.with_ymd_and_hms(2024, 6, 24, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_load_missing_column_names_field_and_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "startTime,open,high,low,endTime,volume\n1,2,3,4,5,6\n").unwrap();

        let err = load_candles(&path).unwrap_err();
        assert!(err.to_string().contains("Missing 'close' field at line 2"));
    }

    #[test]
    fn test_load_invalid_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "startTime,open,high,low,close,endTime,volume\n1,abc,3,4,5,6,7\n").unwrap();

        let err = load_candles(&path).unwrap_err();
        assert!(err.to_string().contains("Error parsing 'open' value 'abc' at line 2"));
    }

    #[test]
    fn test_load_rejects_non_finite_prices() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nan.csv");
        fs::write(
            &path,
            "startTime,open,high,low,close,endTime,volume\n1719226800000,1,2,1,1.5,1719230399999,3\n1719230400000,1,inf,1,NaN,1719233999999,3\n",
        )
        .unwrap();

        let err = load_candles(&path).unwrap_err();
        assert!(matches!(err, EngineError::CsvDataFormatError(_)));
        assert!(err.to_string().contains("Non-finite 'high' value 'inf' at line 3"));
    }

    #[test]
    fn test_load_dataset_skips_missing_and_broken_files() {
        let dir = tempdir().unwrap();
        save_candles(dir.path(), "BTCINR_1h_data.csv", &hourly_candles(3)).unwrap();
        fs::write(dir.path().join("BTCINR_6h_data.csv"), "startTime,open\nnot,valid\n").unwrap();

        let (dataset, reports) =
            load_dataset(dir.path(), "BTCINR", &[Interval::Minute5, Interval::Hour1, Interval::Hour6]);

        assert_eq!(dataset.intervals(), vec![Interval::Hour1]);
        assert_eq!(dataset.get(Interval::Hour1).unwrap().len(), 3);
        assert_eq!(reports[0].status, LoadStatus::Missing);
        assert_eq!(reports[1].status, LoadStatus::Loaded { rows: 3 });
        assert!(matches!(reports[2].status, LoadStatus::Failed { .. }));
    }
}
