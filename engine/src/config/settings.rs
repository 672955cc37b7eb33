// Engine settings, loaded from a JSON file or taken from the built-in defaults
use crate::error::EngineError;
use serde::Deserialize;
use shared::models::Interval;
use std::path::{Path, PathBuf};

pub const DEFAULT_KLINE_URL: &str = "https://api.pi42.com/v1/market/klines";
pub const DEFAULT_WS_URL: &str = "wss://api.pi42.com/v1/market/ws";
pub const DEFAULT_PAGE_LIMIT: u32 = 10_000;

/// How far back one interval is requested.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct IntervalLookback {
    pub interval: Interval,
    pub lookback_days: u32,
}

impl IntervalLookback {
    pub fn new(interval: Interval, lookback_days: u32) -> Self {
        Self { interval, lookback_days }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineSettings {
    pub pair: String,
    pub kline_url: String,
    pub ws_url: String,
    pub data_dir: PathBuf,
    pub page_limit: u32,
    // None means the request may block indefinitely
    pub request_timeout_secs: Option<u64>,
    // Fetched in this order
    pub intervals: Vec<IntervalLookback>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pair: "BTCINR".to_string(),
            kline_url: DEFAULT_KLINE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            data_dir: PathBuf::from(".data/raw"),
            page_limit: DEFAULT_PAGE_LIMIT,
            request_timeout_secs: None,
            intervals: vec![
                IntervalLookback::new(Interval::Minute5, 7),
                IntervalLookback::new(Interval::Minute15, 30),
                IntervalLookback::new(Interval::Minute30, 60),
                IntervalLookback::new(Interval::Hour1, 60),
                IntervalLookback::new(Interval::Hour6, 60),
                IntervalLookback::new(Interval::Hour12, 60),
            ],
        }
    }
}

impl EngineSettings {
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::ConfigError(format!("Failed to read settings file '{}': {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, EngineError> {
        let settings: EngineSettings = serde_json::from_str(raw)
            .map_err(|e| EngineError::ConfigError(format!("Invalid settings JSON: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.pair.trim().is_empty() {
            return Err(EngineError::ConfigError("pair must not be empty".to_string()));
        }
        if self.page_limit == 0 {
            return Err(EngineError::ConfigError("page_limit must be greater than 0".to_string()));
        }
        if let Some(dup) = self
            .intervals
            .iter()
            .enumerate()
            .find(|(i, entry)| self.intervals[..*i].iter().any(|prev| prev.interval == entry.interval))
        {
            return Err(EngineError::ConfigError(format!(
                "interval {} is configured more than once",
                dup.1.interval
            )));
        }
        Ok(())
    }

    pub fn lookback_for(&self, interval: Interval) -> Option<u32> {
        self.intervals
            .iter()
            .find(|entry| entry.interval == interval)
            .map(|entry| entry.lookback_days)
    }

    pub fn configured_intervals(&self) -> Vec<Interval> {
        self.intervals.iter().map(|entry| entry.interval).collect()
    }
}
