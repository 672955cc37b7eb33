use thiserror::Error;

/// Why a single kline request produced no data.
///
/// Callers treat every variant the same way (skip the interval and carry on);
/// the split exists so the reason can be reported.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("endpoint rejected request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed kline response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("CSV system error: {source}")]
    CsvSystemError {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV data format error: {0}")]
    CsvDataFormatError(String),

    #[error("Live feed error: {0}")]
    LiveFeedError(String),
}

impl EngineError {
    /// Storage failures end a fetch cycle; everything else is reported per interval.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            EngineError::IoError { .. } | EngineError::CsvSystemError { .. }
        )
    }
}
