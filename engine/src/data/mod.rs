pub mod csv_store;
pub mod kline_client;
pub mod market_data;

pub use csv_store::{load_candles, load_dataset, save_candles, LoadReport, LoadStatus, SaveOutcome};
pub use kline_client::{KlineClient, KlineSource};
pub use market_data::IntervalDataset;
