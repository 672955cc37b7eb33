pub mod fetch_service;
pub mod live_feed;

pub use fetch_service::{FetchAborted, FetchCycle, FetchService, IntervalReport, IntervalStatus};
pub use live_feed::{LiveFeed, LiveFeedHandle};
