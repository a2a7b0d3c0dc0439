mod fetch;
mod session;
mod stats;

pub use fetch::{FetchResponse, Fetcher, HttpFetcher, DEFAULT_HTTP_TIMEOUT};
pub use session::UpdateSession;
pub use stats::HttpStatsReporter;
