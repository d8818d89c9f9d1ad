//! Default values for job specifications.

use std::time::Duration;

/// Default time between scrapes of one target.
pub const DEFAULT_SCRAPE_INTERVAL: Duration = Duration::from_secs(60);

/// Default upper bound for a single scrape.
pub const DEFAULT_SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default HTTP path of the metrics endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default URL scheme.
pub const DEFAULT_SCHEME: &str = "http";

/// Default per-scrape sample limit (0 = unlimited).
pub const DEFAULT_SAMPLE_LIMIT: usize = 0;

/// Schemes a job may use.
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];
