//! Job specifications and the typed configuration they are built from.
//!
//! File formats are left to the embedding application; this module only
//! defines the data the manager reconciles against, its defaults and its
//! validation rules.

mod defaults;
mod duration;
mod job;

pub use defaults::{
    DEFAULT_METRICS_PATH, DEFAULT_SAMPLE_LIMIT, DEFAULT_SCHEME, DEFAULT_SCRAPE_INTERVAL,
    DEFAULT_SCRAPE_TIMEOUT, SUPPORTED_SCHEMES,
};
pub use duration::{format_duration, parse_duration, DurationParseError, HumanDuration};
pub use job::{ConfigError, DiscoveryConfig, JobSpec};
