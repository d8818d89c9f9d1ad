//! Job specifications.

use super::defaults::{
    DEFAULT_METRICS_PATH, DEFAULT_SAMPLE_LIMIT, DEFAULT_SCHEME, DEFAULT_SCRAPE_INTERVAL,
    DEFAULT_SCRAPE_TIMEOUT, SUPPORTED_SCHEMES,
};
use super::duration::{format_duration, DurationParseError};
use crate::target::{RelabelConfig, TargetGroup};
use std::time::Duration;
use thiserror::Error;

/// Errors in a job specification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Job name must not be empty")]
    EmptyJobName,

    #[error("Job '{job}': scrape interval must be greater than zero")]
    ZeroInterval { job: String },

    #[error("Job '{job}': scrape timeout {timeout} is greater than scrape interval {interval}")]
    TimeoutExceedsInterval {
        job: String,
        timeout: String,
        interval: String,
    },

    #[error("Job '{job}': unsupported scheme '{scheme}'")]
    UnsupportedScheme { job: String, scheme: String },

    #[error("Job '{job}': metrics path '{path}' must start with '/'")]
    InvalidMetricsPath { job: String, path: String },

    #[error("Invalid relabel regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error(transparent)]
    Duration(#[from] DurationParseError),
}

/// Where a job's targets come from.
///
/// Only static groups are built in; other sources plug in through
/// [`TargetProvider`](crate::discovery::TargetProvider).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Fixed target groups.
    pub static_configs: Vec<TargetGroup>,
}

impl DiscoveryConfig {
    /// Returns true if no discovery source is configured.
    pub fn is_empty(&self) -> bool {
        self.static_configs.is_empty()
    }
}

/// A named scrape job. The name is its identity in the manager.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Unique job name; also the default `job` label.
    pub job_name: String,
    /// Time between scrapes of one target.
    pub scrape_interval: Duration,
    /// Upper bound for a single scrape.
    pub scrape_timeout: Duration,
    /// HTTP path of the metrics endpoint.
    pub metrics_path: String,
    /// `http` or `https`.
    pub scheme: String,
    /// Keep scraped labels that clash with target labels instead of
    /// renaming them to `exported_<name>`.
    pub honor_labels: bool,
    /// Reject scrapes returning more samples than this (0 = unlimited).
    pub sample_limit: usize,
    /// Rules applied to discovered labels.
    pub relabel_configs: Vec<RelabelConfig>,
    /// Discovery sources.
    pub discovery: DiscoveryConfig,
}

impl JobSpec {
    /// Creates a job with default parameters and no discovery sources.
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            scrape_interval: DEFAULT_SCRAPE_INTERVAL,
            scrape_timeout: DEFAULT_SCRAPE_TIMEOUT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            scheme: DEFAULT_SCHEME.to_string(),
            honor_labels: false,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
            relabel_configs: Vec::new(),
            discovery: DiscoveryConfig::default(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.scrape_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.scrape_timeout = timeout;
        self
    }

    pub fn with_metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = path.into();
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_honor_labels(mut self, honor: bool) -> Self {
        self.honor_labels = honor;
        self
    }

    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    pub fn with_relabel(mut self, config: RelabelConfig) -> Self {
        self.relabel_configs.push(config);
        self
    }

    /// Adds a static target group.
    pub fn with_static_group(mut self, group: TargetGroup) -> Self {
        self.discovery.static_configs.push(group);
        self
    }

    /// Checks the specification for values no worker group can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.job_name.trim().is_empty() {
            return Err(ConfigError::EmptyJobName);
        }
        if self.scrape_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                job: self.job_name.clone(),
            });
        }
        if self.scrape_timeout > self.scrape_interval {
            return Err(ConfigError::TimeoutExceedsInterval {
                job: self.job_name.clone(),
                timeout: format_duration(self.scrape_timeout),
                interval: format_duration(self.scrape_interval),
            });
        }
        if !SUPPORTED_SCHEMES.contains(&self.scheme.as_str()) {
            return Err(ConfigError::UnsupportedScheme {
                job: self.job_name.clone(),
                scheme: self.scheme.clone(),
            });
        }
        if !self.metrics_path.starts_with('/') {
            return Err(ConfigError::InvalidMetricsPath {
                job: self.job_name.clone(),
                path: self.metrics_path.clone(),
            });
        }
        Ok(())
    }
}
