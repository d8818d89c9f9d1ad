//! The scrape exchange seam.
//!
//! Fetching and parsing a metrics payload is not this crate's business;
//! a [`Scraper`] does it and hands back parsed samples.

use crate::storage::{Sample, StorageError};
use crate::target::Target;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors from a single scrape cycle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScrapeError {
    /// The scrape did not finish within the job's timeout.
    #[error("scrape timed out after {0:?}")]
    Timeout(Duration),

    /// The target returned more samples than the job allows.
    #[error("sample limit exceeded: {scraped} > {limit}")]
    SampleLimitExceeded { limit: usize, scraped: usize },

    /// The target could not be reached or returned garbage.
    #[error("{0}")]
    Target(String),

    /// Samples could not be stored.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Boxed future returned by [`Scraper::scrape`].
pub type ScrapeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Sample>, ScrapeError>> + Send + 'a>>;

/// Performs one scrape of a target.
///
/// Returned samples carry only their own labels; the scrape loop attaches
/// the target's labels. A `timestamp_ms` of zero means "use the scrape
/// start time".
pub trait Scraper: Send + Sync + 'static {
    /// Scrapes `target`, giving up after `timeout`.
    fn scrape<'a>(&'a self, target: &'a Target, timeout: Duration) -> ScrapeFuture<'a>;
}

/// Scraper that succeeds with no samples.
///
/// Targets still get their `up` and timing series.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScraper;

impl Scraper for NullScraper {
    fn scrape<'a>(&'a self, _target: &'a Target, _timeout: Duration) -> ScrapeFuture<'a> {
        Box::pin(async { Ok(Vec::new()) })
    }
}
