//! Storage sink contract.
//!
//! The manager receives one [`Appendable`] at construction and shares it
//! with every worker group. Each scrape obtains a fresh [`Appender`], adds
//! its samples and commits them as one batch.

mod memory;

pub use memory::{MemoryStorage, NoopAppendable};

use crate::target::LabelSet;
use thiserror::Error;

/// Storage errors surfaced to scrape loops.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage cannot hand out appenders right now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A sample was refused.
    #[error("Sample rejected: {0}")]
    Rejected(String),
}

/// One timestamped value of a labelled series.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Series labels, including `__name__`.
    pub labels: LabelSet,
    /// Sample value.
    pub value: f64,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// Label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

impl Sample {
    /// Creates a sample for metric `name` with no other labels.
    pub fn new(name: &str, value: f64, timestamp_ms: i64) -> Self {
        Self {
            labels: LabelSet::new().with(METRIC_NAME_LABEL, name),
            value,
            timestamp_ms,
        }
    }

    /// Adds a label.
    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name, value);
        self
    }

    /// The metric name, if set.
    pub fn name(&self) -> Option<&str> {
        self.labels.get(METRIC_NAME_LABEL)
    }
}

/// A batch of samples that becomes visible on commit.
pub trait Appender: Send {
    /// Stages a sample.
    fn add(&mut self, sample: Sample) -> Result<(), StorageError>;

    /// Makes every staged sample visible.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discards every staged sample.
    fn rollback(self: Box<Self>);
}

/// Source of appenders, shared by every worker group.
pub trait Appendable: Send + Sync + 'static {
    /// Returns a new appender.
    fn appender(&self) -> Result<Box<dyn Appender>, StorageError>;
}
