//! In-process storage sinks.

use super::{Appendable, Appender, Sample, StorageError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Sink that accepts and discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAppendable;

struct NoopAppender;

impl Appender for NoopAppender {
    fn add(&mut self, _sample: Sample) -> Result<(), StorageError> {
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

impl Appendable for NoopAppendable {
    fn appender(&self) -> Result<Box<dyn Appender>, StorageError> {
        Ok(Box::new(NoopAppender))
    }
}

/// Sink that keeps committed samples in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every committed sample, in commit order.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().clone()
    }

    /// Number of committed samples.
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    /// Returns true if nothing was committed.
    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    /// Committed samples of metric `name`.
    pub fn series(&self, name: &str) -> Vec<Sample> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.name() == Some(name))
            .cloned()
            .collect()
    }
}

struct MemoryAppender {
    staged: Vec<Sample>,
    target: Arc<Mutex<Vec<Sample>>>,
}

impl Appender for MemoryAppender {
    fn add(&mut self, sample: Sample) -> Result<(), StorageError> {
        if sample.name().is_none() {
            return Err(StorageError::Rejected(
                "sample without metric name".to_string(),
            ));
        }
        self.staged.push(sample);
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let MemoryAppender { staged, target } = *self;
        target.lock().extend(staged);
        Ok(())
    }

    fn rollback(self: Box<Self>) {}
}

impl Appendable for MemoryStorage {
    fn appender(&self) -> Result<Box<dyn Appender>, StorageError> {
        Ok(Box::new(MemoryAppender {
            staged: Vec::new(),
            target: Arc::clone(&self.samples),
        }))
    }
}
