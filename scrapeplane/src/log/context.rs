//! Logger decorator that attaches a fixed `key=value` context.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::sync::Arc;

/// Wraps another logger and prefixes every record with a context pair.
///
/// Decorators nest: wrapping a `ContextLogger` appends to its context, so
/// `scrape_pool=node target=10.0.0.1:9100` reaches the root logger as one
/// context string.
#[derive(Clone)]
pub struct ContextLogger {
    inner: Arc<dyn Logger>,
    context: String,
}

impl ContextLogger {
    /// Creates a logger that tags every record with `key=value`.
    pub fn new(inner: Arc<dyn Logger>, key: &str, value: &str) -> Self {
        Self {
            inner,
            context: format!("{}={}", key, value),
        }
    }

    /// Returns the context string attached to each record.
    pub fn context(&self) -> &str {
        &self.context
    }
}

impl Logger for ContextLogger {
    fn log(&self, level: LogLevel, context: &str, args: Arguments<'_>) {
        if context.is_empty() {
            self.inner.log(level, &self.context, args);
        } else {
            let joined = format!("{} {}", self.context, context);
            self.inner.log(level, &joined, args);
        }
    }
}

impl std::fmt::Debug for ContextLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextLogger")
            .field("context", &self.context)
            .finish()
    }
}
