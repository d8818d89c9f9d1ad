//! Adapter from [`Logger`] to the `tracing` crate.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// Logger that emits `tracing` events.
///
/// A non-empty context is recorded as the `context` field so subscribers
/// can filter on it (for example `scrape_pool=node`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing logger adapter.
    pub fn new() -> Self {
        Self
    }
}

macro_rules! emit {
    ($macro:ident, $context:expr, $args:expr) => {
        if $context.is_empty() {
            tracing::$macro!("{}", $args)
        } else {
            tracing::$macro!(context = %$context, "{}", $args)
        }
    };
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, context: &str, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => emit!(trace, context, args),
            LogLevel::Debug => emit!(debug, context, args),
            LogLevel::Info => emit!(info, context, args),
            LogLevel::Warn => emit!(warn, context, args),
            LogLevel::Error => emit!(error, context, args),
        }
    }
}
