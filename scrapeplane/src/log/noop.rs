//! Logger that discards everything.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;

/// A logger that discards all messages.
///
/// The default for tests and for embedding the manager where the host
/// application does its own reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _context: &str, _args: Arguments<'_>) {}
}
