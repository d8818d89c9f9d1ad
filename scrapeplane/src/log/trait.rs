//! Logger trait definition.

use std::fmt::{self, Arguments};

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Verbose debugging information
    Trace,
    /// Debugging information
    Debug,
    /// General information
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Logging interface for manager components.
///
/// `context` is a space-separated list of `key=value` pairs attached by
/// decorators such as [`ContextLogger`](super::ContextLogger); it is empty
/// for a root logger. Implementations must be `Send + Sync` because one
/// logger is shared by every job's background task.
pub trait Logger: Send + Sync {
    /// Log a message at `level` with the given context.
    fn log(&self, level: LogLevel, context: &str, args: Arguments<'_>);

    /// Log a trace-level message.
    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, "", args);
    }

    /// Log a debug-level message.
    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, "", args);
    }

    /// Log an info-level message.
    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, "", args);
    }

    /// Log a warning-level message.
    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, "", args);
    }

    /// Log an error-level message.
    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, "", args);
    }
}

impl<L: Logger + ?Sized> Logger for std::sync::Arc<L> {
    fn log(&self, level: LogLevel, context: &str, args: Arguments<'_>) {
        (**self).log(level, context, args);
    }
}

#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log::Logger::trace(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log::Logger::debug(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log::Logger::info(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log::Logger::warn(&$logger, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log::Logger::error(&$logger, format_args!($($arg)*))
    };
}
