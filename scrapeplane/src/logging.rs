//! Process-wide `tracing` setup for binaries embedding the manager.
//!
//! - Writes to `<log_dir>/<log_file>`, truncated at the start of each run
//! - Optionally mirrors events to stdout
//! - Filter from `RUST_LOG`, falling back to `info` (or `debug` on request)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default directory for log files.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "scrapeplane.log";

/// Options for [`init_logging`].
#[derive(Clone, Debug)]
pub struct LoggingOptions {
    /// Directory that receives the log file.
    pub log_dir: PathBuf,
    /// Log file name inside `log_dir`.
    pub log_file: String,
    /// Mirror events to stdout.
    pub stdout: bool,
    /// Use `debug` instead of `info` when `RUST_LOG` is unset.
    pub debug: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_file: DEFAULT_LOG_FILE.to_string(),
            stdout: true,
            debug: false,
        }
    }
}

/// Guard that keeps the non-blocking file writer alive.
///
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Creates the log directory and truncates the log file.
///
/// Returns the full path of the (now empty) log file.
pub fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log
/// file cannot be truncated.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(&options.log_dir, &options.log_file)?;

    let file_appender = tracing_appender::rolling::never(&options.log_dir, &options.log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = options.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .compact()
    });

    let fallback = if options.debug { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
