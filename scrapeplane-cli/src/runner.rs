//! CLI runner for common setup.

use crate::error::CliError;
use scrapeplane::logging::{init_logging, LoggingGuard, LoggingOptions};
use std::path::PathBuf;
use tracing::info;

/// Keeps logging alive for the duration of a command.
pub struct CliRunner {
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
}

impl CliRunner {
    /// Initializes file and stdout logging.
    ///
    /// # Arguments
    ///
    /// * `log_dir` - Directory for the log file
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(log_dir: PathBuf, debug_mode: bool) -> Result<Self, CliError> {
        let options = LoggingOptions {
            log_dir,
            debug: debug_mode,
            ..Default::default()
        };
        let logging_guard =
            init_logging(&options).map_err(|e| CliError::LoggingInit(e.to_string()))?;
        Ok(Self { logging_guard })
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Scrapeplane v{}", scrapeplane::VERSION);
        info!("Scrapeplane CLI: {} command", command);
    }
}
