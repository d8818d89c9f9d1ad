//! CLI error handling with user-friendly messages.

use scrapeplane::manager::ManagerError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// A `--job` flag could not be parsed
    InvalidJob(String),
    /// The manager rejected the configuration
    Manager(ManagerError),
    /// Failed to build the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::InvalidJob(_) = self {
            eprintln!();
            eprintln!("Jobs are given as NAME=HOST:PORT[,HOST:PORT...], for example:");
            eprintln!("  scrapeplane run --job node=localhost:9100,localhost:9101");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::InvalidJob(msg) => write!(f, "Invalid job: {}", msg),
            CliError::Manager(e) => write!(f, "Configuration rejected: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Manager(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ManagerError> for CliError {
    fn from(e: ManagerError) -> Self {
        CliError::Manager(e)
    }
}
