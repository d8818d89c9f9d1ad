//! Coordinator error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors raised while reconciling jobs.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The job definition is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The backend could not build a job's worker group.
    #[error("Job '{job}': {message}")]
    Backend { job: String, message: String },
}

impl ManagerError {
    /// Creates a backend error for `job`.
    pub fn backend(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            job: job.into(),
            message: message.into(),
        }
    }
}
