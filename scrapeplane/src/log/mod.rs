//! Logging abstraction handed to the target manager and its collaborators.
//!
//! The manager is constructed with an `Arc<dyn Logger>` and passes a
//! job-scoped [`ContextLogger`] down to every worker group and discovery
//! engine it creates. Keeping the seam as a trait lets tests run silently
//! with [`NoOpLogger`] while binaries forward to `tracing` through
//! [`TracingLogger`].
//!
//! ```
//! use scrapeplane::log::{ContextLogger, Logger, NoOpLogger};
//! use scrapeplane::log_info;
//! use std::sync::Arc;
//!
//! let root: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! let pool_logger = ContextLogger::new(root, "scrape_pool", "node");
//! log_info!(pool_logger, "Starting scrape pool");
//! ```

mod context;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use context::ContextLogger;
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
