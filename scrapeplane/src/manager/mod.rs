//! Job reconciliation and lifecycle.
//!
//! [`TargetManager`] turns a list of job definitions into running jobs.
//! Each job gets a cancellation scope, a worker group and a discovery
//! engine built by a [`JobBackend`]. Reloading with a new list starts,
//! reconfigures and cancels jobs so that exactly one runs per name.
//!
//! # Example
//!
//! ```no_run
//! use scrapeplane::config::JobSpec;
//! use scrapeplane::log::TracingLogger;
//! use scrapeplane::manager::TargetManager;
//! use scrapeplane::storage::MemoryStorage;
//! use scrapeplane::target::TargetGroup;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager: Arc<TargetManager> =
//!     Arc::new(TargetManager::new(Arc::new(MemoryStorage::new()), Arc::new(TracingLogger)));
//!
//! manager.apply_config(vec![
//!     JobSpec::new("node").with_static_group(TargetGroup::new("").with_address("localhost:9100")),
//! ])?;
//!
//! let runner = {
//!     let manager = Arc::clone(&manager);
//!     tokio::spawn(async move { manager.run().await })
//! };
//!
//! manager.stop().await;
//! runner.await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod error;
mod job_scope;
mod target_manager;


pub use backend::{DefaultBackend, DiscoveryEngine, JobBackend, WorkerGroup};
pub use error::ManagerError;
pub use target_manager::{ManagerStatus, TargetManager};
