//! Scrapeplane - reconciliation and lifecycle for metrics scrape jobs
//!
//! This library keeps a set of scrape jobs running in step with a job
//! configuration that may be replaced at any time.
//!
//! # High-Level API
//!
//! The [`manager`] module provides the coordinator:
//!
//! ```ignore
//! use scrapeplane::manager::TargetManager;
//!
//! let manager = Arc::new(TargetManager::new(storage, logger));
//! manager.apply_config(jobs)?;
//! tokio::spawn({ let m = manager.clone(); async move { m.run().await } });
//!
//! // Later, on reload
//! manager.apply_config(new_jobs)?;
//!
//! // On shutdown: waits until in-flight inserts have landed
//! manager.stop().await;
//! ```
//!
//! The remaining modules are the parts a job is made of: discovered
//! [`target`]s, [`discovery`] providers, [`scrape`] pools and the
//! [`storage`] sink they write to.

pub mod config;
pub mod discovery;
pub mod log;
pub mod logging;
pub mod manager;
pub mod scrape;
pub mod storage;
pub mod target;

/// Version of the Scrapeplane library and CLI.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
