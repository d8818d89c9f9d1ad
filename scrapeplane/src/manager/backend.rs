//! Seams between the coordinator and the components it drives.
//!
//! The coordinator never constructs worker groups or discovery engines
//! itself. A [`JobBackend`] builds them, which lets tests substitute
//! instrumented fakes.

use super::error::ManagerError;
use crate::config::{ConfigError, JobSpec};
use crate::discovery::{providers_from_config, ProviderSet, TargetSet, TargetSink};
use crate::log::Logger;
use crate::scrape::{NullScraper, ScrapePool, Scraper};
use crate::storage::Appendable;
use crate::target::PoolTargets;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The component that scrapes the targets of one job.
///
/// Receives target groups through [`TargetSink::sync`].
pub trait WorkerGroup: TargetSink {
    /// Applies a new job definition to the running group.
    fn reconfigure(&self, spec: &JobSpec) -> Result<(), ConfigError>;

    /// Stops all work and resolves once in-flight storage inserts finish.
    fn stop(&self) -> impl Future<Output = ()> + Send;

    /// Current targets, active first.
    fn targets(&self) -> PoolTargets;
}

/// The component that discovers targets for one job and feeds its group.
pub trait DiscoveryEngine: Send + Sync + 'static {
    /// Runs until `scope` is cancelled.
    fn run(&self, scope: CancellationToken) -> impl Future<Output = ()> + Send;

    /// Replaces the engine's providers. Callable before `run`.
    fn update_providers(&self, providers: ProviderSet);
}

/// Builds the per-job components.
///
/// # Example
///
/// ```ignore
/// let manager = TargetManager::with_backend(
///     DefaultBackend::new(Arc::new(my_scraper)),
///     Arc::new(storage),
///     logger,
/// );
/// ```
pub trait JobBackend: Send + Sync + 'static {
    type Group: WorkerGroup;
    type Discovery: DiscoveryEngine;

    /// Creates the worker group of a new job. `scope` is the job's
    /// cancellation scope.
    fn create_group(
        &self,
        scope: CancellationToken,
        spec: &JobSpec,
        appendable: Arc<dyn Appendable>,
        logger: Arc<dyn Logger>,
    ) -> Result<Arc<Self::Group>, ManagerError>;

    /// Creates the discovery engine feeding `group`.
    fn create_discovery(&self, group: Arc<Self::Group>, logger: Arc<dyn Logger>) -> Self::Discovery;

    /// Providers for a job definition.
    fn providers(&self, spec: &JobSpec) -> ProviderSet {
        providers_from_config(&spec.discovery)
    }
}

/// Backend building [`ScrapePool`]s fed by [`TargetSet`]s.
#[derive(Clone)]
pub struct DefaultBackend {
    scraper: Arc<dyn Scraper>,
}

impl DefaultBackend {
    pub fn new(scraper: Arc<dyn Scraper>) -> Self {
        Self { scraper }
    }
}

impl Default for DefaultBackend {
    fn default() -> Self {
        Self::new(Arc::new(NullScraper))
    }
}

impl JobBackend for DefaultBackend {
    type Group = ScrapePool;
    type Discovery = TargetSet<ScrapePool>;

    fn create_group(
        &self,
        scope: CancellationToken,
        spec: &JobSpec,
        appendable: Arc<dyn Appendable>,
        logger: Arc<dyn Logger>,
    ) -> Result<Arc<ScrapePool>, ManagerError> {
        let pool = ScrapePool::new(scope, spec, Arc::clone(&self.scraper), appendable, logger)?;
        Ok(Arc::new(pool))
    }

    fn create_discovery(&self, group: Arc<ScrapePool>, logger: Arc<dyn Logger>) -> TargetSet<ScrapePool> {
        TargetSet::new(group, logger)
    }
}

impl WorkerGroup for ScrapePool {
    fn reconfigure(&self, spec: &JobSpec) -> Result<(), ConfigError> {
        ScrapePool::reconfigure(self, spec)
    }

    async fn stop(&self) {
        ScrapePool::stop(self).await
    }

    fn targets(&self) -> PoolTargets {
        ScrapePool::targets(self)
    }
}

impl<S: TargetSink> DiscoveryEngine for TargetSet<S> {
    async fn run(&self, scope: CancellationToken) {
        TargetSet::run(self, scope).await
    }

    fn update_providers(&self, providers: ProviderSet) {
        TargetSet::update_providers(self, providers)
    }
}
