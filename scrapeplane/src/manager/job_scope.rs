use super::backend::{DiscoveryEngine, JobBackend, WorkerGroup};
use super::error::ManagerError;
use crate::config::JobSpec;
use crate::log::{ContextLogger, Logger};
use crate::storage::Appendable;
use crate::{log_debug, log_warn};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything the coordinator holds for one active job.
pub(crate) struct JobScope<B: JobBackend> {
    cancel: CancellationToken,
    group: Arc<B::Group>,
    discovery: Arc<B::Discovery>,
    logger: Arc<dyn Logger>,
}

impl<B: JobBackend> JobScope<B> {
    /// Builds the group and discovery engine of a new job under `root`.
    pub(crate) fn create(
        backend: &B,
        root: &CancellationToken,
        spec: &JobSpec,
        appendable: Arc<dyn Appendable>,
        logger: &Arc<dyn Logger>,
    ) -> Result<Self, ManagerError> {
        let logger: Arc<dyn Logger> = Arc::new(ContextLogger::new(
            Arc::clone(logger),
            "scrape_pool",
            &spec.job_name,
        ));
        let cancel = root.child_token();
        let group = backend.create_group(cancel.clone(), spec, appendable, Arc::clone(&logger))?;
        let discovery = Arc::new(backend.create_discovery(Arc::clone(&group), Arc::clone(&logger)));
        Ok(Self {
            cancel,
            group,
            discovery,
            logger,
        })
    }

    /// Background work of the job: discovery until the scope is cancelled,
    /// then a graceful stop of the group.
    pub(crate) fn background(&self) -> impl Future<Output = ()> + Send + 'static {
        let cancel = self.cancel.clone();
        let group = Arc::clone(&self.group);
        let discovery = Arc::clone(&self.discovery);
        let logger = Arc::clone(&self.logger);
        async move {
            discovery.run(cancel.clone()).await;
            if !cancel.is_cancelled() {
                log_warn!(logger, "Discovery ended before the job was cancelled");
            }
            group.stop().await;
            log_debug!(logger, "Job stopped");
        }
    }

    pub(crate) fn update(&self, spec: &JobSpec, backend: &B) -> Result<(), ManagerError> {
        let result = self.group.reconfigure(spec).map_err(ManagerError::from);
        self.discovery.update_providers(backend.providers(spec));
        result
    }

    pub(crate) fn update_providers(&self, spec: &JobSpec, backend: &B) {
        self.discovery.update_providers(backend.providers(spec));
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn group(&self) -> &B::Group {
        &self.group
    }
}
