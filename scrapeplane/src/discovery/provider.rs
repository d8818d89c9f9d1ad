//! Provider trait and provider-set construction.

use super::static_provider::StaticProvider;
use crate::config::DiscoveryConfig;
use crate::target::TargetGroup;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Boxed future returned by [`TargetProvider::run`].
pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A source of target groups.
///
/// `run` sends full or partial group lists on `updates` whenever its view
/// changes, and returns once `cancel` fires. A group with the same source
/// as an earlier one replaces it; a group with no targets clears it.
pub trait TargetProvider: Send + Sync + 'static {
    fn run(
        &self,
        cancel: CancellationToken,
        updates: mpsc::Sender<Vec<TargetGroup>>,
    ) -> ProviderFuture<'_>;
}

/// Named providers for one job. Names are unique within a job.
pub type ProviderSet = BTreeMap<String, Arc<dyn TargetProvider>>;

/// Builds the providers described by a job's discovery config.
///
/// All static groups go to a single provider named `static/0`.
pub fn providers_from_config(config: &DiscoveryConfig) -> ProviderSet {
    let mut providers = ProviderSet::new();
    if !config.static_configs.is_empty() {
        providers.insert(
            "static/0".to_string(),
            Arc::new(StaticProvider::new(config.static_configs.clone())) as Arc<dyn TargetProvider>,
        );
    }
    providers
}
