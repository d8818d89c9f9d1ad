//! Merges provider output and feeds it to a sink.

use super::provider::ProviderSet;
use crate::log::Logger;
use crate::target::TargetGroup;
use crate::{log_debug, log_warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Buffer size of the channel carrying provider updates.
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Receives the merged target groups of a job.
///
/// `sync` is always called with the complete current view.
pub trait TargetSink: Send + Sync + 'static {
    fn sync(&self, groups: Vec<TargetGroup>);
}

struct ProviderUpdate {
    generation: u64,
    provider: String,
    groups: Vec<TargetGroup>,
}

/// Groups by provider, then by source.
type GroupIndex = BTreeMap<String, BTreeMap<String, TargetGroup>>;

/// Runs the providers of one job and keeps a sink in sync with them.
///
/// Providers may be replaced at any time, including before [`run`] starts;
/// the latest set wins. Updates from a replaced provider set are ignored.
///
/// [`run`]: TargetSet::run
pub struct TargetSet<S: TargetSink> {
    sink: Arc<S>,
    pending: Mutex<Option<ProviderSet>>,
    providers_changed: Notify,
    logger: Arc<dyn Logger>,
}

impl<S: TargetSink> TargetSet<S> {
    pub fn new(sink: Arc<S>, logger: Arc<dyn Logger>) -> Self {
        Self {
            sink,
            pending: Mutex::new(None),
            providers_changed: Notify::new(),
            logger,
        }
    }

    /// Replaces the provider set.
    pub fn update_providers(&self, providers: ProviderSet) {
        *self.pending.lock() = Some(providers);
        self.providers_changed.notify_one();
    }

    /// Runs providers and forwards their groups until `scope` is cancelled.
    ///
    /// Returns once every provider it started has finished.
    pub async fn run(&self, scope: CancellationToken) {
        let (tx, mut rx) = mpsc::channel::<ProviderUpdate>(UPDATE_CHANNEL_CAPACITY);
        let providers = TaskTracker::new();
        let mut index = GroupIndex::new();
        let mut generation = 0u64;
        let mut running: Option<CancellationToken> = None;

        loop {
            tokio::select! {
                biased;
                _ = scope.cancelled() => break,
                _ = self.providers_changed.notified() => {
                    self.restart_providers(
                        &scope,
                        &providers,
                        &tx,
                        &mut generation,
                        &mut running,
                        &mut index,
                    );
                }
                Some(update) = rx.recv() => {
                    if update.generation != generation {
                        continue;
                    }
                    merge(&mut index, update.provider, update.groups);
                    self.sink.sync(flatten(&index));
                }
            }
        }

        if let Some(token) = running {
            token.cancel();
        }
        drop(rx);
        providers.close();
        providers.wait().await;
        log_debug!(self.logger, "Target set stopped");
    }

    fn restart_providers(
        &self,
        scope: &CancellationToken,
        tracker: &TaskTracker,
        tx: &mpsc::Sender<ProviderUpdate>,
        generation: &mut u64,
        running: &mut Option<CancellationToken>,
        index: &mut GroupIndex,
    ) {
        let Some(providers) = self.pending.lock().take() else {
            return;
        };

        if let Some(token) = running.take() {
            token.cancel();
        }
        *generation += 1;
        index.clear();

        log_debug!(
            self.logger,
            "Starting {} provider(s), generation {}",
            providers.len(),
            generation
        );

        if providers.is_empty() {
            self.sink.sync(Vec::new());
            return;
        }

        let token = scope.child_token();
        for (name, provider) in providers {
            let token = token.clone();
            let tx = tx.clone();
            let generation = *generation;
            let logger = Arc::clone(&self.logger);
            tracker.spawn(async move {
                let (provider_tx, mut provider_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
                let forward = async {
                    while let Some(groups) = provider_rx.recv().await {
                        let update = ProviderUpdate {
                            generation,
                            provider: name.clone(),
                            groups,
                        };
                        if tx.send(update).await.is_err() {
                            break;
                        }
                    }
                };
                tokio::join!(provider.run(token.clone(), provider_tx), forward);
                if !token.is_cancelled() {
                    log_warn!(logger, "Provider {} stopped on its own", name);
                }
            });
        }
        *running = Some(token);
    }
}

fn merge(index: &mut GroupIndex, provider: String, groups: Vec<TargetGroup>) {
    let by_source = index.entry(provider).or_default();
    for group in groups {
        if group.is_empty() {
            by_source.remove(&group.source);
        } else {
            by_source.insert(group.source.clone(), group);
        }
    }
}

fn flatten(index: &GroupIndex) -> Vec<TargetGroup> {
    index
        .values()
        .flat_map(|by_source| by_source.values().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{ProviderFuture, StaticProvider, TargetProvider};
    use crate::log::NoOpLogger;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        syncs: Mutex<Vec<Vec<TargetGroup>>>,
    }

    impl RecordingSink {
        fn last(&self) -> Option<Vec<TargetGroup>> {
            self.syncs.lock().last().cloned()
        }

        fn count(&self) -> usize {
            self.syncs.lock().len()
        }
    }

    impl TargetSink for RecordingSink {
        fn sync(&self, groups: Vec<TargetGroup>) {
            self.syncs.lock().push(groups);
        }
    }

    /// Provider that sends whatever the test pushes through it.
    struct ScriptedProvider {
        script: Mutex<Option<mpsc::Receiver<Vec<TargetGroup>>>>,
    }

    impl ScriptedProvider {
        fn new() -> (Self, mpsc::Sender<Vec<TargetGroup>>) {
            let (tx, rx) = mpsc::channel(8);
            (
                Self {
                    script: Mutex::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl TargetProvider for ScriptedProvider {
        fn run(
            &self,
            cancel: CancellationToken,
            updates: mpsc::Sender<Vec<TargetGroup>>,
        ) -> ProviderFuture<'_> {
            let script = self.script.lock().take();
            Box::pin(async move {
                let Some(mut script) = script else {
                    return cancel.cancelled().await;
                };
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        next = script.recv() => match next {
                            Some(groups) => {
                                let _ = updates.send(groups).await;
                            }
                            None => return cancel.cancelled().await,
                        }
                    }
                }
            })
        }
    }

    fn static_set(addresses: &[&str]) -> ProviderSet {
        let groups = addresses
            .iter()
            .map(|a| TargetGroup::new("").with_address(a))
            .collect();
        let mut set = ProviderSet::new();
        set.insert(
            "static/0".into(),
            Arc::new(StaticProvider::new(groups)) as Arc<dyn TargetProvider>,
        );
        set
    }

    async fn wait_for(cond: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn addresses(groups: &[TargetGroup]) -> Vec<String> {
        let mut out: Vec<String> = groups
            .iter()
            .flat_map(|g| g.targets.iter())
            .filter_map(|t| t.get("__address__").map(str::to_string))
            .collect();
        out.sort();
        out
    }

    #[tokio::test]
    async fn test_providers_set_before_run_are_started() {
        let sink = Arc::new(RecordingSink::default());
        let set = Arc::new(TargetSet::new(sink.clone(), Arc::new(NoOpLogger)));
        set.update_providers(static_set(&["a:1", "b:1"]));

        let scope = CancellationToken::new();
        let run = {
            let set = set.clone();
            let scope = scope.clone();
            tokio::spawn(async move { set.run(scope).await })
        };

        wait_for(|| sink.count() > 0).await;
        assert_eq!(addresses(&sink.last().unwrap()), vec!["a:1", "b:1"]);

        scope.cancel();
        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_replacing_providers_replaces_targets() {
        let sink = Arc::new(RecordingSink::default());
        let set = Arc::new(TargetSet::new(sink.clone(), Arc::new(NoOpLogger)));
        let scope = CancellationToken::new();
        let _run = {
            let set = set.clone();
            let scope = scope.clone();
            tokio::spawn(async move { set.run(scope).await })
        };

        set.update_providers(static_set(&["a:1"]));
        wait_for(|| sink.last().map(|g| addresses(&g)) == Some(vec!["a:1".into()])).await;

        set.update_providers(static_set(&["c:1"]));
        wait_for(|| sink.last().map(|g| addresses(&g)) == Some(vec!["c:1".into()])).await;

        scope.cancel();
    }

    #[tokio::test]
    async fn test_empty_provider_set_clears_sink() {
        let sink = Arc::new(RecordingSink::default());
        let set = Arc::new(TargetSet::new(sink.clone(), Arc::new(NoOpLogger)));
        let scope = CancellationToken::new();
        let _run = {
            let set = set.clone();
            let scope = scope.clone();
            tokio::spawn(async move { set.run(scope).await })
        };

        set.update_providers(static_set(&["a:1"]));
        wait_for(|| sink.last().map(|g| !g.is_empty()).unwrap_or(false)).await;

        set.update_providers(ProviderSet::new());
        wait_for(|| sink.last().map(|g| g.is_empty()).unwrap_or(false)).await;

        scope.cancel();
    }

    #[tokio::test]
    async fn test_groups_merge_by_source() {
        let sink = Arc::new(RecordingSink::default());
        let set = Arc::new(TargetSet::new(sink.clone(), Arc::new(NoOpLogger)));
        let (provider, script) = ScriptedProvider::new();
        let mut providers = ProviderSet::new();
        providers.insert("scripted".into(), Arc::new(provider) as Arc<dyn TargetProvider>);
        set.update_providers(providers);

        let scope = CancellationToken::new();
        let _run = {
            let set = set.clone();
            let scope = scope.clone();
            tokio::spawn(async move { set.run(scope).await })
        };

        script
            .send(vec![
                TargetGroup::new("x").with_address("a:1"),
                TargetGroup::new("y").with_address("b:1"),
            ])
            .await
            .unwrap();
        wait_for(|| sink.last().map(|g| g.len() == 2).unwrap_or(false)).await;

        // Replace x, clear y.
        script
            .send(vec![
                TargetGroup::new("x").with_address("c:1"),
                TargetGroup::new("y"),
            ])
            .await
            .unwrap();
        wait_for(|| sink.last().map(|g| addresses(&g)) == Some(vec!["c:1".into()])).await;

        scope.cancel();
    }

    /// Provider that takes a while to wind down after cancellation.
    struct LingeringProvider {
        finished: Arc<std::sync::atomic::AtomicBool>,
    }

    impl TargetProvider for LingeringProvider {
        fn run(
            &self,
            cancel: CancellationToken,
            _updates: mpsc::Sender<Vec<TargetGroup>>,
        ) -> ProviderFuture<'_> {
            let finished = Arc::clone(&self.finished);
            Box::pin(async move {
                cancel.cancelled().await;
                tokio::time::sleep(Duration::from_millis(100)).await;
                finished.store(true, std::sync::atomic::Ordering::SeqCst);
            })
        }
    }

    #[tokio::test]
    async fn test_run_waits_for_providers_to_finish() {
        let sink = Arc::new(RecordingSink::default());
        let set = Arc::new(TargetSet::new(sink, Arc::new(NoOpLogger)));
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut providers = ProviderSet::new();
        providers.insert(
            "lingering".into(),
            Arc::new(LingeringProvider {
                finished: Arc::clone(&finished),
            }) as Arc<dyn TargetProvider>,
        );
        set.update_providers(providers);

        let scope = CancellationToken::new();
        let run = {
            let set = set.clone();
            let scope = scope.clone();
            tokio::spawn(async move { set.run(scope).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        scope.cancel();
        tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .unwrap()
            .unwrap();
        assert!(finished.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_returns_on_cancel_without_providers() {
        let sink = Arc::new(RecordingSink::default());
        let set = TargetSet::new(sink.clone(), Arc::new(NoOpLogger));
        let scope = CancellationToken::new();
        scope.cancel();

        tokio::time::timeout(Duration::from_secs(1), set.run(scope))
            .await
            .unwrap();
        assert_eq!(sink.count(), 0);
    }
}
