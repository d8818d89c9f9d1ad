//! Scrape pool: the worker group of one job.

use super::scrape_loop::ScrapeLoop;
use super::scraper::Scraper;
use crate::config::{ConfigError, JobSpec};
use crate::discovery::TargetSink;
use crate::log::Logger;
use crate::storage::Appendable;
use crate::target::{targets_from_groups, PoolTargets, Target, TargetGroup, TargetStatus};
use crate::{log_debug, log_info, log_warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

struct RunningTarget {
    target: Arc<Target>,
    cancel: CancellationToken,
}

struct PoolState {
    spec: Arc<JobSpec>,
    groups: Vec<TargetGroup>,
    active: HashMap<u64, RunningTarget>,
    dropped: Vec<Arc<Target>>,
    stopped: bool,
}

/// Runs one scrape loop per active target of a job.
///
/// Loops are children of the job scope, so cancelling the scope stops
/// them too; [`stop`](ScrapePool::stop) additionally waits for them.
pub struct ScrapePool {
    scope: CancellationToken,
    scraper: Arc<dyn Scraper>,
    appendable: Arc<dyn Appendable>,
    logger: Arc<dyn Logger>,
    state: RwLock<PoolState>,
    loops: TaskTracker,
}

impl ScrapePool {
    /// Creates an empty pool. Fails if `spec` is invalid.
    pub fn new(
        scope: CancellationToken,
        spec: &JobSpec,
        scraper: Arc<dyn Scraper>,
        appendable: Arc<dyn Appendable>,
        logger: Arc<dyn Logger>,
    ) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Self {
            scope,
            scraper,
            appendable,
            logger,
            state: RwLock::new(PoolState {
                spec: Arc::new(spec.clone()),
                groups: Vec::new(),
                active: HashMap::new(),
                dropped: Vec::new(),
                stopped: false,
            }),
            loops: TaskTracker::new(),
        })
    }

    /// Name of the job this pool scrapes.
    pub fn job_name(&self) -> String {
        self.state.read().spec.job_name.clone()
    }

    /// Current job definition.
    pub fn spec(&self) -> Arc<JobSpec> {
        Arc::clone(&self.state.read().spec)
    }

    /// Number of running scrape loops.
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Applies a new job definition.
    ///
    /// Every loop restarts with the new parameters. Targets that survive
    /// relabeling keep their identity and scrape state.
    pub fn reconfigure(&self, spec: &JobSpec) -> Result<(), ConfigError> {
        spec.validate()?;
        let mut state = self.state.write();
        if state.stopped {
            log_warn!(self.logger, "Ignoring reconfigure of stopped scrape pool");
            return Ok(());
        }
        state.spec = Arc::new(spec.clone());
        let groups = std::mem::take(&mut state.groups);
        self.apply_groups(&mut state, groups, true);
        log_info!(self.logger, "Reconfigured with {} target(s)", state.active.len());
        Ok(())
    }

    /// Stops every loop and waits for them to finish.
    ///
    /// The pool ignores target updates afterwards.
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            state.stopped = true;
            for running in state.active.values() {
                running.cancel.cancel();
            }
        }
        self.loops.close();
        self.loops.wait().await;
        log_debug!(self.logger, "Scrape pool stopped");
    }

    /// Active targets sorted by URL, then dropped ones.
    pub fn targets(&self) -> PoolTargets {
        let state = self.state.read();
        let mut active: Vec<TargetStatus> =
            state.active.values().map(|r| r.target.status()).collect();
        active.sort_by(|a, b| a.url.cmp(&b.url));
        PoolTargets {
            active,
            dropped: state.dropped.iter().map(|t| t.status()).collect(),
        }
    }

    fn apply_groups(&self, state: &mut PoolState, groups: Vec<TargetGroup>, restart: bool) {
        let derived = targets_from_groups(&state.spec, &groups);
        for error in &derived.errors {
            log_warn!(self.logger, "Skipping target: {}", error);
        }

        let mut next: HashMap<u64, RunningTarget> = HashMap::with_capacity(derived.active.len());
        for target in derived.active {
            let fingerprint = target.fingerprint();
            if next.contains_key(&fingerprint) {
                continue;
            }
            let running = match state.active.remove(&fingerprint) {
                Some(running) if restart => {
                    running.cancel.cancel();
                    self.start_loop(running.target, &state.spec)
                }
                Some(running) => running,
                None => self.start_loop(Arc::new(target), &state.spec),
            };
            next.insert(fingerprint, running);
        }

        for (_, gone) in state.active.drain() {
            gone.cancel.cancel();
        }

        log_debug!(
            self.logger,
            "Synced {} active, {} dropped target(s)",
            next.len(),
            derived.dropped.len()
        );
        state.active = next;
        state.dropped = derived.dropped.into_iter().map(Arc::new).collect();
        state.groups = groups;
    }

    fn start_loop(&self, target: Arc<Target>, spec: &Arc<JobSpec>) -> RunningTarget {
        let cancel = self.scope.child_token();
        let scrape_loop = ScrapeLoop::new(
            Arc::clone(&target),
            Arc::clone(spec),
            Arc::clone(&self.scraper),
            Arc::clone(&self.appendable),
        );
        self.loops.spawn(scrape_loop.run(cancel.clone()));
        RunningTarget { target, cancel }
    }
}

impl TargetSink for ScrapePool {
    fn sync(&self, groups: Vec<TargetGroup>) {
        let mut state = self.state.write();
        if state.stopped {
            log_debug!(self.logger, "Ignoring target update after stop");
            return;
        }
        self.apply_groups(&mut state, groups, false);
    }
}
