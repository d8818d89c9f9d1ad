//! The reconciliation coordinator.

use super::backend::{DefaultBackend, JobBackend, WorkerGroup};
use super::error::ManagerError;
use super::job_scope::JobScope;
use crate::config::JobSpec;
use crate::log::Logger;
use crate::storage::Appendable;
use crate::target::TargetStatus;
use crate::{log_debug, log_error, log_info};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Lifecycle of a [`TargetManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerStatus {
    /// Constructed, `run` not yet called.
    Created,
    /// Jobs are being reconciled and run.
    Running,
    /// `stop` is draining jobs.
    Stopping,
    /// Every job has finished.
    Stopped,
}

impl fmt::Display for ManagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.pad(s)
    }
}

struct ManagerState<B: JobBackend> {
    /// Set once `run` starts. Parent of every job scope.
    root: Option<CancellationToken>,
    runtime: Option<Handle>,
    jobs: Vec<JobSpec>,
    scopes: HashMap<String, JobScope<B>>,
}

/// Keeps one running job per configured job definition.
///
/// The manager owns the desired job list and a map from job name to the
/// job's scope. Every reconcile creates scopes for new jobs, reconfigures
/// existing ones and cancels those no longer listed. Background work of
/// every job is tracked so that [`stop`](Self::stop) can wait for it.
///
/// # Lifecycle
///
/// ```text
/// new ──► apply_config* ──► run ──► apply_config* ──► stop
///                            │                          │
///                            └── returns once stop ◄────┘
///                                has drained all jobs
/// ```
///
/// `apply_config` before `run` only records the job list. Once running it
/// may be called from any thread, inside a runtime or not. `stop` may be
/// called before `run`; it waits until `run` has started and reconciled.
///
/// A job whose discovery ends on its own has its group stopped but keeps
/// its entry. It stays inert, ignoring reconfiguration, until a reload
/// removes it; listing it again afterwards starts it afresh.
pub struct TargetManager<B: JobBackend = DefaultBackend> {
    backend: B,
    appendable: Arc<dyn Appendable>,
    logger: Arc<dyn Logger>,
    state: RwLock<ManagerState<B>>,
    tracker: TaskTracker,
    status: watch::Sender<ManagerStatus>,
}

impl<B: JobBackend + Default> TargetManager<B> {
    /// Creates a manager with the default-constructed backend.
    pub fn new(appendable: Arc<dyn Appendable>, logger: Arc<dyn Logger>) -> Self {
        Self::with_backend(B::default(), appendable, logger)
    }
}

impl<B: JobBackend> TargetManager<B> {
    /// Creates a manager that builds job components with `backend`.
    pub fn with_backend(backend: B, appendable: Arc<dyn Appendable>, logger: Arc<dyn Logger>) -> Self {
        let (status, _) = watch::channel(ManagerStatus::Created);
        Self {
            backend,
            appendable,
            logger,
            state: RwLock::new(ManagerState {
                root: None,
                runtime: None,
                jobs: Vec::new(),
                scopes: HashMap::new(),
            }),
            tracker: TaskTracker::new(),
            status,
        }
    }

    /// Starts every configured job and runs until [`stop`](Self::stop)
    /// has drained them.
    ///
    /// Calling `run` a second time logs an error and returns.
    pub async fn run(&self) {
        {
            let mut state = self.state.write();
            if state.root.is_some() {
                log_error!(self.logger, "Target manager already started");
                return;
            }
            log_info!(self.logger, "Starting target manager...");
            state.root = Some(CancellationToken::new());
            state.runtime = Some(Handle::current());
            self.reload(&mut state);
        }
        self.status.send_replace(ManagerStatus::Running);

        self.tracker.wait().await;
        log_debug!(self.logger, "Target manager run finished");
    }

    /// Cancels every job and waits until their groups have stopped.
    ///
    /// If `run` has not started yet, waits for it first so that jobs it
    /// creates are not left behind.
    pub async fn stop(&self) {
        let mut status = self.status.subscribe();
        if status
            .wait_for(|s| *s != ManagerStatus::Created)
            .await
            .is_err()
        {
            return;
        }

        log_info!(self.logger, "Stopping target manager...");
        {
            let state = self.state.read();
            if let Some(root) = &state.root {
                root.cancel();
            }
        }
        self.status.send_if_modified(|s| {
            if *s == ManagerStatus::Running {
                *s = ManagerStatus::Stopping;
                true
            } else {
                false
            }
        });

        self.tracker.close();
        self.tracker.wait().await;

        self.status.send_replace(ManagerStatus::Stopped);
        log_info!(self.logger, "Target manager stopped");
    }

    /// Replaces the desired job list and reconciles if running.
    ///
    /// Jobs whose components cannot be built are logged and skipped; the
    /// remaining jobs still converge. Duplicate names resolve to the last
    /// definition.
    pub fn apply_config(&self, jobs: Vec<JobSpec>) -> Result<(), ManagerError> {
        let mut state = self.state.write();
        state.jobs = jobs;
        if state.root.is_some() {
            self.reload(&mut state);
        }
        Ok(())
    }

    /// All targets grouped by job name, active then dropped per job.
    ///
    /// Every active job has an entry, even with no targets.
    pub fn target_map(&self) -> HashMap<String, Vec<TargetStatus>> {
        let state = self.state.read();
        state
            .scopes
            .iter()
            .map(|(name, scope)| (name.clone(), scope.group().targets().into_all()))
            .collect()
    }

    /// Active targets of every job.
    pub fn targets(&self) -> Vec<TargetStatus> {
        let state = self.state.read();
        state
            .scopes
            .values()
            .flat_map(|scope| scope.group().targets().active)
            .collect()
    }

    /// Names of the active jobs, sorted.
    pub fn job_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.read().scopes.keys().cloned().collect();
        names.sort();
        names
    }

    /// The most recently applied job list.
    pub fn config(&self) -> Vec<JobSpec> {
        self.state.read().jobs.clone()
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ManagerStatus {
        *self.status.borrow()
    }

    /// Number of jobs whose background work has not finished.
    pub fn outstanding(&self) -> usize {
        self.tracker.len()
    }

    /// Brings the scope map in line with `state.jobs`.
    fn reload(&self, state: &mut ManagerState<B>) {
        let (Some(root), Some(runtime)) = (state.root.clone(), state.runtime.clone()) else {
            return;
        };
        // Worker groups spawn scrape loops while reconfiguring; the caller
        // may not be on a runtime thread.
        let _runtime = runtime.enter();

        let jobs = dedup_last_wins(&state.jobs);
        for spec in &jobs {
            match state.scopes.get(&spec.job_name) {
                Some(scope) => {
                    if let Err(e) = scope.update(spec, &self.backend) {
                        log_error!(
                            self.logger,
                            "Error reconfiguring job {}, keeping previous settings: {}",
                            spec.job_name,
                            e
                        );
                    }
                }
                None => {
                    let scope = match JobScope::create(
                        &self.backend,
                        &root,
                        spec,
                        Arc::clone(&self.appendable),
                        &self.logger,
                    ) {
                        Ok(scope) => scope,
                        Err(e) => {
                            log_error!(self.logger, "Error creating job {}: {}", spec.job_name, e);
                            continue;
                        }
                    };
                    scope.update_providers(spec, &self.backend);
                    self.tracker.spawn_on(scope.background(), &runtime);
                    log_info!(self.logger, "Started job {}", spec.job_name);
                    state.scopes.insert(spec.job_name.clone(), scope);
                }
            }
        }

        let wanted: HashSet<&str> = jobs.iter().map(|j| j.job_name.as_str()).collect();
        state.scopes.retain(|name, scope| {
            if wanted.contains(name.as_str()) {
                return true;
            }
            scope.cancel();
            log_info!(self.logger, "Removed job {}", name);
            false
        });
    }
}

/// Keeps the last definition of each job name, in first-seen order.
fn dedup_last_wins(jobs: &[JobSpec]) -> Vec<JobSpec> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<JobSpec> = Vec::with_capacity(jobs.len());
    for spec in jobs {
        match position.get(spec.job_name.as_str()) {
            Some(&i) => out[i] = spec.clone(),
            None => {
                position.insert(spec.job_name.as_str(), out.len());
                out.push(spec.clone());
            }
        }
    }
    out
}
