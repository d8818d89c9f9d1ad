//! Scrape targets and their observable state.

use super::labels::LabelSet;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors turning discovered labels into a target.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// No usable `__address__` after relabeling.
    #[error("target has no address label: {labels}")]
    MissingAddress { labels: LabelSet },

    /// The address is not a plain `host:port`.
    #[error("invalid target address '{address}'")]
    InvalidAddress { address: String },
}

/// Result of the most recent scrape of a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetHealth {
    /// Not scraped yet.
    #[default]
    Unknown,
    /// Last scrape succeeded.
    Up,
    /// Last scrape failed.
    Down,
}

impl fmt::Display for TargetHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "unknown",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.pad(s)
    }
}

#[derive(Debug, Default)]
struct ScrapeState {
    health: TargetHealth,
    last_error: Option<String>,
    last_scrape: Option<DateTime<Utc>>,
    last_duration: Option<Duration>,
}

/// A scrape target.
///
/// Labels are fixed at construction; the scrape state is updated by the
/// target's scrape loop and read concurrently by snapshot queries.
#[derive(Debug)]
pub struct Target {
    labels: LabelSet,
    discovered_labels: LabelSet,
    url: String,
    fingerprint: u64,
    state: RwLock<ScrapeState>,
}

impl Target {
    /// Creates an active target.
    pub fn new(labels: LabelSet, discovered_labels: LabelSet, url: String) -> Self {
        let fingerprint = labels.clone().with("__url__", url.as_str()).fingerprint();
        Self {
            labels,
            discovered_labels,
            url,
            fingerprint,
            state: RwLock::new(ScrapeState::default()),
        }
    }

    /// Creates a placeholder for a target that relabeling dropped.
    pub fn dropped(discovered_labels: LabelSet) -> Self {
        let fingerprint = discovered_labels.fingerprint();
        Self {
            labels: LabelSet::new(),
            discovered_labels,
            url: String::new(),
            fingerprint,
            state: RwLock::new(ScrapeState::default()),
        }
    }

    /// Final labels attached to every sample scraped from this target.
    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Labels as discovered, before relabeling.
    pub fn discovered_labels(&self) -> &LabelSet {
        &self.discovered_labels
    }

    /// Scrape URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Identity of the target within its pool.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Deterministic delay before the first scrape, spreading targets
    /// across the interval.
    pub fn offset(&self, interval: Duration) -> Duration {
        let interval_ms = interval.as_millis() as u64;
        if interval_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.fingerprint % interval_ms)
    }

    /// Current health.
    pub fn health(&self) -> TargetHealth {
        self.state.read().health
    }

    /// Records the outcome of a scrape.
    pub fn report(&self, started: DateTime<Utc>, duration: Duration, error: Option<String>) {
        let mut state = self.state.write();
        state.health = if error.is_none() {
            TargetHealth::Up
        } else {
            TargetHealth::Down
        };
        state.last_error = error;
        state.last_scrape = Some(started);
        state.last_duration = Some(duration);
    }

    /// Point-in-time copy of the target.
    pub fn status(&self) -> TargetStatus {
        let state = self.state.read();
        TargetStatus {
            labels: self.labels.clone(),
            discovered_labels: self.discovered_labels.clone(),
            url: self.url.clone(),
            health: state.health,
            last_error: state.last_error.clone(),
            last_scrape: state.last_scrape,
            last_duration: state.last_duration,
        }
    }
}

/// Owned snapshot of a [`Target`], as returned by manager queries.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStatus {
    /// Final labels; empty for dropped targets.
    pub labels: LabelSet,
    /// Labels before relabeling.
    pub discovered_labels: LabelSet,
    /// Scrape URL; empty for dropped targets.
    pub url: String,
    /// Health after the last scrape.
    pub health: TargetHealth,
    /// Error of the last scrape, if it failed.
    pub last_error: Option<String>,
    /// Start time of the last scrape.
    pub last_scrape: Option<DateTime<Utc>>,
    /// Duration of the last scrape.
    pub last_duration: Option<Duration>,
}

impl TargetStatus {
    /// Returns true for targets that relabeling dropped.
    pub fn is_dropped(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Targets of one worker group at a point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolTargets {
    /// Targets being scraped.
    pub active: Vec<TargetStatus>,
    /// Targets removed by relabeling.
    pub dropped: Vec<TargetStatus>,
}

impl PoolTargets {
    /// Active targets followed by dropped ones.
    pub fn into_all(self) -> Vec<TargetStatus> {
        let mut all = self.active;
        all.extend(self.dropped);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target::new(
            LabelSet::from([("instance", "a:9100"), ("job", "node")]),
            LabelSet::from([("__address__", "a:9100")]),
            "http://a:9100/metrics".to_string(),
        )
    }

    #[test]
    fn test_new_target_is_unknown() {
        let status = target().status();
        assert_eq!(status.health, TargetHealth::Unknown);
        assert!(status.last_scrape.is_none());
        assert!(!status.is_dropped());
    }

    #[test]
    fn test_report_updates_state() {
        let t = target();
        let now = Utc::now();

        t.report(now, Duration::from_millis(12), Some("connection refused".into()));
        let status = t.status();
        assert_eq!(status.health, TargetHealth::Down);
        assert_eq!(status.last_error.as_deref(), Some("connection refused"));
        assert_eq!(status.last_scrape, Some(now));

        t.report(now, Duration::from_millis(3), None);
        assert_eq!(t.health(), TargetHealth::Up);
        assert!(t.status().last_error.is_none());
    }

    #[test]
    fn test_offset_within_interval() {
        let t = target();
        let interval = Duration::from_secs(15);
        assert!(t.offset(interval) < interval);
        assert_eq!(t.offset(interval), t.offset(interval));
        assert_eq!(t.offset(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_dropped_target_status() {
        let t = Target::dropped(LabelSet::from([("__address__", "x:1")]));
        let status = t.status();
        assert!(status.is_dropped());
        assert_eq!(status.discovered_labels.get("__address__"), Some("x:1"));
        assert_eq!(status.url, "");
    }

    #[test]
    fn test_fingerprint_depends_on_url() {
        let a = target();
        let b = Target::new(
            a.labels().clone(),
            a.discovered_labels().clone(),
            "https://a:9100/metrics".to_string(),
        );
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
