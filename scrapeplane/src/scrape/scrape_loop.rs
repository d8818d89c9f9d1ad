//! Per-target scrape loop.

use super::scraper::{ScrapeError, Scraper};
use crate::config::JobSpec;
use crate::storage::{Appendable, Appender, Sample, METRIC_NAME_LABEL};
use crate::target::{LabelSet, Target};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Series recording whether the last scrape succeeded.
pub const UP_METRIC: &str = "up";

/// Series recording how long the last scrape took.
pub const SCRAPE_DURATION_METRIC: &str = "scrape_duration_seconds";

/// Series recording how many samples the target returned.
pub const SAMPLES_SCRAPED_METRIC: &str = "scrape_samples_scraped";

/// Prefix for scraped labels that clash with target labels.
pub const EXPORTED_LABEL_PREFIX: &str = "exported_";

/// Scrapes one target on the job's interval until cancelled.
///
/// A scrape in progress is abandoned as soon as the token fires; the
/// storage insert that follows a completed scrape is never interrupted.
pub(crate) struct ScrapeLoop {
    target: Arc<Target>,
    spec: Arc<JobSpec>,
    scraper: Arc<dyn Scraper>,
    appendable: Arc<dyn Appendable>,
}

impl ScrapeLoop {
    pub(crate) fn new(
        target: Arc<Target>,
        spec: Arc<JobSpec>,
        scraper: Arc<dyn Scraper>,
        appendable: Arc<dyn Appendable>,
    ) -> Self {
        Self {
            target,
            spec,
            scraper,
            appendable,
        }
    }

    pub(crate) async fn run(self, cancel: CancellationToken) {
        let interval = self.spec.scrape_interval;
        let offset = self.target.offset(interval);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(offset) => {}
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if !self.scrape_once(&cancel).await {
                break;
            }
        }

        debug!(job = %self.spec.job_name, target = %self.target.url(), "Scrape loop stopped");
    }

    /// Runs one cycle. Returns false if cancellation cut the scrape short.
    async fn scrape_once(&self, cancel: &CancellationToken) -> bool {
        let timeout = self.spec.scrape_timeout;
        let started = Utc::now();
        let clock = Instant::now();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            r = tokio::time::timeout(timeout, self.scraper.scrape(&self.target, timeout)) => {
                r.unwrap_or(Err(ScrapeError::Timeout(timeout)))
            }
        };
        let duration = clock.elapsed();

        let outcome = self.append(result, started, duration);
        if let Err(e) = &outcome {
            debug!(
                job = %self.spec.job_name,
                target = %self.target.url(),
                error = %e,
                "Scrape failed"
            );
        }
        self.target
            .report(started, duration, outcome.err().map(|e| e.to_string()));
        true
    }

    /// Stores scraped and report samples as one batch.
    fn append(
        &self,
        result: Result<Vec<Sample>, ScrapeError>,
        started: DateTime<Utc>,
        duration: Duration,
    ) -> Result<(), ScrapeError> {
        let timestamp_ms = started.timestamp_millis();
        let mut app = self.appendable.appender()?;

        let scraped = result.as_ref().map(Vec::len).unwrap_or(0);
        let outcome = match result {
            Ok(samples) => self.add_scraped(app.as_mut(), samples, timestamp_ms),
            Err(e) => Err(e),
        };

        // Scraped samples from a failed cycle must not be committed.
        if outcome.is_err() {
            app.rollback();
            app = self.appendable.appender()?;
        }

        let up = if outcome.is_ok() { 1.0 } else { 0.0 };
        let labels = self.target.labels();
        for (name, value) in [
            (UP_METRIC, up),
            (SCRAPE_DURATION_METRIC, duration.as_secs_f64()),
            (SAMPLES_SCRAPED_METRIC, scraped as f64),
        ] {
            let sample = Sample {
                labels: labels.clone().with(METRIC_NAME_LABEL, name),
                value,
                timestamp_ms,
            };
            if let Err(e) = app.add(sample) {
                warn!(job = %self.spec.job_name, error = %e, "Report sample rejected");
            }
        }

        app.commit()?;
        outcome
    }

    fn add_scraped(
        &self,
        app: &mut dyn Appender,
        samples: Vec<Sample>,
        timestamp_ms: i64,
    ) -> Result<(), ScrapeError> {
        let limit = self.spec.sample_limit;
        if limit > 0 && samples.len() > limit {
            return Err(ScrapeError::SampleLimitExceeded {
                limit,
                scraped: samples.len(),
            });
        }

        for mut sample in samples {
            sample.labels =
                attach_target_labels(sample.labels, self.target.labels(), self.spec.honor_labels);
            if sample.timestamp_ms == 0 {
                sample.timestamp_ms = timestamp_ms;
            }
            app.add(sample)?;
        }
        Ok(())
    }
}

/// Merges target labels into a scraped sample's labels.
///
/// With `honor_labels` the scraped value wins on a clash; otherwise the
/// scraped value moves to `exported_<name>` and the target value wins.
pub fn attach_target_labels(scraped: LabelSet, target: &LabelSet, honor_labels: bool) -> LabelSet {
    let mut out = scraped;
    for (name, value) in target.iter() {
        if honor_labels {
            out.insert_default(name, value);
            continue;
        }
        if let Some(existing) = out.remove(name) {
            if existing != value {
                out.insert(format!("{}{}", EXPORTED_LABEL_PREFIX, name), existing);
            }
        }
        out.insert(name, value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::scraper::ScrapeFuture;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::target::TargetHealth;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedScraper {
        samples: Vec<Sample>,
        calls: AtomicUsize,
    }

    impl Scraper for FixedScraper {
        fn scrape<'a>(&'a self, _target: &'a Target, _timeout: Duration) -> ScrapeFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let samples = self.samples.clone();
            Box::pin(async move { Ok(samples) })
        }
    }

    struct FailingScraper;

    impl Scraper for FailingScraper {
        fn scrape<'a>(&'a self, _target: &'a Target, _timeout: Duration) -> ScrapeFuture<'a> {
            Box::pin(async { Err(ScrapeError::Target("connection refused".into())) })
        }
    }

    struct HangingScraper;

    impl Scraper for HangingScraper {
        fn scrape<'a>(&'a self, _target: &'a Target, _timeout: Duration) -> ScrapeFuture<'a> {
            Box::pin(std::future::pending())
        }
    }

    fn target() -> Arc<Target> {
        Arc::new(Target::new(
            LabelSet::from([("instance", "a:1"), ("job", "node")]),
            LabelSet::new(),
            "http://a:1/metrics".into(),
        ))
    }

    fn make_loop(scraper: Arc<dyn Scraper>, spec: JobSpec, storage: &MemoryStorage) -> ScrapeLoop {
        ScrapeLoop::new(target(), Arc::new(spec), scraper, Arc::new(storage.clone()))
    }

    fn spec() -> JobSpec {
        JobSpec::new("node")
            .with_interval(Duration::from_millis(50))
            .with_timeout(Duration::from_millis(20))
    }

    #[test]
    fn test_attach_renames_clashing_labels() {
        let scraped = LabelSet::from([("__name__", "x"), ("job", "inner")]);
        let target = LabelSet::from([("job", "node")]);

        let out = attach_target_labels(scraped, &target, false);
        assert_eq!(out.get("job"), Some("node"));
        assert_eq!(out.get("exported_job"), Some("inner"));
    }

    #[test]
    fn test_attach_honor_labels_keeps_scraped() {
        let scraped = LabelSet::from([("__name__", "x"), ("job", "inner")]);
        let target = LabelSet::from([("job", "node"), ("instance", "a:1")]);

        let out = attach_target_labels(scraped, &target, true);
        assert_eq!(out.get("job"), Some("inner"));
        assert_eq!(out.get("instance"), Some("a:1"));
        assert!(!out.contains("exported_job"));
    }

    #[tokio::test]
    async fn test_successful_cycle_stores_samples_and_reports() {
        let storage = MemoryStorage::new();
        let scraper = Arc::new(FixedScraper {
            samples: vec![Sample::new("requests_total", 7.0, 0)],
            calls: AtomicUsize::new(0),
        });
        let lp = make_loop(scraper, spec(), &storage);

        assert!(lp.scrape_once(&CancellationToken::new()).await);

        let scraped = storage.series("requests_total");
        assert_eq!(scraped.len(), 1);
        assert_eq!(scraped[0].labels.get("job"), Some("node"));
        assert!(scraped[0].timestamp_ms > 0);
        assert_eq!(storage.series(UP_METRIC)[0].value, 1.0);
        assert_eq!(storage.series(SAMPLES_SCRAPED_METRIC)[0].value, 1.0);
        assert_eq!(lp.target.health(), TargetHealth::Up);
    }

    #[tokio::test]
    async fn test_failed_cycle_reports_down() {
        let storage = MemoryStorage::new();
        let lp = make_loop(Arc::new(FailingScraper), spec(), &storage);

        assert!(lp.scrape_once(&CancellationToken::new()).await);

        assert_eq!(storage.series(UP_METRIC)[0].value, 0.0);
        let status = lp.target.status();
        assert_eq!(status.health, TargetHealth::Down);
        assert_eq!(status.last_error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_sample_limit_rolls_back_scraped_samples() {
        let storage = MemoryStorage::new();
        let scraper = Arc::new(FixedScraper {
            samples: vec![Sample::new("a", 1.0, 0), Sample::new("b", 2.0, 0)],
            calls: AtomicUsize::new(0),
        });
        let lp = make_loop(scraper, spec().with_sample_limit(1), &storage);

        lp.scrape_once(&CancellationToken::new()).await;

        assert!(storage.series("a").is_empty());
        assert_eq!(storage.series(UP_METRIC)[0].value, 0.0);
        assert_eq!(storage.series(SAMPLES_SCRAPED_METRIC)[0].value, 2.0);
    }

    #[tokio::test]
    async fn test_timeout_reports_down() {
        let storage = MemoryStorage::new();
        let lp = make_loop(Arc::new(HangingScraper), spec(), &storage);

        lp.scrape_once(&CancellationToken::new()).await;

        let status = lp.target.status();
        assert_eq!(status.health, TargetHealth::Down);
        assert!(status.last_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_scrape_without_insert() {
        let storage = MemoryStorage::new();
        let lp = make_loop(
            Arc::new(HangingScraper),
            spec().with_timeout(Duration::from_secs(30)).with_interval(Duration::from_secs(60)),
            &storage,
        );
        let cancel = CancellationToken::new();
        let c = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            c.cancel();
        });

        let finished = tokio::time::timeout(Duration::from_secs(2), lp.scrape_once(&cancel))
            .await
            .expect("cancel must abort the scrape");
        assert!(!finished);
        assert!(storage.is_empty());
        assert_eq!(lp.target.health(), TargetHealth::Unknown);
    }

    #[tokio::test]
    async fn test_run_scrapes_until_cancelled() {
        let storage = MemoryStorage::new();
        let scraper = Arc::new(FixedScraper {
            samples: Vec::new(),
            calls: AtomicUsize::new(0),
        });
        let lp = make_loop(scraper.clone(), spec(), &storage);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(lp.run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        assert!(scraper.calls.load(Ordering::SeqCst) >= 2);
        assert!(!storage.series(UP_METRIC).is_empty());
    }

    struct BrokenStorage;

    impl Appendable for BrokenStorage {
        fn appender(&self) -> Result<Box<dyn Appender>, StorageError> {
            Err(StorageError::Unavailable("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_storage_failure_marks_target_down() {
        let scraper = Arc::new(FixedScraper {
            samples: Vec::new(),
            calls: AtomicUsize::new(0),
        });
        let lp = ScrapeLoop::new(target(), Arc::new(spec()), scraper, Arc::new(BrokenStorage));

        lp.scrape_once(&CancellationToken::new()).await;

        let status = lp.target.status();
        assert_eq!(status.health, TargetHealth::Down);
        assert!(status.last_error.unwrap().contains("disk full"));
    }
}
