//! Run command - scrape the given jobs until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::{info, warn};

use scrapeplane::config::{HumanDuration, JobSpec};
use scrapeplane::log::TracingLogger;
use scrapeplane::logging::DEFAULT_LOG_DIR;
use scrapeplane::manager::{DefaultBackend, TargetManager};
use scrapeplane::storage::NoopAppendable;
use scrapeplane::target::TargetGroup;

use crate::error::CliError;
use crate::probe::TcpProbe;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Job to scrape, as NAME=HOST:PORT[,HOST:PORT...] (repeatable)
    #[arg(long = "job", value_name = "NAME=TARGETS", required = true)]
    pub jobs: Vec<String>,

    /// Time between scrapes of each target
    #[arg(long, default_value = "15s")]
    pub scrape_interval: HumanDuration,

    /// Time after which a scrape is abandoned
    #[arg(long, default_value = "5s")]
    pub scrape_timeout: HumanDuration,

    /// Time between target status reports
    #[arg(long, default_value = "30s")]
    pub report_interval: HumanDuration,

    /// Directory for the log file
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let jobs = args
        .jobs
        .iter()
        .map(|flag| parse_job(flag, args.scrape_interval.0, args.scrape_timeout.0))
        .collect::<Result<Vec<_>, _>>()?;

    let runner = CliRunner::new(args.log_dir.clone(), args.debug)?;
    runner.log_startup("run");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(serve(jobs, args.report_interval.0))
}

/// Parses a `--job` flag into a job with one static target group.
pub fn parse_job(flag: &str, interval: Duration, timeout: Duration) -> Result<JobSpec, CliError> {
    let (name, targets) = flag
        .split_once('=')
        .ok_or_else(|| CliError::InvalidJob(format!("'{}' is missing '='", flag)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::InvalidJob(format!("'{}' has no job name", flag)));
    }

    let group = targets
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .fold(TargetGroup::new(""), |group, address| group.with_address(address));
    if group.targets.is_empty() {
        return Err(CliError::InvalidJob(format!("job '{}' has no targets", name)));
    }

    let spec = JobSpec::new(name)
        .with_interval(interval)
        .with_timeout(timeout)
        .with_static_group(group);
    spec.validate()
        .map_err(|e| CliError::InvalidJob(e.to_string()))?;
    Ok(spec)
}

async fn serve(jobs: Vec<JobSpec>, report_interval: Duration) -> Result<(), CliError> {
    let job_count = jobs.len();
    let manager: Arc<TargetManager> = Arc::new(TargetManager::with_backend(
        DefaultBackend::new(Arc::new(TcpProbe)),
        Arc::new(NoopAppendable),
        Arc::new(TracingLogger),
    ));
    manager.apply_config(jobs)?;

    let run_handle = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.run().await })
    };

    println!("Scraping {} job(s). Press Ctrl-C to stop.", job_count);

    let mut ticker = tokio::time::interval(report_interval);
    // The first tick completes immediately; nothing has been scraped yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
            _ = ticker.tick() => report(&manager),
        }
    }

    println!("Shutting down...");
    manager.stop().await;
    if let Err(e) = run_handle.await {
        warn!("Manager task failed: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}

fn report(manager: &TargetManager) {
    let mut jobs: Vec<_> = manager.target_map().into_iter().collect();
    jobs.sort_by(|a, b| a.0.cmp(&b.0));

    println!();
    println!("{:<16} {:<40} {:<8} {:>10}  ERROR", "JOB", "TARGET", "HEALTH", "LAST");
    for (job, targets) in jobs {
        for target in targets.iter().filter(|t| !t.is_dropped()) {
            let last = target
                .last_duration
                .map(|d| format!("{:.1}ms", d.as_secs_f64() * 1000.0))
                .unwrap_or_else(|| "-".to_string());
            let error = target.last_error.as_deref().unwrap_or("");
            println!(
                "{:<16} {:<40} {:<8} {:>10}  {}",
                job, target.url, target.health, last, error
            );
            info!(job = %job, target = %target.url, health = %target.health, "Target status");
        }
    }
}
