//! `run` and `watch`: one cycle now, or cycles on a cron schedule.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shopwatch_core::AppConfig;
use shopwatch_monitor::{run_cycle_with_retry, CycleError, FailureKind};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::LiveMonitor;

/// Tagged failure printed when a cycle gives up.
#[derive(Debug, Serialize)]
struct CycleFailure<'a> {
    kind: FailureKind,
    message: &'a str,
}

fn retry_delay(config: &AppConfig) -> Duration {
    Duration::from_secs(config.cycle_retry_delay_secs)
}

/// Runs one cycle with caller-side retry and prints the report as JSON.
///
/// # Errors
///
/// Returns an error if the cycle ultimately fails or the report cannot be
/// serialized.
pub(crate) async fn run_once(monitor: &LiveMonitor, config: &AppConfig) -> anyhow::Result<()> {
    match run_cycle_with_retry(monitor, config.cycle_max_attempts, retry_delay(config)).await {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Err(err) => {
            print_failure(&err)?;
            Err(err.into())
        }
    }
}

fn print_failure(err: &CycleError) -> anyhow::Result<()> {
    let failure = CycleFailure {
        kind: err.kind(),
        message: err.message(),
    };
    println!("{}", serde_json::to_string_pretty(&failure)?);
    Ok(())
}

/// Runs one cycle unless the previous one is still in progress.
async fn guarded_cycle(monitor: &LiveMonitor, config: &AppConfig, running: &Mutex<()>) {
    let Ok(_guard) = running.try_lock() else {
        tracing::warn!("watch: previous cycle still running; skipping tick");
        return;
    };

    match run_cycle_with_retry(monitor, config.cycle_max_attempts, retry_delay(config)).await {
        Ok(report) if report.has_changes() => match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "watch: failed to serialize report"),
        },
        Ok(_) => tracing::debug!("watch: no catalog changes"),
        Err(err) => tracing::error!(
            kind = err.kind().as_str(),
            error = %err,
            "watch: cycle failed"
        ),
    }
}

/// Runs a cycle immediately, then on every tick of `config.schedule` until
/// the process receives Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be created, the schedule is not
/// a valid cron expression, or the scheduler fails to start or stop.
pub(crate) async fn run_watch(
    monitor: Arc<LiveMonitor>,
    config: Arc<AppConfig>,
) -> anyhow::Result<()> {
    let running = Arc::new(Mutex::new(()));

    guarded_cycle(&monitor, &config, &running).await;

    let mut scheduler = JobScheduler::new().await?;
    let job = {
        let monitor = Arc::clone(&monitor);
        let config = Arc::clone(&config);
        let running = Arc::clone(&running);
        Job::new_async(config.schedule.clone().as_str(), move |_uuid, _lock| {
            let monitor = Arc::clone(&monitor);
            let config = Arc::clone(&config);
            let running = Arc::clone(&running);

            Box::pin(async move {
                guarded_cycle(&monitor, &config, &running).await;
            })
        })?
    };
    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(schedule = %config.schedule, "watch: scheduler started");

    shutdown_signal().await;
    scheduler.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
