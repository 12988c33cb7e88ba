//! Background job scheduler.
//!
//! Registers the recurring watch job on `DROPWATCH_SCHEDULE_CRON` and the
//! one-shot lock confirmations that follow a tentative lock change.

use dropwatch_core::PendingLockChange;
use dropwatch_db::ConfiguredStore;
use dropwatch_notify::ConfiguredNotifier;
use dropwatch_watcher::{JobReport, JobRunner, RunError};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// The job runner the server drives.
pub type ServerRunner = JobRunner<ConfiguredStore, ConfiguredNotifier>;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: ServerRunner,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_watch_job(&scheduler, runner, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_watch_job(
    scheduler: &JobScheduler,
    runner: ServerRunner,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let follow_ups = scheduler.clone();

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = runner.clone();
        let follow_ups = follow_ups.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting watch job");
            match runner.run_job().await {
                Ok(report) => {
                    log_report(&report);
                    if let Some(pending) = report.pending_lock_change() {
                        if let Err(e) = schedule_confirmation(&follow_ups, &runner, pending).await {
                            tracing::error!(error = %e, "scheduler: failed to schedule lock confirmation");
                        }
                    }
                }
                Err(RunError::AlreadyRunning) => {
                    tracing::warn!("scheduler: previous job still running; skipping this tick");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: watch job failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered watch job");
    Ok(())
}

/// Schedules a one-shot re-probe of `pending` after the configured delay.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the job cannot be created or added.
pub async fn schedule_confirmation(
    scheduler: &JobScheduler,
    runner: &ServerRunner,
    pending: PendingLockChange,
) -> Result<(), JobSchedulerError> {
    let delay = runner.watcher().settings().lock_confirm_delay;
    let runner = runner.clone();

    let job = Job::new_one_shot_async(delay, move |_uuid, _lock| {
        let runner = runner.clone();

        Box::pin(async move {
            match runner.run_confirmation(pending).await {
                Ok(report) => tracing::info!(
                    changed = report.decision.changed,
                    persisted = %report.decision.persisted,
                    "scheduler: lock confirmation complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: lock confirmation failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(
        previous = %pending.previous,
        observed = %pending.observed,
        delay_secs = delay.as_secs(),
        "scheduler: lock confirmation scheduled"
    );
    Ok(())
}

fn log_report(report: &JobReport) {
    match report.failure_summary() {
        None => tracing::info!(
            changes = report.catalog.as_ref().map_or(0, |c| c.changes.len()),
            "scheduler: watch job complete"
        ),
        Some(summary) => tracing::warn!(%summary, "scheduler: watch job finished with errors"),
    }
}
