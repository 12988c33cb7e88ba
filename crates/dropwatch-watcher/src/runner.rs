//! Serializes jobs: at most one catalog pass or lock confirmation at a time.

use std::sync::Arc;

use dropwatch_core::PendingLockChange;
use dropwatch_db::{LockStateStore, SnapshotStore};
use dropwatch_notify::Notifier;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{RunError, WatchError};
use crate::watcher::{error_class, CatalogReport, LockCheck, LockReport, Watcher};

/// Lock half of a job.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockOutcome {
    Settled(LockReport),
    /// A change was seen and must be confirmed after the delay.
    PendingConfirmation {
        pending: PendingLockChange,
        confirm_after_secs: u64,
    },
    Failed {
        error: String,
    },
}

/// Everything one job did. The two halves fail independently.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub catalog: Option<CatalogReport>,
    pub catalog_error: Option<String>,
    pub lock: LockOutcome,
}

impl JobReport {
    /// `true` when neither half failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.catalog_error.is_none() && !matches!(self.lock, LockOutcome::Failed { .. })
    }

    /// The confirmation the caller must schedule, if any.
    #[must_use]
    pub fn pending_lock_change(&self) -> Option<PendingLockChange> {
        match &self.lock {
            LockOutcome::PendingConfirmation { pending, .. } => Some(*pending),
            _ => None,
        }
    }

    /// Human-readable summary of the failures, if any.
    #[must_use]
    pub fn failure_summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(e) = &self.catalog_error {
            parts.push(format!("catalog: {e}"));
        }
        if let LockOutcome::Failed { error } = &self.lock {
            parts.push(format!("lock: {error}"));
        }
        (!parts.is_empty()).then(|| parts.join("; "))
    }
}

/// Shared handle that rejects a job while another is in flight.
pub struct JobRunner<S, N> {
    watcher: Arc<Watcher<S, N>>,
    gate: Arc<Mutex<()>>,
}

impl<S, N> Clone for JobRunner<S, N> {
    fn clone(&self) -> Self {
        Self {
            watcher: Arc::clone(&self.watcher),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<S, N> JobRunner<S, N>
where
    S: SnapshotStore + LockStateStore,
    N: Notifier,
{
    #[must_use]
    pub fn new(watcher: Watcher<S, N>) -> Self {
        Self {
            watcher: Arc::new(watcher),
            gate: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn watcher(&self) -> &Watcher<S, N> {
        &self.watcher
    }

    /// `true` while a job or confirmation holds the gate.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Runs the catalog pass, then the first lock probe. The lock check runs
    /// even when the catalog pass fails.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::AlreadyRunning`] if another job holds the gate.
    /// Failures inside the job are reported in the [`JobReport`].
    pub async fn run_job(&self) -> Result<JobReport, RunError> {
        let Ok(_guard) = self.gate.try_lock() else {
            tracing::warn!("job trigger rejected — a job is already running");
            return Err(RunError::AlreadyRunning);
        };

        let (catalog, catalog_error) = match self.watcher.run_catalog_pass().await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                tracing::error!(error = %e, class = error_class(&e), "catalog pass failed");
                (None, Some(e.to_string()))
            }
        };

        let confirm_after_secs = self.watcher.settings().lock_confirm_delay.as_secs();
        let lock = match self.watcher.begin_lock_check().await {
            Ok(LockCheck::Settled(report)) => LockOutcome::Settled(report),
            Ok(LockCheck::Pending(pending)) => LockOutcome::PendingConfirmation {
                pending,
                confirm_after_secs,
            },
            Err(e) => {
                tracing::error!(error = %e, class = error_class(&e), "lock check failed");
                LockOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(JobReport {
            catalog,
            catalog_error,
            lock,
        })
    }

    /// Settles a pending lock change. Waits for any running job to finish
    /// first rather than being rejected.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Watch`] if the confirmed state cannot be persisted.
    pub async fn run_confirmation(
        &self,
        pending: PendingLockChange,
    ) -> Result<LockReport, RunError> {
        let _guard = self.gate.lock().await;
        self.watcher
            .confirm_lock_check(pending)
            .await
            .map_err(|e: WatchError| {
                tracing::error!(error = %e, class = error_class(&e), "lock confirmation failed");
                RunError::from(e)
            })
    }
}
