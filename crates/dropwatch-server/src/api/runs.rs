use axum::{extract::State, response::IntoResponse, Extension, Json};
use dropwatch_watcher::{JobReport, RunError};
use serde::Serialize;

use super::{ApiError, ApiResponse, AppState, ErrorCode};
use crate::middleware::RequestId;
use crate::scheduler::schedule_confirmation;

#[derive(Debug, Serialize)]
pub(super) struct RunData {
    success: bool,
    /// `true` when a lock confirmation was queued for this run.
    confirmation_scheduled: bool,
    #[serde(flatten)]
    report: JobReport,
}

/// `POST /api/v1/runs` — runs one watch job now and returns its report.
///
/// Job-level failures are part of the report; only an overlapping job is an
/// error (409).
pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let report = match state.runner.run_job().await {
        Ok(report) => report,
        Err(RunError::AlreadyRunning) => {
            return Err(ApiError::new(
                req_id.0,
                ErrorCode::Conflict,
                "a job is already running",
            ));
        }
        Err(e) => {
            tracing::error!(error = %e, "triggered run failed");
            return Err(ApiError::new(
                req_id.0,
                ErrorCode::InternalError,
                "job failed",
            ));
        }
    };

    let mut confirmation_scheduled = false;
    if let Some(pending) = report.pending_lock_change() {
        match schedule_confirmation(&state.scheduler, &state.runner, pending).await {
            Ok(()) => confirmation_scheduled = true,
            Err(e) => tracing::error!(error = %e, "failed to schedule lock confirmation"),
        }
    }

    Ok(Json(ApiResponse::new(
        RunData {
            success: report.is_success(),
            confirmation_scheduled,
            report,
        },
        req_id.0,
    )))
}
