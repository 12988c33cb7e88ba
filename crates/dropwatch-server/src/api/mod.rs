mod runs;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_cron_scheduler::JobScheduler;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, ApiKeys, RequestId, RunThrottle,
    REQUEST_ID_HEADER,
};
use crate::scheduler::ServerRunner;

#[derive(Clone)]
pub struct AppState {
    pub runner: ServerRunner,
    /// Receives the one-shot lock confirmations of HTTP-triggered runs.
    pub scheduler: JobScheduler,
}

/// Success envelope: `{ "data": ..., "meta": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// Machine-readable error codes; each maps to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    RateLimited,
    Conflict,
    InternalError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error envelope: `{ "error": { "code", "message" }, "meta": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(request_id: impl Into<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code,
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.error.code.status(), Json(self)).into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
    notifier: &'static str,
    job_running: bool,
}

/// Health is readable from a browser dashboard; the trigger needs its token header.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, REQUEST_ID_HEADER.clone()])
        .expose_headers([REQUEST_ID_HEADER.clone()])
}

pub fn build_app(state: AppState, keys: ApiKeys, throttle: RunThrottle) -> Router {
    // Outermost first: the throttle counts only authenticated triggers.
    let trigger = Router::new()
        .route("/api/v1/runs", post(runs::trigger_run))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(keys, require_bearer_auth))
                .layer(axum::middleware::from_fn_with_state(throttle, enforce_rate_limit)),
        );

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(trigger)
        .layer(
            ServiceBuilder::new()
                .layer(cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

/// Liveness only: reads in-memory state, never touches the store or the shop.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<HealthData>> {
    let watcher = state.runner.watcher();
    Json(ApiResponse::new(
        HealthData {
            status: "ok",
            store: watcher.store().backend_name(),
            notifier: watcher.notifier().kind_name(),
            job_running: state.runner.is_running(),
        },
        req_id.0,
    ))
}

#[cfg(test)]
#[path = "../api_test.rs"]
mod tests;
