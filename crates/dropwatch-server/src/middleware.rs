use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dropwatch_core::{AppConfig, Environment};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::{ApiError, ErrorCode};

pub(crate) static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Request ID for the current request, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted by `POST /api/v1/runs`. Empty means auth is off.
#[derive(Debug, Clone)]
pub struct ApiKeys(Arc<[String]>);

impl ApiKeys {
    /// Takes the keys from `DROPWATCH_API_KEYS`.
    ///
    /// Running without keys is allowed in development only; anywhere else a
    /// run trigger would be open to the world.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.api_keys.is_empty() {
            if config.env != Environment::Development {
                anyhow::bail!(
                    "DROPWATCH_API_KEYS is required outside development ({})",
                    config.env
                );
            }
            tracing::warn!("DROPWATCH_API_KEYS not set; run trigger is unauthenticated");
        }
        Ok(Self::new(config.api_keys.clone()))
    }

    pub fn new(keys: Vec<String>) -> Self {
        Self(keys.into())
    }

    fn is_enabled(&self) -> bool {
        !self.0.is_empty()
    }

    /// Compares `token` against every key in constant time.
    fn accepts(&self, token: &str) -> bool {
        self.0.iter().fold(false, |found, key| {
            found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
        })
    }
}

/// Fixed-window throttle shared by the protected routes.
#[derive(Debug, Clone)]
pub struct RunThrottle {
    max_requests: usize,
    window: Duration,
    current: Arc<Mutex<(Instant, usize)>>,
}

impl RunThrottle {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            current: Arc::new(Mutex::new((Instant::now(), 0))),
        }
    }

    /// Counts one request against the current window; `false` once it is full.
    async fn admit(&self, now: Instant) -> bool {
        let mut current = self.current.lock().await;
        let (started_at, count) = &mut *current;
        if now.duration_since(*started_at) >= self.window {
            *started_at = now;
            *count = 0;
        }
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }
}

impl Default for RunThrottle {
    /// 30 triggers per minute.
    fn default() -> Self {
        Self::new(30, Duration::from_secs(60))
    }
}

fn request_id_of(req: &Request) -> String {
    req.extensions()
        .get::<RequestId>()
        .map_or_else(String::new, |id| id.0.clone())
}

/// Reuses the caller's `x-request-id` or mints a UUID, then echoes it back.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER.clone(), val);
    }
    res
}

pub async fn require_bearer_auth(
    State(keys): State<ApiKeys>,
    req: Request,
    next: Next,
) -> Response {
    if !keys.is_enabled() {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if keys.accepts(token) => next.run(req).await,
        _ => ApiError::new(
            request_id_of(&req),
            ErrorCode::Unauthorized,
            "missing or invalid bearer token",
        )
        .into_response(),
    }
}

pub async fn enforce_rate_limit(
    State(throttle): State<RunThrottle>,
    req: Request,
    next: Next,
) -> Response {
    if throttle.admit(Instant::now()).await {
        return next.run(req).await;
    }
    tracing::warn!("run trigger rate limit exceeded");
    ApiError::new(
        request_id_of(&req),
        ErrorCode::RateLimited,
        "too many run triggers; try again later",
    )
    .into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}
