use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use dropwatch_core::LockStatus;
use dropwatch_db::{ConfiguredStore, FileStore, LockStateStore};
use dropwatch_notify::ConfiguredNotifier;
use dropwatch_scraper::{LockProber, ShopifyClient};
use dropwatch_watcher::{JobRunner, Watcher, WatcherSettings};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn temp_store() -> FileStore {
    FileStore::new(std::env::temp_dir().join(format!("dropwatch-server-{}", uuid::Uuid::new_v4())))
}

async fn test_state(shop: &MockServer, store: FileStore) -> AppState {
    let settings = WatcherSettings {
        store_url: shop.uri(),
        page_limit: 250,
        max_pages: 5,
        inter_request_delay_ms: 0,
        lock_confirm_delay: Duration::from_secs(60),
        notify_max_chars: 280,
        dry_run: false,
    };
    let watcher = Watcher::new(
        ShopifyClient::new(5, "dropwatch-test/0.1", 0, 0).expect("catalog client"),
        LockProber::new(5, "dropwatch-test/0.1").expect("prober"),
        ConfiguredStore::File(store),
        ConfiguredNotifier::log_only(),
        settings,
    );
    AppState {
        runner: JobRunner::new(watcher),
        scheduler: JobScheduler::new().await.expect("scheduler"),
    }
}

fn open_auth() -> ApiKeys {
    ApiKeys::new(Vec::new())
}

fn secret_auth() -> ApiKeys {
    ApiKeys::new(vec!["secret".to_owned()])
}

async fn mount_shop(shop: &MockServer, root: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{
                "id": 1,
                "title": "Logo Tee",
                "handle": "logo-tee",
                "product_type": "Tee",
                "variants": [
                    { "id": 101, "title": "Small", "price": "30.00", "available": true },
                    { "id": 102, "title": "Medium", "price": "30.00", "available": false }
                ]
            }]
        })))
        .mount(shop)
        .await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "products": [] })))
        .mount(shop)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(root)
        .mount(shop)
        .await;
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

fn post_runs(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/v1/runs");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}

#[test]
fn api_error_codes_map_to_statuses() {
    let conflict = ApiError::new("req-1", ErrorCode::Conflict, "busy").into_response();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
    let internal = ApiError::new("req-1", ErrorCode::InternalError, "boom").into_response();
    assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        serde_json::to_value(ErrorCode::RateLimited).expect("serialize"),
        "rate_limited"
    );
}

#[tokio::test]
async fn health_is_public_and_echoes_request_id() {
    let shop = MockServer::start().await;
    let auth = secret_auth();
    let app = build_app(
        test_state(&shop, temp_store()).await,
        auth,
        RunThrottle::default(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["store"], "file");
    assert_eq!(json["data"]["notifier"], "log");
    assert_eq!(json["data"]["job_running"], false);
    assert_eq!(json["meta"]["request_id"], "req-health");
    assert!(
        shop.received_requests().await.unwrap_or_default().is_empty(),
        "health must not touch the storefront"
    );
}

#[tokio::test]
async fn runs_rejects_missing_or_wrong_token() {
    let shop = MockServer::start().await;
    let auth = secret_auth();
    let app = build_app(
        test_state(&shop, temp_store()).await,
        auth,
        RunThrottle::default(),
    );

    let missing = app.clone().oneshot(post_runs(None)).await.expect("response");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app.oneshot(post_runs(Some("nope"))).await.expect("response");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(wrong).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn runs_executes_one_job_and_returns_report() {
    let shop = MockServer::start().await;
    mount_shop(&shop, ResponseTemplate::new(200).set_body_string("<h1>Shop</h1>")).await;
    let store = temp_store();
    let snapshot_path = store.snapshot_path();
    let auth = secret_auth();
    let app = build_app(
        test_state(&shop, store).await,
        auth,
        RunThrottle::default(),
    );

    let response = app
        .oneshot(post_runs(Some("secret")))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["catalog"]["first_run"], true);
    assert_eq!(json["data"]["catalog"]["variants_seen"], 2);
    assert_eq!(json["data"]["lock"]["state"], "settled");
    assert_eq!(json["data"]["confirmation_scheduled"], false);
    assert!(snapshot_path.exists(), "baseline snapshot written");
}

#[tokio::test]
async fn runs_schedules_confirmation_for_tentative_lock_change() {
    let shop = MockServer::start().await;
    mount_shop(
        &shop,
        ResponseTemplate::new(302).insert_header("Location", "/password"),
    )
    .await;
    let store = temp_store();
    store
        .save_lock_status(LockStatus::Unlocked)
        .await
        .expect("seed lock state");
    let app = build_app(
        test_state(&shop, store).await,
        open_auth(),
        RunThrottle::default(),
    );

    let response = app.oneshot(post_runs(None)).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["lock"]["state"], "pending_confirmation");
    assert_eq!(json["data"]["lock"]["pending"]["observed"], "locked");
    assert_eq!(json["data"]["lock"]["confirm_after_secs"], 60);
    assert_eq!(json["data"]["confirmation_scheduled"], true);
}

#[tokio::test]
async fn overlapping_run_returns_conflict() {
    let shop = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "products": [] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&shop)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&shop)
        .await;
    let app = build_app(
        test_state(&shop, temp_store()).await,
        open_auth(),
        RunThrottle::default(),
    );

    let first = tokio::spawn(app.clone().oneshot(post_runs(None)));
    tokio::time::sleep(Duration::from_millis(100)).await;

    let second = app.oneshot(post_runs(None)).await.expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let json = body_json(second).await;
    assert_eq!(json["error"]["code"], "conflict");

    let first = first.await.expect("join").expect("response");
    assert_eq!(first.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_are_rate_limited() {
    let shop = MockServer::start().await;
    mount_shop(&shop, ResponseTemplate::new(200)).await;
    let app = build_app(
        test_state(&shop, temp_store()).await,
        open_auth(),
        RunThrottle::new(1, Duration::from_secs(60)),
    );

    let first = app.clone().oneshot(post_runs(None)).await.expect("response");
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.oneshot(post_runs(None)).await.expect("response");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert_eq!(json["error"]["code"], "rate_limited");
    assert!(json["meta"]["request_id"].as_str().is_some_and(|id| !id.is_empty()));
}
