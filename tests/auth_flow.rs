//! Integration tests for the auth middleware: redirect choreography,
//! the SSO callback, session validation, and the grace-period cache.
//! Exercises the real `axum::middleware::from_fn_with_state`-wired router
//! end to end via `tower::ServiceExt::oneshot`, against a `wiremock` stand-in
//! for the SSO and an in-memory `SessionStore`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware};
use http_body_util::BodyExt;
use s3proxy::config::ProxyConfig;
use s3proxy::server::auth::auth_middleware;
use s3proxy::session::{SessionStore, SessionStoreError};
use s3proxy::sso::SsoClient;
use s3proxy::state::AppState;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A plain `HashMap`-backed `SessionStore`, local to this test file rather
/// than reused from the library's own unit-test double, since the trait is
/// the actual seam implementers program against and an integration test
/// binary cannot reach a `#[cfg(test)]` item from the library crate.
#[derive(Default)]
struct FakeSessionStore {
    entries: Mutex<HashMap<String, (String, Instant, Duration)>>,
}

#[async_trait]
impl SessionStore for FakeSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).and_then(|(value, stored_at, ttl)| {
            (stored_at.elapsed() < *ttl).then(|| value.clone())
        }))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now(), ttl));
        Ok(())
    }
}

fn test_config(sso_base: &str, grace_period: Duration) -> ProxyConfig {
    ProxyConfig {
        port: 0,
        redis_endpoint: "redis://localhost".into(),
        sso_url: format!("{sso_base}/"),
        sso_url_internal: format!("{sso_base}/"),
        sso_client_id: "test-client".into(),
        sso_client_secret: "test-secret".into(),
        aws_s3_bucket: "bucket".into(),
        aws_default_region: "us-east-1".into(),
        aws_s3_healthcheck_key: "healthcheck.txt".into(),
        key_prefix: String::new(),
        s3_endpoint_url: None,
        aws_access_key_id: None,
        aws_secret_access_key: None,
        sso_token_check_grace_period: grace_period,
        cookie_ttl: Duration::from_secs(60 * 60 * 9),
        session_ttl: Duration::from_secs(60 * 60 * 10),
        state_ttl: Duration::from_secs(60),
    }
}

/// Builds the same two-branch router `server::service::start` would, minus
/// the object-store-backed proxy handler (replaced by a stub so these tests
/// stay scoped to the auth middleware).
fn build_router(app: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/{*path}", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(app.clone(), auth_middleware))
        .with_state(app)
}

async fn app_with(mock: &MockServer, grace_period: Duration) -> Arc<AppState> {
    let config = test_config(&mock.uri(), grace_period);
    let app = Arc::new(AppState::new());
    app.set_sso_client(Arc::new(SsoClient::new(&config).unwrap()));
    app.set_session_store(Arc::new(FakeSessionStore::default()));
    app.set_config(Arc::new(config));
    app
}

async fn body_string(response: axum::response::Response) -> String {
    String::from_utf8(response.into_body().collect().await.unwrap().to_bytes().to_vec()).unwrap()
}

#[tokio::test]
async fn fresh_client_is_redirected_to_sso() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.starts_with(&mock.uri()));
    assert!(location.contains("scope=read+write"));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=test-client"));
    assert!(location.contains("state="));
    assert!(location.contains(&urlencoding::encode("http://proxy.example/__redirect_from_sso").to_string()));
}

#[tokio::test]
async fn redirect_preserves_a_bare_trailing_question_mark() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let session_store_probe = app.session_store();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b?")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    // Find the state this request minted and confirm the bound final URL
    // kept the bare trailing `?`.
    let state = location
        .split("state=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap();
    let state_key = format!("s3proxy__sso_state__{state}");
    let final_url = session_store_probe.get(&state_key).await.unwrap().unwrap();
    assert!(final_url.ends_with("/a/b?"), "got {final_url}");
}

#[tokio::test]
async fn healthcheck_path_bypasses_auth_entirely() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let router = build_router(app);

    let request = Request::builder()
        .uri("/healthcheck.txt")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn callback_missing_code_and_state_is_bad_request() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let router = build_router(app);

    let request = Request::builder()
        .uri("/__redirect_from_sso")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn callback_with_unknown_state_is_expired() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let router = build_router(app);

    let request = Request::builder()
        .uri("/__redirect_from_sso?code=abc&state=does-not-exist")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(body_string(response).await.contains("Sign in may have taken too long"));
}

#[tokio::test]
async fn callback_success_rotates_session_cookie_and_redirects_to_final_url() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "tok-xyz"})),
        )
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::ZERO).await;
    let session_store = app.session_store();
    session_store
        .set(
            "s3proxy__sso_state__deadbeef",
            "http://proxy.example/a/b",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/__redirect_from_sso?code=good-code&state=deadbeef")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "http://proxy.example/a/b"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("assets_session_id="));
    assert!(cookie.contains("HttpOnly"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn callback_propagates_exact_sso_rejection_status() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o/token/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::ZERO).await;
    app.session_store()
        .set(
            "s3proxy__sso_state__cafef00d",
            "http://proxy.example/a/b",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/__redirect_from_sso?code=bad-code&state=cafef00d")
        .header(header::HOST, "proxy.example")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn established_session_with_valid_token_passes_through() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::ZERO).await;
    app.session_store()
        .set(
            "s3proxy__assets_session_id__sess1__sso_token",
            "valid-token",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b")
        .header(header::HOST, "proxy.example")
        .header(header::COOKIE, "assets_session_id=sess1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn established_session_with_rejected_token_redirects_to_sso() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::ZERO).await;
    app.session_store()
        .set(
            "s3proxy__assets_session_id__sess1__sso_token",
            "stale-token",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b")
        .header(header::HOST, "proxy.example")
        .header(header::COOKIE, "assets_session_id=sess1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with(&mock.uri())
    );
}

#[tokio::test]
async fn sso_validation_failure_surfaces_as_internal_error() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::ZERO).await;
    app.session_store()
        .set(
            "s3proxy__assets_session_id__sess1__sso_token",
            "any-token",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b")
        .header(header::HOST, "proxy.example")
        .header(header::COOKIE, "assets_session_id=sess1")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn grace_period_skips_revalidation_within_window() {
    let mock = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/user/me/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let app = app_with(&mock, Duration::from_secs(2)).await;
    app.session_store()
        .set(
            "s3proxy__assets_session_id__sess1__sso_token",
            "cached-token",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
    let router = build_router(app);

    for _ in 0..2 {
        let request = Request::builder()
            .uri("/a/b")
            .header(header::HOST, "proxy.example")
            .header(header::COOKIE, "assets_session_id=sess1")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // wiremock's `.expect(1)` is verified when `mock` drops at the end of
    // the test; a second call would panic there if the cache didn't hold.
}

#[tokio::test]
async fn session_cookie_without_a_live_record_is_treated_as_no_cookie() {
    let mock = MockServer::start().await;
    let app = app_with(&mock, Duration::ZERO).await;
    let router = build_router(app);

    let request = Request::builder()
        .uri("/a/b")
        .header(header::HOST, "proxy.example")
        .header(header::COOKIE, "assets_session_id=does-not-exist")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with(&mock.uri())
    );
}
