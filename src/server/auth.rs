//! Auth middleware: cookie-based session lookup, OAuth state binding,
//! redirect choreography to and from the SSO, and token-validity checking
//! with an optional grace-period cache.
//!
//! Every incoming request runs through a single dispatch (healthcheck
//! bypass, callback, or gated), so that is exactly what `auth_middleware`
//! does rather than splitting the callback out into its own unlayered
//! route — one middleware function composed with the downstream handler,
//! not a collection of independently-gated routes.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::server::constants::{
    REDIRECT_CALLBACK_PATH, SCOPE_SESSION, SCOPE_STATE, SESSION_COOKIE_NAME, SESSION_ID_BYTES,
    SESSION_TOKEN_KEY, STATE_BYTES,
};
use crate::server::errors::ProxyError;
use crate::server::requestline;
use crate::session::{scoped_field_key, scoped_key};
use crate::sso::{ExchangeOutcome, TokenValidity};
use crate::state::AppState;

/// Top-level dispatch run on every request: healthcheck bypass, the SSO
/// callback, or the gated path (validate-or-redirect).
pub async fn auth_middleware(
    State(app): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let config = app.config();
    let path = req.uri().path();

    if path == format!("/{}", config.aws_s3_healthcheck_key) {
        return next.run(req).await;
    }

    if path == REDIRECT_CALLBACK_PATH {
        return redirect_from_sso(&app, &config, &req).await;
    }

    let session_key = extract_cookie(req.headers(), SESSION_COOKIE_NAME)
        .map(|id| scoped_field_key(SCOPE_SESSION, &id, SESSION_TOKEN_KEY));

    let token = match session_key {
        Some(key) => match app.session_store().get(&key).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(target = "s3proxy::auth", "session store read failed: {e}");
                return ProxyError::Internal.into_response();
            }
        },
        None => None,
    };

    match token {
        Some(token) => validate(&app, &config, &token, req, next).await,
        None => redirect_to_sso(&app, &config, &req).await,
    }
}

/// A session cookie named the token it bound; check it's still good with
/// the SSO, skipping the round-trip when a grace-period cache hit applies.
async fn validate(
    app: &Arc<AppState>,
    config: &ProxyConfig,
    token: &str,
    req: Request<Body>,
    next: Next,
) -> Response {
    if app
        .token_grace_cache
        .is_fresh(token, config.sso_token_check_grace_period)
    {
        return next.run(req).await;
    }

    match app.sso_client().validate_token(token).await {
        TokenValidity::Valid => {
            app.token_grace_cache.mark_valid(token);
            next.run(req).await
        }
        TokenValidity::Invalid => redirect_to_sso(app, config, &req).await,
        TokenValidity::Error => ProxyError::Internal.into_response(),
    }
}

/// Mints a fresh `state`, binds it to this request's full destination URL,
/// and sends the browser to the SSO's authorize endpoint.
async fn redirect_to_sso(app: &Arc<AppState>, config: &ProxyConfig, req: &Request<Body>) -> Response {
    let scheme = scheme_from_headers(req.headers());
    let host = match host_from_headers(req.headers()) {
        Some(h) => h,
        None => return ProxyError::Internal.into_response(),
    };

    let final_url = format!(
        "{scheme}://{host}{}",
        requestline::original_request_target(req.uri())
    );

    let state = random_state();
    let state_key = scoped_key(SCOPE_STATE, &state);
    if let Err(e) = app
        .session_store()
        .set(&state_key, &final_url, config.state_ttl)
        .await
    {
        tracing::warn!(target = "s3proxy::auth", "failed to store oauth state: {e}");
        return ProxyError::Internal.into_response();
    }

    let callback_uri = format!("{scheme}://{host}{REDIRECT_CALLBACK_PATH}");
    let sso = app.sso_client();
    let location = format!(
        "{}?scope=read+write&state={}&redirect_uri={}&response_type=code&client_id={}",
        sso.authorize_url(),
        state,
        urlencoding::encode(&callback_uri),
        sso.client_id(),
    );

    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .expect("valid redirect response")
}

/// Handles `GET /__redirect_from_sso`: exchanges `code` for a token, binds
/// it to a freshly rotated session, and sends the browser on to the final
/// destination recorded against `state`.
async fn redirect_from_sso(app: &Arc<AppState>, config: &ProxyConfig, req: &Request<Body>) -> Response {
    let query = req.uri().query().unwrap_or("");
    let params: std::collections::HashMap<String, String> =
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();

    let (code, state) = match (params.get("code"), params.get("state")) {
        (Some(code), Some(state)) => (code.clone(), state.clone()),
        _ => return ProxyError::BadRequest.into_response(),
    };

    let state_key = scoped_key(SCOPE_STATE, &state);
    let final_url = match app.session_store().get(&state_key).await {
        Ok(Some(url)) => url,
        Ok(None) => return ProxyError::Expired.into_response(),
        Err(e) => {
            tracing::warn!(target = "s3proxy::auth", "session store read failed: {e}");
            return ProxyError::Internal.into_response();
        }
    };

    let scheme = scheme_from_headers(req.headers());
    let host = match host_from_headers(req.headers()) {
        Some(h) => h,
        None => return ProxyError::Internal.into_response(),
    };
    let callback_uri = format!("{scheme}://{host}{REDIRECT_CALLBACK_PATH}");

    match app.sso_client().exchange_code(&code, &callback_uri).await {
        ExchangeOutcome::Ok { access_token } => {
            let session_id = random_session_id();
            let session_key = scoped_field_key(SCOPE_SESSION, &session_id, SESSION_TOKEN_KEY);
            if let Err(e) = app
                .session_store()
                .set(&session_key, &access_token, config.session_ttl)
                .await
            {
                tracing::warn!(target = "s3proxy::auth", "failed to store session: {e}");
                return ProxyError::Internal.into_response();
            }

            let cookie = build_set_cookie(&session_id, config, scheme == "https");

            Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, final_url)
                .header(header::SET_COOKIE, cookie)
                .body(Body::empty())
                .expect("valid redirect response")
        }
        ExchangeOutcome::Unauthorized(status) => Response::builder()
            .status(status)
            .body(Body::empty())
            .expect("valid error response"),
        ExchangeOutcome::Error => ProxyError::Internal.into_response(),
    }
}

/// Reads a single named cookie out of the `Cookie` header, if present.
fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// The scheme the client sees: `X-Forwarded-Proto` if present (assumes TLS
/// termination happens upstream of this process), else `http`.
fn scheme_from_headers(headers: &HeaderMap) -> &'static str {
    match headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) if s.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

fn host_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

/// Builds the `Set-Cookie` value for a freshly rotated session.
fn build_set_cookie(session_id: &str, config: &ProxyConfig, secure: bool) -> String {
    let expires = http_date(chrono::Utc::now() + chrono::Duration::from_std(config.cookie_ttl).unwrap());
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; Max-Age={}; Expires={}",
        SESSION_COOKIE_NAME,
        session_id,
        config.cookie_ttl.as_secs(),
        expires,
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn http_date(instant: chrono::DateTime<chrono::Utc>) -> String {
    instant.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// A fresh, >=512-bit, URL-safe session identifier, rotated on every
/// successful login as a session-fixation mitigation.
fn random_session_id() -> String {
    let mut buf = [0u8; SESSION_ID_BYTES];
    rand::rng().fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}

/// A fresh, >=256-bit, hex-encoded OAuth `state` value.
fn random_state() -> String {
    let mut buf = [0u8; STATE_BYTES];
    rand::rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
