//! Internal liveness/readiness probes. These are distinct from the
//! object-backed `/<healthcheck_key>` bypass path (see `server::proxy`),
//! which is the health check operators actually point at — it proxies to a
//! real object through the same code path as any other request. `/livez`
//! and `/readyz` exist purely so the process itself can be probed before
//! the object store or SSO are known to be reachable.

use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;

use crate::state::AppState;

pub async fn livez(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn readyz(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
