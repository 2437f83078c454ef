//! Session store: an opaque, TTL'd key/value store shared across every
//! instance of the proxy. Holds both OAuth `state` records and session
//! records behind the one fixed key namespace, `s3proxy__<scope>__<id>[__<key>]`.

pub mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

pub use redis_store::RedisSessionStore;

/// Errors the session store can surface. Every caller maps these straight
/// onto the `Internal` outcome; there is no retry policy at this layer
/// (retries belong to the object-store client only).
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
    #[error("session store operation failed: {0}")]
    Operation(String),
}

/// A single key/value record with a bounded lifetime. Implementations are
/// not required to support update-in-place: every `set` is a fresh write
/// with its own TTL.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetches the value stored at `key`, or `None` if it does not exist or
    /// has expired.
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError>;

    /// Stores `value` at `key`, expiring it after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError>;
}

/// Builds the fixed-format key `s3proxy__<scope>__<id>`.
pub fn scoped_key(scope: &str, id: &str) -> String {
    format!("{}__{}__{}", crate::server::constants::KEY_NAMESPACE, scope, id)
}

/// Builds the fixed-format key `s3proxy__<scope>__<id>__<key>`, used for
/// per-session sub-fields (e.g. the stored SSO access token).
pub fn scoped_field_key(scope: &str, id: &str, field: &str) -> String {
    format!(
        "{}__{}__{}__{}",
        crate::server::constants::KEY_NAMESPACE,
        scope,
        id,
        field
    )
}
