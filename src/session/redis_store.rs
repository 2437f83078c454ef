//! Redis-backed `SessionStore`.
//!
//! Must be externally shared (e.g. Redis) across server instances, so that
//! horizontal scaling does not break in-flight OAuth flows — a
//! point-in-time local file cannot satisfy that. See `DESIGN.md` for how
//! this departs from other persistence layers in this lineage.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::{SessionStore, SessionStoreError};

pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Connects to `redis_url` and wraps the connection in a
    /// `ConnectionManager`, which transparently reconnects on the next
    /// command after a dropped connection rather than requiring callers to
    /// retry themselves.
    pub async fn connect(redis_url: &str) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| SessionStoreError::Unavailable(e.to_string()))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let mut conn = self.conn.clone();
        conn.get(key)
            .await
            .map_err(|e| SessionStoreError::Operation(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), SessionStoreError> {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| SessionStoreError::Operation(e.to_string()))
    }
}
