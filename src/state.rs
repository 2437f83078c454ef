//! Shared application state: lifecycle tracking plus the process-wide
//! singleton clients (session store, SSO client, object store client).
//! These are constructed once at startup and shared across every request,
//! never rebuilt per-request.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU8, Ordering},
};
use std::time::Instant;

use crate::config::ProxyConfig;
use crate::objectstore::ObjectStoreClient;
use crate::session::SessionStore;
use crate::sso::SsoClient;

/// Application lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplicationState {
    Unknown = 0,
    Initializing = 1,
    StartingNetwork = 2,
    Ready = 3,
    Terminating = 4,
}

/// In-process cache of tokens the SSO has recently confirmed valid.
///
/// Keyed by the raw bearer token; a hit within `token_grace_period` skips
/// the round-trip to the SSO's userinfo endpoint. Race-free: two requests
/// validating the same token concurrently both query the SSO and both
/// write the same (or similar) timestamp; losing that race costs one extra
/// network call, never a correctness problem.
#[derive(Debug, Default)]
pub struct TokenGraceCache {
    entries: RwLock<std::collections::HashMap<String, Instant>>,
}

impl TokenGraceCache {
    /// Returns `true` if `token` was confirmed valid within `grace_period`.
    pub fn is_fresh(&self, token: &str, grace_period: std::time::Duration) -> bool {
        if grace_period.is_zero() {
            return false;
        }
        let entries = self.entries.read().expect("token grace cache lock poisoned");
        match entries.get(token) {
            Some(checked_at) => checked_at.elapsed() < grace_period,
            None => false,
        }
    }

    /// Records that `token` was just confirmed valid by the SSO.
    pub fn mark_valid(&self, token: &str) {
        let mut entries = self.entries.write().expect("token grace cache lock poisoned");
        entries.insert(token.to_string(), Instant::now());
    }
}

/// Shared, process-wide application state.
#[derive(Debug)]
pub struct AppState {
    lifecycle: AtomicU8,
    config: RwLock<Option<Arc<ProxyConfig>>>,
    session_store: RwLock<Option<Arc<dyn SessionStore>>>,
    sso_client: RwLock<Option<Arc<SsoClient>>>,
    object_store: RwLock<Option<Arc<ObjectStoreClient>>>,
    pub token_grace_cache: TokenGraceCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            lifecycle: AtomicU8::new(ApplicationState::Unknown as u8),
            config: RwLock::new(None),
            session_store: RwLock::new(None),
            sso_client: RwLock::new(None),
            object_store: RwLock::new(None),
            token_grace_cache: TokenGraceCache::default(),
        }
    }

    pub fn set_state(&self, state: ApplicationState) {
        self.lifecycle.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_alive(&self) -> bool {
        let s = self.lifecycle.load(Ordering::SeqCst);
        s >= ApplicationState::Initializing as u8 && s < ApplicationState::Terminating as u8
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.load(Ordering::SeqCst) >= ApplicationState::Ready as u8
    }

    pub fn set_config(&self, config: Arc<ProxyConfig>) {
        *self.config.write().expect("state lock poisoned") = Some(config);
    }

    pub fn config(&self) -> Arc<ProxyConfig> {
        self.config
            .read()
            .expect("state lock poisoned")
            .clone()
            .expect("config read before it was set")
    }

    pub fn set_session_store(&self, store: Arc<dyn SessionStore>) {
        *self.session_store.write().expect("state lock poisoned") = Some(store);
    }

    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        self.session_store
            .read()
            .expect("state lock poisoned")
            .clone()
            .expect("session store read before it was set")
    }

    pub fn set_sso_client(&self, client: Arc<SsoClient>) {
        *self.sso_client.write().expect("state lock poisoned") = Some(client);
    }

    pub fn sso_client(&self) -> Arc<SsoClient> {
        self.sso_client
            .read()
            .expect("state lock poisoned")
            .clone()
            .expect("sso client read before it was set")
    }

    pub fn set_object_store(&self, client: Arc<ObjectStoreClient>) {
        *self.object_store.write().expect("state lock poisoned") = Some(client);
    }

    pub fn object_store(&self) -> Arc<ObjectStoreClient> {
        self.object_store
            .read()
            .expect("state lock poisoned")
            .clone()
            .expect("object store read before it was set")
    }
}
