//! Default value helpers shared between env parsing and tests.

use crate::server::constants::{COOKIE_TTL_SECS, SESSION_TTL_SECS, STATE_TTL_SECS};

pub(crate) fn default_cookie_ttl_secs() -> u64 {
    COOKIE_TTL_SECS
}

pub(crate) fn default_session_ttl_secs() -> u64 {
    SESSION_TTL_SECS
}

pub(crate) fn default_state_ttl_secs() -> u64 {
    STATE_TTL_SECS
}
