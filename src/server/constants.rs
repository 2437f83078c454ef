//! Fixed names and timing constants pinned exactly rather than left to
//! configuration.

// user agent used for outgoing HTTP(s) requests to the SSO
pub const REQUEST_USER_AGENT: &str = "s3proxy/1";

/// Name of the session cookie. Not configurable.
pub const SESSION_COOKIE_NAME: &str = "assets_session_id";

/// Path the SSO redirects back to after the user authorizes.
pub const REDIRECT_CALLBACK_PATH: &str = "/__redirect_from_sso";

/// Redis key namespace prefix shared by every key this process writes.
pub const KEY_NAMESPACE: &str = "s3proxy";

/// Scope within the namespace used for session records.
pub const SCOPE_SESSION: &str = "assets_session_id";

/// Scope within the namespace used for OAuth state records.
pub const SCOPE_STATE: &str = "sso_state";

/// Sub-key under a session record holding the SSO access token.
pub const SESSION_TOKEN_KEY: &str = "sso_token";

/// Cookie lifetime: 9 hours.
pub const COOKIE_TTL_SECS: u64 = 60 * 60 * 9;

/// Session record lifetime in the store: 10 hours.
pub const SESSION_TTL_SECS: u64 = 60 * 60 * 10;

/// OAuth `state` record lifetime: 60 seconds.
pub const STATE_TTL_SECS: u64 = 60;

/// Bytes of entropy in a freshly minted session id (>= 512 bits).
pub const SESSION_ID_BYTES: usize = 64;

/// Bytes of entropy in an OAuth `state` value (>= 256 bits), hex-encoded.
pub const STATE_BYTES: usize = 32;

/// Upstream body is relayed in bounded chunks of this size.
pub const PROXY_CHUNK_SIZE: usize = 16 * 1024;

/// Literal body returned when a callback arrives for an unknown/expired
/// `state`.
pub const EXPIRED_STATE_BODY: &str = "<p style=\"font-weight: bold; font-family: Helvetica, Arial, sans-serif\">Sign in may have taken too long. Please try the original link again.</p>";
