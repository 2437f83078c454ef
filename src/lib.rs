//! s3proxy: an authenticating reverse proxy. Every request is gated behind
//! an OAuth2 authorization-code exchange against an external SSO, and once
//! authenticated the request is proxied through to an S3-compatible object
//! store.
//!
//! # Application Lifecycle
//!
//! 1. **Initializing** — parse CLI/env configuration.
//! 2. **StartingNetwork** — connect the session store, build the SSO and
//!    object-store clients, bind the listener.
//! 3. **Ready** — serving requests.
//! 4. **Terminating** — draining in-flight streaming responses after
//!    SIGTERM, no new connections accepted.

pub mod config;
pub mod errors;
pub mod objectstore;
pub mod server;
pub mod session;
pub mod sso;
pub mod state;

use clap::Parser;

/// CLI arguments for the proxy.
///
/// Every field mirrors one deployment environment variable exactly via
/// `clap`'s `env` attribute, so the process can be configured purely by
/// environment (as it is deployed) while still taking CLI flags in local
/// development.
#[derive(Parser, Debug, Clone)]
#[command(name = "s3proxy", version, about = "Authenticating S3 proxy", long_about = None)]
pub struct Args {
    /// TCP port to listen on.
    #[arg(long = "port", env = "PORT", default_value = "8000")]
    pub port: String,

    /// Redis connection URL backing the session store.
    #[arg(long = "redis-endpoint", env = "REDIS_ENDPOINT")]
    pub redis_endpoint: Option<String>,

    /// Base URL of the SSO, reachable from the browser.
    #[arg(long = "sso-url", env = "SSO_URL")]
    pub sso_url: Option<String>,

    /// Base URL of the SSO, reachable from this process. Defaults to
    /// `SSO_URL` when unset (the SSO may not be reachable from the browser
    /// and the proxy under the same hostname).
    #[arg(long = "sso-url-internal", env = "SSO_URL_INTERNAL")]
    pub sso_url_internal: Option<String>,

    /// OAuth2 client id registered with the SSO.
    #[arg(long = "sso-client-id", env = "SSO_CLIENT_ID")]
    pub sso_client_id: Option<String>,

    /// OAuth2 client secret registered with the SSO.
    #[arg(long = "sso-client-secret", env = "SSO_CLIENT_SECRET")]
    pub sso_client_secret: Option<String>,

    /// S3 bucket objects are proxied from.
    #[arg(long = "aws-s3-bucket", env = "AWS_S3_BUCKET")]
    pub aws_s3_bucket: Option<String>,

    /// AWS region for the S3 client.
    #[arg(long = "aws-default-region", env = "AWS_DEFAULT_REGION")]
    pub aws_default_region: Option<String>,

    /// Object key that the unauthenticated healthcheck path proxies to.
    #[arg(long = "aws-s3-healthcheck-key", env = "AWS_S3_HEALTHCHECK_KEY")]
    pub aws_s3_healthcheck_key: Option<String>,

    /// Optional prefix prepended to every object key.
    #[arg(long = "key-prefix", env = "KEY_PREFIX")]
    pub key_prefix: Option<String>,

    /// Override endpoint URL for the S3 client (e.g. a MinIO instance in
    /// local development).
    #[arg(long = "s3-endpoint-url", env = "S3_ENDPOINT_URL")]
    pub s3_endpoint_url: Option<String>,

    /// Explicit AWS access key id, overriding the SDK's default credential
    /// chain.
    #[arg(long = "aws-access-key-id", env = "AWS_ACCESS_KEY_ID")]
    pub aws_access_key_id: Option<String>,

    /// Explicit AWS secret access key, overriding the SDK's default
    /// credential chain.
    #[arg(long = "aws-secret-access-key", env = "AWS_SECRET_ACCESS_KEY")]
    pub aws_secret_access_key: Option<String>,

    /// Seconds a validated token may be served from the in-process cache
    /// before re-checking it against the SSO's userinfo endpoint.
    #[arg(
        long = "sso-token-check-grace-period",
        env = "SSO_TOKEN_CHECK_GRACE_PERIOD",
        default_value = "0"
    )]
    pub sso_token_check_grace_period: String,
}
