//! Configuration for the proxy, loaded the way this service is deployed:
//! straight from environment variables (overridable for local development
//! via CLI flags of the same name).

use std::time::Duration;
use thiserror::Error;

pub mod defaults;

/// Root configuration for the proxy.
///
/// Field names track the deployment's environment variables exactly; see
/// `ProxyConfig::from_args` for the mapping.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub port: u16,
    pub redis_endpoint: String,
    pub sso_url: String,
    pub sso_url_internal: String,
    pub sso_client_id: String,
    pub sso_client_secret: String,
    pub aws_s3_bucket: String,
    pub aws_default_region: String,
    pub aws_s3_healthcheck_key: String,
    pub key_prefix: String,
    pub s3_endpoint_url: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub sso_token_check_grace_period: Duration,

    pub cookie_ttl: Duration,
    pub session_ttl: Duration,
    pub state_ttl: Duration,
}

impl ProxyConfig {
    /// Build a `ProxyConfig` from the parsed CLI/env arguments.
    ///
    /// `clap`'s `env` attribute on `Args` already pulled values from the
    /// process environment when no flag was given, so by the time this runs
    /// `args` holds the effective configuration; this function only
    /// validates shape (e.g. parses `PORT` into a `u16`) and fills the fixed
    /// TTLs.
    pub fn from_args(args: crate::Args) -> Result<Self, ConfigError> {
        let port: u16 = args
            .port
            .parse()
            .map_err(|_| ConfigError::Invalid("PORT".into(), args.port.clone()))?;

        let sso_url = normalize_base_url(&require(args.sso_url, "SSO_URL")?);
        let sso_url_internal = args
            .sso_url_internal
            .map(|v| normalize_base_url(&v))
            .unwrap_or_else(|| sso_url.clone());

        let key_prefix = match args.key_prefix {
            Some(p) if !p.is_empty() => format!("{}/", p),
            _ => String::new(),
        };

        let grace_period_secs: u64 = args
            .sso_token_check_grace_period
            .parse()
            .map_err(|_| {
                ConfigError::Invalid(
                    "SSO_TOKEN_CHECK_GRACE_PERIOD".into(),
                    args.sso_token_check_grace_period.clone(),
                )
            })?;

        Ok(Self {
            port,
            redis_endpoint: require(args.redis_endpoint, "REDIS_ENDPOINT")?,
            sso_url,
            sso_url_internal,
            sso_client_id: require(args.sso_client_id, "SSO_CLIENT_ID")?,
            sso_client_secret: require(args.sso_client_secret, "SSO_CLIENT_SECRET")?,
            aws_s3_bucket: require(args.aws_s3_bucket, "AWS_S3_BUCKET")?,
            aws_default_region: require(args.aws_default_region, "AWS_DEFAULT_REGION")?,
            aws_s3_healthcheck_key: require(args.aws_s3_healthcheck_key, "AWS_S3_HEALTHCHECK_KEY")?,
            key_prefix,
            s3_endpoint_url: args.s3_endpoint_url,
            aws_access_key_id: args.aws_access_key_id,
            aws_secret_access_key: args.aws_secret_access_key,
            sso_token_check_grace_period: Duration::from_secs(grace_period_secs),
            cookie_ttl: Duration::from_secs(defaults::default_cookie_ttl_secs()),
            session_ttl: Duration::from_secs(defaults::default_session_ttl_secs()),
            state_ttl: Duration::from_secs(defaults::default_state_ttl_secs()),
        })
    }
}

fn require(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Strips a trailing slash so callers can always write `{base}/path` without
/// doubling slashes, mirroring the original `f"{sso_url}{auth_path}"`
/// concatenation, which assumed a trailing slash on `sso_url`.
fn normalize_base_url(raw: &str) -> String {
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}
