//! SSO client: authorization-code exchange and Bearer-token validation
//! against an external SSO. No PKCE and no local JWT validation — token
//! validity is whatever the SSO's `userinfo` endpoint says it is.

use serde::Deserialize;

use crate::config::ProxyConfig;
use crate::server::constants::REQUEST_USER_AGENT;

const AUTHORIZE_PATH: &str = "o/authorize/";
const TOKEN_PATH: &str = "o/token/";
const USERINFO_PATH: &str = "api/v1/user/me/";

/// Outcome of a code-for-token exchange.
pub enum ExchangeOutcome {
    /// Exchange succeeded; carries the access token to store in the
    /// session record.
    Ok { access_token: String },
    /// The SSO rejected the code (401/403). Carries the exact status so the
    /// callback handler can propagate it verbatim.
    Unauthorized(reqwest::StatusCode),
    /// Anything else: network failure, non-2xx/401/403 status, malformed
    /// body.
    Error,
}

/// Outcome of validating a bearer token against the SSO's userinfo
/// endpoint.
pub enum TokenValidity {
    Valid,
    Invalid,
    Error,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct SsoClient {
    http: reqwest::Client,
    authorize_url: String,
    token_url: String,
    userinfo_url: String,
    client_id: String,
    client_secret: String,
}

impl SsoClient {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(REQUEST_USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            authorize_url: format!("{}{}", config.sso_url, AUTHORIZE_PATH),
            token_url: format!("{}{}", config.sso_url_internal, TOKEN_PATH),
            userinfo_url: format!("{}{}", config.sso_url_internal, USERINFO_PATH),
            client_id: config.sso_client_id.clone(),
            client_secret: config.sso_client_secret.clone(),
            http,
        })
    }

    /// Base URL of the browser-facing authorize endpoint, used by
    /// `redirect_to_sso` when building the 302 `Location`.
    pub fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Exchanges an authorization `code` for an access token.
    ///
    /// `redirect_uri` must be byte-identical to the one sent in the initial
    /// authorize redirect, per OAuth2 — it is not re-derived here, the
    /// caller passes the same value it used to build the authorize URL.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> ExchangeOutcome {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
        ];

        let response = match self.http.post(&self.token_url).form(&params).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(target = "s3proxy::auth", "token exchange request failed: {e}");
                return ExchangeOutcome::Error;
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::debug!(target = "s3proxy::auth", "token exchange rejected: {status}");
            return ExchangeOutcome::Unauthorized(status);
        }
        if !status.is_success() {
            tracing::warn!(target = "s3proxy::auth", "token exchange error: {status}");
            return ExchangeOutcome::Error;
        }

        match response.json::<TokenResponse>().await {
            Ok(body) => ExchangeOutcome::Ok {
                access_token: body.access_token,
            },
            Err(e) => {
                tracing::warn!(target = "s3proxy::auth", "token exchange body malformed: {e}");
                ExchangeOutcome::Error
            }
        }
    }

    /// Checks whether `token` is still valid by calling the SSO's userinfo
    /// endpoint with it as a Bearer token. 200 -> Valid, 401/403 -> Invalid,
    /// everything else (network failure, 5xx, ...) -> Error, which callers
    /// must treat as fail-closed.
    pub async fn validate_token(&self, token: &str) -> TokenValidity {
        let response = match self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(target = "s3proxy::auth", "userinfo request failed: {e}");
                return TokenValidity::Error;
            }
        };

        match response.status() {
            reqwest::StatusCode::OK => TokenValidity::Valid,
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                TokenValidity::Invalid
            }
            other => {
                tracing::warn!(target = "s3proxy::auth", "userinfo unexpected status: {other}");
                TokenValidity::Error
            }
        }
    }
}
