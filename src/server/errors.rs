//! Error taxonomy for request handling.
//!
//! Every variant maps to exactly one status code and a fixed body. Upstream
//! response bodies (from the SSO or the object store) are never forwarded to
//! the client; only the status code is ever propagated.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::server::constants::EXPIRED_STATE_BODY;

#[derive(Debug)]
pub enum ProxyError {
    /// The SSO rejected the token, or the callback's code/state exchange
    /// came back 401/403.
    Unauthorized,
    /// The requested object does not exist (`NoSuchKey`).
    NotFound,
    /// The callback request was missing `code` or `state`.
    BadRequest,
    /// The `state` named in a callback is not known to the session store
    /// (expired or never issued).
    Expired,
    /// Anything else: SSO unreachable, object store error other than
    /// `NoSuchKey`, session store error, etc. Fail closed.
    Internal,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::Unauthorized => Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .body(Body::empty())
                .unwrap(),
            ProxyError::NotFound => Response::builder()
                .status(StatusCode::NOT_FOUND)
                .body(Body::empty())
                .unwrap(),
            ProxyError::BadRequest => Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Body::empty())
                .unwrap(),
            ProxyError::Expired => Response::builder()
                .status(StatusCode::FORBIDDEN)
                .header("content-type", "text/html")
                .body(Body::from(EXPIRED_STATE_BODY))
                .unwrap(),
            ProxyError::Internal => Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::empty())
                .unwrap(),
        }
    }
}
