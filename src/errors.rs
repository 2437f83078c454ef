use thiserror::Error;

/// Failures that can occur while bringing the process up, before it starts
/// accepting connections.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Session store unavailable: {0}")]
    SessionStoreUnavailable(String),

    #[error("Failed to bind listener: {0}")]
    BindFailed(String),

    #[error("Other startup error: {0}")]
    Other(String),
}
