//! Error types for the signaling session

use crate::session::SessionState;
use std::time::Duration;

/// Result type alias using the signaling [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end (or degrade) a signaling session
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed base URL or a request that could not be built
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Connection-level failure on one of the bridge calls
    #[error("transport error: {0}")]
    Transport(String),

    /// The bridge did not answer within the request timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The bridge refused the bearer token
    #[error("bridge rejected credentials (status {0})")]
    Unauthorized(u16),

    /// The bridge answered with a non-success status
    #[error("bridge returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// ICE server list was unavailable or unreadable. Never fatal: the
    /// session logs it and carries on with an empty server set.
    #[error("ice discovery degraded: {0}")]
    DiscoveryDegraded(String),

    /// Offer generation or answer application failed in the media engine
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("session cancelled")]
    Cancelled,

    /// `negotiate` was called on a session that already ran
    #[error("session already started (state: {0})")]
    AlreadyStarted(SessionState),
}

impl Error {
    /// Whether a caller-level policy may retry with a fresh session
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Timeout(_))
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

impl From<webrtc::Error> for Error {
    fn from(err: webrtc::Error) -> Self {
        Error::Negotiation(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(err.to_string())
    }
}
