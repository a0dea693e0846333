//! Error types for authenticated client operations

use bytes::Bytes;
use reqwest::StatusCode;
use transport::Request;

/// Errors surfaced to callers of `AuthClient`.
///
/// A 401 that the refresh coordinator recovers from never reaches the caller;
/// everything else arrives here unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-2xx response. `request` is the descriptor as the caller built it,
    /// before any transform stamped headers on it.
    #[error("request failed with status {status}")]
    Status {
        status: StatusCode,
        body: Bytes,
        request: Box<Request>,
    },

    #[error("transport error: {0}")]
    Transport(#[from] transport::Error),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid response body: {0}")]
    Decode(String),
}

impl Error {
    /// HTTP status of a `Status` failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Descriptor that produced a `Status` failure.
    pub fn request(&self) -> Option<&Request> {
        match self {
            Error::Status { request, .. } => Some(request),
            _ => None,
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
