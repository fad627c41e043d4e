//! Error taxonomy for the pull query surface.

use thiserror::Error;

/// Error returned by feed and mutation calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a usable response (network error,
    /// timeout). Retrying the same call may succeed.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The server answered and refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A response (or push frame) arrived but could not be decoded.
    #[error("malformed payload: {message}")]
    Decode { message: String },
}

impl ApiError {
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        ApiError::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode {
            message: message.into(),
        }
    }

    /// True for failures where retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
