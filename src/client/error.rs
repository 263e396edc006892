//! Client error types.

use super::Action;

/// Errors from deployment endpoint requests.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("{action} request failed: {message}")]
    RequestFailed { action: Action, message: String },

    #[error("{action} request timed out")]
    Timeout { action: Action },

    #[error("{action} request returned HTTP {status}: {body}")]
    Status {
        action: Action,
        status: u16,
        body: String,
    },

    #[error("Invalid {action} response: {message}")]
    InvalidResponse { action: Action, message: String },
}

impl ClientError {
    /// Request kind that failed, if the error belongs to one.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Build(_) => None,
            Self::RequestFailed { action, .. }
            | Self::Timeout { action }
            | Self::Status { action, .. }
            | Self::InvalidResponse { action, .. } => Some(*action),
        }
    }

    pub(crate) fn from_reqwest(action: Action, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { action }
        } else {
            Self::RequestFailed {
                action,
                message: err.to_string(),
            }
        }
    }
}
