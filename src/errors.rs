//! Error taxonomy for the chat relay path.
//!
//! Every failure is terminal for its request and is turned into a JSON body with a matching
//! status code.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The caller did not present the configured access token.
    #[error("Unauthorized")]
    Unauthorized,

    /// `messages` was missing or not an array.
    #[error("Invalid messages format")]
    InvalidMessages,

    /// The upstream API answered with a non-success status.
    #[error("OpenAI API error ({status}): {details}")]
    Upstream { status: StatusCode, details: String },

    /// Anything unexpected: unreadable or malformed input, transport failures, timeouts.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidMessages => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::Unauthorized => ErrorBody::new("Unauthorized"),
            Self::InvalidMessages => ErrorBody::new("Invalid messages format"),
            Self::Upstream { details, .. } => {
                ErrorBody::new("OpenAI API error").with_details(details.clone())
            }
            Self::Internal(message) => {
                ErrorBody::new("Internal server error").with_message(message.clone())
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
