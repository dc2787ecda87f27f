//! Error types for worker addons.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::{ActionType, FetchError, ValidationError};

/// Errors that can occur while building an addon or running its actions.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Addon properties failed validation.
    #[error("Invalid addon properties: {0}")]
    Validation(#[from] ValidationError),

    /// A handler is already bound to the action.
    #[error("Another handler is already registered for \"{0}\" action")]
    DuplicateHandler(ActionType),

    /// No handler is bound to the action.
    #[error("No handler for \"{0}\" action")]
    HandlerNotFound(ActionType),

    /// The action name is not a known action.
    #[error("Unknown action \"{0}\"")]
    UnknownAction(String),

    /// The action input could not be decoded.
    #[error("Invalid input for \"{action}\" action: {message}")]
    InvalidInput { action: ActionType, message: String },

    /// The handler output could not be encoded.
    #[error("Invalid output from \"{action}\" action: {message}")]
    InvalidOutput { action: ActionType, message: String },

    /// Failure raised by a handler.
    #[error("Handler error: {0}")]
    Handler(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ActionError {
    /// Create a handler failure from any displayable error.
    pub fn handler(err: impl std::fmt::Display) -> Self {
        Self::Handler(err.to_string())
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::HandlerNotFound(action) => format!("Action '{action}' is not supported"),
            Self::UnknownAction(name) => format!("Action '{name}' is not supported"),
            Self::InvalidInput { message, .. } => format!("Invalid input: {message}"),
            Self::Validation(_) | Self::DuplicateHandler(_) | Self::InvalidOutput { .. } => {
                "The addon is misconfigured".into()
            }
            Self::Handler(msg) => msg.clone(),
            Self::Fetch(e) => format!("Remote request failed: {e}"),
        }
    }

    /// Whether the error means "no such action" rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound(_) | Self::UnknownAction(_))
    }

    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerNotFound(_) | Self::UnknownAction(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this error points at a bug worth reporting.
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::DuplicateHandler(_) | Self::InvalidOutput { .. }
        )
    }

    /// Serializable body for transports.
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.status_code().as_u16(),
            error: self.user_message(),
        }
    }
}

/// Error body returned to callers of an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: u16,
    pub error: String,
}
