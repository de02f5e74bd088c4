//! Uniform result and error envelopes
//!
//! Every public client call resolves to one of these two shapes; no
//! transport failure ever escapes the client boundary as anything else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::request::ApiResponse;

/// Message used when no response was received from the server.
pub const CONNECT_FAILED_MESSAGE: &str = "Failed to connect to server";

/// Fallback message when the server did not provide one.
pub const GENERIC_SERVER_ERROR: &str = "Server error!";

/// Message shown when the session can no longer be refreshed.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired please login again!";

/// The success envelope returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// The HTTP status of the response.
    pub status: u16,
    /// The server-provided `message` field, if any.
    pub message: Option<String>,
    /// The full response body.
    pub data: Value,
}

impl ResultEnvelope {
    /// Builds the envelope from a successful exchange.
    #[must_use]
    pub fn from_response(response: ApiResponse) -> Self {
        let message = response.message().map(str::to_string);
        Self {
            status: response.status,
            message,
            data: response.body,
        }
    }
}

/// The error envelope returned to callers on any failure path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{status}: {message}")]
pub struct ErrorEnvelope {
    /// The HTTP status of the failed exchange, or 500 when none was received.
    pub status: u16,
    /// A user-presentable failure message.
    pub message: String,
}

impl ErrorEnvelope {
    /// Creates an envelope from a status and message.
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// The envelope for a request that received no response at all.
    #[must_use]
    pub fn connection_failed() -> Self {
        Self::new(500, CONNECT_FAILED_MESSAGE)
    }

    /// The envelope returned after the session has been terminated.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::new(401, SESSION_EXPIRED_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_envelope_from_response() {
        let response = ApiResponse::new(201, json!({"message": "created", "id": 7}));
        let envelope = ResultEnvelope::from_response(response);
        assert_eq!(envelope.status, 201);
        assert_eq!(envelope.message.as_deref(), Some("created"));
        assert_eq!(envelope.data["id"], 7);
    }

    #[test]
    fn test_envelope_without_message() {
        let envelope = ResultEnvelope::from_response(ApiResponse::new(204, Value::Null));
        assert_eq!(envelope.message, None);
    }

    #[test]
    fn test_error_envelope_display() {
        let envelope = ErrorEnvelope::connection_failed();
        assert_eq!(envelope.to_string(), "500: Failed to connect to server");
        assert_eq!(ErrorEnvelope::session_expired().status, 401);
    }
}
