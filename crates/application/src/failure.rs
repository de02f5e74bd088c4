//! Failure classification and notification suppression
//!
//! Maps failed transport exchanges into the uniform [`ErrorEnvelope`],
//! deciding along the way whether the user should be notified.

use std::sync::Arc;

use relay_domain::{ApiResponse, CONNECT_FAILED_MESSAGE, ErrorEnvelope, GENERIC_SERVER_ERROR};

use crate::ports::{Notifier, TransportError};

/// Classifies failed exchanges into error envelopes.
pub struct ErrorClassifier {
    notifier: Arc<dyn Notifier>,
    suppress_marker: String,
}

impl ErrorClassifier {
    /// Creates a classifier.
    ///
    /// Failures from paths containing `suppress_marker` never notify the
    /// user; background polling should not toast on every hiccup.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, suppress_marker: impl Into<String>) -> Self {
        Self {
            notifier,
            suppress_marker: suppress_marker.into(),
        }
    }

    /// A request that received no response at all: connectivity failure,
    /// timeout or abort.
    #[must_use]
    pub fn no_response(&self, path: &str, error: &TransportError) -> ErrorEnvelope {
        tracing::warn!(path, %error, "no response received");
        self.notifier.notify_error(CONNECT_FAILED_MESSAGE, path);
        ErrorEnvelope::connection_failed()
    }

    /// A request the server answered with a failure status.
    #[must_use]
    pub fn http_failure(&self, path: &str, response: &ApiResponse) -> ErrorEnvelope {
        if response.is_infrastructure_error() {
            tracing::error!(path, status = response.status, "server error occurred");
        }
        let message = response.message().unwrap_or(GENERIC_SERVER_ERROR);
        if !path.contains(&self.suppress_marker) {
            self.notifier.notify_error(message, path);
        }
        ErrorEnvelope::new(response.status, message)
    }
}
