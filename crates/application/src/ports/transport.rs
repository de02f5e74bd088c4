//! HTTP transport port

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use relay_domain::{ApiRequest, ApiResponse};

/// Errors for exchanges that produced no response at all.
///
/// Any status the server answered with, including 4xx and 5xx, is an
/// `Ok(ApiResponse)` from the transport; these variants cover the rest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request exceeded its timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request URL could not be constructed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The caller aborted the request through its cancellation token.
    #[error("request aborted")]
    Aborted,

    /// The request body could not be encoded.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// Any other transport-level failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// Upload progress callback: `(bytes_sent, bytes_total)`.
pub type UploadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Caller-supplied options for a single request.
///
/// `headers` are merged into the generated headers by the client before
/// dispatch, with the caller winning per header name; the remaining fields
/// are consumed by the transport.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Header overrides, applied after the generated auth headers.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Aborts this request only; a shared in-flight token refresh is
    /// never cancelled by an individual caller.
    pub cancel: Option<CancellationToken>,
    /// Invoked as multipart file bytes go out on the wire.
    pub on_upload_progress: Option<UploadProgress>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header override.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Attaches an upload-progress callback.
    #[must_use]
    pub fn upload_progress(mut self, callback: UploadProgress) -> Self {
        self.on_upload_progress = Some(callback);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("timeout_ms", &self.timeout_ms)
            .field("cancel", &self.cancel.is_some())
            .field("on_upload_progress", &self.on_upload_progress.is_some())
            .finish()
    }
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing the
/// pipeline to be independent of specific HTTP libraries and testable
/// with fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a request.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received: connection
    /// failure, timeout, abort or a body that could not be encoded.
    async fn send(
        &self,
        request: &ApiRequest,
        options: &RequestOptions,
    ) -> Result<ApiResponse, TransportError>;
}
