//! Transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port from the application
//! layer. Any status the server answers with becomes an `ApiResponse`;
//! `TransportError` is reserved for exchanges that produced no response.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, Url};
use serde_json::Value;

use relay_application::ports::{RequestOptions, Transport, TransportError, UploadProgress};
use relay_domain::{ApiRequest, ApiResponse, FilePart, HttpMethod, MultipartPayload, RequestBody};

/// Chunk size for progress-reporting upload streams.
const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Transport implementation using reqwest.
///
/// Wraps a `reqwest::Client` and a base URL that every request path is
/// resolved against.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    ///
    /// Default configuration:
    /// - Follow redirects: up to 10
    /// - TLS verification: enabled
    /// - User-Agent: "Relay/<version>"
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("Relay/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Converts the domain method to a reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    /// Resolves a request path against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        let absolute = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&absolute).map_err(|e| TransportError::InvalidUrl(format!("{e}: {absolute}")))
    }

    /// Renders a JSON field value as multipart form text.
    fn field_text(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Builds the multipart form, optionally wrapping file parts in a
    /// progress-reporting stream.
    fn multipart_form(
        payload: &MultipartPayload,
        progress: Option<&UploadProgress>,
    ) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (name, value) in &payload.fields {
            form = form.text(name.clone(), Self::field_text(value));
        }

        let total: u64 = payload.files.iter().map(|f| f.bytes.len() as u64).sum();
        let sent = Arc::new(AtomicU64::new(0));
        for file in &payload.files {
            let part = Self::file_part(file, progress, &sent, total)?;
            form = form.part(file.name.clone(), part);
        }
        Ok(form)
    }

    fn file_part(
        file: &FilePart,
        progress: Option<&UploadProgress>,
        sent: &Arc<AtomicU64>,
        total: u64,
    ) -> Result<Part, TransportError> {
        let mime: mime::Mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
        let part = match progress {
            Some(callback) => {
                let length = file.bytes.len() as u64;
                let stream = progress_stream(
                    file.bytes.clone(),
                    sent.clone(),
                    total,
                    callback.clone(),
                );
                Part::stream_with_length(Body::wrap_stream(stream), length)
            }
            None => Part::bytes(file.bytes.clone()),
        };
        part.file_name(file.file_name.clone())
            .mime_str(mime.as_ref())
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }

    /// Maps reqwest errors to the port's no-response taxonomy.
    fn map_error(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            return TransportError::Timeout;
        }
        if error.is_connect() {
            return TransportError::ConnectionFailed(error.to_string());
        }
        if error.is_body() || error.is_request() {
            return TransportError::InvalidBody(error.to_string());
        }
        TransportError::Other(error.to_string())
    }
}

/// Splits the bytes into chunks and reports cumulative progress as each
/// chunk is pulled onto the wire.
fn progress_stream(
    bytes: Vec<u8>,
    sent: Arc<AtomicU64>,
    total: u64,
    callback: UploadProgress,
) -> impl futures_util::Stream<Item = Result<Vec<u8>, std::convert::Infallible>> {
    let chunks: Vec<Vec<u8>> = bytes
        .chunks(UPLOAD_CHUNK_BYTES)
        .map(<[u8]>::to_vec)
        .collect();
    futures_util::stream::iter(chunks).map(move |chunk| {
        let done = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        callback(done, total);
        Ok(chunk)
    })
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        options: &RequestOptions,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request.path)?;
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        if let Some(timeout_ms) = options.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        builder = match &request.body {
            RequestBody::None => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(payload) => builder.multipart(Self::multipart_form(
                payload,
                options.on_upload_progress.as_ref(),
            )?),
        };

        let send = builder.send();
        let result = match &options.cancel {
            Some(token) => tokio::select! {
                () = token.cancelled() => return Err(TransportError::Aborted),
                result = send => result,
            },
            None => send.await,
        };
        let response = result.map_err(|e| Self::map_error(&e))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Other(format!("failed to read body: {e}")))?;
        // Non-JSON bodies classify with the generic fallback message.
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Ok(ApiResponse::new(status, body))
    }
}
