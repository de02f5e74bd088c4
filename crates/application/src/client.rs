//! The public client surface and its request pipeline
//!
//! Every verb and sanitization variant funnels into one parameterized
//! pipeline: sanitize, build headers, dispatch, classify failures.
//! Refresh-eligible 401s route through the coordinator and earn a single
//! retry.

use std::sync::Arc;

use serde_json::{Map, Value};

use relay_domain::{
    ApiRequest, ErrorEnvelope, HttpMethod, MultipartPayload, RequestBody, ResultEnvelope,
};

use crate::config::ClientConfig;
use crate::failure::ErrorClassifier;
use crate::headers::{ACCESS_TOKEN_HEADER, AUTHORIZATION, AuthHeaderBuilder};
use crate::ports::{CredentialStore, Navigator, Notifier, RequestOptions, Transport};
use crate::refresh::RefreshCoordinator;
use crate::sanitize;

/// What every public call resolves to. Failure paths never panic and never
/// propagate a transport error past this boundary.
pub type CallResult = Result<ResultEnvelope, ErrorEnvelope>;

/// How an outgoing payload's empty values are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Remove keys with empty or null values (create operations).
    DropEmpty,
    /// Convert empty values to explicit null, preserving the key
    /// (update operations where "cleared" and "omitted" differ).
    NullEmpty,
}

impl SanitizeMode {
    fn apply(self, fields: &mut Map<String, Value>) {
        match self {
            Self::DropEmpty => sanitize::drop_empty_fields(fields),
            Self::NullEmpty => sanitize::null_empty_fields(fields),
        }
    }
}

/// The authenticated HTTP client.
///
/// Composes the sanitizers, the auth header builder, the error classifier
/// and the refresh coordinator around a transport port. All collaborators
/// are injected; there is no ambient global state.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    headers: AuthHeaderBuilder,
    classifier: ErrorClassifier,
    refresh: RefreshCoordinator,
    config: ClientConfig,
}

impl ApiClient {
    /// Wires a client from its collaborators.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: ClientConfig,
    ) -> Self {
        let headers = AuthHeaderBuilder::new(store.clone());
        let classifier =
            ErrorClassifier::new(notifier.clone(), config.notify_suppress_marker.clone());
        let refresh = RefreshCoordinator::new(
            transport.clone(),
            store,
            notifier,
            navigator,
            config.refresh_path.clone(),
        );
        Self {
            transport,
            headers,
            classifier,
            refresh,
            config,
        }
    }

    /// Makes a GET request.
    pub async fn get(&self, path: &str, options: RequestOptions) -> CallResult {
        self.dispatch_json(HttpMethod::Get, path, None, SanitizeMode::DropEmpty, options)
            .await
    }

    /// Makes a DELETE request.
    pub async fn delete(&self, path: &str, options: RequestOptions) -> CallResult {
        self.dispatch_json(
            HttpMethod::Delete,
            path,
            None,
            SanitizeMode::DropEmpty,
            options,
        )
        .await
    }

    /// Makes a POST request. Payload keys with empty or null values are
    /// removed.
    pub async fn post(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Post,
            path,
            payload,
            SanitizeMode::DropEmpty,
            options,
        )
        .await
    }

    /// Makes a POST request, converting empty payload values to explicit
    /// null instead of removing them.
    pub async fn post_unsanitized(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Post,
            path,
            payload,
            SanitizeMode::NullEmpty,
            options,
        )
        .await
    }

    /// Makes a multipart POST request for uploads. Text fields with empty
    /// or null values are removed.
    pub async fn post_multipart(
        &self,
        path: &str,
        payload: MultipartPayload,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_multipart(HttpMethod::Post, path, payload, SanitizeMode::DropEmpty, options)
            .await
    }

    /// Makes a multipart POST request, converting empty text fields to
    /// explicit null instead of removing them.
    pub async fn post_multipart_unsanitized(
        &self,
        path: &str,
        payload: MultipartPayload,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_multipart(HttpMethod::Post, path, payload, SanitizeMode::NullEmpty, options)
            .await
    }

    /// Makes a PUT request. Payload keys with empty or null values are
    /// removed.
    pub async fn put(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Put,
            path,
            payload,
            SanitizeMode::DropEmpty,
            options,
        )
        .await
    }

    /// Makes a PUT request, converting empty payload values to explicit
    /// null instead of removing them.
    pub async fn put_unsanitized(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Put,
            path,
            payload,
            SanitizeMode::NullEmpty,
            options,
        )
        .await
    }

    /// Makes a multipart PUT request for uploads. Text fields with empty
    /// or null values are removed.
    pub async fn put_multipart(
        &self,
        path: &str,
        payload: MultipartPayload,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_multipart(HttpMethod::Put, path, payload, SanitizeMode::DropEmpty, options)
            .await
    }

    /// Makes a multipart PUT request, converting empty text fields to
    /// explicit null instead of removing them.
    pub async fn put_multipart_unsanitized(
        &self,
        path: &str,
        payload: MultipartPayload,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_multipart(HttpMethod::Put, path, payload, SanitizeMode::NullEmpty, options)
            .await
    }

    /// Makes a PATCH request. Payload keys with empty or null values are
    /// removed.
    pub async fn patch(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Patch,
            path,
            payload,
            SanitizeMode::DropEmpty,
            options,
        )
        .await
    }

    /// Makes a PATCH request, converting empty payload values to explicit
    /// null instead of removing them.
    pub async fn patch_unsanitized(
        &self,
        path: &str,
        payload: Option<Map<String, Value>>,
        options: RequestOptions,
    ) -> CallResult {
        self.dispatch_json(
            HttpMethod::Patch,
            path,
            payload,
            SanitizeMode::NullEmpty,
            options,
        )
        .await
    }

    async fn dispatch_json(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<Map<String, Value>>,
        mode: SanitizeMode,
        options: RequestOptions,
    ) -> CallResult {
        let path = sanitize::sanitize_path(path);
        let body = payload.map_or(RequestBody::None, |mut fields| {
            mode.apply(&mut fields);
            RequestBody::Json(Value::Object(fields))
        });
        let request =
            Self::build_request(method, path, body, self.headers.json_headers(), &options);
        self.execute(request, options).await
    }

    // Multipart endpoints carry no sanitizable query strings; the path is
    // used as given.
    async fn dispatch_multipart(
        &self,
        method: HttpMethod,
        path: &str,
        mut payload: MultipartPayload,
        mode: SanitizeMode,
        options: RequestOptions,
    ) -> CallResult {
        mode.apply(&mut payload.fields);
        let request = Self::build_request(
            method,
            path.to_string(),
            RequestBody::Multipart(payload),
            self.headers.multipart_headers(),
            &options,
        );
        self.execute(request, options).await
    }

    fn build_request(
        method: HttpMethod,
        path: String,
        body: RequestBody,
        headers: Vec<(String, String)>,
        options: &RequestOptions,
    ) -> ApiRequest {
        let mut request = ApiRequest {
            method,
            path,
            headers,
            body,
        };
        // Caller overrides win per header name.
        for (name, value) in &options.headers {
            request.set_header(name, value.clone());
        }
        request
    }

    async fn execute(&self, request: ApiRequest, options: RequestOptions) -> CallResult {
        tracing::debug!(method = %request.method, path = %request.path, "dispatching request");
        match self.transport.send(&request, &options).await {
            Err(error) => Err(self.classifier.no_response(&request.path, &error)),
            Ok(response) if response.is_success() => Ok(ResultEnvelope::from_response(response)),
            Ok(response)
                if response.is_unauthorized()
                    && !self.config.is_refresh_excluded(&request.path) =>
            {
                self.retry_after_refresh(request, options).await
            }
            Ok(response) => Err(self.classifier.http_failure(&request.path, &response)),
        }
    }

    /// Refreshes the session, then retries the original request exactly
    /// once with the refreshed token. A second 401 on the retry terminates
    /// the session instead of recursing into another refresh.
    async fn retry_after_refresh(
        &self,
        mut request: ApiRequest,
        options: RequestOptions,
    ) -> CallResult {
        let Ok(token) = self.refresh.refresh().await else {
            // The coordinator already notified, cleared credentials and
            // redirected; the caller just gets the terminal envelope.
            return Err(ErrorEnvelope::session_expired());
        };

        request.set_header(AUTHORIZATION, format!("Bearer {}", token.access_token));
        request.set_header(ACCESS_TOKEN_HEADER, token.access_token);

        match self.transport.send(&request, &options).await {
            Err(error) => Err(self.classifier.no_response(&request.path, &error)),
            Ok(response) if response.is_success() => Ok(ResultEnvelope::from_response(response)),
            Ok(response) if response.is_unauthorized() => {
                self.refresh.expire_session();
                Err(ErrorEnvelope::session_expired())
            }
            Ok(response) => Err(self.classifier.http_failure(&request.path, &response)),
        }
    }
}
