//! Request and response specification types

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Supported HTTP methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET method
    #[default]
    Get,
    /// HTTP POST method
    Post,
    /// HTTP PUT method
    Put,
    /// HTTP PATCH method
    Patch,
    /// HTTP DELETE method
    Delete,
}

impl HttpMethod {
    /// Returns the method as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A file to be sent as one part of a multipart request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePart {
    /// The form field name this file is attached under.
    pub name: String,
    /// The file name reported to the server; also drives MIME guessing.
    pub file_name: String,
    /// The raw file content.
    pub bytes: Vec<u8>,
}

/// A multipart request payload: JSON-like text fields plus file parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultipartPayload {
    /// Plain form fields, subject to the same sanitization as JSON payloads.
    pub fields: Map<String, Value>,
    /// File parts, sent as-is.
    pub files: Vec<FilePart>,
}

impl MultipartPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Adds a file part.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }
}

/// The body of an outgoing request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestBody {
    /// No body
    #[default]
    None,
    /// A JSON object body
    Json(Value),
    /// A multipart form-data body
    Multipart(MultipartPayload),
}

/// A transient per-call request descriptor.
///
/// The `path` is relative to the transport's base URL. Headers are plain
/// name/value pairs; [`ApiRequest::set_header`] replaces case-insensitively
/// so caller overrides and token rewrites never duplicate a header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The route of the requested resource, excluding the base URL.
    pub path: String,
    /// Request headers in dispatch order.
    pub headers: Vec<(String, String)>,
    /// The request body.
    pub body: RequestBody,
}

impl ApiRequest {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::None,
        }
    }

    /// Sets a header, replacing any existing value under the same
    /// case-insensitive name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing_value)) => *existing_value = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Looks up a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A completed HTTP exchange: any status the server answered with.
///
/// Transport errors (no response received) are represented separately;
/// a 4xx or 5xx still produces an `ApiResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The response body parsed as JSON, or `Value::Null` when unparseable.
    pub body: Value,
}

impl ApiResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Returns true for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for a 401 status.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns true for the 500-504 infrastructure failure range.
    #[must_use]
    pub const fn is_infrastructure_error(&self) -> bool {
        self.status >= 500 && self.status <= 504
    }

    /// Returns the server-provided `message` field, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(Value::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_method_as_str() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut request = ApiRequest::new(HttpMethod::Get, "items");
        request.set_header("Authorization", "Bearer old");
        request.set_header("authorization", "Bearer new");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_response_message_extraction() {
        let response = ApiResponse::new(404, json!({"message": "not found"}));
        assert_eq!(response.message(), Some("not found"));
        assert!(!response.is_success());

        let response = ApiResponse::new(200, json!({"items": []}));
        assert_eq!(response.message(), None);
        assert!(response.is_success());
    }

    #[test]
    fn test_infrastructure_error_range() {
        assert!(ApiResponse::new(500, Value::Null).is_infrastructure_error());
        assert!(ApiResponse::new(504, Value::Null).is_infrastructure_error());
        assert!(!ApiResponse::new(505, Value::Null).is_infrastructure_error());
        assert!(!ApiResponse::new(404, Value::Null).is_infrastructure_error());
    }

    #[test]
    fn test_multipart_builder() {
        let payload = MultipartPayload::new()
            .field("title", "hello")
            .file("attachment", "photo.png", vec![1, 2, 3]);
        assert_eq!(payload.fields.len(), 1);
        assert_eq!(payload.files[0].file_name, "photo.png");
    }
}
