//! Auth header derivation

use std::sync::Arc;

use crate::ports::CredentialStore;

/// The standard authorization header name.
pub const AUTHORIZATION: &str = "Authorization";

/// Secondary header carrying the bare token, for backends expecting the
/// custom convention instead of `Authorization`.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Derives request headers from the currently stored access token.
///
/// The token is read from the store on every call so a refreshed pair is
/// picked up immediately; nothing is cached here.
pub struct AuthHeaderBuilder {
    store: Arc<dyn CredentialStore>,
}

impl AuthHeaderBuilder {
    /// Creates a builder reading from the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Headers for standard JSON calls.
    #[must_use]
    pub fn json_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];
        self.apply_token(&mut headers);
        headers
    }

    /// Headers for multipart uploads.
    ///
    /// Content-Type is deliberately absent: the transport must set its own
    /// with the multipart boundary.
    #[must_use]
    pub fn multipart_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        self.apply_token(&mut headers);
        headers
    }

    fn apply_token(&self, headers: &mut Vec<(String, String)>) {
        if let Some(token) = self.store.get_access_token() {
            headers.push((AUTHORIZATION.to_string(), format!("Bearer {token}")));
            headers.push((ACCESS_TOKEN_HEADER.to_string(), token));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use relay_domain::AuthToken;
    use std::sync::Mutex;

    struct FakeStore {
        access_token: Mutex<Option<String>>,
    }

    impl FakeStore {
        fn with_token(token: &str) -> Arc<Self> {
            Arc::new(Self {
                access_token: Mutex::new(Some(token.to_string())),
            })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self {
                access_token: Mutex::new(None),
            })
        }
    }

    impl CredentialStore for FakeStore {
        fn get_access_token(&self) -> Option<String> {
            self.access_token.lock().ok().and_then(|guard| guard.clone())
        }

        fn get_refresh_token(&self) -> Option<String> {
            None
        }

        fn set_token_data(&self, _token: AuthToken) {}

        fn clear_auth_data(&self) {}
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_json_headers_with_token() {
        let builder = AuthHeaderBuilder::new(FakeStore::with_token("tok-1"));
        let headers = builder.json_headers();
        assert_eq!(header(&headers, "Content-Type"), Some("application/json"));
        assert_eq!(header(&headers, "Accept"), Some("application/json"));
        assert_eq!(header(&headers, AUTHORIZATION), Some("Bearer tok-1"));
        assert_eq!(header(&headers, ACCESS_TOKEN_HEADER), Some("tok-1"));
    }

    #[test]
    fn test_json_headers_without_token() {
        let builder = AuthHeaderBuilder::new(FakeStore::empty());
        let headers = builder.json_headers();
        assert_eq!(header(&headers, AUTHORIZATION), None);
        assert_eq!(header(&headers, ACCESS_TOKEN_HEADER), None);
    }

    #[test]
    fn test_multipart_headers_omit_content_type() {
        let builder = AuthHeaderBuilder::new(FakeStore::with_token("tok-1"));
        let headers = builder.multipart_headers();
        assert_eq!(header(&headers, "Content-Type"), None);
        assert_eq!(header(&headers, AUTHORIZATION), Some("Bearer tok-1"));
    }
}
