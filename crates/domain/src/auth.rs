//! Authentication token types

use serde::{Deserialize, Serialize};

/// An access/refresh token pair as issued by the backend.
///
/// The pair is owned by the host application's credential store; the client
/// reads it fresh from the store at request time and never caches it. Wire
/// names follow the backend contract: the access token travels as `token`,
/// the refresh token as `refreshToken`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// The short-lived access token attached to every request.
    #[serde(rename = "token")]
    pub access_token: String,
    /// The long-lived token exchanged for a new pair when the session expires.
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl AuthToken {
    /// Creates a new token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}
