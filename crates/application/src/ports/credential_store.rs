//! Credential store port

use relay_domain::AuthToken;

/// Port for the host application's credential storage.
///
/// The store owns the token pair. The pipeline reads the access token
/// fresh at request time, never caching it, and writes back only after a
/// successful refresh. Implementations are expected to be cheap to call.
pub trait CredentialStore: Send + Sync {
    /// Returns the current access token, if a session exists.
    fn get_access_token(&self) -> Option<String>;

    /// Returns the current refresh token, if a session exists.
    fn get_refresh_token(&self) -> Option<String>;

    /// Overwrites the stored token pair after a successful refresh.
    fn set_token_data(&self, token: AuthToken);

    /// Removes all stored credentials when the session is terminated.
    fn clear_auth_data(&self);
}
