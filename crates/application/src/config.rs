//! Client configuration

/// Configuration for the request pipeline.
///
/// All fields have defaults matching the backend this client was written
/// against; hosts with different route layouts override them here rather
/// than through any global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Path of the token refresh endpoint.
    pub refresh_path: String,
    /// Endpoints whose 401 means "invalid credentials", not "expired
    /// session": login, the refresh endpoint itself, OTP verification.
    /// Matched by exact path equality.
    pub refresh_excluded: Vec<String>,
    /// Requests whose path contains this marker never notify the user on
    /// failure (background polling endpoints).
    pub notify_suppress_marker: String,
}

impl ClientConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the refresh endpoint path.
    #[must_use]
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Overrides the excluded endpoint set.
    #[must_use]
    pub fn refresh_excluded(mut self, paths: Vec<String>) -> Self {
        self.refresh_excluded = paths;
        self
    }

    /// Overrides the notification suppression marker.
    #[must_use]
    pub fn notify_suppress_marker(mut self, marker: impl Into<String>) -> Self {
        self.notify_suppress_marker = marker.into();
        self
    }

    /// Returns true when a 401 from this path must not trigger a refresh.
    #[must_use]
    pub fn is_refresh_excluded(&self, path: &str) -> bool {
        self.refresh_excluded.iter().any(|excluded| excluded == path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            refresh_path: "auth/refresh-token".to_string(),
            refresh_excluded: vec![
                "e-commerce/auth/login".to_string(),
                "auth/refresh-token".to_string(),
                "auth/otp-verify".to_string(),
            ],
            notify_suppress_marker: "notification".to_string(),
        }
    }
}
