//! Navigation port

/// Port for sending the user back to the unauthenticated entry point.
///
/// Invoked exactly once per terminated session, after credentials have
/// been cleared.
pub trait Navigator: Send + Sync {
    /// Redirects to the login entry point.
    ///
    /// `session_expired` is surfaced to the entry point so it can explain
    /// why the user landed there.
    fn redirect_to_login(&self, session_expired: bool);
}
