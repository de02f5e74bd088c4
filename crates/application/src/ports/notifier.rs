//! User notification port

/// Port for surfacing failure messages to the user.
///
/// The `dedupe_key` lets the host collapse repeated notifications for the
/// same source (the original toast layer keyed them by request URL).
pub trait Notifier: Send + Sync {
    /// Shows an error message to the user.
    fn notify_error(&self, message: &str, dedupe_key: &str);
}
