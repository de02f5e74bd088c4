//! Single-flight token refresh coordination
//!
//! Many requests can fail with a 401 at nearly the same time; at most one
//! refresh network call may run for all of them. The in-flight attempt is
//! a [`Shared`] future in a mutex-guarded slot: the first arrival creates
//! it, later arrivals clone and await it, and whichever waiter observes
//! settlement first clears the slot, on every exit path.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;

use relay_domain::{ApiRequest, AuthToken, HttpMethod, RequestBody, SESSION_EXPIRED_MESSAGE};

use crate::ports::{CredentialStore, Navigator, Notifier, RequestOptions, Transport};

/// Dedupe key for session-expiry notifications.
const SESSION_EXPIRED_KEY: &str = "session-expired";

/// Ways a refresh attempt can fail.
///
/// `Clone` because every waiter on the shared attempt receives the same
/// outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token is stored; there is no session to extend.
    #[error("refresh token not available, please login again")]
    MissingRefreshToken,

    /// The refresh call itself received no response.
    #[error("token refresh transport failure: {0}")]
    Transport(String),

    /// The refresh endpoint rejected the refresh token.
    #[error("token refresh rejected with status {status}")]
    Rejected {
        /// The status the refresh endpoint answered with.
        status: u16,
    },

    /// The refresh endpoint answered 2xx with an unusable body.
    #[error("malformed token grant: {0}")]
    MalformedGrant(String),
}

type SharedAttempt = Shared<BoxFuture<'static, Result<AuthToken, RefreshError>>>;

/// Guarantees at most one concurrent token-refresh call process-wide.
pub struct RefreshCoordinator {
    inflight: Mutex<Option<SharedAttempt>>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    refresh_path: String,
}

impl RefreshCoordinator {
    /// Creates a coordinator posting to `refresh_path` through `transport`.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            inflight: Mutex::new(None),
            transport,
            store,
            notifier,
            navigator,
            refresh_path: refresh_path.into(),
        }
    }

    /// Refreshes the session, joining an in-flight attempt if one exists.
    ///
    /// On success the new pair has already been persisted to the store and
    /// the new token is returned to every waiter. On failure the session
    /// has already been terminated (user notified, credentials cleared,
    /// redirect issued) exactly once, inside the attempt.
    ///
    /// # Errors
    ///
    /// Returns the settled [`RefreshError`] of the attempt this caller
    /// observed.
    pub async fn refresh(&self) -> Result<AuthToken, RefreshError> {
        let attempt = {
            let mut slot = self.inflight.lock().await;
            if let Some(existing) = slot.as_ref() {
                tracing::debug!("joining in-flight token refresh");
                existing.clone()
            } else {
                tracing::warn!("session expired, starting token refresh");
                let attempt = Self::run_attempt(
                    self.transport.clone(),
                    self.store.clone(),
                    self.notifier.clone(),
                    self.navigator.clone(),
                    self.refresh_path.clone(),
                )
                .boxed()
                .shared();
                *slot = Some(attempt.clone());
                attempt
            }
        };

        let outcome = attempt.clone().await;

        // Every waiter clears the slot after settlement, not just the
        // creator: a creator dropped mid-await must not wedge the settled
        // attempt in place. The ptr_eq guard keeps a slow waiter from
        // discarding a newer attempt.
        let mut slot = self.inflight.lock().await;
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
            *slot = None;
        }
        drop(slot);

        outcome
    }

    /// Terminates the session outside a refresh attempt.
    ///
    /// Used when a request retried with a freshly refreshed token is
    /// rejected with 401 again: the token is unusable for reasons other
    /// than expiry and a second refresh would not help.
    pub fn expire_session(&self) {
        tracing::error!("retried request rejected again, terminating session");
        terminate_session(&*self.notifier, &*self.store, &*self.navigator);
    }

    async fn run_attempt(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        refresh_path: String,
    ) -> Result<AuthToken, RefreshError> {
        let outcome = Self::exchange(&*transport, &*store, &refresh_path).await;
        match &outcome {
            Ok(_) => tracing::debug!("token refresh succeeded"),
            Err(error) => {
                tracing::error!(%error, "token refresh failed, terminating session");
                terminate_session(&*notifier, &*store, &*navigator);
            }
        }
        outcome
    }

    async fn exchange(
        transport: &dyn Transport,
        store: &dyn CredentialStore,
        refresh_path: &str,
    ) -> Result<AuthToken, RefreshError> {
        let refresh_token = store
            .get_refresh_token()
            .ok_or(RefreshError::MissingRefreshToken)?;

        let mut request = ApiRequest::new(HttpMethod::Post, refresh_path);
        request.set_header("Content-Type", "application/json");
        request.set_header("Accept", "application/json");
        request.body = RequestBody::Json(json!({ "refreshToken": refresh_token }));

        let response = transport
            .send(&request, &RequestOptions::default())
            .await
            .map_err(|error| RefreshError::Transport(error.to_string()))?;

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status,
            });
        }

        let token: AuthToken = serde_json::from_value(response.body)
            .map_err(|error| RefreshError::MalformedGrant(error.to_string()))?;
        store.set_token_data(token.clone());
        Ok(token)
    }
}

/// Session termination side effects, in the order the host expects them:
/// notify, clear credentials, redirect with the session-expired flag.
fn terminate_session(notifier: &dyn Notifier, store: &dyn CredentialStore, navigator: &dyn Navigator) {
    notifier.notify_error(SESSION_EXPIRED_MESSAGE, SESSION_EXPIRED_KEY);
    store.clear_auth_data();
    navigator.redirect_to_login(true);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::TransportError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use relay_domain::ApiResponse;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeStore {
        refresh_token: StdMutex<Option<String>>,
        stored: StdMutex<Option<AuthToken>>,
        cleared: AtomicUsize,
    }

    impl CredentialStore for FakeStore {
        fn get_access_token(&self) -> Option<String> {
            None
        }

        fn get_refresh_token(&self) -> Option<String> {
            self.refresh_token.lock().unwrap().clone()
        }

        fn set_token_data(&self, token: AuthToken) {
            *self.stored.lock().unwrap() = Some(token);
        }

        fn clear_auth_data(&self) {
            self.cleared.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        messages: StdMutex<Vec<String>>,
    }

    impl Notifier for FakeNotifier {
        fn notify_error(&self, message: &str, _dedupe_key: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    #[derive(Default)]
    struct FakeNavigator {
        redirects: StdMutex<Vec<bool>>,
    }

    impl Navigator for FakeNavigator {
        fn redirect_to_login(&self, session_expired: bool) {
            self.redirects.lock().unwrap().push(session_expired);
        }
    }

    struct FakeTransport {
        calls: AtomicUsize,
        grant: Result<ApiResponse, TransportError>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(
            &self,
            _request: &ApiRequest,
            _options: &RequestOptions,
        ) -> Result<ApiResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Stay pending long enough for concurrent arrivals to join.
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            self.grant.clone()
        }
    }

    fn coordinator(
        grant: Result<ApiResponse, TransportError>,
        refresh_token: Option<&str>,
    ) -> (
        Arc<RefreshCoordinator>,
        Arc<FakeTransport>,
        Arc<FakeStore>,
        Arc<FakeNotifier>,
        Arc<FakeNavigator>,
    ) {
        let transport = Arc::new(FakeTransport {
            calls: AtomicUsize::new(0),
            grant,
        });
        let store = Arc::new(FakeStore {
            refresh_token: StdMutex::new(refresh_token.map(String::from)),
            ..FakeStore::default()
        });
        let notifier = Arc::new(FakeNotifier::default());
        let navigator = Arc::new(FakeNavigator::default());
        let coordinator = Arc::new(RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            notifier.clone(),
            navigator.clone(),
            "auth/refresh-token",
        ));
        (coordinator, transport, store, notifier, navigator)
    }

    fn grant_body() -> ApiResponse {
        ApiResponse::new(
            200,
            serde_json::json!({"token": "new-access", "refreshToken": "new-refresh"}),
        )
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_attempt() {
        let (coordinator, transport, store, _, _) =
            coordinator(Ok(grant_body()), Some("refresh-1"));

        let (a, b, c) = tokio::join!(
            coordinator.refresh(),
            coordinator.refresh(),
            coordinator.refresh()
        );

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        for outcome in [a, b, c] {
            assert_eq!(outcome.unwrap().access_token, "new-access");
        }
        assert_eq!(
            store.stored.lock().unwrap().clone(),
            Some(AuthToken::new("new-access", "new-refresh"))
        );
    }

    #[tokio::test]
    async fn test_missing_refresh_token_terminates_session() {
        let (coordinator, transport, store, notifier, navigator) =
            coordinator(Ok(grant_body()), None);

        let outcome = coordinator.refresh().await;

        assert_eq!(outcome, Err(RefreshError::MissingRefreshToken));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.cleared.load(Ordering::SeqCst), 1);
        assert_eq!(
            notifier.messages.lock().unwrap().as_slice(),
            &[SESSION_EXPIRED_MESSAGE.to_string()]
        );
        assert_eq!(navigator.redirects.lock().unwrap().as_slice(), &[true]);
    }

    #[tokio::test]
    async fn test_rejected_refresh_fails_every_waiter_once() {
        let (coordinator, transport, _, notifier, navigator) = coordinator(
            Ok(ApiResponse::new(401, serde_json::Value::Null)),
            Some("refresh-1"),
        );

        let (a, b) = tokio::join!(coordinator.refresh(), coordinator.refresh());

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(a, Err(RefreshError::Rejected { status: 401 }));
        assert_eq!(b, Err(RefreshError::Rejected { status: 401 }));
        // Side effects ran once, not once per waiter.
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
        assert_eq!(navigator.redirects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_slot_is_cleared_after_failure() {
        let (coordinator, transport, store, _, _) = coordinator(Ok(grant_body()), None);

        assert_eq!(
            coordinator.refresh().await,
            Err(RefreshError::MissingRefreshToken)
        );

        // A token shows up later; the coordinator must not stay wedged.
        *store.refresh_token.lock().unwrap() = Some("refresh-2".to_string());
        let outcome = coordinator.refresh().await;
        assert_eq!(outcome.unwrap().access_token, "new-access");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_creator_does_not_wedge_the_slot() {
        let (coordinator, transport, _, _, _) = coordinator(Ok(grant_body()), Some("refresh-1"));

        // The first caller starts the attempt and is dropped mid-await.
        let creator = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.refresh().await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        creator.abort();

        // A later caller joins the still-pending attempt and drives it to
        // settlement without a second network call.
        let outcome = coordinator.refresh().await;
        assert_eq!(outcome.unwrap().access_token, "new-access");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

        // The next expiry must start a fresh attempt.
        coordinator.refresh().await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_maps_to_refresh_error() {
        let (coordinator, _, store, _, navigator) = coordinator(
            Err(TransportError::ConnectionFailed("refused".to_string())),
            Some("refresh-1"),
        );

        let outcome = coordinator.refresh().await;
        assert!(matches!(outcome, Err(RefreshError::Transport(_))));
        assert_eq!(store.cleared.load(Ordering::SeqCst), 1);
        assert_eq!(navigator.redirects.lock().unwrap().as_slice(), &[true]);
    }
}
