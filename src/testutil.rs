//! Shared test doubles for the session, guard, and navigator suites.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AuthError;
use crate::provider::{EVENT_BUFFER, Identity, IdentityProvider, SessionEvents};

/// In-memory identity provider with scriptable failures.
#[derive(Default)]
pub(crate) struct MockProvider {
    /// Credentials accepted by `sign_in`.
    account: Mutex<Option<(String, String, Identity)>>,
    /// Identity reported by the first subscription event.
    current: Mutex<Option<Identity>>,
    events: Mutex<Option<mpsc::Sender<Option<Identity>>>>,
    pub subscribe_calls: AtomicUsize,
    pub fail_subscribe: AtomicBool,
    pub fail_sign_in: AtomicBool,
    pub fail_sign_out: AtomicBool,
}

impl MockProvider {
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Provider with a registered account, initially signed out.
    pub fn with_account(email: &str, password: &str) -> Self {
        let identity = Identity { id: Uuid::new_v4(), email: email.to_owned() };
        let mock = Self::default();
        *guard(&mock.account) = Some((email.to_owned(), password.to_owned(), identity));
        mock
    }

    /// Provider already signed in as the registered account.
    pub fn signed_in(email: &str) -> (Self, Identity) {
        let identity = Identity { id: Uuid::new_v4(), email: email.to_owned() };
        let mock = Self::default();
        *guard(&mock.account) = Some((email.to_owned(), "hunter2".to_owned(), identity.clone()));
        *guard(&mock.current) = Some(identity.clone());
        (mock, identity)
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Simulate a provider-side session change (e.g. another tab signing
    /// out). Returns false when no subscriber is listening.
    pub async fn push_event(&self, change: Option<Identity>) -> bool {
        *guard(&self.current) = change.clone();
        let tx = guard(&self.events).clone();
        match tx {
            Some(tx) => tx.send(change).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockProvider {
    async fn subscribe(&self) -> Result<SessionEvents, AuthError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderUnavailable("subscription refused".into()));
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let current = guard(&self.current).clone();
        tx.try_send(current)
            .map_err(|e| AuthError::ProviderUnavailable(format!("event seed failed: {e}")))?;
        *guard(&self.events) = Some(tx);
        Ok(SessionEvents::new(rx))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if self.fail_sign_in.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderUnavailable("auth service down".into()));
        }
        let matched = guard(&self.account)
            .as_ref()
            .filter(|(e, p, _)| e == email && p == password)
            .map(|(_, _, identity)| identity.clone());
        match matched {
            Some(identity) => {
                self.push_event(Some(identity.clone())).await;
                Ok(identity)
            }
            None => Err(AuthError::CredentialRejected("invalid login credentials".into())),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderUnavailable("sign-out request failed".into()));
        }
        self.push_event(None).await;
        Ok(())
    }

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        if self.fail_sign_in.load(Ordering::SeqCst) {
            return Err(AuthError::ProviderUnavailable("auth service down".into()));
        }
        Ok(())
    }
}

/// Record store whose every lookup fails; exercises fail-open paths.
pub(crate) struct FailingRecordStore;

#[async_trait::async_trait]
impl crate::role::UserRecordStore for FailingRecordStore {
    async fn get_record(&self, _id: Uuid) -> Result<Option<crate::role::UserRecord>, AuthError> {
        Err(AuthError::LookupFailed("record service down".into()))
    }
}

fn guard<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Route tracing output through the test harness so `--nocapture` shows
/// guard and session logs. Safe to call from every test.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
