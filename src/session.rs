//! Process-wide session state with lazy provider subscription.
//!
//! DESIGN
//! ======
//! `SessionStore` is the single source of truth for "who is signed in".
//! State lives behind a `tokio::sync::watch` channel so UI layers can
//! observe transitions, and initialization is guarded by a `OnceCell`:
//! however many callers race into `initialize()`, exactly one provider
//! subscription is created and all callers resolve together once the first
//! session state (including "no user") is known.
//!
//! TRADE-OFFS
//! ==========
//! A failed initialization is not cached, so a later navigation may retry
//! the subscription. Sign-out failures keep the local identity (best
//! effort) rather than optimistically clearing it; the provider remains
//! authoritative and will report the real state on its next event.

use std::sync::{Arc, Mutex};

use tokio::sync::{OnceCell, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::AuthError;
use crate::provider::{Identity, IdentityProvider};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Point-in-time view of the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Provider-assigned id of the signed-in user, if any.
    pub user_id: Option<Uuid>,
    /// Email of the signed-in user, if any.
    pub email: Option<String>,
    /// True once the first provider state has been received.
    pub initialized: bool,
    /// True while a login call is in flight.
    pub loading: bool,
    /// Human-readable message from the last failed operation.
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    /// The identity this session currently represents, if signed in.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.user_id.map(|id| Identity {
            id,
            email: self.email.clone().unwrap_or_default(),
        })
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Authoritative, lazily-initialized session state.
pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<SessionSnapshot>,
    init: OnceCell<()>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            provider,
            state,
            init: OnceCell::new(),
            listener: Mutex::new(None),
        }
    }

    /// Subscribe to the provider and wait for the first session state.
    ///
    /// Idempotent: concurrent and repeated callers share one subscription
    /// and one completion. Subsequent provider events are applied by a
    /// background listener until [`teardown`](Self::teardown).
    ///
    /// # Errors
    ///
    /// [`AuthError::ProviderUnavailable`] when the subscription fails or
    /// the event stream closes before the first state arrives.
    pub async fn initialize(&self) -> Result<(), AuthError> {
        self.init
            .get_or_try_init(|| async {
                let mut events = self.provider.subscribe().await?;
                let first = events.next().await.ok_or_else(|| {
                    AuthError::ProviderUnavailable(
                        "event stream closed before the first session state".into(),
                    )
                })?;
                apply_change(&self.state, first);
                self.state.send_modify(|s| s.initialized = true);

                let state = self.state.clone();
                let handle = tokio::spawn(async move {
                    while let Some(change) = events.next().await {
                        tracing::debug!(signed_in = change.is_some(), "provider session change");
                        apply_change(&state, change);
                    }
                });
                *lock(&self.listener) = Some(handle);
                Ok(())
            })
            .await
            .copied()
    }

    /// True iff a user is currently signed in.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().user_id.is_some()
    }

    /// Current state, cloned.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Watch for state transitions (UI reactivity seam).
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Sign in with email and password. No retry.
    ///
    /// On success the session holds the new identity; on failure the
    /// session keeps its previous identity and records a human-readable
    /// `last_error` for inline display.
    ///
    /// # Errors
    ///
    /// [`AuthError::CredentialRejected`] when the provider refuses the
    /// credentials, [`AuthError::ProviderUnavailable`] when it cannot be
    /// reached.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.last_error = None;
        });
        match self.provider.sign_in(email, password).await {
            Ok(identity) => {
                self.state.send_modify(|s| {
                    s.user_id = Some(identity.id);
                    s.email = Some(identity.email.clone());
                    s.loading = false;
                });
                tracing::debug!(user = %identity.id, "login succeeded");
                Ok(())
            }
            Err(err) => {
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.last_error = Some(err.to_string());
                });
                tracing::warn!(error = %err, "login failed");
                Err(err)
            }
        }
    }

    /// Sign out. Clears the local identity only when the provider confirms.
    ///
    /// # Errors
    ///
    /// [`AuthError::ProviderUnavailable`] when sign-out fails; the local
    /// identity is kept and `last_error` records the message.
    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.user_id = None;
                    s.email = None;
                });
                Ok(())
            }
            Err(err) => {
                self.state
                    .send_modify(|s| s.last_error = Some(err.to_string()));
                tracing::warn!(error = %err, "logout failed");
                Err(err)
            }
        }
    }

    /// Ask the provider to send a password-reset email. Never mutates the
    /// session.
    ///
    /// # Errors
    ///
    /// Propagates the provider failure unchanged.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        self.provider.send_password_reset(email).await
    }

    /// Stop applying provider events. The snapshot freezes at its current
    /// value; `initialized` stays true.
    pub fn teardown(&self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply_change(state: &watch::Sender<SessionSnapshot>, change: Option<Identity>) {
    state.send_modify(|s| match &change {
        Some(identity) => {
            s.user_id = Some(identity.id);
            s.email = Some(identity.email.clone());
        }
        None => {
            s.user_id = None;
            s.email = None;
        }
    });
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
