//! Identity provider seam — the external authentication service.
//!
//! ARCHITECTURE
//! ============
//! The session store never talks to an auth backend directly; it consumes
//! the [`IdentityProvider`] trait. One real adapter ships in [`gotrue`],
//! and tests substitute an in-memory double. Session changes arrive as a
//! [`SessionEvents`] stream whose first event always describes the current
//! state, signed-out included, so callers can tell "not yet known" apart
//! from "no user".

pub mod gotrue;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::AuthError;

/// Buffer for pending session-change events. Changes are rare (sign-in,
/// sign-out, token refresh), so a small bound is plenty.
pub(crate) const EVENT_BUFFER: usize = 8;

/// An authenticated identity as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Identity {
    /// Provider-assigned user id.
    pub id: Uuid,
    /// The email the user signed in with.
    pub email: String,
}

/// Stream of session-change notifications from the provider.
///
/// `Some(identity)` means a user is signed in, `None` means signed out.
/// Dropping the stream releases the subscription.
pub struct SessionEvents {
    rx: mpsc::Receiver<Option<Identity>>,
}

impl SessionEvents {
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Option<Identity>>) -> Self {
        Self { rx }
    }

    /// Await the next session change. Returns `None` once the provider has
    /// shut down and no further changes will be reported.
    pub async fn next(&mut self) -> Option<Option<Identity>> {
        self.rx.recv().await
    }
}

/// External authentication service interface.
///
/// At most one subscription may be active per provider instance; the
/// session store establishes it exactly once during lazy initialization.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Subscribe to session-change events. The first event reports the
    /// current state (including "no user").
    async fn subscribe(&self) -> Result<SessionEvents, AuthError>;

    /// Exchange credentials for an authenticated identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// End the current provider session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Ask the provider to send a password-reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}
