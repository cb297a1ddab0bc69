//! Serialized navigation with last-request-wins supersession.
//!
//! DESIGN
//! ======
//! Navigation requests are evaluated one at a time in issue order (the
//! tokio mutex hands the gate out FIFO), so two conflicting redirects can
//! never be in flight together. A monotonically increasing generation
//! counter marks the newest request; anything older observes the counter
//! moved past it and reports [`AuthError::NavigationSuperseded`] instead
//! of handing back a stale decision.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

use crate::error::AuthError;
use crate::guard::{Guard, NavigationDecision};

/// Applies the guard to a stream of navigation requests.
pub struct Navigator {
    guard: Guard,
    latest: AtomicU64,
    gate: Mutex<()>,
}

impl Navigator {
    #[must_use]
    pub fn new(guard: Guard) -> Self {
        Self {
            guard,
            latest: AtomicU64::new(0),
            gate: Mutex::new(()),
        }
    }

    /// Evaluate a navigation to `path`.
    ///
    /// The returned decision is safe to apply: if a newer request arrived
    /// while this one was queued or suspended, this one yields
    /// [`AuthError::NavigationSuperseded`] and its decision is discarded.
    ///
    /// # Errors
    ///
    /// [`AuthError::NavigationSuperseded`] when preempted by a newer
    /// request.
    pub async fn navigate(&self, path: &str) -> Result<NavigationDecision, AuthError> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let _gate = self.gate.lock().await;

        // Preempted while waiting for the gate: skip the evaluation.
        if self.latest.load(Ordering::SeqCst) != ticket {
            tracing::debug!(path, "navigation superseded before evaluation");
            return Err(AuthError::NavigationSuperseded);
        }

        let decision = self.guard.decide(path).await;

        // Preempted while suspended inside the guard: the decision is
        // stale and must not be applied.
        if self.latest.load(Ordering::SeqCst) != ticket {
            tracing::debug!(path, "navigation superseded during evaluation");
            return Err(AuthError::NavigationSuperseded);
        }
        Ok(decision)
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
