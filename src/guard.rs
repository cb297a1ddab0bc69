//! Route authorization guard — the per-navigation decision function.
//!
//! DESIGN
//! ======
//! `decide` runs before a navigation commits: ensure the session is
//! initialized, check authentication before role, then the guest-only
//! rule. Every failure path still yields a decision — a guard error on a
//! protected route degrades to a login redirect, never to a broken page or
//! an aborted navigation.

use std::sync::Arc;

use crate::error::AuthError;
use crate::role::{Role, RoleResolver};
use crate::routes::{LOGIN_PATH, RouteDescriptor, RouteTable};
use crate::session::{SessionSnapshot, SessionStore};

/// Outcome of evaluating one navigation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Commit the navigation to the requested path.
    Proceed,
    /// Substitute the given path for the requested one.
    RedirectTo(String),
}

impl NavigationDecision {
    fn redirect(path: &str) -> Self {
        Self::RedirectTo(path.to_owned())
    }
}

/// Decides, for every navigation, whether the current user may view the
/// requested page and where to send them otherwise.
pub struct Guard {
    session: Arc<SessionStore>,
    resolver: RoleResolver,
    table: RouteTable,
}

impl Guard {
    #[must_use]
    pub fn new(session: Arc<SessionStore>, resolver: RoleResolver, table: RouteTable) -> Self {
        Self { session, resolver, table }
    }

    /// Evaluate a navigation to `path`.
    ///
    /// Order matters: initialization wait, then authentication, then role,
    /// then the guest-only rule. An unauthenticated user requesting an
    /// admin-only route is sent to `/login`, not to a role-mismatch
    /// redirect.
    pub async fn decide(&self, path: &str) -> NavigationDecision {
        let route = self.table.match_path(path);
        let decision = match self.evaluate(&route).await {
            Ok(decision) => decision,
            Err(err) => {
                // Recover locally: protected targets fall back to login,
                // public ones proceed.
                tracing::warn!(path, error = %err, "guard error, applying fallback decision");
                if route.requires_auth {
                    NavigationDecision::redirect(LOGIN_PATH)
                } else {
                    NavigationDecision::Proceed
                }
            }
        };
        tracing::debug!(path, ?decision, "navigation decided");
        decision
    }

    async fn evaluate(&self, route: &RouteDescriptor) -> Result<NavigationDecision, AuthError> {
        // An uninitialized session must never back an authorization
        // decision; suspend until the first provider state is known.
        self.session.initialize().await?;
        let snapshot = self.session.snapshot();

        if route.requires_auth && snapshot.user_id.is_none() {
            return Ok(NavigationDecision::redirect(LOGIN_PATH));
        }

        if let Some(required) = route.required_role {
            let current = self.current_role(&snapshot).await;
            if current != required {
                return Ok(NavigationDecision::redirect(current.home_path()));
            }
        }

        if route.guest_only && snapshot.user_id.is_some() {
            let current = self.current_role(&snapshot).await;
            return Ok(NavigationDecision::redirect(current.home_path()));
        }

        Ok(NavigationDecision::Proceed)
    }

    /// Role of the signed-in user. Only called on authenticated snapshots;
    /// a snapshot without an identity resolves to the low-privilege role.
    async fn current_role(&self, snapshot: &SessionSnapshot) -> Role {
        match snapshot.identity() {
            Some(identity) => self.resolver.resolve(&identity).await,
            None => Role::Student,
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
