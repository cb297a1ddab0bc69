//! GoTrue-style hosted identity provider adapter.
//!
//! Thin HTTP wrapper over the auth endpoints the hosted backend exposes:
//! `POST /token?grant_type=password`, `POST /logout`, `POST /recover`.
//! Pure parsing lives in `parse_token_response` / `parse_error_message`
//! for testability; nothing here touches the network during tests.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;

use super::{EVENT_BUFFER, Identity, IdentityProvider, SessionEvents};
use crate::error::AuthError;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// CONFIG
// =============================================================================

/// Hosted auth configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct GotrueConfig {
    /// Base URL of the auth service, e.g. `https://project.example.co/auth/v1`.
    pub base_url: String,
    /// Public (anon) API key sent with every request.
    pub anon_key: String,
}

impl GotrueConfig {
    /// Load from `GOTRUE_URL` and `GOTRUE_ANON_KEY`.
    /// Returns `None` if either is missing (the adapter is then unavailable).
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("GOTRUE_URL").ok()?;
        let anon_key = std::env::var("GOTRUE_ANON_KEY").ok()?;
        Some(Self { base_url, anon_key })
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// [`IdentityProvider`] implementation backed by a GoTrue-style REST API.
pub struct GotrueProvider {
    http: reqwest::Client,
    config: GotrueConfig,
    /// Last identity reported by the service; seeds the first subscription event.
    current: Mutex<Option<Identity>>,
    /// Bearer token for the active session, needed to revoke it on sign-out.
    access_token: Mutex<Option<String>>,
    /// Active subscription, if any. At most one at a time.
    events: Mutex<Option<mpsc::Sender<Option<Identity>>>>,
}

impl GotrueProvider {
    pub fn new(config: GotrueConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::ProviderUnavailable(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            config,
            current: Mutex::new(None),
            access_token: Mutex::new(None),
            events: Mutex::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    /// Record the new session state and notify the subscriber, if any.
    async fn publish(&self, identity: Option<Identity>) {
        *lock(&self.current) = identity.clone();
        let tx = lock(&self.events).clone();
        if let Some(tx) = tx {
            if tx.send(identity).await.is_err() {
                // Subscriber dropped its stream; release the slot.
                *lock(&self.events) = None;
            }
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for GotrueProvider {
    async fn subscribe(&self) -> Result<SessionEvents, AuthError> {
        let mut slot = lock(&self.events);
        if slot.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(AuthError::ProviderUnavailable(
                "a session subscription is already active".into(),
            ));
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        // First event reports the current state, signed-out included.
        let current = lock(&self.current).clone();
        tx.try_send(current)
            .map_err(|e| AuthError::ProviderUnavailable(format!("event seed failed: {e}")))?;
        *slot = Some(tx);
        Ok(SessionEvents::new(rx))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let url = self.endpoint("token?grant_type=password");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("sign-in request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("sign-in response read failed: {e}")))?;

        // Statuses GoTrue uses for rejected credentials; other 4xx codes
        // (like 429) are service-side conditions, not bad credentials.
        if matches!(status, 400 | 401 | 403 | 422) {
            let message =
                parse_error_message(&body).unwrap_or_else(|| "invalid login credentials".into());
            return Err(AuthError::CredentialRejected(message));
        }
        if status != 200 {
            return Err(AuthError::ProviderUnavailable(format!(
                "sign-in returned status {status}"
            )));
        }

        let (token, identity) = parse_token_response(&body)?;
        *lock(&self.access_token) = Some(token);
        self.publish(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = lock(&self.access_token).take();
        if let Some(token) = token {
            let url = self.endpoint("logout");
            let response = self
                .http
                .post(url)
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| {
                    // Keep the token so a retry can still revoke it.
                    *lock(&self.access_token) = Some(token.clone());
                    AuthError::ProviderUnavailable(format!("sign-out request failed: {e}"))
                })?;
            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                *lock(&self.access_token) = Some(token);
                return Err(AuthError::ProviderUnavailable(format!(
                    "sign-out returned status {status}"
                )));
            }
        }
        self.publish(None).await;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let url = self.endpoint("recover");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("reset request failed: {e}")))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(AuthError::ProviderUnavailable(format!(
                "reset returned status {status}"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    user: WireUser,
}

#[derive(serde::Deserialize)]
struct WireUser {
    id: uuid::Uuid,
    email: String,
}

#[derive(serde::Deserialize)]
struct WireError {
    error_description: Option<String>,
    msg: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_token_response(json: &str) -> Result<(String, Identity), AuthError> {
    let wire: TokenResponse = serde_json::from_str(json)
        .map_err(|e| AuthError::ProviderUnavailable(format!("sign-in response parse failed: {e}")))?;
    let identity = Identity { id: wire.user.id, email: wire.user.email };
    Ok((wire.access_token, identity))
}

/// Extract a human-readable message from a GoTrue error body, which uses
/// either `error_description` or `msg` depending on the endpoint.
fn parse_error_message(json: &str) -> Option<String> {
    let wire: WireError = serde_json::from_str(json).ok()?;
    wire.error_description.or(wire.msg)
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
