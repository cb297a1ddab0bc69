//! Role derivation for authenticated identities.
//!
//! DESIGN
//! ======
//! Two resolution strategies exist in the product's history and both are
//! supported: a static rule (one fixed administrator address) and a lookup
//! against a user-record store. Resolution is fail-open to the *lower*
//! privilege: a missing record, an unknown role string, or a lookup failure
//! all yield `Student`, never `Admin`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use crate::error::AuthError;
use crate::provider::Identity;

// =============================================================================
// ROLE
// =============================================================================

/// Coarse-grained authorization category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// The dashboard a user of this role lands on after a redirect.
    #[must_use]
    pub fn home_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/dashboard",
            Self::Student => "/student/dashboard",
        }
    }

    /// Parse a record's role field. Unknown strings resolve to `None` so
    /// callers fall back to the low-privilege default.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "student" => Some(Self::Student),
            _ => None,
        }
    }
}

// =============================================================================
// USER RECORDS
// =============================================================================

/// A user record as stored by the backing record store.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// Role field; absent or unrecognized values default to `Student`.
    #[serde(default)]
    pub role: Option<String>,
}

/// Keyed access to user records.
#[async_trait::async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Fetch the record for an identity id, `None` when absent.
    async fn get_record(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError>;
}

/// In-memory record store for tests and offline use.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: UserRecord) {
        lock(&self.records).insert(record.id, record);
    }
}

#[async_trait::async_trait]
impl UserRecordStore for MemoryRecordStore {
    async fn get_record(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        Ok(lock(&self.records).get(&id).cloned())
    }
}

/// Record store backed by a PostgREST-style API
/// (`GET /users?id=eq.<uuid>&select=id,email,role`).
pub struct RestRecordStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRecordStore {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::LookupFailed(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url, api_key })
    }
}

#[async_trait::async_trait]
impl UserRecordStore for RestRecordStore {
    async fn get_record(&self, id: Uuid) -> Result<Option<UserRecord>, AuthError> {
        let url = format!(
            "{}/users?id=eq.{id}&select=id,email,role",
            self.base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| AuthError::LookupFailed(format!("record request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::LookupFailed(format!("record response read failed: {e}")))?;
        if status != 200 {
            return Err(AuthError::LookupFailed(format!(
                "record request returned status {status}"
            )));
        }
        parse_record_rows(&body)
    }
}

/// Parse a PostgREST row array; the id filter yields zero or one rows.
fn parse_record_rows(json: &str) -> Result<Option<UserRecord>, AuthError> {
    let rows: Vec<UserRecord> = serde_json::from_str(json)
        .map_err(|e| AuthError::LookupFailed(format!("record parse failed: {e}")))?;
    Ok(rows.into_iter().next())
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Maps an authenticated identity to a [`Role`].
#[derive(Clone)]
pub enum RoleResolver {
    /// Fixed administrator address; everyone else is a student. Decides
    /// synchronously from cached session state.
    StaticRule { admin_email: String },
    /// Fetch the identity's record and read its role field.
    RecordLookup { store: Arc<dyn UserRecordStore> },
}

impl RoleResolver {
    /// Static rule configured from the `ADMIN_EMAIL` environment variable.
    #[must_use]
    pub fn static_rule_from_env() -> Option<Self> {
        let admin_email = std::env::var("ADMIN_EMAIL").ok()?;
        Some(Self::StaticRule { admin_email })
    }

    /// Resolve the role for an identity. Never fails: lookup errors are
    /// recovered locally by defaulting to [`Role::Student`].
    pub async fn resolve(&self, identity: &Identity) -> Role {
        match self {
            Self::StaticRule { admin_email } => {
                if identity.email.eq_ignore_ascii_case(admin_email) {
                    Role::Admin
                } else {
                    Role::Student
                }
            }
            Self::RecordLookup { store } => match store.get_record(identity.id).await {
                Ok(Some(record)) => record
                    .role
                    .as_deref()
                    .and_then(Role::parse)
                    .unwrap_or(Role::Student),
                Ok(None) => Role::Student,
                Err(err) => {
                    tracing::warn!(user = %identity.id, error = %err, "role lookup failed, defaulting to student");
                    Role::Student
                }
            },
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[path = "role_test.rs"]
mod tests;
