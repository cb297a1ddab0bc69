//! Crate-wide failure taxonomy for the authorization core.

/// Errors produced by session, role, and navigation operations.
///
/// Provider failures surface as a result plus a human-readable message on
/// the session; none of these are ever allowed to escape the guard as a
/// panic or an aborted navigation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The provider subscription could not be established, or the event
    /// stream ended before the first session state was known.
    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected the supplied credentials.
    #[error("credentials rejected: {0}")]
    CredentialRejected(String),

    /// A user-record fetch failed while resolving a role.
    #[error("role lookup failed: {0}")]
    LookupFailed(String),

    /// A newer navigation request preempted this one; its decision was
    /// discarded and must not be applied.
    #[error("navigation superseded by a newer request")]
    NavigationSuperseded,
}
