//! Session-authorization core for the educational dashboard client.
//!
//! This crate owns the decision made before every navigation in the
//! single-page app: may the current user view the requested page, and if
//! not, where do they go instead? The UI layer hands each requested path
//! to the [`Navigator`] and applies the resulting [`NavigationDecision`];
//! everything else — dashboards, simulations, quizzes — lives outside.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`provider`] | Identity-provider seam and the hosted GoTrue adapter |
//! | [`session`] | Lazily-initialized, observable session state |
//! | [`role`] | Role derivation: static rule or user-record lookup |
//! | [`routes`] | Static route table with access metadata |
//! | [`guard`] | Per-navigation allow/redirect decision |
//! | [`navigator`] | Serialized navigation, last request wins |
//! | [`error`] | Crate-wide failure taxonomy |

pub mod error;
pub mod guard;
pub mod navigator;
pub mod provider;
pub mod role;
pub mod routes;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::AuthError;
pub use guard::{Guard, NavigationDecision};
pub use navigator::Navigator;
pub use provider::gotrue::{GotrueConfig, GotrueProvider};
pub use provider::{Identity, IdentityProvider, SessionEvents};
pub use role::{MemoryRecordStore, RestRecordStore, Role, RoleResolver, UserRecord, UserRecordStore};
pub use routes::{LOGIN_PATH, NOT_FOUND_VIEW, RouteDescriptor, RouteGroup, RouteTable};
pub use session::{SessionSnapshot, SessionStore};
