//! Static route table with access metadata.
//!
//! DESIGN
//! ======
//! Routes are declared once at startup, individually or through groups
//! whose children inherit the group's auth/role metadata unless overridden.
//! Matching is exact on normalized paths; anything unmatched resolves to a
//! "not found" view with no access requirement, so the guard lets the UI
//! render its 404 page instead of bouncing the user around.

use crate::role::Role;

/// Where unauthenticated users are sent.
pub const LOGIN_PATH: &str = "/login";

/// View name used for unmatched paths.
pub const NOT_FOUND_VIEW: &str = "not-found";

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Access metadata for a single path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Normalized absolute path, unique within a table.
    pub path: String,
    /// The session must be authenticated to proceed.
    pub requires_auth: bool,
    /// The resolved role must match to proceed. Implies `requires_auth`.
    pub required_role: Option<Role>,
    /// Authenticated sessions are redirected away (login/landing pages).
    pub guest_only: bool,
    /// Name of the view the UI renders for this path.
    pub view: &'static str,
}

impl RouteDescriptor {
    /// A route anyone may visit.
    #[must_use]
    pub fn public(path: &str, view: &'static str) -> Self {
        Self {
            path: normalize(path),
            requires_auth: false,
            required_role: None,
            guest_only: false,
            view,
        }
    }

    /// A route only anonymous sessions may visit.
    #[must_use]
    pub fn guest(path: &str, view: &'static str) -> Self {
        Self { guest_only: true, ..Self::public(path, view) }
    }

    /// A route requiring authentication and, optionally, a role.
    #[must_use]
    pub fn protected(path: &str, view: &'static str, required_role: Option<Role>) -> Self {
        Self {
            requires_auth: true,
            required_role,
            ..Self::public(path, view)
        }
    }
}

// =============================================================================
// GROUPS
// =============================================================================

/// A prefix under which children inherit auth/role metadata.
pub struct RouteGroup {
    prefix: String,
    requires_auth: bool,
    required_role: Option<Role>,
    children: Vec<RouteDescriptor>,
}

impl RouteGroup {
    /// A group whose children require the given role.
    #[must_use]
    pub fn with_role(prefix: &str, role: Role) -> Self {
        Self {
            prefix: normalize(prefix),
            requires_auth: true,
            required_role: Some(role),
            children: Vec::new(),
        }
    }

    /// A group whose children require authentication but no specific role.
    #[must_use]
    pub fn authenticated(prefix: &str) -> Self {
        Self {
            prefix: normalize(prefix),
            requires_auth: true,
            required_role: None,
            children: Vec::new(),
        }
    }

    /// Add a child inheriting the group's metadata. An empty `subpath`
    /// registers the group prefix itself.
    #[must_use]
    pub fn child(mut self, subpath: &str, view: &'static str) -> Self {
        let descriptor = RouteDescriptor {
            path: self.join(subpath),
            requires_auth: self.requires_auth,
            required_role: self.required_role,
            guest_only: false,
            view,
        };
        self.children.push(descriptor);
        self
    }

    /// Add a child that overrides the group's metadata to be public.
    #[must_use]
    pub fn public_child(mut self, subpath: &str, view: &'static str) -> Self {
        let path = self.join(subpath);
        self.children.push(RouteDescriptor::public(&path, view));
        self
    }

    fn join(&self, subpath: &str) -> String {
        let subpath = subpath.trim_matches('/');
        if subpath.is_empty() {
            self.prefix.clone()
        } else if self.prefix == "/" {
            format!("/{subpath}")
        } else {
            format!("{}/{subpath}", self.prefix)
        }
    }
}

// =============================================================================
// TABLE
// =============================================================================

/// Immutable path → [`RouteDescriptor`] mapping.
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder { routes: Vec::new() }
    }

    /// The original application's map: guest-only landing and login pages
    /// plus the admin and student dashboard trees. Bare `/admin` and
    /// `/student` resolve to their dashboards.
    #[must_use]
    pub fn educational_default() -> Self {
        Self::builder()
            .route(RouteDescriptor::guest("/", "landing"))
            .route(RouteDescriptor::guest(LOGIN_PATH, "login"))
            .group(
                RouteGroup::with_role("/admin", Role::Admin)
                    .child("", "admin-dashboard")
                    .child("dashboard", "admin-dashboard")
                    .child("users", "user-management")
                    .child("content", "content-creation")
                    .child("training", "program-training")
                    .child("simulations", "simulation-modules")
                    .child("analytics", "system-analytics"),
            )
            .group(
                RouteGroup::with_role("/student", Role::Student)
                    .child("", "student-dashboard")
                    .child("dashboard", "student-dashboard")
                    .child("simulations", "simulation-tasks")
                    .child("forum", "collaboration-forum")
                    .child("feedback", "feedback-messages")
                    .child("settings", "student-settings"),
            )
            .build()
    }

    /// Resolve a path to its descriptor. Unmatched paths get the catch-all
    /// "not found" descriptor, which carries no access requirement.
    #[must_use]
    pub fn match_path(&self, path: &str) -> RouteDescriptor {
        let normalized = normalize(path);
        self.routes
            .iter()
            .find(|r| r.path == normalized)
            .cloned()
            .unwrap_or(RouteDescriptor {
                path: normalized,
                requires_auth: false,
                required_role: None,
                guest_only: false,
                view: NOT_FOUND_VIEW,
            })
    }

    /// All declared descriptors, in declaration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }
}

/// Collects descriptors, keeping declaration order and path uniqueness.
pub struct RouteTableBuilder {
    routes: Vec<RouteDescriptor>,
}

impl RouteTableBuilder {
    /// Add one descriptor. The first declaration of a path wins; later
    /// duplicates are dropped with a warning so a built table always holds
    /// the uniqueness invariant.
    #[must_use]
    pub fn route(mut self, descriptor: RouteDescriptor) -> Self {
        self.push(descriptor);
        self
    }

    /// Add every child of a group.
    #[must_use]
    pub fn group(mut self, group: RouteGroup) -> Self {
        for descriptor in group.children {
            self.push(descriptor);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> RouteTable {
        RouteTable { routes: self.routes }
    }

    fn push(&mut self, mut descriptor: RouteDescriptor) {
        // A role requirement implies an auth requirement.
        if descriptor.required_role.is_some() {
            descriptor.requires_auth = true;
        }
        if self.routes.iter().any(|r| r.path == descriptor.path) {
            tracing::warn!(path = %descriptor.path, "duplicate route path ignored");
            return;
        }
        self.routes.push(descriptor);
    }
}

/// Strip query/fragment and trailing slashes; guarantee a leading slash.
fn normalize(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
