//! Caller identity and capabilities.
//!
//! Caller identity is always threaded through operations as an explicit
//! parameter; it is never stored in shared or global state.

use serde::{Deserialize, Serialize};

use crate::auth::permission::Permission;
use crate::schema::AccessLevel;

/// Broad classification of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Public,
    Agency,
    Admin,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Public => write!(f, "public"),
            UserType::Agency => write!(f, "agency"),
            UserType::Admin => write!(f, "admin"),
        }
    }
}

/// The resolved caller for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_type: UserType,
    pub roles: Vec<String>,
    pub permissions: Permission,
}

impl UserContext {
    /// Context with the preset permissions for a user type.
    pub fn new(user_id: impl Into<String>, user_type: UserType) -> Self {
        let permissions = match user_type {
            UserType::Public => Permission::PUBLIC_ACCESS,
            UserType::Agency => Permission::AGENCY_ACCESS,
            UserType::Admin => Permission::ALL,
        };
        Self {
            user_id: user_id.into(),
            user_type,
            roles: Vec::new(),
            permissions,
        }
    }

    /// A public caller.
    pub fn public(user_id: impl Into<String>) -> Self {
        Self::new(user_id, UserType::Public)
    }

    /// An agency caller.
    pub fn agency(user_id: impl Into<String>) -> Self {
        Self::new(user_id, UserType::Agency)
    }

    /// An admin caller.
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, UserType::Admin)
    }

    /// Attach a role name.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Grant a permission.
    pub fn grant(mut self, permission: Permission) -> Self {
        self.permissions |= permission;
        self
    }

    /// Revoke a permission.
    pub fn revoke(mut self, permission: Permission) -> Self {
        self.permissions &= !permission;
        self
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// The highest attribute visibility tier this caller may read.
    pub fn max_access(&self) -> AccessLevel {
        if self.permissions.can_view_admin_data() {
            AccessLevel::Admin
        } else if self.permissions.contains(Permission::VIEW_AGENCY_DATA) {
            AccessLevel::Agency
        } else {
            AccessLevel::Public
        }
    }
}

/// Provider of the current caller, consumed at the request boundary.
pub trait CurrentUserProvider: Send + Sync {
    /// The resolved caller, or `None` when the request is unauthenticated.
    fn current_user(&self) -> Option<UserContext>;
}

/// Provider that always returns one fixed caller. Used by the demo binary
/// and tests.
#[derive(Debug, Clone)]
pub struct FixedUserProvider {
    user: UserContext,
}

impl FixedUserProvider {
    pub fn new(user: UserContext) -> Self {
        Self { user }
    }
}

impl CurrentUserProvider for FixedUserProvider {
    fn current_user(&self) -> Option<UserContext> {
        Some(self.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_user_type() {
        let public = UserContext::public("u-1");
        assert_eq!(public.max_access(), AccessLevel::Public);
        assert!(!public.permissions.can_edit_records());

        let agency = UserContext::agency("u-2");
        assert_eq!(agency.max_access(), AccessLevel::Agency);
        assert!(agency.permissions.can_edit_records());

        let admin = UserContext::admin("u-3");
        assert_eq!(admin.max_access(), AccessLevel::Admin);
        assert!(admin.permissions.can_edit_admin_data());
    }

    #[test]
    fn grant_and_revoke() {
        let ctx = UserContext::public("u-1").grant(Permission::VIEW_ADMIN_DATA);
        assert_eq!(ctx.max_access(), AccessLevel::Admin);

        let ctx = ctx.revoke(Permission::VIEW_ADMIN_DATA);
        assert_eq!(ctx.max_access(), AccessLevel::Public);
    }

    #[test]
    fn fixed_provider_returns_user() {
        let provider = FixedUserProvider::new(UserContext::agency("worker-7"));
        let user = provider.current_user().unwrap();
        assert_eq!(user.user_id, "worker-7");
        assert_eq!(user.user_type, UserType::Agency);
    }
}
