//! Authorization: caller context, permissions, capability checks, and the
//! field-level visibility filter applied at the serialization boundary.

pub mod context;
pub mod handler;
pub mod permission;
pub mod projection;

pub use context::{CurrentUserProvider, FixedUserProvider, UserContext, UserType};
pub use handler::{Action, AuthFilter, AuthorizationHandler, ResourceInstance, ResourceType, RolePolicy};
pub use permission::Permission;
pub use projection::project_entity;
