//! Capability checks and field-level visibility filters.
//!
//! The lifecycle services consult an [`AuthorizationHandler`] at three
//! points: before create (type-level plus instance-level on the referenced
//! parent), before update (type, instance, and field level), and before read
//! projection (field-level filter applied to the serialized map).

use crate::auth::context::UserContext;
use crate::auth::permission::Permission;
use crate::records::record::Record;
use crate::records::transaction::Transaction;
use crate::schema::{AccessLevel, AttributeDefinition};

/// An action a caller may attempt on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::View => write!(f, "view"),
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
        }
    }
}

/// The resource classes this core manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Record,
    Transaction,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Record => write!(f, "record"),
            ResourceType::Transaction => write!(f, "transaction"),
        }
    }
}

/// A borrowed resource instance for instance-level checks.
#[derive(Debug, Clone, Copy)]
pub enum ResourceInstance<'a> {
    Record(&'a Record),
    Transaction(&'a Transaction),
}

impl ResourceInstance<'_> {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceInstance::Record(_) => ResourceType::Record,
            ResourceInstance::Transaction(_) => ResourceType::Transaction,
        }
    }

    fn created_by(&self) -> &str {
        match self {
            ResourceInstance::Record(r) => &r.created_by,
            ResourceInstance::Transaction(t) => &t.created_by,
        }
    }
}

/// Per-field visibility predicate, applied at the serialization boundary.
///
/// The filter is a pure function of the caller's clearance: an attribute is
/// visible when its declared tier does not exceed the filter's. Clearance is
/// monotonic, so a higher-tier caller always sees a superset of a lower
/// tier's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthFilter {
    max_access: AccessLevel,
}

impl AuthFilter {
    /// Filter that admits every attribute.
    pub fn all() -> Self {
        Self {
            max_access: AccessLevel::Admin,
        }
    }

    /// Filter admitting attributes up to the given tier.
    pub fn up_to(max_access: AccessLevel) -> Self {
        Self { max_access }
    }

    pub fn max_access(&self) -> AccessLevel {
        self.max_access
    }

    /// Whether an attribute passes the filter.
    pub fn is_visible(&self, definition: &AttributeDefinition) -> bool {
        definition.access <= self.max_access
    }
}

/// The capability-check and field-filter provider the lifecycle services
/// depend on.
pub trait AuthorizationHandler: Send + Sync {
    /// Coarse-grained, type-level permission check.
    fn is_allowed(&self, ctx: &UserContext, action: Action, resource: ResourceType) -> bool;

    /// Instance-level check, e.g. "update" on a specific transaction the
    /// caller does not own.
    fn is_allowed_for_instance(
        &self,
        ctx: &UserContext,
        action: Action,
        instance: &ResourceInstance<'_>,
    ) -> bool;

    /// Per-field visibility predicate for outbound projections (and for
    /// vetting inbound attribute names on update).
    fn auth_filter(&self, ctx: &UserContext, action: Action, resource: ResourceType) -> AuthFilter;
}

/// Default permission-based policy.
///
/// Type-level checks map actions to [`Permission`] flags; instance-level
/// checks let agency and admin callers act on any instance while public
/// callers are confined to resources they created.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl RolePolicy {
    pub fn new() -> Self {
        Self
    }

    fn required(action: Action, resource: ResourceType) -> Permission {
        match (resource, action) {
            (ResourceType::Record, Action::View) => Permission::VIEW_RECORDS,
            (ResourceType::Record, Action::Create) => Permission::CREATE_RECORDS,
            (ResourceType::Record, Action::Update) => Permission::EDIT_RECORDS,
            (ResourceType::Transaction, Action::View) => Permission::VIEW_TRANSACTIONS,
            (ResourceType::Transaction, Action::Create) => Permission::CREATE_TRANSACTIONS,
            (ResourceType::Transaction, Action::Update) => Permission::EDIT_TRANSACTIONS,
        }
    }
}

impl AuthorizationHandler for RolePolicy {
    fn is_allowed(&self, ctx: &UserContext, action: Action, resource: ResourceType) -> bool {
        ctx.permissions.contains(Self::required(action, resource))
    }

    fn is_allowed_for_instance(
        &self,
        ctx: &UserContext,
        action: Action,
        instance: &ResourceInstance<'_>,
    ) -> bool {
        if !self.is_allowed(ctx, action, instance.resource_type()) {
            return false;
        }

        // Agency and admin callers act across instances; public callers only
        // on what they created.
        if ctx.permissions.contains(Permission::VIEW_AGENCY_DATA) || ctx.permissions.is_admin() {
            return true;
        }

        instance.created_by() == ctx.user_id
    }

    fn auth_filter(&self, ctx: &UserContext, _action: Action, _resource: ResourceType) -> AuthFilter {
        AuthFilter::up_to(ctx.max_access())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DynamicEntity;
    use crate::records::transaction::TransactionStatus;
    use crate::schema::AttributeType;
    use chrono::Utc;
    use uuid::Uuid;

    fn transaction_created_by(user: &str) -> Transaction {
        let schema = std::sync::Arc::new(crate::schema::Schema::new("blank", vec![]).unwrap());
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            transaction_definition_key: "permit_request".to_string(),
            process_instance_id: None,
            status: TransactionStatus::New,
            created_by: user.to_string(),
            last_updated_by: user.to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
            data: DynamicEntity::new(schema),
        }
    }

    #[test]
    fn type_level_checks_follow_permissions() {
        let policy = RolePolicy::new();
        let public = UserContext::public("u-1");
        let agency = UserContext::agency("w-1");

        assert!(policy.is_allowed(&public, Action::View, ResourceType::Record));
        assert!(!policy.is_allowed(&public, Action::Create, ResourceType::Record));
        assert!(policy.is_allowed(&agency, Action::Create, ResourceType::Record));
    }

    #[test]
    fn public_caller_confined_to_own_instances() {
        let policy = RolePolicy::new();
        let owner = UserContext::public("u-1");
        let stranger = UserContext::public("u-2");
        let agency = UserContext::agency("w-1");

        let tx = transaction_created_by("u-1");
        let instance = ResourceInstance::Transaction(&tx);

        assert!(policy.is_allowed_for_instance(&owner, Action::Update, &instance));
        assert!(!policy.is_allowed_for_instance(&stranger, Action::Update, &instance));
        assert!(policy.is_allowed_for_instance(&agency, Action::Update, &instance));
    }

    #[test]
    fn auth_filter_is_role_monotonic() {
        let policy = RolePolicy::new();

        let def = |access| AttributeDefinition {
            name: "field".to_string(),
            attr_type: AttributeType::String,
            access,
        };

        let public_filter =
            policy.auth_filter(&UserContext::public("u"), Action::View, ResourceType::Record);
        let agency_filter =
            policy.auth_filter(&UserContext::agency("w"), Action::View, ResourceType::Record);
        let admin_filter =
            policy.auth_filter(&UserContext::admin("a"), Action::View, ResourceType::Record);

        assert!(public_filter.is_visible(&def(AccessLevel::Public)));
        assert!(!public_filter.is_visible(&def(AccessLevel::Agency)));
        assert!(!public_filter.is_visible(&def(AccessLevel::Admin)));

        assert!(agency_filter.is_visible(&def(AccessLevel::Agency)));
        assert!(!agency_filter.is_visible(&def(AccessLevel::Admin)));

        assert!(admin_filter.is_visible(&def(AccessLevel::Admin)));
    }
}
