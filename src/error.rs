//! Error handling for the casework core.
//!
//! This module provides idiomatic Rust error types using thiserror. The
//! taxonomy is layered: attribute- and schema-level failures have their own
//! enums and are wrapped by the top-level [`CaseworkError`] alongside the
//! service-level failure kinds.

use thiserror::Error;

/// Top-level error type for the casework core.
#[derive(Error, Debug)]
pub enum CaseworkError {
    #[error("Attribute error: {0}")]
    Attribute(#[from] AttributeError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A referenced collaborator (record definition, transaction) could not
    /// be resolved at creation time. Distinct from `NotFound`: the failure is
    /// in a prerequisite, not the primary resource.
    #[error("Missing dependency: {kind} '{reference}' not found")]
    MissingDependency { kind: DependencyKind, reference: String },

    /// The primary resource id could not be resolved at read/update time.
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Authorization denial. The reason distinguishes a missing general
    /// permission from a denial on a specific referenced resource and from
    /// an admin-field update without privilege.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Concurrent update detected by the persistence collaborator.
    #[error("Conflict: {resource} '{id}' was modified concurrently")]
    Conflict { resource: &'static str, id: String },
}

/// The kind of prerequisite that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    RecordDefinition,
    TransactionDefinition,
    Transaction,
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyKind::RecordDefinition => write!(f, "record definition"),
            DependencyKind::TransactionDefinition => write!(f, "transaction definition"),
            DependencyKind::Transaction => write!(f, "transaction"),
        }
    }
}

/// Attribute-level validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Unknown attribute '{attribute}' for schema '{schema}'")]
    UnknownAttribute { schema: String, attribute: String },

    #[error("Invalid value for attribute '{attribute}': expected {expected}, received {received}")]
    InvalidValue {
        attribute: String,
        expected: &'static str,
        received: String,
    },
}

/// Schema resolution and load-time validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema '{key}' could not be resolved")]
    MissingSchema { key: String },

    #[error("Duplicate attribute '{attribute}' in schema '{schema}'")]
    DuplicateAttribute { schema: String, attribute: String },

    #[error("Cyclic schema composition detected: {chain}")]
    CyclicComposition { chain: String },

    #[error("Attribute '{attribute}' in schema '{schema}' declares a composed type without a schema key")]
    MissingComposition { schema: String, attribute: String },

    #[error("Attribute '{attribute}' in schema '{schema}' declares a list of non-scalar elements")]
    InvalidListElement { schema: String, attribute: String },
}

impl CaseworkError {
    /// Missing type-level permission for an action.
    pub fn forbidden_action(action: &str, resource: &str) -> Self {
        CaseworkError::Forbidden {
            reason: format!("caller lacks '{action}' permission on {resource}"),
        }
    }

    /// Denied on a specific referenced resource instance.
    pub fn forbidden_instance(action: &str, resource: &str, id: impl std::fmt::Display) -> Self {
        CaseworkError::Forbidden {
            reason: format!("caller may not '{action}' the referenced {resource} '{id}'"),
        }
    }

    /// Admin-only field targeted without the admin-update capability.
    pub fn forbidden_admin_fields(fields: &[String]) -> Self {
        CaseworkError::Forbidden {
            reason: format!(
                "update targets admin-only attributes [{}] without admin-update privilege",
                fields.join(", ")
            ),
        }
    }
}

/// Result type aliases for convenience.
pub type CaseworkResult<T> = Result<T, CaseworkError>;
pub type AttributeResult<T> = Result<T, AttributeError>;
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wrapping() {
        let attr_err = AttributeError::UnknownAttribute {
            schema: "permit".to_string(),
            attribute: "bogus".to_string(),
        };

        let err = CaseworkError::from(attr_err);
        assert!(matches!(err, CaseworkError::Attribute(_)));
    }

    #[test]
    fn test_forbidden_reasons_are_distinct() {
        let general = CaseworkError::forbidden_action("update", "record");
        let instance = CaseworkError::forbidden_instance("update", "transaction", "tx-1");
        let admin = CaseworkError::forbidden_admin_fields(&["reviewer_notes".to_string()]);

        assert!(general.to_string().contains("lacks 'update' permission"));
        assert!(instance.to_string().contains("referenced transaction 'tx-1'"));
        assert!(admin.to_string().contains("admin-only attributes"));
    }

    #[test]
    fn test_dependency_error_names_reference() {
        let err = CaseworkError::MissingDependency {
            kind: DependencyKind::RecordDefinition,
            reference: "permit".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing dependency: record definition 'permit' not found"
        );
    }
}
