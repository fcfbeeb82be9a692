//! Record and transaction definitions: configuration, not runtime state.
//!
//! Definitions are resolved once per creation and shared read-only across
//! requests, like schemas.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::config::{RecordDefinitionConfig, TransactionDefinitionConfig};
use crate::error::{CaseworkError, CaseworkResult, DependencyKind};
use crate::schema::SchemaSet;

/// Configuration describing a class of record.
#[derive(Debug, Clone)]
pub struct RecordDefinition {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub schema_key: String,
    /// Records of this class expire this long after creation.
    pub expiration: Duration,
}

/// Configuration describing a class of transaction.
#[derive(Debug, Clone)]
pub struct TransactionDefinition {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub schema_key: String,
}

/// Keyed lookup of the loaded definitions.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    records: HashMap<String, Arc<RecordDefinition>>,
    transactions: HashMap<String, Arc<TransactionDefinition>>,
}

impl DefinitionRegistry {
    /// Build the registry from raw configuration, verifying that every
    /// referenced schema is resolvable at load time.
    pub fn from_configs(
        record_configs: &[RecordDefinitionConfig],
        transaction_configs: &[TransactionDefinitionConfig],
        schemas: &SchemaSet,
    ) -> CaseworkResult<Self> {
        let mut records = HashMap::with_capacity(record_configs.len());
        for config in record_configs {
            schemas.get(&config.schema)?;
            let definition = RecordDefinition {
                id: Uuid::new_v4(),
                key: config.key.clone(),
                name: config.name.clone().unwrap_or_else(|| config.key.clone()),
                schema_key: config.schema.clone(),
                expiration: Duration::seconds(config.expiration_seconds),
            };
            records.insert(config.key.clone(), Arc::new(definition));
        }

        let mut transactions = HashMap::with_capacity(transaction_configs.len());
        for config in transaction_configs {
            schemas.get(&config.schema)?;
            let definition = TransactionDefinition {
                id: Uuid::new_v4(),
                key: config.key.clone(),
                name: config.name.clone().unwrap_or_else(|| config.key.clone()),
                schema_key: config.schema.clone(),
            };
            transactions.insert(config.key.clone(), Arc::new(definition));
        }

        Ok(Self {
            records,
            transactions,
        })
    }

    /// Resolve a record definition by key; absence is a dependency failure,
    /// not a `NotFound`.
    pub fn record_definition(&self, key: &str) -> CaseworkResult<Arc<RecordDefinition>> {
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| CaseworkError::MissingDependency {
                kind: DependencyKind::RecordDefinition,
                reference: key.to_string(),
            })
    }

    /// Resolve a transaction definition by key.
    pub fn transaction_definition(&self, key: &str) -> CaseworkResult<Arc<TransactionDefinition>> {
        self.transactions
            .get(key)
            .cloned()
            .ok_or_else(|| CaseworkError::MissingDependency {
                kind: DependencyKind::TransactionDefinition,
                reference: key.to_string(),
            })
    }

    pub fn record_keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn transaction_keys(&self) -> impl Iterator<Item = &str> {
        self.transactions.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseworkConfigFile;

    fn registry() -> DefinitionRegistry {
        let file = CaseworkConfigFile::from_yaml_str(
            r#"
            schemas:
              - key: permit_application
                attributes:
                  - name: applicant_name
                    type: string
            record_definitions:
              - key: permit
                schema: permit_application
                expiration_seconds: 3600
            transaction_definitions:
              - key: permit_request
                schema: permit_application
            "#,
        )
        .unwrap();
        let schemas = SchemaSet::compile(&file.schemas).unwrap();
        DefinitionRegistry::from_configs(
            &file.record_definitions,
            &file.transaction_definitions,
            &schemas,
        )
        .unwrap()
    }

    #[test]
    fn resolves_known_keys() {
        let registry = registry();
        assert_eq!(
            registry.record_definition("permit").unwrap().schema_key,
            "permit_application"
        );
        assert_eq!(
            registry
                .transaction_definition("permit_request")
                .unwrap()
                .key,
            "permit_request"
        );
    }

    #[test]
    fn unknown_key_is_a_dependency_failure() {
        let registry = registry();
        let err = registry.record_definition("license").unwrap_err();
        match err {
            CaseworkError::MissingDependency { kind, reference } => {
                assert_eq!(kind, DependencyKind::RecordDefinition);
                assert_eq!(reference, "license");
            }
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }
}
