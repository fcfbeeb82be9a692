//! Configuration loading.
//!
//! Schemas, record definitions, and transaction definitions are externally
//! configured. This module holds the raw YAML-facing types and the loaders
//! that turn a configuration file into the compiled, immutable registries
//! the rest of the core shares by reference.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CaseworkResult;
use crate::records::definition::DefinitionRegistry;
use crate::schema::{AccessLevel, SchemaSet};

/// Root of a casework configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseworkConfigFile {
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,

    #[serde(default)]
    pub record_definitions: Vec<RecordDefinitionConfig>,

    #[serde(default)]
    pub transaction_definitions: Vec<TransactionDefinitionConfig>,
}

/// Raw schema declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub key: String,

    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
}

/// Raw attribute declaration within a schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeConfig {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: AttributeKindConfig,

    /// Composed schema key, required for `entity` / `entity_list`.
    #[serde(default)]
    pub schema: Option<String>,

    /// Element kind, required for `value_list`.
    #[serde(default)]
    pub element: Option<AttributeKindConfig>,

    #[serde(default)]
    pub access: AccessLevel,
}

/// Declared attribute kind as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKindConfig {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    ValueList,
    Entity,
    EntityList,
}

/// Raw record definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefinitionConfig {
    pub key: String,

    #[serde(default)]
    pub name: Option<String>,

    pub schema: String,

    /// Records expire this many seconds after creation.
    pub expiration_seconds: i64,
}

/// Raw transaction definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDefinitionConfig {
    pub key: String,

    #[serde(default)]
    pub name: Option<String>,

    pub schema: String,
}

impl CaseworkConfigFile {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse casework configuration YAML")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", path.display()))
    }

    /// Compile the raw configuration into the shared runtime registries.
    pub fn compile(&self) -> CaseworkResult<(Arc<SchemaSet>, Arc<DefinitionRegistry>)> {
        let schemas = Arc::new(SchemaSet::compile(&self.schemas)?);
        let definitions = Arc::new(DefinitionRegistry::from_configs(
            &self.record_definitions,
            &self.transaction_definitions,
            &schemas,
        )?);

        info!(
            schemas = self.schemas.len(),
            record_definitions = self.record_definitions.len(),
            transaction_definitions = self.transaction_definitions.len(),
            "Compiled casework configuration"
        );

        Ok((schemas, definitions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
schemas:
  - key: permit_application
    attributes:
      - name: applicant_name
        type: string
      - name: unit_count
        type: integer
      - name: reviewer_notes
        type: string
        access: admin

record_definitions:
  - key: permit
    name: Building Permit
    schema: permit_application
    expiration_seconds: 2592000

transaction_definitions:
  - key: permit_request
    schema: permit_application
"#;

    #[test]
    fn parses_and_compiles_sample() {
        let file = CaseworkConfigFile::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(file.schemas.len(), 1);
        assert_eq!(file.record_definitions.len(), 1);

        let (schemas, definitions) = file.compile().unwrap();
        assert!(schemas.contains("permit_application"));

        let def = definitions.record_definition("permit").unwrap();
        assert_eq!(def.schema_key, "permit_application");
        assert_eq!(def.expiration.num_seconds(), 2_592_000);
    }

    #[test]
    fn attribute_access_defaults_to_public() {
        let file = CaseworkConfigFile::from_yaml_str(SAMPLE).unwrap();
        let attrs = &file.schemas[0].attributes;
        assert_eq!(attrs[0].access, AccessLevel::Public);
        assert_eq!(attrs[2].access, AccessLevel::Admin);
    }

    #[test]
    fn unknown_attribute_kind_fails_at_parse() {
        let bad = r#"
schemas:
  - key: x
    attributes:
      - name: y
        type: floatingpoint
"#;
        assert!(CaseworkConfigFile::from_yaml_str(bad).is_err());
    }

    #[test]
    fn definition_against_unknown_schema_fails_compile() {
        let bad = r#"
record_definitions:
  - key: permit
    schema: nowhere
    expiration_seconds: 60
"#;
        let file = CaseworkConfigFile::from_yaml_str(bad).unwrap();
        assert!(file.compile().is_err());
    }
}
