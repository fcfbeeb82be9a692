//! Runtime schemas: named, composable definitions of the attributes an
//! entity may hold.
//!
//! Schemas are compiled once from configuration into immutable values shared
//! by reference (`Arc<Schema>`) across all concurrent requests. Composition
//! (nested entities) is resolved at compile time and checked for cycles, so
//! downstream validation never has to guard against infinite recursion.

pub mod attribute_type;

pub use attribute_type::{AttributeType, AttributeValue};

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{AttributeConfig, AttributeKindConfig, SchemaConfig};
use crate::error::{SchemaError, SchemaResult};

/// Visibility tier of an attribute. Tiers are ordered: a caller cleared for
/// a tier sees that tier and everything below it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Public,
    Agency,
    Admin,
}

/// A single named, typed attribute declaration within a schema.
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub name: String,
    pub attr_type: AttributeType,
    pub access: AccessLevel,
}

/// A named, ordered set of attribute definitions.
///
/// Declaration order is preserved and drives serialization order. Attribute
/// names are unique within the schema. Immutable once compiled.
#[derive(Debug)]
pub struct Schema {
    key: String,
    attributes: Vec<AttributeDefinition>,
    index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from ordered attribute definitions, rejecting
    /// duplicate names.
    pub fn new(key: impl Into<String>, attributes: Vec<AttributeDefinition>) -> SchemaResult<Self> {
        let key = key.into();
        let mut index = HashMap::with_capacity(attributes.len());
        for (position, def) in attributes.iter().enumerate() {
            if index.insert(def.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateAttribute {
                    schema: key,
                    attribute: def.name.clone(),
                });
            }
        }
        Ok(Self {
            key,
            attributes,
            index,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolve an attribute definition by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDefinition> {
        self.index.get(name).map(|&i| &self.attributes[i])
    }

    /// Attribute definitions in declaration order. The iterator is finite
    /// and restartable.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDefinition> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// The set of compiled schemas, loaded once and shared read-only.
#[derive(Debug, Default)]
pub struct SchemaSet {
    schemas: HashMap<String, Arc<Schema>>,
}

impl SchemaSet {
    /// Look up a schema by key. Unknown keys fail with `MissingSchema`; the
    /// failure propagates up through entity creation rather than being
    /// defaulted, because record/transaction creation cannot proceed
    /// without the schema.
    pub fn get(&self, key: &str) -> SchemaResult<Arc<Schema>> {
        self.schemas
            .get(key)
            .cloned()
            .ok_or_else(|| SchemaError::MissingSchema {
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.schemas.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Compile raw schema configuration into the immutable runtime set.
    ///
    /// Performs every load-time check: duplicate attribute names, scalar
    /// value-list elements, resolvable composition references, and cycle
    /// detection (a schema may not nest itself, directly or transitively).
    pub fn compile(configs: &[SchemaConfig]) -> SchemaResult<Self> {
        let by_key: HashMap<&str, &SchemaConfig> =
            configs.iter().map(|c| (c.key.as_str(), c)).collect();

        // Post-order walk gives a construction order in which every nested
        // schema is already built; the walk itself detects cycles.
        let mut order: Vec<&str> = Vec::with_capacity(configs.len());
        let mut state: HashMap<&str, VisitState> = HashMap::new();
        for config in configs {
            visit(config.key.as_str(), &by_key, &mut state, &mut order, &mut Vec::new())?;
        }

        let mut schemas: HashMap<String, Arc<Schema>> = HashMap::with_capacity(order.len());
        for key in order {
            let config = by_key[key];
            let mut attributes = Vec::with_capacity(config.attributes.len());
            for attr in &config.attributes {
                attributes.push(compile_attribute(key, attr, &schemas)?);
            }
            let schema = Arc::new(Schema::new(key, attributes)?);
            schemas.insert(key.to_string(), schema);
        }

        Ok(Self { schemas })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum VisitState {
    InProgress,
    Done,
}

fn visit<'a>(
    key: &'a str,
    by_key: &HashMap<&'a str, &'a SchemaConfig>,
    state: &mut HashMap<&'a str, VisitState>,
    order: &mut Vec<&'a str>,
    stack: &mut Vec<&'a str>,
) -> SchemaResult<()> {
    match state.get(key) {
        Some(VisitState::Done) => return Ok(()),
        Some(VisitState::InProgress) => {
            let mut chain: Vec<&str> = stack.clone();
            chain.push(key);
            return Err(SchemaError::CyclicComposition {
                chain: chain.join(" -> "),
            });
        }
        None => {}
    }

    let config = by_key
        .get(key)
        .copied()
        .ok_or_else(|| SchemaError::MissingSchema {
            key: key.to_string(),
        })?;

    state.insert(key, VisitState::InProgress);
    stack.push(key);

    for attr in &config.attributes {
        if let Some(nested) = attr.schema.as_deref() {
            match attr.kind {
                AttributeKindConfig::Entity | AttributeKindConfig::EntityList => {
                    visit(nested, by_key, state, order, stack)?;
                }
                _ => {}
            }
        }
    }

    stack.pop();
    state.insert(key, VisitState::Done);
    order.push(key);
    Ok(())
}

fn compile_attribute(
    schema_key: &str,
    config: &AttributeConfig,
    built: &HashMap<String, Arc<Schema>>,
) -> SchemaResult<AttributeDefinition> {
    let nested = |schema: &Option<String>| -> SchemaResult<Arc<Schema>> {
        let key = schema
            .as_deref()
            .ok_or_else(|| SchemaError::MissingComposition {
                schema: schema_key.to_string(),
                attribute: config.name.clone(),
            })?;
        // Post-order construction guarantees nested schemas are present.
        built
            .get(key)
            .cloned()
            .ok_or_else(|| SchemaError::MissingSchema {
                key: key.to_string(),
            })
    };

    let attr_type = match config.kind {
        AttributeKindConfig::String => AttributeType::String,
        AttributeKindConfig::Integer => AttributeType::Integer,
        AttributeKindConfig::Decimal => AttributeType::Decimal,
        AttributeKindConfig::Boolean => AttributeType::Boolean,
        AttributeKindConfig::Date => AttributeType::Date,
        AttributeKindConfig::ValueList => {
            let element = match config.element {
                Some(AttributeKindConfig::String) => AttributeType::String,
                Some(AttributeKindConfig::Integer) => AttributeType::Integer,
                Some(AttributeKindConfig::Decimal) => AttributeType::Decimal,
                Some(AttributeKindConfig::Boolean) => AttributeType::Boolean,
                Some(AttributeKindConfig::Date) => AttributeType::Date,
                // Lists of lists or of entities are not value lists.
                Some(_) | None => {
                    return Err(SchemaError::InvalidListElement {
                        schema: schema_key.to_string(),
                        attribute: config.name.clone(),
                    })
                }
            };
            AttributeType::ValueList(Box::new(element))
        }
        AttributeKindConfig::Entity => AttributeType::Entity(nested(&config.schema)?),
        AttributeKindConfig::EntityList => AttributeType::EntityList(nested(&config.schema)?),
    };

    Ok(AttributeDefinition {
        name: config.name.clone(),
        attr_type,
        access: config.access,
    })
}
