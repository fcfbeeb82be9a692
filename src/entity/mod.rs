//! Dynamic entities: schema-bound value containers.
//!
//! A [`DynamicEntity`] holds typed attribute values validated against its
//! schema on every mutation. Values for composed attributes are themselves
//! entities bound to the nested schema, giving the model a tree shape.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{AttributeError, AttributeResult};
use crate::schema::{AttributeValue, Schema};

/// A value container bound to a schema.
///
/// Invariant: every key in the value map exists in the schema and the stored
/// value satisfies that attribute's type. An attribute that has never been
/// populated is absent, which is a valid state distinct from null.
#[derive(Debug, Clone)]
pub struct DynamicEntity {
    schema: Arc<Schema>,
    values: HashMap<String, AttributeValue>,
}

impl DynamicEntity {
    /// A fresh entity with an empty value map.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            values: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Validate and store a raw value for a declared attribute.
    pub fn set(&mut self, name: &str, raw: &JsonValue) -> AttributeResult<()> {
        let definition =
            self.schema
                .attribute(name)
                .ok_or_else(|| AttributeError::UnknownAttribute {
                    schema: self.schema.key().to_string(),
                    attribute: name.to_string(),
                })?;

        let value = definition.attr_type.validate(name, raw)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// The typed value for an attribute, or `None` when not populated.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.values.get(name)
    }

    /// Remove a stored value, returning it if present.
    pub fn unset(&mut self, name: &str) -> Option<AttributeValue> {
        self.values.remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Project the tree of typed values into a flat name/value map suitable
    /// for transport. Keys follow schema declaration order; composed values
    /// recurse into nested maps.
    pub fn to_flat_map(&self) -> JsonMap<String, JsonValue> {
        let mut map = JsonMap::with_capacity(self.values.len());
        for definition in self.schema.attributes() {
            if let Some(value) = self.values.get(&definition.name) {
                map.insert(definition.name.clone(), value.to_json());
            }
        }
        map
    }

    /// Inverse of [`to_flat_map`](Self::to_flat_map): validate every key and
    /// value against the schema.
    ///
    /// Decoding is strict: a key not declared in the schema fails with
    /// `UnknownAttribute` rather than being ignored. This is a deliberate
    /// boundary decision; lenient decoding would silently drop caller data.
    pub fn from_flat_map(
        schema: Arc<Schema>,
        map: &JsonMap<String, JsonValue>,
    ) -> AttributeResult<Self> {
        let mut entity = Self::new(schema);
        for (name, raw) in map {
            entity.set(name, raw)?;
        }
        Ok(entity)
    }

    /// Merge a partial update: only the fields present in the patch are
    /// validated and overwritten; everything else is left untouched.
    pub fn apply_patch(&mut self, patch: &AttributePatch) -> AttributeResult<()> {
        for (name, raw) in patch.entries() {
            self.set(name, raw)?;
        }
        Ok(())
    }
}

impl PartialEq for DynamicEntity {
    fn eq(&self, other: &Self) -> bool {
        self.schema.key() == other.schema.key() && self.values == other.values
    }
}

/// An explicit partial-update payload: a mapping of the fields to overwrite.
///
/// Fields absent from the patch are "not provided", never "cleared", a
/// distinction a full entity with nulls cannot express.
#[derive(Debug, Clone, Default)]
pub struct AttributePatch {
    values: JsonMap<String, JsonValue>,
}

impl AttributePatch {
    pub fn new(values: JsonMap<String, JsonValue>) -> Self {
        Self { values }
    }

    /// Build a patch from a JSON object value; anything else is rejected.
    pub fn from_value(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(values) => Some(Self { values }),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of the fields this patch overwrites.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.values.iter()
    }

    pub fn touches(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}
