//! Attribute value kinds and their validation/coercion rules.
//!
//! Every kind defines the raw JSON shapes it accepts, an explicit coercion
//! rule, and a canonical in-memory representation ([`AttributeValue`]).
//! Structured kinds delegate to the composed schema recursively. Validation
//! is a pure function of its inputs.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::entity::DynamicEntity;
use crate::error::{AttributeError, AttributeResult};
use crate::schema::Schema;

/// A value kind an attribute may declare.
///
/// This is the compiled form: composed kinds hold a shared reference to the
/// nested schema, resolved at load time. The schema graph is acyclic by
/// construction, so `Arc` sharing is safe.
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Integer,
    Decimal,
    Boolean,
    Date,
    /// Ordered list of scalar values of a single kind.
    ValueList(Box<AttributeType>),
    /// Single nested entity bound to a composed schema.
    Entity(Arc<Schema>),
    /// Ordered list of nested entities bound to a composed schema.
    EntityList(Arc<Schema>),
}

/// Canonical typed value stored in a [`DynamicEntity`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    List(Vec<AttributeValue>),
    Entity(DynamicEntity),
    EntityList(Vec<DynamicEntity>),
}

impl AttributeType {
    /// Human-readable name of the expected kind, used in error messages.
    pub fn expected(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Integer => "integer",
            AttributeType::Decimal => "decimal",
            AttributeType::Boolean => "boolean",
            AttributeType::Date => "date (YYYY-MM-DD)",
            AttributeType::ValueList(_) => "list of scalar values",
            AttributeType::Entity(_) => "nested entity object",
            AttributeType::EntityList(_) => "list of nested entity objects",
        }
    }

    /// Whether this kind is a scalar (permitted as a value-list element).
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            AttributeType::String
                | AttributeType::Integer
                | AttributeType::Decimal
                | AttributeType::Boolean
                | AttributeType::Date
        )
    }

    /// Validate a raw JSON value against this kind, coercing where the rules
    /// allow, and produce the canonical typed representation.
    pub fn validate(&self, attribute: &str, raw: &JsonValue) -> AttributeResult<AttributeValue> {
        match self {
            AttributeType::String => match raw {
                JsonValue::String(s) => Ok(AttributeValue::String(s.clone())),
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::Integer => match raw {
                JsonValue::Number(n) => n
                    .as_i64()
                    .map(AttributeValue::Integer)
                    .ok_or_else(|| self.mismatch(attribute, raw)),
                // Numeric strings coerce to integers.
                JsonValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(AttributeValue::Integer)
                    .map_err(|_| self.mismatch(attribute, raw)),
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::Decimal => match raw {
                JsonValue::Number(n) => n
                    .to_string()
                    .parse::<Decimal>()
                    .map(AttributeValue::Decimal)
                    .map_err(|_| self.mismatch(attribute, raw)),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<Decimal>()
                    .map(AttributeValue::Decimal)
                    .map_err(|_| self.mismatch(attribute, raw)),
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::Boolean => match raw {
                JsonValue::Bool(b) => Ok(AttributeValue::Boolean(*b)),
                // "true"/"false" strings coerce to booleans.
                JsonValue::String(s) => match s.trim() {
                    "true" => Ok(AttributeValue::Boolean(true)),
                    "false" => Ok(AttributeValue::Boolean(false)),
                    _ => Err(self.mismatch(attribute, raw)),
                },
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::Date => match raw {
                JsonValue::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(AttributeValue::Date)
                    .map_err(|_| self.mismatch(attribute, raw)),
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::ValueList(element) => match raw {
                JsonValue::Array(items) => {
                    let mut values = Vec::with_capacity(items.len());
                    for item in items {
                        values.push(element.validate(attribute, item)?);
                    }
                    Ok(AttributeValue::List(values))
                }
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::Entity(schema) => match raw {
                JsonValue::Object(map) => {
                    let entity = DynamicEntity::from_flat_map(Arc::clone(schema), map)?;
                    Ok(AttributeValue::Entity(entity))
                }
                other => Err(self.mismatch(attribute, other)),
            },
            AttributeType::EntityList(schema) => match raw {
                JsonValue::Array(items) => {
                    let mut entities = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            JsonValue::Object(map) => {
                                entities.push(DynamicEntity::from_flat_map(Arc::clone(schema), map)?);
                            }
                            other => return Err(self.mismatch(attribute, other)),
                        }
                    }
                    Ok(AttributeValue::EntityList(entities))
                }
                other => Err(self.mismatch(attribute, other)),
            },
        }
    }

    fn mismatch(&self, attribute: &str, raw: &JsonValue) -> AttributeError {
        AttributeError::InvalidValue {
            attribute: attribute.to_string(),
            expected: self.expected(),
            received: describe_json(raw),
        }
    }
}

impl AttributeValue {
    /// Project this value into its JSON transport form. Decimals and dates
    /// serialize as strings, matching the accepted inbound shapes so that
    /// encode/decode round-trips.
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::String(s) => JsonValue::String(s.clone()),
            AttributeValue::Integer(i) => JsonValue::from(*i),
            AttributeValue::Decimal(d) => JsonValue::String(d.to_string()),
            AttributeValue::Boolean(b) => JsonValue::Bool(*b),
            AttributeValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            AttributeValue::List(items) => {
                JsonValue::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Entity(entity) => JsonValue::Object(entity.to_flat_map()),
            AttributeValue::EntityList(entities) => JsonValue::Array(
                entities
                    .iter()
                    .map(|e| JsonValue::Object(e.to_flat_map()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AttributeValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AttributeValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&DynamicEntity> {
        match self {
            AttributeValue::Entity(e) => Some(e),
            _ => None,
        }
    }
}

/// Short description of a raw JSON value's shape for error messages.
fn describe_json(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => format!("boolean {b}"),
        JsonValue::Number(n) => format!("number {n}"),
        JsonValue::String(s) => format!("string \"{s}\""),
        JsonValue::Array(_) => "array".to_string(),
        JsonValue::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_accepts_only_strings() {
        let t = AttributeType::String;
        assert_eq!(
            t.validate("name", &json!("Ada")).unwrap(),
            AttributeValue::String("Ada".to_string())
        );
        assert!(t.validate("name", &json!(42)).is_err());
        assert!(t.validate("name", &json!(null)).is_err());
    }

    #[test]
    fn integer_coerces_numeric_strings() {
        let t = AttributeType::Integer;
        assert_eq!(
            t.validate("count", &json!(42)).unwrap(),
            AttributeValue::Integer(42)
        );
        assert_eq!(
            t.validate("count", &json!("42")).unwrap(),
            AttributeValue::Integer(42)
        );
        assert_eq!(
            t.validate("count", &json!(" -7 ")).unwrap(),
            AttributeValue::Integer(-7)
        );
    }

    #[test]
    fn integer_rejects_fractions() {
        let t = AttributeType::Integer;
        assert!(t.validate("count", &json!(1.5)).is_err());
        assert!(t.validate("count", &json!("1.5")).is_err());
        assert!(t.validate("count", &json!(true)).is_err());
    }

    #[test]
    fn decimal_accepts_numbers_and_strings() {
        let t = AttributeType::Decimal;
        assert_eq!(
            t.validate("fee", &json!("19.99")).unwrap(),
            AttributeValue::Decimal("19.99".parse().unwrap())
        );
        assert_eq!(
            t.validate("fee", &json!(5)).unwrap(),
            AttributeValue::Decimal("5".parse().unwrap())
        );
        assert!(t.validate("fee", &json!("abc")).is_err());
    }

    #[test]
    fn boolean_coerces_true_false_strings() {
        let t = AttributeType::Boolean;
        assert_eq!(
            t.validate("flag", &json!("true")).unwrap(),
            AttributeValue::Boolean(true)
        );
        assert_eq!(
            t.validate("flag", &json!(false)).unwrap(),
            AttributeValue::Boolean(false)
        );
        assert!(t.validate("flag", &json!("yes")).is_err());
    }

    #[test]
    fn date_parses_iso_8601() {
        let t = AttributeType::Date;
        assert_eq!(
            t.validate("opened", &json!("2024-03-01")).unwrap(),
            AttributeValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(t.validate("opened", &json!("03/01/2024")).is_err());
        assert!(t.validate("opened", &json!(20240301)).is_err());
    }

    #[test]
    fn value_list_validates_each_element() {
        let t = AttributeType::ValueList(Box::new(AttributeType::Integer));
        assert_eq!(
            t.validate("scores", &json!([1, "2", 3])).unwrap(),
            AttributeValue::List(vec![
                AttributeValue::Integer(1),
                AttributeValue::Integer(2),
                AttributeValue::Integer(3),
            ])
        );

        let err = t.validate("scores", &json!([1, "two"])).unwrap_err();
        assert!(matches!(err, AttributeError::InvalidValue { .. }));
    }

    #[test]
    fn mismatch_reports_attribute_and_shapes() {
        let err = AttributeType::Integer
            .validate("count", &json!("abc"))
            .unwrap_err();
        match err {
            AttributeError::InvalidValue {
                attribute,
                expected,
                received,
            } => {
                assert_eq!(attribute, "count");
                assert_eq!(expected, "integer");
                assert_eq!(received, "string \"abc\"");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
