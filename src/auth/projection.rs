//! Authorization-filtered projection.
//!
//! This is the single point where entity values cross the serialization
//! boundary. Every outbound path (read, create/update responses, list and
//! search results) serializes through [`project_entity`], so the contract
//! "no restricted field ever leaves unfiltered" holds in one code path.

use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::auth::handler::AuthFilter;
use crate::entity::DynamicEntity;
use crate::schema::AttributeValue;

/// Project an entity into its externally visible flat map, redacting every
/// attribute the filter does not admit. Nested entities are filtered with
/// the same clearance; key order follows schema declaration order.
pub fn project_entity(entity: &DynamicEntity, filter: &AuthFilter) -> JsonMap<String, JsonValue> {
    let mut map = JsonMap::new();
    for definition in entity.schema().attributes() {
        if !filter.is_visible(definition) {
            continue;
        }
        if let Some(value) = entity.get(&definition.name) {
            map.insert(definition.name.clone(), project_value(value, filter));
        }
    }
    map
}

fn project_value(value: &AttributeValue, filter: &AuthFilter) -> JsonValue {
    match value {
        AttributeValue::Entity(entity) => JsonValue::Object(project_entity(entity, filter)),
        AttributeValue::EntityList(entities) => JsonValue::Array(
            entities
                .iter()
                .map(|e| JsonValue::Object(project_entity(e, filter)))
                .collect(),
        ),
        scalar => scalar.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaseworkConfigFile;
    use crate::schema::{AccessLevel, SchemaSet};
    use serde_json::json;

    fn entity_with_gated_fields() -> DynamicEntity {
        let file = CaseworkConfigFile::from_yaml_str(
            r#"
            schemas:
              - key: note
                attributes:
                  - name: body
                    type: string
                  - name: internal_ref
                    type: string
                    access: agency
              - key: profile
                attributes:
                  - name: display_name
                    type: string
                  - name: email
                    type: string
                  - name: case_worker
                    type: string
                    access: agency
                  - name: risk_score
                    type: integer
                    access: admin
                  - name: notes
                    type: entity_list
                    schema: note
            "#,
        )
        .unwrap();
        let schemas = SchemaSet::compile(&file.schemas).unwrap();

        DynamicEntity::from_flat_map(
            schemas.get("profile").unwrap(),
            json!({
                "display_name": "Ada",
                "email": "ada@example.com",
                "case_worker": "w-9",
                "risk_score": 2,
                "notes": [{"body": "called applicant", "internal_ref": "N-1"}]
            })
            .as_object()
            .unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn public_projection_drops_gated_fields() {
        let entity = entity_with_gated_fields();
        let map = project_entity(&entity, &AuthFilter::up_to(AccessLevel::Public));

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["display_name", "email", "notes"]);

        // Nested entities are filtered with the same clearance.
        let note = &map["notes"][0];
        assert_eq!(note, &json!({"body": "called applicant"}));
    }

    #[test]
    fn visibility_is_strictly_monotonic_by_tier() {
        let entity = entity_with_gated_fields();

        let public = project_entity(&entity, &AuthFilter::up_to(AccessLevel::Public));
        let agency = project_entity(&entity, &AuthFilter::up_to(AccessLevel::Agency));
        let admin = project_entity(&entity, &AuthFilter::up_to(AccessLevel::Admin));

        assert_eq!(public.len(), 3);
        assert_eq!(agency.len(), 4);
        assert_eq!(admin.len(), 5);

        // Each tier sees a superset of the tier below.
        for key in public.keys() {
            assert!(agency.contains_key(key));
        }
        for key in agency.keys() {
            assert!(admin.contains_key(key));
        }
    }

    #[test]
    fn admin_filter_admits_everything_in_order() {
        let entity = entity_with_gated_fields();
        let map = project_entity(&entity, &AuthFilter::all());

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(
            keys,
            vec!["display_name", "email", "case_worker", "risk_score", "notes"]
        );
        assert_eq!(map["risk_score"], json!(2));
    }
}
