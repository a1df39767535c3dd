//! Common test utilities for building form definitions and data snapshots.
use kakunin::prelude::*;
use serde_json::{Value, json};

/// Builds a data snapshot from `(field, value)` pairs.
#[allow(dead_code)]
pub fn snapshot(pairs: &[(&str, Value)]) -> DataSnapshot {
    pairs
        .iter()
        .map(|(field, value)| (field.to_string(), value.clone()))
        .collect()
}

/// `hasChildren` (checkbox) and `age` (number), where `age` is only shown
/// when `hasChildren` is true and must be at least 0.
///
/// Logic: `age` visible when `$hasChildren equals true`
#[allow(dead_code)]
pub fn create_family_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("hasChildren", FieldType::Checkbox).with_label("Has children"),
        FieldDefinition::new("age", FieldType::Number)
            .with_label("Age")
            .with_rule(ValidationRule::min(0.0))
            .visible_when(Condition::leaf("hasChildren", Operator::Equals, json!(true))),
    ]
}

/// A required email field with the `[required, email]` rule pair.
#[allow(dead_code)]
pub fn create_email_field() -> FieldDefinition {
    FieldDefinition::new("email", FieldType::Email)
        .with_label("Email")
        .with_rule(ValidationRule::required())
        .with_rule(ValidationRule::email())
}

/// Two fields whose visibility conditions read each other.
///
/// Logic: `A` visible when `$B is_not_empty`, `B` visible when `$A is_not_empty`
#[allow(dead_code)]
pub fn create_cyclic_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("A", FieldType::Text)
            .visible_when(Condition::leaf("B", Operator::IsNotEmpty, Value::Null)),
        FieldDefinition::new("B", FieldType::Text)
            .visible_when(Condition::leaf("A", Operator::IsNotEmpty, Value::Null)),
    ]
}

/// A three-level chain: `country` drives `state`, which drives `city`.
///
/// Logic: `state` visible when `$country equals "US"`,
/// `city` visible when `$state is_not_empty`
#[allow(dead_code)]
pub fn create_chained_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("country", FieldType::Select),
        FieldDefinition::new("state", FieldType::Text)
            .visible_when(Condition::leaf("country", Operator::Equals, json!("US"))),
        FieldDefinition::new("city", FieldType::Text)
            .required()
            .visible_when(Condition::leaf("state", Operator::IsNotEmpty, Value::Null)),
    ]
}

/// A form exercising every condition slot, as authored JSON.
#[allow(dead_code)]
pub const SHIPPING_FORM_JSON: &str = r#"{
    "title": "Shipping",
    "config": { "mode": "all", "debounceMs": 0 },
    "fields": [
        { "name": "method", "type": "radio", "label": "Delivery method",
          "options": [
            { "label": "Pickup", "value": "pickup" },
            { "label": "Courier", "value": "courier" }
          ] },
        { "name": "address", "type": "textarea", "label": "Address",
          "rules": [ { "type": "minLength", "value": 10 } ],
          "conditions": {
            "visibility": { "field": "method", "operator": "equals", "value": "courier" },
            "required": { "field": "method", "operator": "equals", "value": "courier" }
          } },
        { "name": "phone", "type": "phone", "label": "Phone",
          "rules": [ { "type": "phone" } ],
          "conditions": {
            "modifications": [
              { "condition": { "field": "method", "operator": "equals", "value": "courier" },
                "changes": { "label": "Courier contact phone", "required": true } }
            ]
          } }
    ]
}"#;
