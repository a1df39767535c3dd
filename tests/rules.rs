//! Tests for the conditional rule processor.
mod common;
use common::*;
use kakunin::prelude::*;
use kakunin::rules::RuleProcessor;
use serde_json::{Value, json};

#[test]
fn test_visibility_follows_condition() {
    let fields = create_family_fields();

    let active = recompute_active_state(&fields, &snapshot(&[("hasChildren", json!(false))]));
    assert!(active["hasChildren"].visible);
    assert!(!active["age"].visible);

    let active = recompute_active_state(&fields, &snapshot(&[("hasChildren", json!(true))]));
    assert!(active["age"].visible);
}

#[test]
fn test_recompute_is_deterministic() {
    let form = FormDefinition::from_json(SHIPPING_FORM_JSON).unwrap();
    let data = snapshot(&[("method", json!("courier")), ("address", json!("1 Main St"))]);
    let first = recompute_active_state(&form.fields, &data);
    let second = recompute_active_state(&form.fields, &data);
    assert_eq!(first, second);
    assert_eq!(first.len(), form.fields.len());
}

#[test]
fn test_static_required_is_never_weakened() {
    let fields = vec![
        FieldDefinition::new("toggle", FieldType::Checkbox),
        FieldDefinition::new("name", FieldType::Text)
            .required()
            .required_when(Condition::leaf("toggle", Operator::Equals, json!(true)))
            .modified_when(
                Condition::leaf("toggle", Operator::Equals, json!(false)),
                FieldOverrides {
                    required: Some(false),
                    ..Default::default()
                },
            ),
        FieldDefinition::new("code", FieldType::Text)
            .with_rule(ValidationRule::required())
            .required_when(Condition::all(vec![Condition::any(vec![])])),
    ];
    for toggle in [json!(true), json!(false), Value::Null, json!("junk")] {
        let active = recompute_active_state(&fields, &snapshot(&[("toggle", toggle)]));
        assert!(active["name"].required);
        assert!(active["code"].required);
    }
}

#[test]
fn test_conditional_required() {
    let form = FormDefinition::from_json(SHIPPING_FORM_JSON).unwrap();

    let active = recompute_active_state(&form.fields, &snapshot(&[("method", json!("pickup"))]));
    assert!(!active["address"].visible);
    assert!(!active["address"].required);

    let active = recompute_active_state(&form.fields, &snapshot(&[("method", json!("courier"))]));
    assert!(active["address"].visible);
    assert!(active["address"].required);
}

#[test]
fn test_modifications_merge_left_to_right() {
    let fields = vec![
        FieldDefinition::new("level", FieldType::Number),
        FieldDefinition::new("notes", FieldType::Textarea)
            .modified_when(
                Condition::leaf("level", Operator::GreaterThan, json!(1)),
                FieldOverrides {
                    label: Some("Notes (level 2)".to_string()),
                    placeholder: Some("Explain".to_string()),
                    ..Default::default()
                },
            )
            .modified_when(
                Condition::leaf("level", Operator::GreaterThan, json!(2)),
                FieldOverrides {
                    label: Some("Notes (level 3)".to_string()),
                    required: Some(true),
                    ..Default::default()
                },
            ),
    ];

    let active = recompute_active_state(&fields, &snapshot(&[("level", json!(1))]));
    assert!(active["notes"].modifications.is_empty());
    assert!(!active["notes"].required);

    let active = recompute_active_state(&fields, &snapshot(&[("level", json!(2))]));
    assert_eq!(active["notes"].modifications.label.as_deref(), Some("Notes (level 2)"));

    let active = recompute_active_state(&fields, &snapshot(&[("level", json!(3))]));
    let notes = &active["notes"];
    assert_eq!(notes.modifications.label.as_deref(), Some("Notes (level 3)"));
    assert_eq!(notes.modifications.placeholder.as_deref(), Some("Explain"));
    assert!(notes.required);
}

#[test]
fn test_unconditional_fields_are_visible() {
    let fields = vec![FieldDefinition::new("plain", FieldType::Text)];
    let active = recompute_active_state(&fields, &DataSnapshot::new());
    assert_eq!(active["plain"], ActiveFieldState::default());
}

#[test]
fn test_cycle_safety_recompute_terminates() {
    let fields = create_cyclic_fields();
    let active = recompute_active_state(&fields, &snapshot(&[("A", json!("x"))]));
    assert_eq!(active.len(), 2);
    // Conditions read data, not computed state: B sees A's value.
    assert!(active["B"].visible);
    assert!(!active["A"].visible);
}

#[test]
fn test_cyclic_fields_keep_last_known_state() {
    let fields = create_cyclic_fields();
    let processor = RuleProcessor::new(&DependencyGraph::build(&fields));
    assert!(processor.is_cyclic("A"));
    assert!(processor.is_cyclic("B"));

    let initial = processor.recompute(&fields, &DataSnapshot::new(), None);
    assert!(!initial["A"].visible);
    assert!(!initial["B"].visible);

    let data = snapshot(&[("A", json!("x")), ("B", json!("y"))]);
    let next = processor.recompute(&fields, &data, Some(&initial));
    assert_eq!(next["A"].visible, initial["A"].visible);
    assert_eq!(next["B"].visible, initial["B"].visible);

    // Without history the computation is the plain one.
    let fresh = processor.recompute(&fields, &data, None);
    assert!(fresh["A"].visible);
    assert!(fresh["B"].visible);
}

#[test]
fn test_non_cyclic_fields_are_not_frozen() {
    let fields = create_family_fields();
    let processor = RuleProcessor::new(&DependencyGraph::build(&fields));
    assert!(!processor.is_cyclic("age"));

    let hidden = processor.recompute(&fields, &DataSnapshot::new(), None);
    let shown = processor.recompute(&fields, &snapshot(&[("hasChildren", json!(true))]), Some(&hidden));
    assert!(shown["age"].visible);
}

#[test]
fn test_required_rule_from_modification_marks_field_required() {
    let fields = vec![
        FieldDefinition::new("mode", FieldType::Select),
        FieldDefinition::new("note", FieldType::Textarea)
            .with_label("Note")
            .modified_when(
                Condition::leaf("mode", Operator::Equals, json!("strict")),
                FieldOverrides {
                    rules: Some(vec![ValidationRule::required()]),
                    ..Default::default()
                },
            ),
    ];

    let relaxed = snapshot(&[("mode", json!("loose"))]);
    assert!(!recompute_active_state(&fields, &relaxed)["note"].required);
    assert!(validate_form(&relaxed, &fields).is_valid);

    let strict = snapshot(&[("mode", json!("strict"))]);
    let active = recompute_active_state(&fields, &strict);
    assert!(active["note"].required);
    // The reported flag and the validation outcome agree.
    let result = validate_form(&strict, &fields);
    assert_eq!(result.errors["note"], vec!["Note is required"]);
}
