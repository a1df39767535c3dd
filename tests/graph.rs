//! Tests for dependency extraction, graph building and cycle detection.
mod common;
use common::*;
use kakunin::prelude::*;
use serde_json::{Value, json};

#[test]
fn test_graph_unions_every_condition_slot() {
    let fields = vec![
        FieldDefinition::new("a", FieldType::Text),
        FieldDefinition::new("b", FieldType::Text),
        FieldDefinition::new("c", FieldType::Text),
        FieldDefinition::new("d", FieldType::Text)
            .visible_when(Condition::leaf("a", Operator::IsNotEmpty, Value::Null))
            .required_when(Condition::leaf("b", Operator::Equals, json!("yes")))
            .modified_when(
                Condition::any(vec![Condition::leaf("c", Operator::GreaterThan, json!(1))]),
                FieldOverrides::default(),
            ),
    ];
    let graph = DependencyGraph::build(&fields);

    let deps: Vec<&String> = graph.dependencies_of("d").collect();
    assert_eq!(deps, vec!["a", "b", "c"]);
    assert_eq!(graph.dependencies_of("a").count(), 0);

    let dependents: Vec<&String> = graph.dependents_of("b").collect();
    assert_eq!(dependents, vec!["d"]);
    assert_eq!(graph.dependents_of("d").count(), 0);
    assert_eq!(graph.fields().count(), 4);
}

#[test]
fn test_graph_direct_dependents_only() {
    let graph = DependencyGraph::build(&create_chained_fields());
    let of_country: Vec<&String> = graph.dependents_of("country").collect();
    assert_eq!(of_country, vec!["state"]);
    let of_state: Vec<&String> = graph.dependents_of("state").collect();
    assert_eq!(of_state, vec!["city"]);
}

#[test]
fn test_acyclic_form_has_no_cycles() {
    assert!(detect_cycles(&create_chained_fields()).is_empty());
    assert!(detect_cycles(&create_family_fields()).is_empty());
    assert!(detect_cycles(&[]).is_empty());
}

#[test]
fn test_mutual_dependency_reports_exactly_one_cycle() {
    let cycles = detect_cycles(&create_cyclic_fields());
    assert_eq!(cycles.len(), 1);

    let cycle = &cycles[0];
    assert!(cycle.contains("A"));
    assert!(cycle.contains("B"));
    assert_eq!(cycle.members().into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(cycle.to_string(), "A -> B -> A");
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let fields = vec![
        FieldDefinition::new("loop", FieldType::Text)
            .visible_when(Condition::leaf("loop", Operator::IsEmpty, Value::Null)),
    ];
    let cycles = detect_cycles(&fields);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].to_string(), "loop -> loop");
}

#[test]
fn test_longer_cycle_with_tail() {
    // entry -> x -> y -> z -> x; entry itself is not on the cycle.
    let fields = vec![
        FieldDefinition::new("entry", FieldType::Text)
            .visible_when(Condition::leaf("x", Operator::IsNotEmpty, Value::Null)),
        FieldDefinition::new("x", FieldType::Text)
            .visible_when(Condition::leaf("y", Operator::IsNotEmpty, Value::Null)),
        FieldDefinition::new("y", FieldType::Text)
            .visible_when(Condition::leaf("z", Operator::IsNotEmpty, Value::Null)),
        FieldDefinition::new("z", FieldType::Text)
            .required_when(Condition::leaf("x", Operator::Equals, json!("go"))),
    ];
    let graph = DependencyGraph::build(&fields);
    let cycles = graph.detect_cycles();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].to_string(), "x -> y -> z -> x");
    assert!(!cycles[0].contains("entry"));

    let in_cycles = graph.fields_in_cycles();
    assert_eq!(in_cycles.len(), 3);
    assert!(!in_cycles.contains("entry"));
}

#[test]
fn test_unknown_dependencies() {
    let fields = vec![
        FieldDefinition::new("a", FieldType::Text)
            .visible_when(Condition::leaf("missing", Operator::IsNotEmpty, Value::Null)),
    ];
    let graph = DependencyGraph::build(&fields);
    assert_eq!(
        graph.unknown_dependencies(),
        vec![("a".to_string(), "missing".to_string())]
    );
}

#[test]
fn test_dot_output() {
    let dot = DependencyGraph::build(&create_family_fields()).to_dot();
    assert!(dot.starts_with("digraph dependencies {"));
    assert!(dot.contains("\"age\" -> \"hasChildren\";"));
    assert!(dot.contains("\"hasChildren\";"));
    assert!(dot.trim_end().ends_with('}'));
}
