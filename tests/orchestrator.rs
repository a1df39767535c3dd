//! Tests for the validation orchestrator, its reducer and the debouncer.
mod common;
use common::*;
use kakunin::prelude::*;
use kakunin::validation::{
    DebounceKey, Debouncer, ValidationAction, ValidationOrchestrator, ValidationState,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Records every value it is asked to check; rejects the string "bad".
struct Recorder {
    seen: Arc<Mutex<Vec<Value>>>,
}

impl RuleChecker for Recorder {
    fn rule_type(&self) -> &str {
        "record"
    }

    fn check(&self, value: &Value, _rule: &ValidationRule, ctx: &RuleContext<'_>) -> Option<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(value.clone());
        }
        (value == "bad").then(|| format!("{} is bad", ctx.label()))
    }
}

fn recorded_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::new("name", FieldType::Text)
            .with_label("Name")
            .with_rule(ValidationRule::new("record", Value::Null)),
        FieldDefinition::new("alias", FieldType::Text)
            .with_label("Alias")
            .with_rule(ValidationRule::new("record", Value::Null)),
    ]
}

fn recording_validator() -> (FieldValidator, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let validator = FieldValidator::builder()
        .with_checker(Box::new(Recorder { seen: seen.clone() }))
        .build();
    (validator, seen)
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// --- Reducer ---

#[test]
fn test_reducer_transitions() {
    let state = ValidationState::default()
        .reduce(ValidationAction::Touch("a".to_string()))
        .reduce(ValidationAction::SetErrors {
            field: "a".to_string(),
            errors: vec!["bad".to_string()],
        });
    assert!(state.is_touched("a"));
    assert_eq!(state.errors("a"), ["bad".to_string()]);
    assert!(!state.is_valid(&ActiveStateMap::default()));

    let cleared = state.clone().reduce(ValidationAction::ClearField("a".to_string()));
    assert!(!cleared.is_touched("a"));
    assert!(cleared.errors("a").is_empty());
    assert!(cleared.field_errors().is_empty());

    let emptied = state.clone().reduce(ValidationAction::SetErrors {
        field: "a".to_string(),
        errors: vec![],
    });
    assert!(emptied.field_errors().is_empty());
    assert!(emptied.is_touched("a"));

    let submitted = state
        .reduce(ValidationAction::TouchAll(vec!["b".to_string(), "c".to_string()]))
        .reduce(ValidationAction::Submitted);
    assert!(submitted.is_submitted());
    assert_eq!(submitted.touched().len(), 3);
    assert_eq!(submitted.reduce(ValidationAction::Reset), ValidationState::default());
}

#[test]
fn test_validity_ignores_hidden_fields() {
    let state = ValidationState::default().reduce(ValidationAction::SetErrors {
        field: "age".to_string(),
        errors: vec!["Age must be at least 0".to_string()],
    });
    let mut active = ActiveStateMap::default();
    active.insert("age".to_string(), ActiveFieldState::default());
    assert!(!state.is_valid(&active));

    active.insert(
        "age".to_string(),
        ActiveFieldState {
            visible: false,
            ..Default::default()
        },
    );
    assert!(state.is_valid(&active));
}

// --- Debouncer ---

#[test]
fn test_debouncer_last_write_wins() {
    let t0 = Instant::now();
    let mut debouncer = Debouncer::new(ms(300));
    let key = DebounceKey::Field("name".to_string());

    assert!(!debouncer.schedule(key.clone(), "name", json!("a"), t0));
    assert!(debouncer.schedule(key.clone(), "name", json!("ab"), t0 + ms(100)));
    assert_eq!(debouncer.next_due(), Some(t0 + ms(400)));

    assert!(debouncer.take_due(t0 + ms(350)).is_empty());
    let due = debouncer.take_due(t0 + ms(400));
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].captured, json!("ab"));
    assert!(due[0].is_current(&json!("ab")));
    assert!(!due[0].is_current(&json!("abc")));
    assert!(!debouncer.has_pending());
}

#[test]
fn test_debouncer_keys_are_independent() {
    let t0 = Instant::now();
    let mut debouncer = Debouncer::new(ms(50));
    debouncer.schedule(DebounceKey::Field("a".to_string()), "a", json!(1), t0);
    debouncer.schedule(DebounceKey::Field("b".to_string()), "b", json!(2), t0);
    assert!(debouncer.is_pending(&DebounceKey::Field("a".to_string())));

    assert!(debouncer.cancel(&DebounceKey::Field("a".to_string())));
    assert!(!debouncer.cancel(&DebounceKey::Field("a".to_string())));
    assert_eq!(debouncer.take_due(t0 + ms(50)).len(), 1);

    debouncer.schedule(DebounceKey::Form, "a", json!(1), t0);
    debouncer.cancel_all();
    assert_eq!(debouncer.next_due(), None);
}

// --- Orchestrator ---

#[test]
fn test_debounce_cancellation_single_invocation_with_latest_value() {
    let fields = recorded_fields();
    let (validator, seen) = recording_validator();
    let config = ValidationConfig::default()
        .with_mode(ValidationMode::OnChange)
        .with_debounce_ms(300);
    let mut orchestrator = ValidationOrchestrator::new(&fields, &validator, config);
    let t0 = Instant::now();

    let mut data = DataSnapshot::new();
    orchestrator.touch_field("name", &data);
    assert!(seen.lock().unwrap().is_empty());

    data.insert("name".to_string(), json!("first"));
    let first = orchestrator.update_value("name", &data, t0);
    assert_eq!(first, ChangeValidation::Scheduled { due: t0 + ms(300) });

    data.insert("name".to_string(), json!("second"));
    orchestrator.update_value("name", &data, t0 + ms(100));

    assert!(orchestrator.tick(t0 + ms(350), &data).is_empty());
    assert_eq!(orchestrator.tick(t0 + ms(500), &data), vec!["name"]);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![json!("second")]);
    assert!(!orchestrator.has_pending());
}

#[test]
fn test_stale_result_is_discarded() {
    let fields = recorded_fields();
    let (validator, seen) = recording_validator();
    let config = ValidationConfig::default().with_mode(ValidationMode::OnChange);
    let mut orchestrator = ValidationOrchestrator::new(&fields, &validator, config);
    let t0 = Instant::now();

    let mut data = snapshot(&[("name", json!("bad"))]);
    orchestrator.touch_field("name", &data);
    orchestrator.update_value("name", &data, t0);

    // The value moved on without a new update reaching the orchestrator.
    data.insert("name".to_string(), json!("good"));
    assert!(orchestrator.tick(t0 + ms(1000), &data).is_empty());
    assert!(seen.lock().unwrap().is_empty());
    assert!(orchestrator.errors("name").is_empty());
}

#[test]
fn test_untouched_and_hidden_updates_are_deferred() {
    let fields = create_family_fields();
    let validator = FieldValidator::default();
    let mut orchestrator =
        ValidationOrchestrator::new(&fields, &validator, ValidationConfig::default());
    let hidden = snapshot(&[("hasChildren", json!(false))]);
    orchestrator.sync_active_state(recompute_active_state(&fields, &hidden));
    let now = Instant::now();

    assert_eq!(orchestrator.update_value("hasChildren", &hidden, now), ChangeValidation::Deferred);

    orchestrator.touch_field("age", &hidden);
    assert_eq!(orchestrator.update_value("age", &hidden, now), ChangeValidation::Deferred);
}

#[test]
fn test_touch_validates_depending_on_mode() {
    let fields = vec![create_email_field()];
    let validator = FieldValidator::default();
    let data = snapshot(&[("email", json!("nope"))]);

    for (mode, validates) in [
        (ValidationMode::All, true),
        (ValidationMode::OnBlur, true),
        (ValidationMode::OnChange, false),
        (ValidationMode::OnSubmit, false),
    ] {
        let config = ValidationConfig::default().with_mode(mode);
        let mut orchestrator = ValidationOrchestrator::new(&fields, &validator, config);
        orchestrator.touch_field("email", &data);
        assert!(orchestrator.state().is_touched("email"));
        assert_eq!(!orchestrator.errors("email").is_empty(), validates, "{:?}", mode);
    }
}

#[test]
fn test_zero_debounce_validates_synchronously() {
    let fields = vec![create_email_field()];
    let validator = FieldValidator::default();
    let config = ValidationConfig::default().with_debounce_ms(0);
    let mut orchestrator = ValidationOrchestrator::new(&fields, &validator, config);

    let mut data = snapshot(&[("email", json!("me@example.com"))]);
    orchestrator.touch_field("email", &data);
    assert!(orchestrator.is_valid());

    data.insert("email".to_string(), json!("me@"));
    let outcome = orchestrator.update_value("email", &data, Instant::now());
    assert_eq!(outcome, ChangeValidation::Validated);
    assert_eq!(orchestrator.errors("email"), ["Email must be a valid email address".to_string()]);
    assert!(!orchestrator.is_valid());
}

#[test]
fn test_form_scope_debounce_validates_all_touched() {
    let fields = recorded_fields();
    let (validator, seen) = recording_validator();
    let config = ValidationConfig::default()
        .with_mode(ValidationMode::OnChange)
        .with_debounce_scope(DebounceScope::Form);
    let mut orchestrator = ValidationOrchestrator::new(&fields, &validator, config);
    let t0 = Instant::now();

    let data = snapshot(&[("name", json!("bad")), ("alias", json!("ok"))]);
    orchestrator.touch_field("name", &data);
    orchestrator.touch_field("alias", &data);
    orchestrator.update_value("name", &data, t0);
    orchestrator.update_value("alias", &data, t0 + ms(10));

    let applied = orchestrator.tick(t0 + ms(1000), &data);
    assert_eq!(applied, vec!["name", "alias"]);
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(orchestrator.errors("name"), ["Name is bad".to_string()]);
}

#[test]
fn test_submit_supersedes_pending_and_skips_hidden() {
    let fields = create_family_fields();
    let validator = FieldValidator::default();
    let mut orchestrator =
        ValidationOrchestrator::new(&fields, &validator, ValidationConfig::default());
    let t0 = Instant::now();

    let data = snapshot(&[("hasChildren", json!(true)), ("age", json!(-1))]);
    orchestrator.sync_active_state(recompute_active_state(&fields, &data));
    orchestrator.touch_field("age", &data);
    orchestrator.update_value("age", &data, t0);
    assert!(orchestrator.has_pending());

    assert!(!orchestrator.validate_for_submit(&data));
    assert!(!orchestrator.has_pending());
    assert!(orchestrator.state().is_submitted());
    assert!(orchestrator.state().is_touched("hasChildren"));
    assert_eq!(orchestrator.errors("age"), ["Age must be at least 0".to_string()]);

    // Once hidden, the stale error no longer counts and is cleared.
    let hidden = snapshot(&[("hasChildren", json!(false)), ("age", json!(-1))]);
    orchestrator.sync_active_state(recompute_active_state(&fields, &hidden));
    assert!(orchestrator.is_valid());
    assert!(orchestrator.errors("age").is_empty());
    assert!(!orchestrator.state().is_touched("age"));
    assert!(orchestrator.validate_for_submit(&hidden));
}

#[test]
fn test_submit_validates_required_untouched_fields() {
    let fields = vec![create_email_field()];
    let validator = FieldValidator::default();
    let mut orchestrator =
        ValidationOrchestrator::new(&fields, &validator, ValidationConfig::default());
    assert!(!orchestrator.validate_for_submit(&DataSnapshot::new()));
    assert_eq!(
        orchestrator.visible_errors()["email"],
        vec!["Email is required".to_string()]
    );

    orchestrator.reset();
    assert!(orchestrator.is_valid());
    assert!(!orchestrator.state().is_submitted());
}
