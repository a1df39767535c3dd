//! # Kakunin - Conditional Form Logic and Validation Engine
//!
//! **Kakunin** decides, for every field of a dynamic form, whether it is visible,
//! whether it is required, and which of its properties are overridden, all from
//! declarative conditions over the other fields' current values. It validates
//! values against per-field rules and keeps both consistent while a user types:
//! dependent fields are recomputed, stale values of hidden fields are cleared,
//! and validation is debounced.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the Form**: Load a `FormDefinition` from JSON, build one with the
//!     `FieldDefinition` builders, or implement `IntoForm` for your own format.
//! 2.  **Build an Engine**: `FormEngine::builder` checks field names, builds the
//!     dependency graph and reports circular dependencies.
//! 3.  **Evaluate**: Use `recompute_active_state` and `validate_form` for one-off
//!     checks against a data snapshot.
//! 4.  **Run a Session**: A `FormSession` tracks touched fields, cascades value
//!     changes and runs debounced validation for one user filling in the form.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kakunin::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<()> {
//!     let fields = vec![
//!         FieldDefinition::new("age", FieldType::Number),
//!         FieldDefinition::new("hasChildren", FieldType::Checkbox)
//!             .visible_when(Condition::leaf("age", Operator::GreaterThan, json!(18))),
//!         FieldDefinition::new("email", FieldType::Email)
//!             .with_label("Email")
//!             .with_rule(ValidationRule::email()),
//!     ];
//!     let engine = FormEngine::from_fields(fields)?;
//!
//!     let mut data = DataSnapshot::new();
//!     data.insert("age".to_string(), json!(25));
//!     data.insert("email".to_string(), json!("not-an-email"));
//!
//!     let active = engine.recompute_active_state(&data);
//!     println!("hasChildren visible: {}", active["hasChildren"].visible);
//!
//!     let result = engine.validate_form(&data);
//!     for (field, messages) in &result.errors {
//!         println!("{}: {:?}", field, messages);
//!     }
//!
//!     // Interactive use: cascade a change and debounce its validation.
//!     let mut session = engine.session(&data);
//!     session.touch_field("age", &data);
//!     let change = session.on_value_change("age", json!(12), &data, std::time::Instant::now());
//!     for (field, value) in change.snapshot_patch {
//!         data.insert(field, value);
//!     }
//!     println!("{:?}", session.explain("hasChildren", &data));
//!     Ok(())
//! }
//! ```

pub mod cascade;
pub mod condition;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod form;
pub mod graph;
pub mod prelude;
pub mod rules;
pub mod trace;
pub mod validation;
