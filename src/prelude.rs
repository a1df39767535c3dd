//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the kakunin crate.
//! Import this module to get access to the core functionality without having to import
//! each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use kakunin::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let form = FormDefinition::from_file("path/to/form.json")?;
//! let engine = FormEngine::builder(form).build()?;
//!
//! for diagnostic in engine.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//!
//! let data: DataSnapshot = serde_json::from_str(&std::fs::read_to_string("path/to/data.json")?)?;
//! let result = engine.validate_form(&data);
//! println!("Valid: {}", result.is_valid);
//! # Ok(())
//! # }
//! ```

// Engine and sessions
pub use crate::engine::{FormEngine, FormEngineBuilder, FormSession, ValueChange};

// Conditions and evaluation
pub use crate::condition::{
    Condition, ConditionTrace, DataSnapshot, LeafCondition, LogicalOperator, Operator,
};
pub use crate::evaluator::{evaluate, evaluate_traced};

// Form model
pub use crate::config::{DebounceScope, ValidationConfig, ValidationMode};
pub use crate::form::{
    FieldDefinition, FieldOption, FieldOverrides, FieldType, FormDefinition, IntoForm,
    ValidationRule,
};

// Dependency analysis and rule processing
pub use crate::graph::{CyclePath, DependencyGraph, detect_cycles};
pub use crate::rules::{ActiveFieldState, ActiveStateMap, recompute_active_state};

// Validation
pub use crate::validation::{
    ChangeValidation, FieldValidator, FormValidation, RuleChecker, RuleContext, validate_field,
    validate_form,
};

// Error types
pub use crate::error::{ConfigurationError, Diagnostic, SchemaError};

// Trace formatting
pub use crate::trace::TraceFormatter;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
