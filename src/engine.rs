use crate::cascade::CascadeController;
use crate::condition::DataSnapshot;
use crate::config::ValidationConfig;
use crate::error::{ConditionSlot, ConfigurationError, Diagnostic, SchemaError, invariant_violation};
use crate::evaluator::{check_leaf, evaluate_traced};
use crate::form::{FieldDefinition, FormDefinition};
use crate::graph::{CyclePath, DependencyGraph};
use crate::rules::{ActiveFieldState, ActiveStateMap, RuleProcessor, visible_fields};
use crate::trace::TraceFormatter;
use crate::validation::{
    ChangeValidation, FieldValidator, FieldValidatorBuilder, FormValidation, RuleChecker,
    RuleContext, ValidationOrchestrator, ValidationState, effective_definition,
};
use ahash::{AHashMap, AHashSet};
use serde_json::Value;
use std::time::Instant;

/// A validated form, ready to evaluate conditions and validate data.
///
/// Holds everything derived from the field list once: the dependency graph,
/// its cycles, and the configured validator. Sessions borrow the engine.
pub struct FormEngine {
    fields: Vec<FieldDefinition>,
    graph: DependencyGraph,
    cycles: Vec<CyclePath>,
    processor: RuleProcessor,
    validator: FieldValidator,
    config: ValidationConfig,
}

pub struct FormEngineBuilder {
    form: FormDefinition,
    config: Option<ValidationConfig>,
    validator: FieldValidatorBuilder,
}

impl FormEngineBuilder {
    pub fn new(form: FormDefinition) -> Self {
        Self {
            form,
            config: None,
            validator: FieldValidatorBuilder::new(),
        }
    }

    /// Overrides the configuration carried by the form definition.
    pub fn with_config(mut self, config: ValidationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_checker(mut self, checker: Box<dyn RuleChecker>) -> Self {
        self.validator = self.validator.with_checker(checker);
        self
    }

    pub fn with_rule_alias(mut self, user_type: &str, builtin_type: &str) -> Self {
        self.validator = self.validator.with_rule_alias(user_type, builtin_type);
        self
    }

    pub fn with_custom_validator<F>(mut self, name: &str, validator: F) -> Self
    where
        F: Fn(&Value, &RuleContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.validator = self.validator.with_custom_validator(name, validator);
        self
    }

    /// Checks field names and builds the dependency graph.
    ///
    /// Cycles do not fail the build; they are logged here and reported by
    /// [`FormEngine::diagnostics`].
    pub fn build(self) -> Result<FormEngine, SchemaError> {
        let fields = self.form.fields;
        let mut seen = AHashSet::new();
        for (position, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName(position));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }

        let graph = DependencyGraph::build(&fields);
        let cycles = graph.detect_cycles();
        for cycle in &cycles {
            tracing::warn!(%cycle, "circular field dependency; affected fields keep their last state");
        }
        let processor = RuleProcessor::new(&graph);

        Ok(FormEngine {
            fields,
            graph,
            cycles,
            processor,
            validator: self.validator.build(),
            config: self.config.unwrap_or(self.form.config),
        })
    }
}

impl FormEngine {
    pub fn builder(form: FormDefinition) -> FormEngineBuilder {
        FormEngineBuilder::new(form)
    }

    /// Builds an engine with the built-in checkers and the form's own configuration.
    pub fn new(form: FormDefinition) -> Result<Self, SchemaError> {
        FormEngineBuilder::new(form).build()
    }

    pub fn from_fields(fields: Vec<FieldDefinition>) -> Result<Self, SchemaError> {
        Self::new(FormDefinition {
            fields,
            ..Default::default()
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::new(FormDefinition::from_json(json)?)
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn validator(&self) -> &FieldValidator {
        &self.validator
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn detect_cycles(&self) -> &[CyclePath] {
        &self.cycles
    }

    /// Every configuration problem found without evaluating any data:
    /// cycles, malformed leaves and references to undefined fields.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<Diagnostic> = self
            .cycles
            .iter()
            .map(|cycle| Diagnostic {
                field: cycle.fields.first().cloned().unwrap_or_default(),
                slot: ConditionSlot::Graph,
                error: ConfigurationError::CircularDependency {
                    path: cycle.clone(),
                },
            })
            .collect();

        let defined: AHashSet<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        for field in &self.fields {
            for (slot, condition) in field.all_conditions() {
                condition.for_each_leaf(&mut |leaf| {
                    if let Some(error) = check_leaf(leaf) {
                        diagnostics.push(Diagnostic {
                            field: field.name.clone(),
                            slot,
                            error,
                        });
                    }
                });
                for dependency in condition.dependencies() {
                    if !defined.contains(dependency.as_str()) {
                        diagnostics.push(Diagnostic {
                            field: field.name.clone(),
                            slot,
                            error: ConfigurationError::UnknownDependency {
                                field: field.name.clone(),
                                dependency,
                            },
                        });
                    }
                }
            }
        }
        diagnostics
    }

    /// Pure recomputation from `data`, no session history involved.
    pub fn recompute_active_state(&self, data: &DataSnapshot) -> ActiveStateMap {
        self.processor.recompute(&self.fields, data, None)
    }

    /// Validates a value against a field's declared rules, using this engine's checkers.
    pub fn validate_field(&self, value: &Value, field: &FieldDefinition, data: &DataSnapshot) -> Vec<String> {
        self.validator.validate(value, field, data)
    }

    pub fn validate_form(&self, data: &DataSnapshot) -> FormValidation {
        let active = self.recompute_active_state(data);
        self.validator.validate_form(&self.fields, data, &active)
    }

    /// Renders why a field's visibility condition holds or not, e.g.
    /// `$hasChildren (was false) equals true`. `None` for unconditional fields.
    pub fn explain_visibility(&self, field: &str, data: &DataSnapshot) -> Option<String> {
        let condition = self.field(field)?.visibility_condition()?;
        Some(TraceFormatter::format_trace(&evaluate_traced(condition, data)))
    }

    /// Starts an interactive session over the initial snapshot.
    pub fn session(&self, data: &DataSnapshot) -> FormSession<'_> {
        FormSession::new(self, data)
    }
}

/// What a single value change produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    /// Apply to the snapshot: the new value plus a `null` per cleared field.
    pub snapshot_patch: AHashMap<String, Value>,
    pub cleared_field_ids: Vec<String>,
    pub hidden_field_ids: Vec<String>,
    /// Fields re-validated because their requiredness changed.
    pub revalidate_field_ids: Vec<String>,
    pub validation: ChangeValidation,
}

/// The state of one user filling in one form.
///
/// The caller owns the data snapshot and applies each returned
/// [`ValueChange::snapshot_patch`] before passing the snapshot back in.
pub struct FormSession<'e> {
    engine: &'e FormEngine,
    active: ActiveStateMap,
    orchestrator: ValidationOrchestrator<'e>,
}

impl<'e> FormSession<'e> {
    pub fn new(engine: &'e FormEngine, data: &DataSnapshot) -> Self {
        let active = engine.recompute_active_state(data);
        let mut orchestrator =
            ValidationOrchestrator::new(&engine.fields, &engine.validator, engine.config.clone());
        orchestrator.sync_active_state(active.clone());
        Self {
            engine,
            active,
            orchestrator,
        }
    }

    pub fn active_state(&self) -> &ActiveStateMap {
        &self.active
    }

    pub fn field_state(&self, field: &str) -> Option<&ActiveFieldState> {
        self.active.get(field)
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.active.get(field).is_some_and(|state| state.visible)
    }

    pub fn is_required(&self, field: &str) -> bool {
        self.active.get(field).is_some_and(|state| state.required)
    }

    pub fn visible_fields(&self) -> Vec<&'e FieldDefinition> {
        visible_fields(&self.engine.fields, &self.active).collect()
    }

    /// The definition as it should be rendered right now.
    pub fn effective_definition(&self, field: &str) -> Option<FieldDefinition> {
        let definition = self.engine.field(field)?;
        let state = self.active.get(field)?;
        Some(effective_definition(definition, state))
    }

    pub fn validation(&self) -> &ValidationState {
        self.orchestrator.state()
    }

    pub fn errors(&self, field: &str) -> &[String] {
        self.orchestrator.errors(field)
    }

    pub fn is_valid(&self) -> bool {
        self.orchestrator.is_valid()
    }

    pub fn has_pending(&self) -> bool {
        self.orchestrator.has_pending()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.orchestrator.next_due()
    }

    /// Records a change of `id` to `value`. `data` is the snapshot before the change.
    ///
    /// Recomputes conditional state, clears values of newly hidden fields when
    /// configured to, re-validates touched fields whose requiredness flipped and
    /// schedules validation of the changed field.
    pub fn on_value_change(
        &mut self,
        id: &str,
        value: Value,
        data: &DataSnapshot,
        now: Instant,
    ) -> ValueChange {
        if self.engine.field(id).is_none() {
            invariant_violation(&format!("value change for unknown field '{}'", id));
        }

        let controller = CascadeController::new(
            &self.engine.fields,
            &self.engine.graph,
            &self.engine.processor,
        );
        let outcome = controller.on_value_change(
            &self.active,
            data,
            id,
            value,
            self.orchestrator.state().touched(),
            self.engine.config.clear_hidden_values,
        );

        let mut updated = data.clone();
        outcome.apply(&mut updated);

        self.active = outcome.active.clone();
        for field in &outcome.hidden_field_ids {
            self.orchestrator.clear_field_validation(field);
        }
        self.orchestrator.sync_active_state(outcome.active);

        let validation = self.orchestrator.update_value(id, &updated, now);
        for field in &outcome.revalidate_field_ids {
            self.orchestrator.validate_now(field, &updated);
        }

        ValueChange {
            snapshot_patch: outcome.snapshot_patch,
            cleared_field_ids: outcome.cleared_field_ids,
            hidden_field_ids: outcome.hidden_field_ids,
            revalidate_field_ids: outcome.revalidate_field_ids,
            validation,
        }
    }

    pub fn touch_field(&mut self, id: &str, data: &DataSnapshot) {
        self.orchestrator.touch_field(id, data);
    }

    /// Fires debounced validations due at `now`; returns the fields validated.
    pub fn tick(&mut self, now: Instant, data: &DataSnapshot) -> Vec<String> {
        self.orchestrator.tick(now, data)
    }

    /// Validates every visible field and returns the form-level result.
    pub fn validate_for_submit(&mut self, data: &DataSnapshot) -> FormValidation {
        let is_valid = self.orchestrator.validate_for_submit(data);
        FormValidation {
            is_valid,
            errors: self.orchestrator.visible_errors(),
        }
    }

    /// Recomputes conditional state after the caller replaced the snapshot wholesale.
    pub fn refresh(&mut self, data: &DataSnapshot) {
        self.active = self
            .engine
            .processor
            .recompute(&self.engine.fields, data, Some(&self.active));
        self.orchestrator.sync_active_state(self.active.clone());
    }

    /// Explains the current visibility of `field` against `data`.
    pub fn explain(&self, field: &str, data: &DataSnapshot) -> Option<String> {
        self.engine.explain_visibility(field, data)
    }

    pub fn reset(&mut self) {
        self.orchestrator.reset();
    }
}
