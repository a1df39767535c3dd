use crate::condition::DataSnapshot;
use crate::evaluator::evaluate;
use crate::form::{FieldDefinition, FieldOverrides};
use crate::graph::DependencyGraph;
use ahash::{AHashMap, AHashSet};
use serde::Serialize;

/// The computed conditional state of one field for a given data snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveFieldState {
    pub visible: bool,
    pub required: bool,
    /// Merged `changes` of every modification whose condition holds.
    pub modifications: FieldOverrides,
}

impl Default for ActiveFieldState {
    fn default() -> Self {
        Self {
            visible: true,
            required: false,
            modifications: FieldOverrides::default(),
        }
    }
}

pub type ActiveStateMap = AHashMap<String, ActiveFieldState>;

/// Computes {visible, required, modifications} for every field.
///
/// Pure: the same fields and data always produce the same map.
pub fn recompute_active_state(fields: &[FieldDefinition], data: &DataSnapshot) -> ActiveStateMap {
    fields
        .iter()
        .map(|field| (field.name.clone(), compute_field_state(field, data)))
        .collect()
}

/// Computes the conditional state of a single field.
pub fn compute_field_state(field: &FieldDefinition, data: &DataSnapshot) -> ActiveFieldState {
    let visible = field
        .visibility_condition()
        .is_none_or(|condition| evaluate(condition, data));

    let mut modifications = FieldOverrides::default();
    for modification in field.modifications() {
        if evaluate(&modification.condition, data) {
            modifications.merge(&modification.changes);
        }
    }

    // Conditions only ever add requiredness on top of the static flag.
    let required = field.is_statically_required()
        || field
            .required_condition()
            .is_some_and(|condition| evaluate(condition, data))
        || modifications.required == Some(true)
        || modifications
            .rules
            .as_ref()
            .is_some_and(|rules| rules.iter().any(|rule| rule.kind == "required"));

    ActiveFieldState {
        visible,
        required,
        modifications,
    }
}

/// Recomputes active state across a session, holding fields that sit on a
/// dependency cycle at their last computed {visible, required}.
#[derive(Debug, Clone, Default)]
pub struct RuleProcessor {
    cyclic: AHashSet<String>,
}

impl RuleProcessor {
    pub fn new(graph: &DependencyGraph) -> Self {
        Self {
            cyclic: graph.fields_in_cycles(),
        }
    }

    pub fn is_cyclic(&self, field: &str) -> bool {
        self.cyclic.contains(field)
    }

    /// Like [`recompute_active_state`], but cyclic fields keep the state found in
    /// `previous` when there is one.
    pub fn recompute(
        &self,
        fields: &[FieldDefinition],
        data: &DataSnapshot,
        previous: Option<&ActiveStateMap>,
    ) -> ActiveStateMap {
        fields
            .iter()
            .map(|field| {
                let mut state = compute_field_state(field, data);
                if self.is_cyclic(&field.name) {
                    if let Some(last) = previous.and_then(|p| p.get(&field.name)) {
                        tracing::trace!(field = %field.name, "cyclic field keeps last known state");
                        state.visible = last.visible;
                        state.required = last.required;
                    }
                }
                (field.name.clone(), state)
            })
            .collect()
    }
}

/// The fields currently visible, in definition order.
pub fn visible_fields<'a>(
    fields: &'a [FieldDefinition],
    active: &ActiveStateMap,
) -> impl Iterator<Item = &'a FieldDefinition> {
    fields
        .iter()
        .filter(move |field| active.get(&field.name).is_none_or(|state| state.visible))
}
