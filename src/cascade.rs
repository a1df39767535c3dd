use crate::condition::DataSnapshot;
use crate::form::FieldDefinition;
use crate::graph::DependencyGraph;
use crate::rules::{ActiveStateMap, RuleProcessor};
use ahash::{AHashMap, AHashSet};
use serde_json::Value;

/// Instructions produced by a value change. The controller never writes to the
/// caller's snapshot; apply `snapshot_patch` to get the consistent state.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOutcome {
    /// The new value plus a `null` for every cleared field.
    pub snapshot_patch: AHashMap<String, Value>,
    /// Fields whose stored value must be cleared, in definition order. Always a
    /// subset of `hidden_field_ids`.
    pub cleared_field_ids: Vec<String>,
    /// Fields that went from visible to hidden, in definition order.
    pub hidden_field_ids: Vec<String>,
    /// Touched, visible fields whose requiredness flipped.
    pub revalidate_field_ids: Vec<String>,
    pub active: ActiveStateMap,
}

impl CascadeOutcome {
    pub fn apply(&self, data: &mut DataSnapshot) {
        for (field, value) in &self.snapshot_patch {
            data.insert(field.clone(), value.clone());
        }
    }
}

/// Propagates a value change into conditional state and stale-value clearing.
pub struct CascadeController<'a> {
    fields: &'a [FieldDefinition],
    graph: &'a DependencyGraph,
    processor: &'a RuleProcessor,
}

fn was_visible(active: &ActiveStateMap, field: &str) -> bool {
    active.get(field).is_none_or(|state| state.visible)
}

impl<'a> CascadeController<'a> {
    pub fn new(
        fields: &'a [FieldDefinition],
        graph: &'a DependencyGraph,
        processor: &'a RuleProcessor,
    ) -> Self {
        Self {
            fields,
            graph,
            processor,
        }
    }

    /// Recomputes the whole field set against the updated snapshot rather than
    /// walking dependents, so transitive effects are never missed.
    ///
    /// Clearing a newly hidden field can hide further fields, or show again one
    /// that was hidden before the clear. Each pass rebuilds the cleared set from
    /// the final state of the previous pass, and only fields that stay hidden in
    /// the settled state are cleared.
    pub fn on_value_change(
        &self,
        previous: &ActiveStateMap,
        data: &DataSnapshot,
        id: &str,
        value: Value,
        touched: &AHashSet<String>,
        clear_hidden: bool,
    ) -> CascadeOutcome {
        let mut base = data.clone();
        base.insert(id.to_string(), value.clone());

        let dependents: Vec<&String> = self.graph.dependents_of(id).collect();
        tracing::debug!(field = id, ?dependents, "value changed");

        let mut active = self.processor.recompute(self.fields, &base, Some(previous));
        let mut cleared: Vec<String> = Vec::new();
        let mut settled = !clear_hidden;
        if clear_hidden {
            for pass in 0..=self.fields.len() {
                let hidden = self.newly_hidden(previous, &active, id);
                if hidden == cleared {
                    settled = true;
                    break;
                }
                let mut working = base.clone();
                for name in &hidden {
                    working.insert(name.clone(), Value::Null);
                }
                tracing::debug!(pass, cleared = ?hidden, "cascading after clearing hidden fields");
                cleared = hidden;
                active = self.processor.recompute(self.fields, &working, Some(previous));
            }
        }
        if !settled {
            tracing::warn!(field = id, "cascade did not settle; clearing only fields still hidden");
        }

        let hidden_field_ids = self.newly_hidden(previous, &active, id);
        let cleared_field_ids: Vec<String> = cleared
            .into_iter()
            .filter(|name| hidden_field_ids.contains(name))
            .collect();

        let mut snapshot_patch = AHashMap::new();
        snapshot_patch.insert(id.to_string(), value);
        for name in &cleared_field_ids {
            snapshot_patch.insert(name.clone(), Value::Null);
        }

        let revalidate_field_ids = self
            .fields
            .iter()
            .filter(|f| touched.contains(&f.name) && was_visible(&active, &f.name))
            .filter(|f| {
                let before = previous.get(&f.name).map(|s| s.required);
                let after = active.get(&f.name).map(|s| s.required);
                before.is_some() && before != after
            })
            .map(|f| f.name.clone())
            .collect();

        CascadeOutcome {
            snapshot_patch,
            cleared_field_ids,
            hidden_field_ids,
            revalidate_field_ids,
            active,
        }
    }

    /// Fields other than `changed` that were visible in `previous` and are
    /// hidden in `active`, in definition order.
    fn newly_hidden(&self, previous: &ActiveStateMap, active: &ActiveStateMap, changed: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.name != changed)
            .filter(|f| was_visible(previous, &f.name) && !was_visible(active, &f.name))
            .map(|f| f.name.clone())
            .collect()
    }
}
