use crate::form::FieldDefinition;
use ahash::AHashSet;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

mod cycles;

pub use cycles::CyclePath;
use cycles::CycleDetector;

static NO_FIELDS: BTreeSet<String> = BTreeSet::new();

/// Maps each field to the fields its conditions read from.
///
/// Built once per field-definition list. Ordered maps keep cycle reports and
/// DOT output stable across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Unions the dependencies of every field's visibility, required and
    /// modification conditions.
    pub fn build(fields: &[FieldDefinition]) -> Self {
        let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for field in fields {
            let entry = dependencies.entry(field.name.clone()).or_default();
            for (_, condition) in field.all_conditions() {
                condition.collect_dependencies(entry);
            }
            for dependency in entry.iter() {
                dependents
                    .entry(dependency.clone())
                    .or_default()
                    .insert(field.name.clone());
            }
        }

        Self {
            dependencies,
            dependents,
        }
    }

    /// Defined fields, in name order.
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.dependencies.keys().map(String::as_str)
    }

    /// Fields that `field`'s conditions read.
    pub fn dependencies_of(&self, field: &str) -> impl Iterator<Item = &String> + '_ {
        self.dependencies.get(field).unwrap_or(&NO_FIELDS).iter()
    }

    /// Fields whose conditions read `field` (direct dependents only).
    pub fn dependents_of(&self, field: &str) -> impl Iterator<Item = &String> + '_ {
        self.dependents.get(field).unwrap_or(&NO_FIELDS).iter()
    }

    pub fn detect_cycles(&self) -> Vec<CyclePath> {
        CycleDetector::new(self).run()
    }

    /// Every field that can reach itself through its dependencies.
    pub fn fields_in_cycles(&self) -> AHashSet<String> {
        self.fields()
            .filter(|field| self.reaches(field, field))
            .map(str::to_string)
            .collect()
    }

    fn reaches(&self, from: &str, target: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut pending: Vec<&str> = self.dependencies_of(from).map(String::as_str).collect();
        while let Some(next) = pending.pop() {
            if next == target {
                return true;
            }
            if seen.insert(next) {
                pending.extend(self.dependencies_of(next).map(String::as_str));
            }
        }
        false
    }

    /// `(field, dependency)` pairs where the dependency is not a defined field.
    pub fn unknown_dependencies(&self) -> Vec<(String, String)> {
        self.dependencies
            .iter()
            .flat_map(|(field, deps)| {
                deps.iter()
                    .filter(|dep| !self.dependencies.contains_key(*dep))
                    .map(move |dep| (field.clone(), dep.clone()))
            })
            .collect()
    }

    /// Renders the graph in Graphviz DOT, edges pointing from a field to what it reads.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph dependencies {\n");
        for (field, deps) in &self.dependencies {
            let _ = writeln!(dot, "    \"{}\";", field);
            for dep in deps {
                let _ = writeln!(dot, "    \"{}\" -> \"{}\";", field, dep);
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Builds the graph for `fields` and reports its circular dependencies.
pub fn detect_cycles(fields: &[FieldDefinition]) -> Vec<CyclePath> {
    DependencyGraph::build(fields).detect_cycles()
}
