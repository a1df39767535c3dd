use super::DependencyGraph;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A closed walk through the dependency graph. The first field is repeated at
/// the end, e.g. `a -> b -> a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CyclePath {
    pub fields: Vec<String>,
}

impl CyclePath {
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// The distinct fields on the cycle.
    pub fn members(&self) -> BTreeSet<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

impl fmt::Display for CyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fields.iter().join(" -> "))
    }
}

/// Depth-first search state for cycle reporting.
pub(super) struct CycleDetector<'a> {
    graph: &'a DependencyGraph,
    visited: BTreeSet<&'a str>,
    stack: Vec<&'a str>,
    on_stack: BTreeSet<&'a str>,
    cycles: Vec<CyclePath>,
}

impl<'a> CycleDetector<'a> {
    pub(super) fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            visited: BTreeSet::new(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            cycles: Vec::new(),
        }
    }

    /// Reports one path per back edge, starting from each unvisited field in name order.
    pub(super) fn run(mut self) -> Vec<CyclePath> {
        let graph = self.graph;
        for node in graph.fields() {
            if !self.visited.contains(node) {
                self.visit(node);
            }
        }
        self.cycles
    }

    fn visit(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for dependency in graph.dependencies_of(node) {
            let dependency = dependency.as_str();
            if self.on_stack.contains(dependency) {
                let start = self
                    .stack
                    .iter()
                    .position(|f| *f == dependency)
                    .unwrap_or(0);
                let mut fields: Vec<String> =
                    self.stack[start..].iter().map(|f| f.to_string()).collect();
                fields.push(dependency.to_string());
                self.cycles.push(CyclePath { fields });
            } else if !self.visited.contains(dependency) {
                self.visit(dependency);
            }
        }

        self.stack.pop();
        self.on_stack.remove(node);
    }
}
