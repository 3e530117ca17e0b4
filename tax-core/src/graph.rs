//! Provenance graph for one calculation run.
//!
//! Nodes are computed lines, raw inputs and rule parameters. An edge runs
//! from a line to every value its formula read. The graph refuses any edge
//! that would close a cycle, so a topological order always exists, and the
//! order in which lines were finalized is recorded alongside it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CalculationError;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    Input(String),
    Line(String),
    Rule(String),
}

impl NodeId {
    pub fn input(code: impl Into<String>) -> Self {
        Self::Input(code.into())
    }

    pub fn line(code: impl Into<String>) -> Self {
        Self::Line(code.into())
    }

    pub fn rule(name: impl Into<String>) -> Self {
        Self::Rule(name.into())
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Input(code) | Self::Line(code) | Self::Rule(code) => code,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Self::Line(_))
    }
}

impl fmt::Display for NodeId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Input(code) => write!(f, "input:{code}"),
            Self::Line(code) => write!(f, "line:{code}"),
            Self::Rule(name) => write!(f, "rule:{name}"),
        }
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("input", code)) if !code.is_empty() => Ok(Self::input(code)),
            Some(("line", code)) if !code.is_empty() => Ok(Self::line(code)),
            Some(("rule", name)) if !name.is_empty() => Ok(Self::rule(name)),
            _ => Err(format!("'{s}' is not a node id (expected input:, line: or rule:)")),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
    order: Vec<NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        node: NodeId,
    ) {
        self.edges.entry(node).or_default();
    }

    /// Records that `from` consumed `to`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::CircularDependency`] if `to` already
    /// depends (directly or transitively) on `from`, or if the two are the
    /// same node. The graph is left unchanged in that case.
    pub fn add_edge(
        &mut self,
        from: &NodeId,
        to: &NodeId,
    ) -> Result<(), CalculationError> {
        if self.edges.get(from).is_some_and(|deps| deps.contains(to)) {
            return Ok(());
        }
        if let Some(mut path) = self.path(to, from) {
            path.insert(0, from.clone());
            return Err(CalculationError::CircularDependency {
                line_code: from.code().to_string(),
                path: path.iter().map(ToString::to_string).collect(),
            });
        }

        self.add_node(to.clone());
        self.edges.entry(from.clone()).or_default().insert(to.clone());
        Ok(())
    }

    /// Appends a line to the calculation order once its value is final.
    pub fn mark_finalized(
        &mut self,
        node: NodeId,
    ) {
        self.add_node(node.clone());
        self.order.push(node);
    }

    pub fn contains(
        &self,
        node: &NodeId,
    ) -> bool {
        self.edges.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.edges.keys()
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Direct dependencies of `node`, sorted.
    pub fn dependencies(
        &self,
        node: &NodeId,
    ) -> impl Iterator<Item = &NodeId> {
        self.edges.get(node).into_iter().flatten()
    }

    /// Nodes that directly consumed `node`, sorted.
    pub fn dependents<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.edges
            .iter()
            .filter(move |(_, deps)| deps.contains(node))
            .map(|(from, _)| from)
    }

    /// Lines in the order they were finalized.
    pub fn calculation_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Every node with its dependencies placed before it (Kahn's algorithm,
    /// ties broken by node ordering so the result is deterministic).
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::CircularDependency`] if the graph has a
    /// cycle, which [`add_edge`](Self::add_edge) never allows.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CalculationError> {
        let mut remaining: HashMap<&NodeId, usize> = self
            .edges
            .iter()
            .map(|(node, deps)| (node, deps.len()))
            .collect();
        let mut dependents: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        for (from, deps) in &self.edges {
            for dep in deps {
                dependents.entry(dep).or_default().push(from);
            }
        }

        let mut ready: BTreeSet<&NodeId> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(node, _)| *node)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(node) = ready.pop_first() {
            order.push(node.clone());
            for dependent in dependents.get(node).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != self.edges.len() {
            let stuck = self
                .edges
                .keys()
                .find(|node| !order.contains(node))
                .map(|node| node.code().to_string())
                .unwrap_or_default();
            return Err(CalculationError::CircularDependency {
                line_code: stuck,
                path: Vec::new(),
            });
        }
        Ok(order)
    }

    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_ok()
    }

    /// True when every finalized line appears after each line it consumed.
    pub fn order_respects_dependencies(&self) -> bool {
        let position: HashMap<&NodeId, usize> =
            self.order.iter().enumerate().map(|(i, node)| (node, i)).collect();

        self.order.iter().enumerate().all(|(i, node)| {
            self.dependencies(node)
                .filter(|dep| dep.is_line())
                .all(|dep| position.get(dep).is_some_and(|p| *p < i))
        })
    }

    /// Transitive dependencies of `node`, each listed after its own
    /// dependencies, ending with `node` itself.
    pub fn closure(
        &self,
        node: &NodeId,
    ) -> Vec<NodeId> {
        let mut visited = BTreeSet::new();
        let mut out = Vec::new();
        if self.contains(node) {
            self.post_order(node, &mut visited, &mut out);
        }
        out
    }

    fn post_order<'a>(
        &'a self,
        node: &'a NodeId,
        visited: &mut BTreeSet<&'a NodeId>,
        out: &mut Vec<NodeId>,
    ) {
        if !visited.insert(node) {
            return;
        }
        for dep in self.dependencies(node) {
            self.post_order(dep, visited, out);
        }
        out.push(node.clone());
    }

    /// A dependency path from `start` to `target`, both included.
    fn path(
        &self,
        start: &NodeId,
        target: &NodeId,
    ) -> Option<Vec<NodeId>> {
        if start == target {
            return Some(vec![start.clone()]);
        }

        let mut parent: HashMap<&NodeId, &NodeId> = HashMap::new();
        let mut visited: BTreeSet<&NodeId> = BTreeSet::from([start]);
        let mut stack = vec![start];

        while let Some(node) = stack.pop() {
            for dep in self.dependencies(node) {
                if !visited.insert(dep) {
                    continue;
                }
                parent.insert(dep, node);
                if dep == target {
                    let mut path = vec![dep.clone()];
                    let mut cursor = dep;
                    while let Some(prev) = parent.get(cursor) {
                        path.push((*prev).clone());
                        cursor = *prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                stack.push(dep);
            }
        }
        None
    }
}
