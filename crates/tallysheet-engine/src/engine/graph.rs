//! Bidirectional dependency graph over cell identifiers.
//!
//! Every node records the cells its formula reads (`depends_on`) and the
//! cells whose formulas read it (`dependents`). The two directions are kept
//! in lockstep: `b ∈ dependents(a)` exactly when `a ∈ depends_on(b)`.
//!
//! Nodes are created lazily the first time a cell is a formula target or a
//! reference. A node whose two sets both become empty is dropped.
//!
//! The graph is a plain owned value with no interior locking; callers that
//! share it across threads must serialize access themselves.

use std::collections::{HashMap, HashSet};

use super::cell_ref::CellId;

#[derive(Clone, Debug, Default)]
struct Node {
    depends_on: HashSet<CellId>,
    dependents: HashSet<CellId>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.depends_on.is_empty() && self.dependents.is_empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<CellId, Node>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `cell`'s dependencies with `refs`.
    ///
    /// `refs` must be the complete new set; this is not additive. Reverse
    /// edges are removed for dropped references and added for new ones.
    pub fn update_dependencies(&mut self, cell: CellId, refs: HashSet<CellId>) {
        let old = self
            .nodes
            .get_mut(&cell)
            .map(|node| std::mem::take(&mut node.depends_on))
            .unwrap_or_default();

        for removed in old.difference(&refs) {
            if let Some(node) = self.nodes.get_mut(removed) {
                node.dependents.remove(&cell);
            }
            self.collect_if_empty(removed);
        }
        for added in refs.difference(&old) {
            self.nodes.entry(*added).or_default().dependents.insert(cell);
        }

        tracing::debug!(cell = %cell, refs = refs.len(), "updated dependencies");
        self.nodes.entry(cell).or_default().depends_on = refs;
        self.collect_if_empty(&cell);
    }

    /// Remove `cell` from the graph, detaching it from all neighbours.
    ///
    /// Returns the cells that depended on it. The node's reverse edges are
    /// gone afterwards, so callers invalidating dependents must start from
    /// this set.
    pub fn remove_cell(&mut self, cell: &CellId) -> HashSet<CellId> {
        let Some(node) = self.nodes.remove(cell) else {
            return HashSet::new();
        };

        for dep in &node.depends_on {
            if let Some(n) = self.nodes.get_mut(dep) {
                n.dependents.remove(cell);
            }
            self.collect_if_empty(dep);
        }
        for dependent in &node.dependents {
            if let Some(n) = self.nodes.get_mut(dependent) {
                n.depends_on.remove(cell);
            }
            self.collect_if_empty(dependent);
        }

        tracing::debug!(cell = %cell, dependents = node.dependents.len(), "removed cell from graph");
        let mut former = node.dependents;
        former.remove(cell);
        former
    }

    /// Every cell reachable from `seeds` by following dependents edges,
    /// excluding the seeds themselves.
    pub fn transitive_dependents<I>(&self, seeds: I) -> HashSet<CellId>
    where
        I: IntoIterator<Item = CellId>,
    {
        let seeds: HashSet<CellId> = seeds.into_iter().collect();
        let mut visited: HashSet<CellId> = HashSet::new();
        let mut work: Vec<CellId> = seeds.iter().copied().collect();

        while let Some(current) = work.pop() {
            for dependent in self.dependents(&current) {
                if visited.insert(*dependent) {
                    work.push(*dependent);
                }
            }
        }
        visited.retain(|id| !seeds.contains(id));
        visited
    }

    /// Cells `cell`'s formula reads.
    pub fn depends_on(&self, cell: &CellId) -> impl Iterator<Item = &CellId> {
        self.nodes
            .get(cell)
            .into_iter()
            .flat_map(|node| node.depends_on.iter())
    }

    /// Cells whose formulas read `cell`.
    pub fn dependents(&self, cell: &CellId) -> impl Iterator<Item = &CellId> {
        self.nodes
            .get(cell)
            .into_iter()
            .flat_map(|node| node.dependents.iter())
    }

    pub fn contains(&self, cell: &CellId) -> bool {
        self.nodes.contains_key(cell)
    }

    /// All cells that currently have a node.
    pub fn cells(&self) -> impl Iterator<Item = &CellId> {
        self.nodes.keys()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn collect_if_empty(&mut self, cell: &CellId) {
        if self.nodes.get(cell).is_some_and(Node::is_empty) {
            self.nodes.remove(cell);
        }
    }

    /// Check that forward and reverse edges agree.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        self.nodes.iter().all(|(id, node)| {
            node.depends_on
                .iter()
                .all(|d| self.nodes.get(d).is_some_and(|n| n.dependents.contains(id)))
                && node
                    .dependents
                    .iter()
                    .all(|d| self.nodes.get(d).is_some_and(|n| n.depends_on.contains(id)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> CellId {
        CellId::parse(s).unwrap()
    }

    fn ids(names: &[&str]) -> HashSet<CellId> {
        names.iter().map(|n| id(n)).collect()
    }

    #[test]
    fn test_update_replaces_edges() {
        let mut graph = DependencyGraph::new();
        graph.update_dependencies(id("C1"), ids(&["A1", "B1"]));
        assert_eq!(graph.dependents(&id("A1")).count(), 1);

        graph.update_dependencies(id("C1"), ids(&["B1", "D1"]));
        assert!(graph.is_consistent());
        assert_eq!(graph.depends_on(&id("C1")).copied().collect::<HashSet<_>>(), ids(&["B1", "D1"]));
        // A1 lost its only edge and is collected.
        assert!(!graph.contains(&id("A1")));
        assert_eq!(graph.dependents(&id("D1")).copied().collect::<Vec<_>>(), vec![id("C1")]);
    }

    #[test]
    fn test_update_with_no_refs_detaches() {
        let mut graph = DependencyGraph::new();
        graph.update_dependencies(id("B1"), ids(&["A1"]));
        graph.update_dependencies(id("B1"), HashSet::new());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_self_reference_edges() {
        let mut graph = DependencyGraph::new();
        graph.update_dependencies(id("A1"), ids(&["A1"]));
        assert!(graph.is_consistent());
        assert_eq!(graph.dependents(&id("A1")).copied().collect::<Vec<_>>(), vec![id("A1")]);
        graph.update_dependencies(id("A1"), HashSet::new());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_transitive_dependents() {
        let mut graph = DependencyGraph::new();
        graph.update_dependencies(id("B1"), ids(&["A1"]));
        graph.update_dependencies(id("C1"), ids(&["B1"]));
        graph.update_dependencies(id("D1"), ids(&["B1", "A1"]));
        graph.update_dependencies(id("E1"), ids(&["Z9"]));

        assert_eq!(graph.transitive_dependents([id("A1")]), ids(&["B1", "C1", "D1"]));
        assert_eq!(graph.transitive_dependents([id("B1")]), ids(&["C1", "D1"]));
        assert_eq!(graph.transitive_dependents([id("A1"), id("B1")]), ids(&["C1", "D1"]));
        assert!(graph.transitive_dependents([id("C1")]).is_empty());
    }

    #[test]
    fn test_remove_cell_restores_invariant() {
        let mut graph = DependencyGraph::new();
        graph.update_dependencies(id("B1"), ids(&["A1"]));
        graph.update_dependencies(id("C1"), ids(&["B1", "A1"]));

        let former = graph.remove_cell(&id("B1"));
        assert_eq!(former, ids(&["C1"]));
        assert!(graph.is_consistent());
        assert!(!graph.contains(&id("B1")));
        assert_eq!(graph.depends_on(&id("C1")).copied().collect::<HashSet<_>>(), ids(&["A1"]));
        assert_eq!(graph.dependents(&id("A1")).copied().collect::<Vec<_>>(), vec![id("C1")]);

        assert!(graph.remove_cell(&id("Q7")).is_empty());
    }
}
