//! The dependency graph between variables.

use crate::modifier::{ModifierKey, Source};
use indexmap::IndexSet;
use skein_core::VarId;

/// Names the modifier attachment an edge belongs to.
///
/// The graph invariant at rest: for every active `(modifier, source)`
/// attached to a variable `v`, and every variable `d` in that modifier's
/// dependency set, exactly one edge `d → v` carries this tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EdgeTag {
    /// The modifier's value identity.
    pub key: ModifierKey,
    /// The attachment source.
    pub source: Source,
}

#[derive(Clone, Debug, PartialEq)]
struct Edge {
    from: VarId,
    to: VarId,
    tag: EdgeTag,
}

/// A directed multigraph on variables; an edge `d → v` means a change to
/// `d` must recompute `v`.
///
/// Parallel edges between the same pair are distinguished by their
/// [`EdgeTag`], so two modifiers reading the same dependency each own an
/// edge and removal of one leaves the other's wiring intact.
#[derive(Clone, Debug, Default)]
pub struct DepGraph {
    nodes: IndexSet<VarId>,
    edges: Vec<Edge>,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; idempotent.
    pub fn add_node(&mut self, id: VarId) {
        self.nodes.insert(id);
    }

    /// Whether the node is present.
    pub fn contains_node(&self, id: &VarId) -> bool {
        self.nodes.contains(id)
    }

    /// Add the edge `from → to` carrying `tag`.
    pub fn add_edge(&mut self, from: VarId, to: VarId, tag: EdgeTag) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.edges.push(Edge { from, to, tag });
    }

    /// The targets of every edge leaving `id`, in insertion order.
    ///
    /// Parallel edges yield their target once per edge; a recomputation
    /// that finds the value unchanged stops, so the repeats are cheap.
    pub fn dependents_of(&self, id: &VarId) -> Vec<VarId> {
        self.edges
            .iter()
            .filter(|edge| edge.from == *id)
            .map(|edge| edge.to.clone())
            .collect()
    }

    /// The sources of every edge entering `id`.
    pub fn dependencies_of(&self, id: &VarId) -> Vec<VarId> {
        self.edges
            .iter()
            .filter(|edge| edge.to == *id)
            .map(|edge| edge.from.clone())
            .collect()
    }

    /// Remove every edge into `to` carrying `tag` whose source node is in
    /// `from_set`. Returns how many edges were removed.
    pub fn remove_matching(
        &mut self,
        to: &VarId,
        from_set: &IndexSet<VarId>,
        tag: &EdgeTag,
    ) -> usize {
        let before = self.edges.len();
        self.edges.retain(|edge| {
            !(edge.to == *to && edge.tag == *tag && from_set.contains(&edge.from))
        });
        before - self.edges.len()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::{Format, InstanceId};

    fn var(name: &str) -> VarId {
        VarId::new(InstanceId(0), name, Format::Integer)
    }

    fn tag(text: &str) -> EdgeTag {
        EdgeTag {
            key: ModifierKey {
                priority: 10,
                operation: "ADD".to_string(),
                instructions: text.to_string(),
            },
            source: Source::new("test"),
        }
    }

    #[test]
    fn edges_wire_dependents_and_dependencies() {
        let mut graph = DepGraph::new();
        graph.add_edge(var("a"), var("b"), tag("a"));
        graph.add_edge(var("b"), var("c"), tag("b"));
        assert_eq!(graph.dependents_of(&var("a")), vec![var("b")]);
        assert_eq!(graph.dependencies_of(&var("c")), vec![var("b")]);
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn parallel_edges_are_distinguished_by_tag() {
        let mut graph = DepGraph::new();
        graph.add_edge(var("a"), var("b"), tag("a+1"));
        graph.add_edge(var("a"), var("b"), tag("a*2"));
        assert_eq!(graph.edge_count(), 2);

        let mut from_set = IndexSet::new();
        from_set.insert(var("a"));
        assert_eq!(graph.remove_matching(&var("b"), &from_set, &tag("a+1")), 1);
        // The other modifier's edge survives.
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.dependents_of(&var("a")), vec![var("b")]);
    }

    #[test]
    fn remove_matching_reports_misses() {
        let mut graph = DepGraph::new();
        graph.add_edge(var("a"), var("b"), tag("a"));
        let mut from_set = IndexSet::new();
        from_set.insert(var("z"));
        assert_eq!(graph.remove_matching(&var("b"), &from_set, &tag("a")), 0);
        assert_eq!(graph.edge_count(), 1);
    }
}
