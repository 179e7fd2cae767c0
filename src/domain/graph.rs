use crate::domain::edge::{Descriptor, InheritanceEdge, RelationEdge, RelationKind};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Entity name (unique within the unit's namespace)
pub type EntityName = String;

/// kind → descriptors, one side of an entity's adjacency
pub type KindIndex = BTreeMap<RelationKind, BTreeSet<Descriptor>>;

/// Incoming and outgoing views of one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityEdges {
    pub incoming: KindIndex,
    pub outgoing: KindIndex,
}

impl EntityEdges {
    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

/// Relationship Graph - the fused relationship store.
///
/// The forward and reverse indices are exact transposes: `insert` is the only mutator and
/// writes both or neither. A published graph is never mutated; rebuilds construct a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    forward: BTreeMap<EntityName, KindIndex>,
    reverse: BTreeMap<EntityName, KindIndex>,
    inheritance: BTreeMap<EntityName, Vec<InheritanceEdge>>,
}

impl RelationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one edge into both indices. Returns `false` when nothing changed: the edge is a
    /// self-reference, or an identical edge is already stored.
    pub(crate) fn insert(&mut self, source: &str, kind: RelationKind, target: Descriptor) -> bool {
        if source == target.entity {
            return false;
        }

        let reverse_entry = target.rebased(source);
        let target_name = target.entity.clone();

        let inserted = self
            .forward
            .entry(source.to_string())
            .or_default()
            .entry(kind)
            .or_default()
            .insert(target);
        if inserted {
            self.reverse
                .entry(target_name)
                .or_default()
                .entry(kind)
                .or_default()
                .insert(reverse_entry);
        }
        inserted
    }

    pub(crate) fn set_inheritance(&mut self, type_name: &str, bases: Vec<InheritanceEdge>) {
        if bases.is_empty() {
            self.inheritance.remove(type_name);
        } else {
            self.inheritance.insert(type_name.to_string(), bases);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
        self.inheritance.clear();
    }

    /// Incoming and outgoing edges of `name`. Unknown names yield an empty result.
    pub fn edges_of(&self, name: &str) -> EntityEdges {
        EntityEdges {
            incoming: self.reverse.get(name).cloned().unwrap_or_default(),
            outgoing: self.forward.get(name).cloned().unwrap_or_default(),
        }
    }

    /// Entities with at least one edge, sorted lexicographically.
    pub fn all_connected_entities(&self) -> Vec<EntityName> {
        self.forward
            .keys()
            .chain(self.reverse.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Type name → bases in collector-reported order. Types without bases are absent.
    pub fn inheritance_tree(&self) -> &BTreeMap<EntityName, Vec<InheritanceEdge>> {
        &self.inheritance
    }

    /// Every stored edge, sorted by source, kind, then target descriptor.
    pub fn edges(&self) -> impl Iterator<Item = RelationEdge> + '_ {
        self.forward.iter().flat_map(|(source, kinds)| {
            kinds.iter().flat_map(move |(kind, targets)| {
                targets
                    .iter()
                    .map(move |t| RelationEdge::new(source.clone(), *kind, t.clone()))
            })
        })
    }

    /// Every stored edge reconstructed from the reverse index.
    pub fn incoming_edges(&self) -> impl Iterator<Item = RelationEdge> + '_ {
        self.reverse.iter().flat_map(|(target, kinds)| {
            kinds.iter().flat_map(move |(kind, sources)| {
                sources.iter().map(move |s| {
                    RelationEdge::new(s.entity.clone(), *kind, s.rebased(target.clone()))
                })
            })
        })
    }

    pub fn edge_count(&self) -> usize {
        self.forward
            .values()
            .flat_map(|kinds| kinds.values())
            .map(BTreeSet::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Directed multigraph view over connected entities, for traversal and DOT rendering.
    /// Nodes and edges are added in sorted order, so the view is deterministic.
    pub fn to_digraph(&self) -> DiGraph<EntityName, RelationKind> {
        let mut graph = DiGraph::new();
        let mut index: HashMap<EntityName, NodeIndex> = HashMap::new();
        for name in self.all_connected_entities() {
            let idx = graph.add_node(name.clone());
            index.insert(name, idx);
        }
        for edge in self.edges() {
            if let (Some(&from), Some(&to)) = (index.get(&edge.source), index.get(&edge.target.entity))
            {
                graph.add_edge(from, to, edge.kind);
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::edge::BaseOrigin;
    use petgraph::visit::EdgeRef;

    #[test]
    fn test_insert_writes_both_indices() {
        let mut g = RelationGraph::new();
        assert!(g.insert(
            "make",
            RelationKind::AcceptsType,
            Descriptor::plain("A").with_parameter("x"),
        ));

        let make = g.edges_of("make");
        assert!(make.incoming.is_empty());
        assert!(make.outgoing[&RelationKind::AcceptsType]
            .contains(&Descriptor::plain("A").with_parameter("x")));

        let a = g.edges_of("A");
        assert!(a.outgoing.is_empty());
        assert!(a.incoming[&RelationKind::AcceptsType]
            .contains(&Descriptor::plain("make").with_parameter("x")));
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut g = RelationGraph::new();
        assert!(g.insert("make", RelationKind::ReturnsType, Descriptor::plain("B")));
        assert!(!g.insert("make", RelationKind::ReturnsType, Descriptor::plain("B")));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.incoming_edges().count(), 1);
    }

    #[test]
    fn test_self_edges_rejected() {
        let mut g = RelationGraph::new();
        assert!(!g.insert("Node", RelationKind::AcceptsType, Descriptor::plain("Node")));
        assert!(!g.insert("walk", RelationKind::CallsFunction, Descriptor::plain("walk")));
        assert!(g.is_empty());
        assert!(g.all_connected_entities().is_empty());
    }

    #[test]
    fn test_unknown_entity_query_is_empty() {
        let g = RelationGraph::new();
        assert!(g.edges_of("Missing").is_empty());
    }

    #[test]
    fn test_connected_entities_sorted_and_unique() {
        let mut g = RelationGraph::new();
        g.insert("zeta", RelationKind::CallsFunction, Descriptor::plain("alpha"));
        g.insert("mid", RelationKind::CallsFunction, Descriptor::plain("alpha"));
        g.insert("alpha", RelationKind::CallsFunction, Descriptor::plain("mid"));
        assert_eq!(g.all_connected_entities(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_forward_and_reverse_enumerations_agree() {
        let mut g = RelationGraph::new();
        g.insert("B", RelationKind::InheritsFrom, Descriptor::plain("A"));
        g.insert(
            "Car",
            RelationKind::AcceptsType,
            Descriptor::plain("Engine")
                .with_member("__init__")
                .with_parameter("engine"),
        );
        g.insert("Car", RelationKind::Instantiates, Descriptor::plain("Engine"));

        let forward: BTreeSet<_> = g.edges().collect();
        let reverse: BTreeSet<_> = g.incoming_edges().collect();
        assert_eq!(forward, reverse);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn test_inheritance_tree_keeps_declared_order() {
        let mut g = RelationGraph::new();
        g.set_inheritance(
            "Square",
            vec![
                InheritanceEdge {
                    base_name: "Shape".into(),
                    origin: BaseOrigin::Internal,
                },
                InheritanceEdge {
                    base_name: "ABC".into(),
                    origin: BaseOrigin::External {
                        qualified: "abc.ABC".into(),
                    },
                },
            ],
        );
        g.set_inheritance("Plain", Vec::new());

        let tree = g.inheritance_tree();
        assert_eq!(tree.len(), 1);
        let names: Vec<_> = tree["Square"].iter().map(|b| b.display_name()).collect();
        assert_eq!(names, vec!["Shape", "abc.ABC"]);
    }

    #[test]
    fn test_digraph_view_matches_edges() {
        let mut g = RelationGraph::new();
        g.insert("make", RelationKind::ReturnsType, Descriptor::plain("B"));
        g.insert("make", RelationKind::Instantiates, Descriptor::plain("B"));
        g.insert("B", RelationKind::InheritsFrom, Descriptor::plain("A"));

        let dg = g.to_digraph();
        assert_eq!(dg.node_count(), 3);
        assert_eq!(dg.edge_count(), 3);
        let first = dg.edge_references().next().map(|e| dg[e.source()].clone());
        assert_eq!(first.as_deref(), Some("B"));
    }
}
