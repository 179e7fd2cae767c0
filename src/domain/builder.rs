use crate::config::AnalysisOptions;
use crate::domain::annotation::TypeMatcher;
use crate::domain::edge::{BaseOrigin, Descriptor, InheritanceEdge, RelationKind};
use crate::domain::entity::{CollectedUnit, EntityKind};
use crate::domain::graph::RelationGraph;
use crate::domain::scanner::{KnownEntities, ScanResult};
use crate::domain::signature::{Signature, SignatureTable};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Graph builder - Domain Service for constructing RelationGraph
///
/// The steps write disjoint relation kinds and may run in any order; every edge goes through
/// `RelationGraph::insert`, which keeps the two indices transposed and collapses duplicates.
pub struct GraphBuilder {
    universal_roots: BTreeSet<String>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(&AnalysisOptions::default())
    }
}

impl GraphBuilder {
    pub fn new(options: &AnalysisOptions) -> Self {
        Self {
            universal_roots: options.universal_roots.iter().cloned().collect(),
        }
    }

    pub fn build(
        &self,
        unit: &CollectedUnit,
        signatures: &SignatureTable,
        scans: &BTreeMap<String, ScanResult>,
    ) -> RelationGraph {
        let mut graph = RelationGraph::new();
        self.build_into(&mut graph, unit, signatures, scans);
        graph
    }

    /// Rebuild `graph` from scratch; nothing from its previous contents survives.
    pub fn build_into(
        &self,
        graph: &mut RelationGraph,
        unit: &CollectedUnit,
        signatures: &SignatureTable,
        scans: &BTreeMap<String, ScanResult>,
    ) {
        graph.clear();
        let known = KnownEntities::from_unit(unit);
        let mut sink = EdgeSink {
            graph,
            known: &known,
            dropped: 0,
        };

        self.resolve_inheritance(&mut sink, unit);
        self.link_annotations(&mut sink, signatures);
        self.link_call_sites(&mut sink, scans);

        debug!(
            unit = unit.name(),
            edges = sink.graph.edge_count(),
            dropped = sink.dropped,
            "relationship graph built"
        );
    }

    // Step 1: Inheritance resolution
    fn resolve_inheritance(&self, sink: &mut EdgeSink<'_>, unit: &CollectedUnit) {
        for entity in unit.owned_of_kind(EntityKind::Type) {
            let Some(detail) = entity.type_detail() else {
                continue;
            };

            let mut bases = Vec::new();
            for base in &detail.bases {
                if self.universal_roots.contains(&base.name) {
                    continue;
                }

                let internal = unit.get(&base.name).is_some_and(|candidate| {
                    candidate.kind == EntityKind::Type
                        && unit.owns(candidate)
                        && (base.qualifier.is_empty()
                            || base.qualifier == candidate.defining_unit)
                });

                if internal {
                    sink.emit(
                        &entity.name,
                        RelationKind::InheritsFrom,
                        Descriptor::plain(&base.name),
                    );
                    bases.push(InheritanceEdge {
                        base_name: base.name.clone(),
                        origin: BaseOrigin::Internal,
                    });
                } else {
                    bases.push(InheritanceEdge {
                        base_name: base.name.clone(),
                        origin: BaseOrigin::External {
                            qualified: base.qualified(),
                        },
                    });
                }
            }
            sink.graph.set_inheritance(&entity.name, bases);
        }
    }

    // Step 2: Annotation-based relations
    fn link_annotations(&self, sink: &mut EdgeSink<'_>, signatures: &SignatureTable) {
        let matcher = TypeMatcher::new(sink.known.types.iter().map(String::as_str));
        if matcher.is_empty() {
            return;
        }

        for (name, signature) in &signatures.callables {
            link_signature(sink, &matcher, name, None, signature);
        }

        for (type_name, methods) in &signatures.types {
            for (method_name, method) in &methods.methods {
                link_signature(
                    sink,
                    &matcher,
                    type_name,
                    Some(method_name),
                    &method.signature,
                );
            }
        }
    }

    // Step 3: Call-derived relations
    fn link_call_sites(&self, sink: &mut EdgeSink<'_>, scans: &BTreeMap<String, ScanResult>) {
        for (name, scan) in scans {
            for type_name in &scan.instantiated {
                sink.emit(name, RelationKind::Instantiates, Descriptor::plain(type_name));
            }
            for callable in &scan.called {
                sink.emit(name, RelationKind::CallsFunction, Descriptor::plain(callable));
            }
        }
    }
}

fn link_signature(
    sink: &mut EdgeSink<'_>,
    matcher: &TypeMatcher,
    owner: &str,
    member: Option<&str>,
    signature: &Signature,
) {
    let context = |target: &str| {
        let descriptor = Descriptor::plain(target);
        match member {
            Some(m) => descriptor.with_member(m),
            None => descriptor,
        }
    };

    for param in &signature.parameters {
        let Some(annotation) = param.annotation.as_deref() else {
            continue;
        };
        for target in matcher.matches(annotation) {
            sink.emit(
                owner,
                RelationKind::AcceptsType,
                context(target).with_parameter(&param.name),
            );
        }
    }

    if let Some(annotation) = signature.return_annotation.as_deref() {
        for target in matcher.matches(annotation) {
            sink.emit(owner, RelationKind::ReturnsType, context(target));
        }
    }
}

/// Step 4: Commit. Drops edges whose endpoints are not graph nodes.
struct EdgeSink<'g> {
    graph: &'g mut RelationGraph,
    known: &'g KnownEntities,
    dropped: usize,
}

impl EdgeSink<'_> {
    fn emit(&mut self, source: &str, kind: RelationKind, target: Descriptor) {
        if !self.known.contains(source) || !self.known.contains(&target.entity) {
            debug!(source, target = %target.entity, %kind, "dropping edge with unknown endpoint");
            self.dropped += 1;
            return;
        }
        self.graph.insert(source, kind, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{BaseRef, CallableDetail, EntityRecord, TypeDetail};
    use crate::domain::signature::{Parameter, ParamKind};

    fn unit_with_types(types: &[(&str, &[BaseRef])]) -> CollectedUnit {
        let mut unit = CollectedUnit::new("zoo");
        for (name, bases) in types {
            unit.insert(EntityRecord::type_entity(
                *name,
                "zoo",
                None,
                TypeDetail {
                    bases: bases.to_vec(),
                    ..TypeDetail::default()
                },
            ));
        }
        unit
    }

    #[test]
    fn test_internal_and_external_bases() {
        let unit = unit_with_types(&[
            ("Animal", &[BaseRef::new("object", "builtins")]),
            (
                "Cat",
                &[BaseRef::new("Animal", "zoo"), BaseRef::new("Protocol", "typing")],
            ),
        ]);
        let graph = GraphBuilder::default().build(
            &unit,
            &SignatureTable::default(),
            &BTreeMap::new(),
        );

        assert!(!graph.inheritance_tree().contains_key("Animal"));
        let cat = &graph.inheritance_tree()["Cat"];
        assert_eq!(cat.len(), 2);
        assert!(cat[0].is_internal());
        assert_eq!(cat[1].display_name(), "typing.Protocol");
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edges_of("Animal").incoming[&RelationKind::InheritsFrom]
            .contains(&Descriptor::plain("Cat")));
    }

    #[test]
    fn test_same_name_from_other_unit_is_external() {
        let unit = unit_with_types(&[
            ("Base", &[]),
            ("Child", &[BaseRef::new("Base", "framework.core")]),
        ]);
        let graph = GraphBuilder::default().build(
            &unit,
            &SignatureTable::default(),
            &BTreeMap::new(),
        );
        assert!(!graph.inheritance_tree()["Child"][0].is_internal());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_edges_to_unknown_entities_are_dropped() {
        let mut unit = unit_with_types(&[("Cat", &[])]);
        unit.insert(EntityRecord::callable(
            "feed",
            "zoo",
            None,
            CallableDetail::default(),
        ));
        let scans = BTreeMap::from([(
            "feed".to_string(),
            ScanResult {
                instantiated: ["Cat".to_string(), "Ghost".to_string()].into(),
                called: ["vanish".to_string()].into(),
            },
        )]);

        let graph = GraphBuilder::default().build(&unit, &SignatureTable::default(), &scans);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edges_of("Ghost").is_empty());
    }

    #[test]
    fn test_two_parameters_with_same_type_keep_distinct_contexts() {
        let mut unit = unit_with_types(&[("Cat", &[])]);
        unit.insert(EntityRecord::callable(
            "pair",
            "zoo",
            None,
            CallableDetail::default(),
        ));
        let param = |name: &str| Parameter {
            name: name.into(),
            kind: ParamKind::Regular,
            annotation: Some("Cat".into()),
            default: None,
        };
        let mut signatures = SignatureTable::default();
        signatures.callables.insert(
            "pair".into(),
            Signature {
                parameters: vec![param("a"), param("b")],
                return_annotation: Some("Cat".into()),
            },
        );

        let graph = GraphBuilder::default().build(&unit, &signatures, &BTreeMap::new());
        let cat_in = graph.edges_of("Cat").incoming;
        assert_eq!(cat_in[&RelationKind::AcceptsType].len(), 2);
        assert_eq!(cat_in[&RelationKind::ReturnsType].len(), 1);
    }
}
