//! Relationship graph construction over collector fixtures.

mod common;

use std::collections::BTreeSet;

use entity_relations::adapters::python::TreeSitterCallParser;
use entity_relations::config::AnalysisOptions;
use entity_relations::domain::analysis::{Analysis, Analyzer};
use entity_relations::domain::builder::GraphBuilder;
use entity_relations::domain::edge::{Descriptor, Direction, RelationKind};
use entity_relations::domain::entity::{BaseRef, CollectedUnit, EntityRecord, TypeDetail};
use entity_relations::domain::error::AnalysisIssue;
use entity_relations::domain::graph::RelationGraph;
use entity_relations::domain::ports::CallSiteParser;

use common::fixtures::{
    MAKE_SOURCE, UNIT, basic_unit, callable, raw, type_entity, with_method, with_noise,
};
use common::mock::{MockCallParser, attr, bare};

fn analyze_with(unit: CollectedUnit, parser: &dyn CallSiteParser) -> Analysis {
    Analyzer::new(&AnalysisOptions::default(), parser).analyze(unit)
}

fn analyze(unit: CollectedUnit) -> Analysis {
    analyze_with(unit, &TreeSitterCallParser::new())
}

fn targets(graph: &RelationGraph, name: &str, kind: RelationKind) -> Vec<String> {
    graph
        .edges_of(name)
        .outgoing
        .get(&kind)
        .map(|set| set.iter().map(|d| d.render(Direction::Outgoing)).collect())
        .unwrap_or_default()
}

fn sources(graph: &RelationGraph, name: &str, kind: RelationKind) -> Vec<String> {
    graph
        .edges_of(name)
        .incoming
        .get(&kind)
        .map(|set| set.iter().map(|d| d.render(Direction::Incoming)).collect())
        .unwrap_or_default()
}

#[test]
fn test_basic_unit_relations() {
    let graph = analyze(basic_unit()).graph;

    assert_eq!(targets(&graph, "B", RelationKind::InheritsFrom), vec!["A"]);
    assert_eq!(
        targets(&graph, "make", RelationKind::AcceptsType),
        vec!["A (parameter: x)"]
    );
    assert_eq!(targets(&graph, "make", RelationKind::ReturnsType), vec!["B"]);
    assert_eq!(targets(&graph, "make", RelationKind::Instantiates), vec!["B"]);
    assert_eq!(graph.edge_count(), 4);

    assert_eq!(sources(&graph, "A", RelationKind::InheritsFrom), vec!["B"]);
    assert_eq!(sources(&graph, "A", RelationKind::AcceptsType), vec!["make(x)"]);
    assert_eq!(sources(&graph, "B", RelationKind::ReturnsType), vec!["make"]);
    assert_eq!(sources(&graph, "B", RelationKind::Instantiates), vec!["make"]);

    assert_eq!(graph.all_connected_entities(), vec!["A", "B", "make"]);
}

#[test]
fn test_forward_and_reverse_indices_are_transposes() {
    let mut unit = basic_unit();
    unit.insert(with_method(
        type_entity("Canvas", &["B"], None),
        "add",
        raw(&[("self", None), ("shape", Some("A")), ("other", Some("B"))], Some("A")),
    ));
    let graph = analyze(unit).graph;

    let forward: BTreeSet<_> = graph.edges().collect();
    let reverse: BTreeSet<_> = graph.incoming_edges().collect();
    assert!(!forward.is_empty());
    assert_eq!(forward, reverse);
    assert_eq!(forward.len(), graph.edge_count());
}

#[test]
fn test_rebuild_is_idempotent() {
    let first = analyze(basic_unit());
    let second = analyze(basic_unit());
    assert_eq!(first.graph, second.graph);

    // Rebuilding into a graph that already holds edges replaces them.
    let mut reused = analyze(with_noise(basic_unit())).graph;
    GraphBuilder::default().build_into(
        &mut reused,
        &first.unit,
        &first.signatures,
        &first.scans,
    );
    assert_eq!(reused, first.graph);
}

#[test]
fn test_self_references_are_not_recorded() {
    let source = "class Node:\n    def __init__(self, next: 'Node'):\n        self.next = Node()\n";
    let mut unit = CollectedUnit::new(UNIT);
    unit.insert(with_method(
        type_entity("Node", &[], Some(source)),
        "__init__",
        raw(&[("self", None), ("next", Some("'Node'"))], None),
    ));

    let analysis = analyze(unit);
    assert!(analysis.graph.is_empty());
    assert_eq!(analysis.scans["Node"].instantiated.len(), 1);
}

#[test]
fn test_annotations_match_whole_tokens_only() {
    let mut unit = CollectedUnit::new(UNIT);
    unit.insert(type_entity("Cat", &[], None));
    unit.insert(callable(
        "adopt",
        raw(&[("kind", Some("Category")), ("pet", Some("Optional[Cat]"))], Some("List[Cat]")),
        None,
    ));

    let graph = analyze(unit).graph;
    assert_eq!(
        targets(&graph, "adopt", RelationKind::AcceptsType),
        vec!["Cat (parameter: pet)"]
    );
    assert_eq!(targets(&graph, "adopt", RelationKind::ReturnsType), vec!["Cat"]);
}

#[test]
fn test_method_contexts() {
    let mut unit = basic_unit();
    let canvas = with_method(
        with_method(
            type_entity("Canvas", &[], None),
            "__init__",
            raw(&[("self", None), ("base", Some("A"))], None),
        ),
        "add",
        raw(&[("self", None), ("shape", Some("A"))], Some("B")),
    );
    unit.insert(canvas);

    let graph = analyze(unit).graph;
    assert_eq!(
        targets(&graph, "Canvas", RelationKind::AcceptsType),
        vec!["A (in __init__.base)", "A (in add.shape)"]
    );
    assert_eq!(
        targets(&graph, "Canvas", RelationKind::ReturnsType),
        vec!["B (from add)"]
    );
    assert_eq!(
        sources(&graph, "A", RelationKind::AcceptsType),
        vec!["Canvas.__init__(base)", "Canvas.add(shape)", "make(x)"]
    );
}

#[test]
fn test_private_methods_are_skipped_unless_enabled() {
    let mut unit = basic_unit();
    unit.insert(with_method(
        type_entity("Canvas", &[], None),
        "_paint",
        raw(&[("self", None), ("shape", Some("A"))], None),
    ));

    let graph = analyze(unit.clone()).graph;
    assert!(targets(&graph, "Canvas", RelationKind::AcceptsType).is_empty());

    let options = AnalysisOptions {
        include_private: true,
        ..AnalysisOptions::default()
    };
    let parser = TreeSitterCallParser::new();
    let graph = Analyzer::new(&options, &parser).analyze(unit).graph;
    assert_eq!(
        targets(&graph, "Canvas", RelationKind::AcceptsType),
        vec!["A (in _paint.shape)"]
    );
}

#[test]
fn test_parse_failure_degrades_to_no_call_edges() {
    let parser = MockCallParser::new().with_failure(MAKE_SOURCE, "syntax error at 1:1");
    let analysis = analyze_with(basic_unit(), &parser);

    assert!(targets(&analysis.graph, "make", RelationKind::Instantiates).is_empty());
    assert_eq!(analysis.graph.edge_count(), 3);
    assert!(analysis.issues.contains(&AnalysisIssue::ParseFailure {
        entity: "make".into(),
        reason: "syntax error at 1:1".into(),
    }));
}

#[test]
fn test_missing_source_keeps_annotation_edges() {
    let mut unit = CollectedUnit::new(UNIT);
    unit.insert(type_entity("A", &[], Some("class A:\n    pass\n")));
    unit.insert(callable("native", raw(&[("a", Some("A"))], None), None));

    let analysis = analyze(unit);
    assert_eq!(
        targets(&analysis.graph, "native", RelationKind::AcceptsType),
        vec!["A (parameter: a)"]
    );
    assert!(analysis.issues.contains(&AnalysisIssue::MissingSource {
        entity: "native".into()
    }));
}

#[test]
fn test_repeated_calls_collapse_and_attribute_calls_resolve() {
    let b_source = "class B(A):\n    pass\n";
    let parser = MockCallParser::new()
        .with_calls(
            MAKE_SOURCE,
            vec![bare("B"), bare("B"), attr("factory", "B"), bare("print")],
        )
        .with_calls(b_source, vec![attr("shapes", "make")]);

    let graph = analyze_with(basic_unit(), &parser).graph;
    assert_eq!(targets(&graph, "make", RelationKind::Instantiates), vec!["B"]);
    assert_eq!(targets(&graph, "B", RelationKind::CallsFunction), vec!["make"]);
    assert_eq!(sources(&graph, "make", RelationKind::CallsFunction), vec!["B"]);
}

#[test]
fn test_non_nodes_never_appear_in_the_graph() {
    let mut unit = with_noise(basic_unit());
    unit.insert(callable(
        "show",
        raw(&[("f", Some("Foreign")), ("n", Some("LIMIT"))], Some("helpers")),
        Some("def show(f, n):\n    return Foreign()\n"),
    ));

    let analysis = analyze(unit);
    let connected = analysis.graph.all_connected_entities();
    for name in ["Foreign", "LIMIT", "helpers", "show"] {
        assert!(!connected.iter().any(|c| c == name), "{name} connected");
    }
    assert!(analysis.node_kind("Foreign").is_none());
    assert!(analysis.node_kind("show").is_some());
}

#[test]
fn test_external_and_universal_bases() {
    let mut unit = CollectedUnit::new(UNIT);
    unit.insert(EntityRecord::type_entity(
        "Plain",
        UNIT,
        None,
        TypeDetail {
            bases: vec![BaseRef::new("object", "builtins")],
            ..TypeDetail::default()
        },
    ));
    unit.insert(EntityRecord::type_entity(
        "Reader",
        UNIT,
        None,
        TypeDetail {
            bases: vec![
                BaseRef::new("Plain", UNIT),
                BaseRef::new("Protocol", "typing"),
            ],
            ..TypeDetail::default()
        },
    ));

    let graph = analyze(unit).graph;
    let tree = graph.inheritance_tree();
    assert!(!tree.contains_key("Plain"));

    let bases: Vec<_> = tree["Reader"]
        .iter()
        .map(|b| (b.display_name().to_string(), b.is_internal()))
        .collect();
    assert_eq!(
        bases,
        vec![
            ("Plain".to_string(), true),
            ("typing.Protocol".to_string(), false),
        ]
    );
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.edges_of("Protocol").is_empty());
    assert!(
        graph.edges_of("Plain").incoming[&RelationKind::InheritsFrom]
            .contains(&Descriptor::plain("Reader"))
    );
}
