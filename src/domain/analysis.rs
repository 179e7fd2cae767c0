//! One complete analysis pass: signatures, scans, graph.

use crate::config::AnalysisOptions;
use crate::domain::builder::GraphBuilder;
use crate::domain::entity::{CollectedUnit, EntityKind};
use crate::domain::error::AnalysisIssue;
use crate::domain::graph::RelationGraph;
use crate::domain::ports::CallSiteParser;
use crate::domain::scanner::{KnownEntities, ScanResult, SourceScanner};
use crate::domain::signature::{SignatureExtractor, SignatureTable};
use std::collections::BTreeMap;
use tracing::info;

/// Immutable result of a pass. Readers share it; a rebuild produces a new one.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub unit: CollectedUnit,
    pub signatures: SignatureTable,
    pub scans: BTreeMap<String, ScanResult>,
    pub graph: RelationGraph,
    pub issues: Vec<AnalysisIssue>,
}

impl Analysis {
    pub fn unit_name(&self) -> &str {
        self.unit.name()
    }

    /// Kind of a graph node, if `name` is one.
    pub fn node_kind(&self, name: &str) -> Option<EntityKind> {
        self.unit
            .get(name)
            .filter(|e| e.kind.is_graph_node() && self.unit.owns(e))
            .map(|e| e.kind)
    }
}

pub struct Analyzer<'p> {
    extractor: SignatureExtractor,
    builder: GraphBuilder,
    scanner: SourceScanner<'p>,
}

impl<'p> Analyzer<'p> {
    pub fn new(options: &AnalysisOptions, parser: &'p dyn CallSiteParser) -> Self {
        Self {
            extractor: SignatureExtractor::new(options),
            builder: GraphBuilder::new(options),
            scanner: SourceScanner::new(parser),
        }
    }

    pub fn analyze(&self, unit: CollectedUnit) -> Analysis {
        let signatures = self.extractor.extract_all(&unit);
        let mut issues = signatures.issues.clone();

        let known = KnownEntities::from_unit(&unit);
        let mut scans = BTreeMap::new();
        for entity in unit.entities.values() {
            if !entity.kind.is_graph_node() || !unit.owns(entity) {
                continue;
            }
            let result = match self.scanner.try_scan(entity, &known) {
                Ok(result) => result,
                Err(issue) => {
                    issues.push(issue);
                    ScanResult::default()
                }
            };
            scans.insert(entity.name.clone(), result);
        }

        let graph = self.builder.build(&unit, &signatures, &scans);

        info!(
            unit = unit.name(),
            types = known.types.len(),
            callables = known.callables.len(),
            edges = graph.edge_count(),
            issues = issues.len(),
            "analysis pass complete"
        );

        Analysis {
            unit,
            signatures,
            scans,
            graph,
            issues,
        }
    }
}
