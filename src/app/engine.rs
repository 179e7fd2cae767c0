use crate::adapters::python::{PythonCollector, TreeSitterCallParser};
use crate::app::dto::*;
use crate::app::export;
use crate::config::AnalysisOptions;
use crate::domain::analysis::{Analysis, Analyzer};
use crate::domain::edge::{BaseOrigin, Direction, InheritanceEdge};
use crate::domain::entity::{EntityDetail, EntityKind};
use crate::domain::ports::EntityCollector;
use anyhow::{Context as _, Result, anyhow};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tracing::info;

/// Holds the published analysis of one target and answers queries against it.
///
/// Readers clone the `Arc<Analysis>` and never block a rebuild for longer than the swap.
#[derive(Clone)]
pub struct AnalysisEngine {
    inner: Arc<RwLock<EngineData>>,
}

struct EngineData {
    target: PathBuf,
    options: AnalysisOptions,
    analysis: Arc<Analysis>,
}

/// Collect and analyze a Python target in one pass.
pub fn analyze_target(target: &Path, options: &AnalysisOptions) -> Result<Analysis> {
    let unit = PythonCollector::new(target, options.clone())
        .collect()
        .with_context(|| format!("Failed to collect entities from {}", target.display()))?;
    let parser = TreeSitterCallParser::new();
    Ok(Analyzer::new(options, &parser).analyze(unit))
}

impl AnalysisEngine {
    /// Construct an engine around an analysis built elsewhere (tests, fixtures).
    pub fn from_analysis(target: PathBuf, options: AnalysisOptions, analysis: Analysis) -> Self {
        Self {
            inner: Arc::new(RwLock::new(EngineData {
                target,
                options,
                analysis: Arc::new(analysis),
            })),
        }
    }

    pub fn load(target: &Path, options: AnalysisOptions) -> Result<Self> {
        let analysis = analyze_target(target, &options)?;
        Ok(Self::from_analysis(target.to_path_buf(), options, analysis))
    }

    /// Rebuild from the target on disk. The new analysis is complete before it is published;
    /// on failure the previous one stays in place.
    pub fn reload(&self) -> Result<HealthResponse> {
        let (target, options) = {
            let data = self.read()?;
            (data.target.clone(), data.options.clone())
        };
        let analysis = Arc::new(analyze_target(&target, &options)?);
        {
            let mut data = self
                .inner
                .write()
                .map_err(|_| anyhow!("Engine state lock poisoned"))?;
            data.analysis = analysis;
        }
        info!(target = %target.display(), "analysis reloaded");
        self.health()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EngineData>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("Engine state lock poisoned"))
    }

    /// The currently published analysis. Stays valid across reloads.
    pub fn snapshot(&self) -> Result<Arc<Analysis>> {
        Ok(self.read()?.analysis.clone())
    }

    pub fn health(&self) -> Result<HealthResponse> {
        let data = self.read()?;
        let analysis = &data.analysis;
        Ok(HealthResponse {
            target: data.target.to_string_lossy().to_string(),
            unit: analysis.unit_name().to_string(),
            node_count: analysis.unit.count_of_kind(EntityKind::Type)
                + analysis.unit.count_of_kind(EntityKind::Callable),
            edge_count: analysis.graph.edge_count(),
            issue_count: analysis.issues.len(),
        })
    }

    pub fn summary(&self) -> Result<SummaryResponse> {
        let analysis = self.snapshot()?;
        let unit = &analysis.unit;
        let names = |kind| {
            unit.owned_of_kind(kind)
                .map(|e| e.name.clone())
                .collect::<Vec<_>>()
        };

        let constants = unit
            .owned_of_kind(EntityKind::Constant)
            .filter_map(|e| match &e.detail {
                EntityDetail::Constant(detail) => Some(ConstantSummary {
                    name: e.name.clone(),
                    detail: detail.clone(),
                }),
                _ => None,
            })
            .collect();

        let sub_units = unit
            .entities
            .values()
            .filter(|e| e.kind == EntityKind::SubUnit)
            .map(|e| e.name.clone())
            .collect();

        Ok(SummaryResponse {
            unit: unit.info.clone(),
            types: names(EntityKind::Type),
            callables: names(EntityKind::Callable),
            constants,
            sub_units,
            unresolved_imports: unit.unresolved_imports.clone(),
            connected_entities: analysis.graph.all_connected_entities().len(),
            edge_count: analysis.graph.edge_count(),
            issues: analysis.issues.clone(),
        })
    }

    /// Graph nodes of the unit, with whether each has any edge.
    pub fn entities(&self) -> Result<EntitiesResponse> {
        let analysis = self.snapshot()?;
        let connected = analysis.graph.all_connected_entities();
        let entities = analysis
            .unit
            .entities
            .values()
            .filter(|e| e.kind.is_graph_node() && analysis.unit.owns(e))
            .map(|e| EntityListItem {
                name: e.name.clone(),
                kind: e.kind,
                connected: connected.binary_search(&e.name).is_ok(),
            })
            .collect();
        Ok(EntitiesResponse { entities })
    }

    pub fn edges_of(&self, name: &str) -> Result<EdgesResponse> {
        let analysis = self.snapshot()?;
        Ok(edges_response(&analysis, name))
    }

    pub fn connected(&self) -> Result<ConnectedResponse> {
        Ok(ConnectedResponse {
            entities: self.snapshot()?.graph.all_connected_entities(),
        })
    }

    pub fn inheritance(&self) -> Result<InheritanceResponse> {
        Ok(InheritanceResponse {
            types: self.snapshot()?.graph.inheritance_tree().clone(),
        })
    }

    /// Everything known about one entity. `None` when the unit has no member of that name.
    pub fn entity(&self, name: &str) -> Result<Option<EntityResponse>> {
        let analysis = self.snapshot()?;
        let Some(entity) = analysis.unit.get(name) else {
            return Ok(None);
        };

        let mut response = EntityResponse {
            name: entity.name.clone(),
            kind: entity.kind,
            defining_unit: entity.defining_unit.clone(),
            doc: entity.doc.clone(),
            signature: None,
            is_async: false,
            bases: Vec::new(),
            methods: Vec::new(),
            instance_attributes: Vec::new(),
            class_attributes: Vec::new(),
            constant: None,
            location: None,
            edges: edges_response(&analysis, name),
        };

        match &entity.detail {
            EntityDetail::Type(detail) => {
                response.bases = match analysis.graph.inheritance_tree().get(name) {
                    Some(bases) => bases.clone(),
                    None => detail
                        .bases
                        .iter()
                        .map(|b| InheritanceEdge {
                            base_name: b.name.clone(),
                            origin: BaseOrigin::External {
                                qualified: b.qualified(),
                            },
                        })
                        .collect(),
                };
                if let Some(sigs) = analysis.signatures.types.get(name) {
                    response.signature = sigs.constructor().map(ToString::to_string);
                    response.methods = sigs
                        .methods
                        .iter()
                        .map(|(method, sig)| MethodDto {
                            name: method.clone(),
                            kind: sig.kind,
                            defined_in: sig.defined_in.clone(),
                            signature: sig.signature.to_string(),
                        })
                        .collect();
                }
                response.instance_attributes = detail.instance_attributes.clone();
                response.class_attributes = detail.class_attributes.clone();
            }
            EntityDetail::Callable(detail) => {
                response.is_async = detail.is_async;
                response.signature = analysis
                    .signatures
                    .callables
                    .get(name)
                    .map(ToString::to_string);
            }
            EntityDetail::Constant(detail) => response.constant = Some(detail.clone()),
            EntityDetail::SubUnit(detail) => response.location = detail.location.clone(),
        }

        Ok(Some(response))
    }

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let analysis = self.snapshot()?;
        export::render(&analysis, format)
    }
}

fn edges_response(analysis: &Analysis, name: &str) -> EdgesResponse {
    let edges = analysis.graph.edges_of(name);
    EdgesResponse {
        entity: name.to_string(),
        known: analysis.node_kind(name).is_some(),
        incoming: render_kind_index(&edges.incoming, Direction::Incoming),
        outgoing: render_kind_index(&edges.outgoing, Direction::Outgoing),
    }
}
