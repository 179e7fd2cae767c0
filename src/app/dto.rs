use crate::domain::edge::{Direction, InheritanceEdge, RelationKind};
use crate::domain::entity::{ConstantDetail, EntityKind, UnitInfo};
use crate::domain::error::AnalysisIssue;
use crate::domain::graph::KindIndex;
use crate::domain::signature::MethodKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
    Dot,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "dot" | "graphviz" => Ok(ExportFormat::Dot),
            other => Err(format!("unknown export format '{other}' (expected text, json or dot)")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Text => "text",
            ExportFormat::Json => "json",
            ExportFormat::Dot => "dot",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub target: String,
    pub unit: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub issue_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConstantSummary {
    pub name: String,
    #[serde(flatten)]
    pub detail: ConstantDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub unit: UnitInfo,
    pub types: Vec<String>,
    pub callables: Vec<String>,
    pub constants: Vec<ConstantSummary>,
    pub sub_units: Vec<String>,
    pub unresolved_imports: BTreeMap<String, String>,
    pub connected_entities: usize,
    pub edge_count: usize,
    pub issues: Vec<AnalysisIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityListItem {
    pub name: String,
    pub kind: EntityKind,
    pub connected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntitiesResponse {
    pub entities: Vec<EntityListItem>,
}

/// Edges of one entity, descriptors rendered for their view and grouped by relation label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgesResponse {
    pub entity: String,
    /// False when the name is not a graph node of the analyzed unit.
    pub known: bool,
    pub incoming: BTreeMap<String, Vec<String>>,
    pub outgoing: BTreeMap<String, Vec<String>>,
}

impl EdgesResponse {
    /// Keep only the groups of one relation kind, on both sides.
    pub fn only(mut self, kind: RelationKind) -> Self {
        self.incoming.retain(|label, _| label == kind.incoming_label());
        self.outgoing.retain(|label, _| label == kind.outgoing_label());
        self
    }
}

/// Render one side of an adjacency: relation label -> sorted rendered descriptors.
pub fn render_kind_index(index: &KindIndex, direction: Direction) -> BTreeMap<String, Vec<String>> {
    index
        .iter()
        .filter(|(_, descriptors)| !descriptors.is_empty())
        .map(|(kind, descriptors)| {
            (
                kind.label(direction).to_string(),
                descriptors.iter().map(|d| d.render(direction)).collect(),
            )
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectedResponse {
    pub entities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InheritanceResponse {
    pub types: BTreeMap<String, Vec<InheritanceEdge>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodDto {
    pub name: String,
    pub kind: MethodKind,
    pub defined_in: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityResponse {
    pub name: String,
    pub kind: EntityKind,
    pub defining_unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Callable signature, or the constructor signature of a Type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub is_async: bool,
    pub bases: Vec<InheritanceEdge>,
    pub methods: Vec<MethodDto>,
    pub instance_attributes: Vec<String>,
    pub class_attributes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstantDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub edges: EdgesResponse,
}

/// `?kind=` accepts either label of a relation (`accepts_type` or `accepted_by`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EdgesQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}
