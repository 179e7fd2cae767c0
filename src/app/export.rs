//! Serializes a relationship graph for persistence.
//!
//! Every format walks the connected entities in lexicographic order and, per entity, its
//! incoming edges grouped by kind, then its outgoing edges grouped by kind. Kinds follow
//! `RelationKind` order and descriptors within a kind are sorted, so identical input always
//! produces byte-identical output.

use crate::app::dto::ExportFormat;
use crate::domain::analysis::Analysis;
use crate::domain::edge::Direction;
use crate::domain::entity::EntityKind;
use crate::domain::graph::KindIndex;
use anyhow::{Context, Result};
use petgraph::dot::Dot;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub unit: String,
    pub entities: Vec<ExportedEntity>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedEntity {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<EntityKind>,
    pub incoming: Vec<ExportedGroup>,
    pub outgoing: Vec<ExportedGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedGroup {
    pub relation: String,
    pub entries: Vec<String>,
}

fn groups(index: &KindIndex, direction: Direction) -> Vec<ExportedGroup> {
    index
        .iter()
        .filter(|(_, descriptors)| !descriptors.is_empty())
        .map(|(kind, descriptors)| ExportedGroup {
            relation: kind.label(direction).to_string(),
            entries: descriptors.iter().map(|d| d.render(direction)).collect(),
        })
        .collect()
}

pub fn export_document(analysis: &Analysis) -> ExportDocument {
    let graph = &analysis.graph;
    let entities = graph
        .all_connected_entities()
        .into_iter()
        .map(|name| {
            let edges = graph.edges_of(&name);
            ExportedEntity {
                kind: analysis.node_kind(&name),
                incoming: groups(&edges.incoming, Direction::Incoming),
                outgoing: groups(&edges.outgoing, Direction::Outgoing),
                name,
            }
        })
        .collect();

    ExportDocument {
        unit: analysis.unit_name().to_string(),
        entities,
    }
}

pub fn render(analysis: &Analysis, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Text => {
            render_text(&export_document(analysis)).context("Failed to render text export")
        }
        ExportFormat::Json => {
            let mut json = serde_json::to_string_pretty(&export_document(analysis))
                .context("Failed to serialize export document")?;
            json.push('\n');
            Ok(json)
        }
        ExportFormat::Dot => Ok(format!("{}", Dot::new(&analysis.graph.to_digraph()))),
    }
}

fn render_text(document: &ExportDocument) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "Relationship graph: {}", document.unit)?;

    if document.entities.is_empty() {
        writeln!(out)?;
        writeln!(out, "No relationships found.")?;
        return Ok(out);
    }

    for entity in &document.entities {
        writeln!(out)?;
        match entity.kind {
            Some(kind) => writeln!(out, "{} ({})", entity.name, kind.label())?,
            None => writeln!(out, "{}", entity.name)?,
        }
        if !entity.incoming.is_empty() {
            writeln!(out, "  used by:")?;
            for group in &entity.incoming {
                for entry in &group.entries {
                    writeln!(out, "    - {entry} ({})", group.relation)?;
                }
            }
        }
        if !entity.outgoing.is_empty() {
            writeln!(out, "  uses:")?;
            for group in &entity.outgoing {
                for entry in &group.entries {
                    writeln!(out, "    - {}: {entry}", group.relation)?;
                }
            }
        }
    }
    Ok(out)
}
