use crate::app::dto::{EdgesResponse, ExportFormat};
use crate::app::engine::AnalysisEngine;
use anyhow::{Context as _, Result};
use std::path::Path;

pub fn display_summary(engine: &AnalysisEngine) -> Result<()> {
    let summary = engine.summary()?;
    let info = &summary.unit;

    println!("Unit: {}", info.name);
    if let Some(location) = &info.location {
        println!("  Location: {}", location);
    }
    if let Some(description) = &info.description {
        println!("  Description: {}", description);
    }
    if let Some(version) = &info.version {
        println!("  Version: {}", version);
    }
    if let Some(author) = &info.author {
        println!("  Author: {}", author);
    }
    if !info.exports.is_empty() {
        println!("  Exports: {}", info.exports.join(", "));
    }
    println!("{}", "=".repeat(80));

    print_name_list("Types", &summary.types);
    print_name_list("Callables", &summary.callables);

    println!("\nConstants ({}):", summary.constants.len());
    for constant in &summary.constants {
        println!(
            "  {} [{}] = {}",
            constant.name, constant.detail.value_kind, constant.detail.preview
        );
    }

    print_name_list("Sub-units", &summary.sub_units);

    if !summary.unresolved_imports.is_empty() {
        println!("\nUnresolved imports ({}):", summary.unresolved_imports.len());
        for (local, qualified) in &summary.unresolved_imports {
            println!("  {} -> {}", local, qualified);
        }
    }

    println!("\nRelationships:");
    println!("  Connected entities: {}", summary.connected_entities);
    println!("  Edges: {}", summary.edge_count);

    if !summary.issues.is_empty() {
        println!("\nIssues ({}):", summary.issues.len());
        for issue in &summary.issues {
            println!("  {}", issue);
        }
    }
    Ok(())
}

fn print_name_list(title: &str, names: &[String]) {
    println!("\n{} ({}):", title, names.len());
    for name in names {
        println!("  {}", name);
    }
}

/// Whole-unit graph, or the neighborhood of a single entity.
pub fn display_graph(engine: &AnalysisEngine, entity: Option<&str>) -> Result<()> {
    let Some(name) = entity else {
        print!("{}", engine.export(ExportFormat::Text)?);
        return Ok(());
    };

    let edges = engine.edges_of(name)?;
    if !edges.known {
        print_not_found(engine, name)?;
        return Ok(());
    }

    println!("Connection graph for: {}", name);
    println!("{}", "=".repeat(80));
    print_edges(&edges);
    Ok(())
}

fn print_edges(edges: &EdgesResponse) {
    if edges.incoming.is_empty() && edges.outgoing.is_empty() {
        println!("  No connections detected");
        return;
    }
    if !edges.incoming.is_empty() {
        println!("  used by:");
        for (relation, sources) in &edges.incoming {
            for source in sources {
                println!("    - {} ({})", source, relation);
            }
        }
    }
    if !edges.outgoing.is_empty() {
        println!("  uses:");
        for (relation, targets) in &edges.outgoing {
            for target in targets {
                println!("    - {}: {}", relation, target);
            }
        }
    }
}

fn print_not_found(engine: &AnalysisEngine, name: &str) -> Result<()> {
    let entities = engine.entities()?;
    println!("Entity '{}' not found in {}", name, engine.health()?.unit);
    let available: Vec<&str> = entities.entities.iter().map(|e| e.name.as_str()).collect();
    if available.is_empty() {
        println!("The unit has no types or callables.");
    } else {
        println!("Available: {}", available.join(", "));
    }
    Ok(())
}

pub fn display_inheritance(engine: &AnalysisEngine) -> Result<()> {
    let inheritance = engine.inheritance()?;
    println!("Inheritance");
    println!("{}", "=".repeat(80));

    if inheritance.types.is_empty() {
        println!("  No type declares a base.");
        return Ok(());
    }
    for (type_name, bases) in &inheritance.types {
        println!("{}", type_name);
        for base in bases {
            let origin = if base.is_internal() {
                "internal"
            } else {
                "external"
            };
            println!("  <- {} ({})", base.display_name(), origin);
        }
    }
    Ok(())
}

pub fn inspect_entity(engine: &AnalysisEngine, name: &str) -> Result<()> {
    let Some(entity) = engine.entity(name)? else {
        print_not_found(engine, name)?;
        return Ok(());
    };

    println!("{} ({:?})", entity.name, entity.kind);
    println!("{}", "=".repeat(80));
    println!("  Defined in: {}", entity.defining_unit);
    if let Some(doc) = &entity.doc {
        let first = doc.lines().next().unwrap_or_default();
        println!("  Doc: {}", first);
    }
    if let Some(signature) = &entity.signature {
        let prefix = if entity.is_async { "async " } else { "" };
        println!("  Signature: {}{}{}", prefix, entity.name, signature);
    }
    if let Some(constant) = &entity.constant {
        println!("  Value [{}]: {}", constant.value_kind, constant.preview);
    }
    if let Some(location) = &entity.location {
        println!("  Location: {}", location);
    }

    if !entity.bases.is_empty() {
        let bases: Vec<&str> = entity.bases.iter().map(|b| b.display_name()).collect();
        println!("  Bases: {}", bases.join(", "));
    }
    if !entity.instance_attributes.is_empty() {
        println!(
            "  Instance attributes: {}",
            entity.instance_attributes.join(", ")
        );
    }
    if !entity.class_attributes.is_empty() {
        println!("  Class attributes: {}", entity.class_attributes.join(", "));
    }
    if !entity.methods.is_empty() {
        println!("\n  Methods:");
        for method in &entity.methods {
            let inherited = if method.defined_in == entity.name {
                String::new()
            } else {
                format!(" (from {})", method.defined_in)
            };
            println!(
                "    {}{} [{:?}]{}",
                method.name, method.signature, method.kind, inherited
            );
        }
    }

    if entity.edges.known {
        println!("\n  Connections:");
        print_edges(&entity.edges);
    }
    Ok(())
}

/// Write the export to `output`, or to stdout when no file is given.
pub fn export_analysis(
    engine: &AnalysisEngine,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let rendered = engine.export(format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            eprintln!("Analysis exported to: {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
