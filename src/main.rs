use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use entity_relations::app::dto::ExportFormat;
use entity_relations::app::engine::AnalysisEngine;
use entity_relations::config::AnalysisOptions;
use entity_relations::{cli, server};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ertool")]
#[command(about = "Relationship graph of the types and callables in a Python module", long_about = None)]
struct Cli {
    /// JSON file with analysis options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also collect `_private` names and methods
    #[arg(long, global = true)]
    include_private: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Python file (.py/.pyi) or package directory to analyze
    target: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unit metadata and entity counts
    Summary,
    /// Relationship graph of the unit, or of one entity
    Graph {
        /// Entity to show
        entity: Option<String>,
    },
    /// Base types of every type
    Inheritance,
    /// Signature, members and connections of one entity
    Inspect {
        entity: String,
    },
    /// Serialize the relationship graph
    Export {
        /// text, json or dot
        #[arg(short, long, default_value = "text")]
        format: ExportFormat,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the query interface over HTTP
    Serve {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if verbose {
        EnvFilter::new("entity_relations=debug,ertool=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("entity_relations=info,ertool=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_options(config: Option<&Path>, include_private: bool) -> Result<AnalysisOptions> {
    let mut options = match config {
        Some(path) => AnalysisOptions::from_json_file(path)?,
        None => AnalysisOptions::default(),
    };
    if include_private {
        options.include_private = true;
    }
    Ok(options)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let options = load_options(args.config.as_deref(), args.include_private)?;
    let engine = AnalysisEngine::load(&args.target, options)?;

    match args.command {
        Commands::Summary => cli::display_summary(&engine)?,
        Commands::Graph { entity } => cli::display_graph(&engine, entity.as_deref())?,
        Commands::Inheritance => cli::display_inheritance(&engine)?,
        Commands::Inspect { entity } => cli::inspect_entity(&engine, &entity)?,
        Commands::Export { format, output } => {
            cli::export_analysis(&engine, format, output.as_deref())?
        }
        Commands::Serve { addr } => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(server::http::serve(engine, addr))?;
        }
    }

    Ok(())
}
