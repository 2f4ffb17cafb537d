//! CLI entry point for the notegraph notebook engine.
//!
//! Runs one cell or one expansion against the notebooks stored under the
//! configured directory and writes the resulting query result as JSON to
//! stdout. Logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use notegraph_core::StudioConfig;
use notegraph_engine::{FileNotebookRepository, NotebookEngine};
use notegraph_graph::{
    GraphBackend, GraphConfig, GremlinClient, MemoryGraphClient, Neo4jClient, QueryClient,
};

#[derive(Parser)]
#[command(name = "notegraph")]
#[command(about = "Execute notebook cells and expand their graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: notegraph).
    #[arg(short, long, default_value = "notegraph", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a cell and store its result.
    Execute {
        #[arg(long)]
        notebook: String,
        #[arg(long)]
        cell: String,
    },
    /// Expand a vertex of a cell's graph with its incident edges.
    Expand {
        #[arg(long)]
        notebook: String,
        #[arg(long)]
        cell: String,
        #[arg(long)]
        vertex: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let studio = StudioConfig::load(&cli.config)?;
    let graph_config = load_graph_config(&cli.config)?;
    let client = build_client(&graph_config)?;
    let repository = FileNotebookRepository::new(studio.notebooks_dir())
        .with_context(|| format!("opening {}", studio.notebooks_dir().display()))?;

    tracing::debug!(
        backend = ?graph_config.backend,
        notebooks = %repository.root().display(),
        "Engine configured"
    );
    let engine = NotebookEngine::new(client, Arc::new(repository), studio);

    let result = match &cli.command {
        Command::Execute { notebook, cell } => engine.execute_cell(notebook, cell).await?,
        Command::Expand {
            notebook,
            cell,
            vertex,
        } => engine.expand_vertex(notebook, cell, vertex).await?,
    };
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}

fn build_client(config: &GraphConfig) -> anyhow::Result<Arc<dyn QueryClient>> {
    let client: Arc<dyn QueryClient> = match config.backend {
        GraphBackend::Gremlin => Arc::new(GremlinClient::new()),
        GraphBackend::Neo4j => Arc::new(Neo4jClient::new(config.clone())),
        GraphBackend::Memory => {
            let fixture = config
                .memory_fixture
                .as_deref()
                .context("graph.memory_fixture is required for the memory backend")?;
            Arc::new(MemoryGraphClient::from_fixture(std::path::Path::new(fixture))?)
        }
    };
    Ok(client)
}

/// Read the `[graph]` section; a missing section yields defaults.
fn load_graph_config(file_prefix: &str) -> anyhow::Result<GraphConfig> {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("NOTEGRAPH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    match cfg.get::<GraphConfig>("graph") {
        Ok(c) => Ok(c),
        Err(config::ConfigError::NotFound(_)) => Ok(GraphConfig::default()),
        Err(e) => Err(e.into()),
    }
}
