//! notegraph-engine: Incremental graph accumulation for notebook cells.
//!
//! Executes a cell's traversal, classifies the output by its first object,
//! extracts the induced vertex/edge set for rendering, and persists the
//! result on the cell. Neighborhood expansion later folds a vertex's
//! incident edges into that persisted graph without duplicates and hands
//! back only what was new.

pub mod accumulate;
pub mod classify;
pub mod error;
pub mod expand;
pub mod extract;
pub mod fetch;
pub mod lock;
pub mod repository;

pub use error::EngineError;
pub use repository::{
    FileNotebookRepository, MemoryNotebookRepository, NotebookRepository, RepositoryError,
};

use std::sync::Arc;
use std::time::Instant;

use notegraph_core::{Cell, CellLanguage, Notebook, QueryResult, ResultType, StudioConfig};
use notegraph_graph::QueryClient;

use crate::fetch::Fetcher;
use crate::lock::CellLocks;

/// Runs cells and expansions against one query client and repository.
pub struct NotebookEngine {
    client: Arc<dyn QueryClient>,
    repository: Arc<dyn NotebookRepository>,
    config: StudioConfig,
    locks: CellLocks,
}

impl NotebookEngine {
    pub fn new(
        client: Arc<dyn QueryClient>,
        repository: Arc<dyn NotebookRepository>,
        config: StudioConfig,
    ) -> Self {
        Self {
            client,
            repository,
            config,
            locks: CellLocks::new(),
        }
    }

    /// Execute a cell and persist its fresh result.
    ///
    /// The returned result and the copy stored on the cell are separate
    /// values. Nothing is persisted if the traversal fails.
    pub async fn execute_cell(&self, notebook_id: &str, cell_id: &str) -> error::Result<QueryResult> {
        require_id("notebook id", notebook_id)?;
        require_id("cell id", cell_id)?;
        let _guard = self.locks.lock(notebook_id, cell_id).await;

        let (notebook, mut cell) = self.load(notebook_id, cell_id).await?;
        let start = Instant::now();

        let mut result = if cell.language == CellLanguage::Markdown {
            let mut result = QueryResult::new().with_type(ResultType::Markdown);
            result.data = Some(vec![serde_json::Value::String(cell.code.clone())]);
            result
        } else {
            self.run_traversal(&notebook, &cell).await?
        };
        result.duration = Some(start.elapsed().as_millis() as u64);

        cell.result = Some(result.clone());
        self.repository.save_cell(notebook_id, &cell).await?;

        tracing::info!(
            notebook_id,
            cell_id,
            result_type = ?result.result_type,
            vertices = result.graph.vertices().map_or(0, |v| v.len()),
            edges = result.graph.edges().map_or(0, |e| e.len()),
            duration_ms = result.duration,
            "Cell executed"
        );
        Ok(result)
    }

    /// Expand `vertex_id` in a cell's graph.
    ///
    /// The union is persisted on the cell; the returned result holds only
    /// the newly found vertices and edges. Precondition failures issue no
    /// query and leave the cell untouched.
    pub async fn expand_vertex(
        &self,
        notebook_id: &str,
        cell_id: &str,
        vertex_id: &str,
    ) -> error::Result<QueryResult> {
        require_id("notebook id", notebook_id)?;
        require_id("cell id", cell_id)?;
        require_id("vertex id", vertex_id)?;
        let _guard = self.locks.lock(notebook_id, cell_id).await;

        let start = Instant::now();
        let (notebook, mut cell) = self.load(notebook_id, cell_id).await?;
        let fetcher = self.fetcher(&notebook);
        let mut persisted = expand::check_preconditions(&cell, vertex_id, &fetcher)?.clone();

        let expansion = expand::expand(
            &fetcher,
            &persisted,
            vertex_id,
            self.config.expansion_vertex_source,
        )
        .await?;
        expansion.commit(&mut persisted);
        cell.result = Some(persisted);
        self.repository.save_cell(notebook_id, &cell).await?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            notebook_id,
            cell_id,
            vertex_id,
            new_vertices = expansion.vertices.len(),
            new_edges = expansion.edges.len(),
            duration_ms,
            "Vertex expanded"
        );
        Ok(expansion.into_result(duration_ms))
    }

    async fn run_traversal(&self, notebook: &Notebook, cell: &Cell) -> error::Result<QueryResult> {
        let fetcher = self.fetcher(notebook);
        let expected = fetcher.dialect().language();
        if cell.language != expected {
            return Err(EngineError::WrongLanguage {
                cell_id: cell.id.clone(),
                expected,
                found: cell.language,
            });
        }
        if cell.code.trim().is_empty() {
            return Err(EngineError::InvalidArgument(format!(
                "cell {} has no code to execute",
                cell.id
            )));
        }

        let objects = fetcher.run(&cell.code).await?;
        let result_type = classify::classify(cell.language, objects.first());

        let mut result = QueryResult::new().with_type(result_type);
        if result_type.has_graph() {
            result.graph = extract::extract(&fetcher, result_type, &objects).await?;
        }
        result.data = Some(objects.iter().map(|o| o.to_json()).collect());
        Ok(result)
    }

    async fn load(&self, notebook_id: &str, cell_id: &str) -> error::Result<(Notebook, Cell)> {
        let notebook = self.repository.load_notebook(notebook_id).await?;
        let cell = notebook
            .cell(cell_id)
            .cloned()
            .ok_or_else(|| RepositoryError::CellNotFound {
                notebook_id: notebook_id.to_string(),
                cell_id: cell_id.to_string(),
            })?;
        Ok((notebook, cell))
    }

    fn fetcher<'a>(&'a self, notebook: &'a Notebook) -> Fetcher<'a> {
        Fetcher::new(
            self.client.as_ref(),
            &notebook.connection,
            self.config.query_timeout(),
        )
    }
}

fn require_id(what: &str, id: &str) -> error::Result<()> {
    if id.trim().is_empty() {
        return Err(EngineError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(())
}
