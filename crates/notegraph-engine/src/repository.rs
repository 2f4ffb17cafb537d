//! Notebook storage: trait + file-backed and in-memory implementations.
//!
//! Notebooks are stored whole, one pretty-printed JSON document per notebook:
//! ```text
//! {root}/
//!   {notebook_id}.json
//! ```
//! Cell-level operations load the notebook, replace the cell by id, and
//! write the notebook back. Callers serialize writers per cell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use notegraph_core::{Cell, Notebook};

/// Errors that can occur during notebook storage operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Notebook not found: {notebook_id}")]
    NotebookNotFound { notebook_id: String },

    #[error("Cell {cell_id} not found in notebook {notebook_id}")]
    CellNotFound { notebook_id: String, cell_id: String },

    #[error("Invalid notebook id: {0:?}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepositoryError::NotebookNotFound { .. }
                | RepositoryError::CellNotFound { .. }
                | RepositoryError::InvalidId(_)
        )
    }
}

/// Persistence backend for notebooks and their cells.
#[async_trait]
pub trait NotebookRepository: Send + Sync {
    async fn load_notebook(&self, notebook_id: &str) -> Result<Notebook, RepositoryError>;

    /// Store a notebook, replacing any previous version with the same id.
    async fn save_notebook(&self, notebook: &Notebook) -> Result<(), RepositoryError>;

    async fn load_cell(&self, notebook_id: &str, cell_id: &str) -> Result<Cell, RepositoryError> {
        let notebook = self.load_notebook(notebook_id).await?;
        notebook
            .cell(cell_id)
            .cloned()
            .ok_or_else(|| RepositoryError::CellNotFound {
                notebook_id: notebook_id.to_string(),
                cell_id: cell_id.to_string(),
            })
    }

    /// Replace the cell with the same id. The cell must already exist.
    async fn save_cell(&self, notebook_id: &str, cell: &Cell) -> Result<(), RepositoryError> {
        let mut notebook = self.load_notebook(notebook_id).await?;
        let slot = notebook
            .cell_mut(&cell.id)
            .ok_or_else(|| RepositoryError::CellNotFound {
                notebook_id: notebook_id.to_string(),
                cell_id: cell.id.clone(),
            })?;
        *slot = cell.clone();
        self.save_notebook(&notebook).await
    }
}

// ── In-memory ─────────────────────────────────────────────────────

/// Process-local repository, used by tests and the fixture-backed CLI mode.
#[derive(Default)]
pub struct MemoryNotebookRepository {
    notebooks: RwLock<HashMap<String, Notebook>>,
}

impl MemoryNotebookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notebook(self, notebook: Notebook) -> Self {
        self.notebooks.write().insert(notebook.id.clone(), notebook);
        self
    }
}

#[async_trait]
impl NotebookRepository for MemoryNotebookRepository {
    async fn load_notebook(&self, notebook_id: &str) -> Result<Notebook, RepositoryError> {
        self.notebooks
            .read()
            .get(notebook_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotebookNotFound {
                notebook_id: notebook_id.to_string(),
            })
    }

    async fn save_notebook(&self, notebook: &Notebook) -> Result<(), RepositoryError> {
        self.notebooks
            .write()
            .insert(notebook.id.clone(), notebook.clone());
        Ok(())
    }
}

// ── File-backed ───────────────────────────────────────────────────

/// File-system backed repository rooted at a notebooks directory.
pub struct FileNotebookRepository {
    root: PathBuf,
}

impl FileNotebookRepository {
    /// Create a repository rooted at the given directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn notebook_path(&self, notebook_id: &str) -> Result<PathBuf, RepositoryError> {
        let valid = !notebook_id.is_empty()
            && notebook_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepositoryError::InvalidId(notebook_id.to_string()));
        }
        Ok(self.root.join(format!("{notebook_id}.json")))
    }
}

#[async_trait]
impl NotebookRepository for FileNotebookRepository {
    async fn load_notebook(&self, notebook_id: &str) -> Result<Notebook, RepositoryError> {
        let path = self.notebook_path(notebook_id)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::NotebookNotFound {
                    notebook_id: notebook_id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&json)?)
    }

    async fn save_notebook(&self, notebook: &Notebook) -> Result<(), RepositoryError> {
        let path = self.notebook_path(&notebook.id)?;
        let json = serde_json::to_string_pretty(notebook)?;

        // Write then rename so readers never see a torn file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::debug!(
            notebook_id = %notebook.id,
            cells = notebook.cells.len(),
            path = %path.display(),
            "Notebook saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_core::{CellLanguage, Connection, QueryResult, ResultType};
    use tempfile::TempDir;

    fn notebook() -> Notebook {
        Notebook {
            id: "nb-1".to_string(),
            name: "people".to_string(),
            connection: Connection {
                id: "c1".to_string(),
                name: "local".to_string(),
                graph_name: "hugegraph".to_string(),
                connection_uri: "http://localhost:8080".to_string(),
            },
            cells: vec![
                Cell::new("cell-1", CellLanguage::Gremlin, "g.V()"),
                Cell::new("cell-2", CellLanguage::Markdown, "# notes"),
            ],
        }
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let tmp = TempDir::new().unwrap();
        let repo = FileNotebookRepository::new(tmp.path().join("notebooks")).unwrap();
        repo.save_notebook(&notebook()).await.unwrap();

        let loaded = repo.load_notebook("nb-1").await.unwrap();
        assert_eq!(loaded.name, "people");
        assert_eq!(loaded.cells.len(), 2);
        assert!(tmp.path().join("notebooks/nb-1.json").exists());
    }

    #[tokio::test]
    async fn test_save_cell_replaces_in_place() {
        let tmp = TempDir::new().unwrap();
        let repo = FileNotebookRepository::new(tmp.path()).unwrap();
        repo.save_notebook(&notebook()).await.unwrap();

        let mut cell = repo.load_cell("nb-1", "cell-1").await.unwrap();
        cell.result = Some(QueryResult::new().with_type(ResultType::Empty));
        repo.save_cell("nb-1", &cell).await.unwrap();

        let loaded = repo.load_notebook("nb-1").await.unwrap();
        assert_eq!(loaded.cells[0].id, "cell-1");
        assert_eq!(
            loaded.cells[0].result.as_ref().and_then(|r| r.result_type),
            Some(ResultType::Empty)
        );
        assert!(loaded.cells[1].result.is_none());
    }

    #[tokio::test]
    async fn test_missing_notebook_and_cell() {
        let tmp = TempDir::new().unwrap();
        let repo = FileNotebookRepository::new(tmp.path()).unwrap();
        let err = repo.load_notebook("nope").await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotebookNotFound { .. }));

        repo.save_notebook(&notebook()).await.unwrap();
        let err = repo.load_cell("nb-1", "cell-9").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_path_traversal_ids_rejected() {
        let tmp = TempDir::new().unwrap();
        let repo = FileNotebookRepository::new(tmp.path()).unwrap();
        let err = repo.load_notebook("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidId(_)));
    }

    #[tokio::test]
    async fn test_memory_repository() {
        let repo = MemoryNotebookRepository::new().with_notebook(notebook());
        let mut cell = repo.load_cell("nb-1", "cell-2").await.unwrap();
        cell.code = "# edited".to_string();
        repo.save_cell("nb-1", &cell).await.unwrap();
        assert_eq!(repo.load_cell("nb-1", "cell-2").await.unwrap().code, "# edited");

        let missing = Cell::new("cell-x", CellLanguage::Gremlin, "g.V()");
        assert!(repo.save_cell("nb-1", &missing).await.is_err());
    }
}
