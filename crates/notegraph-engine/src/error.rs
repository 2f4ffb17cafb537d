//! Error types for the notegraph-engine crate.

use thiserror::Error;

use notegraph_core::CellLanguage;

use crate::repository::RepositoryError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cell {cell_id} is a {found} cell, expected {expected}")]
    WrongLanguage {
        cell_id: String,
        expected: CellLanguage,
        found: CellLanguage,
    },

    #[error("Cell {cell_id} has no graph to expand; execute it first")]
    MissingGraph { cell_id: String },

    #[error("Vertex {vertex_id} is not part of the graph of cell {cell_id}")]
    VertexNotInGraph { cell_id: String, vertex_id: String },

    #[error("Graph error: {0}")]
    Graph(#[from] notegraph_graph::GraphError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// The caller sent something unusable; nothing was queried or persisted.
    pub fn is_client_error(&self) -> bool {
        match self {
            EngineError::InvalidArgument(_)
            | EngineError::WrongLanguage { .. }
            | EngineError::MissingGraph { .. }
            | EngineError::VertexNotInGraph { .. } => true,
            EngineError::Repository(e) => e.is_not_found(),
            EngineError::Graph(_) => false,
        }
    }

    /// The remote graph store failed or timed out.
    pub fn is_upstream(&self) -> bool {
        matches!(self, EngineError::Graph(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
