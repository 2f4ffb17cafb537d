//! The remote query capability and shared client configuration.

use async_trait::async_trait;
use serde::Deserialize;

use notegraph_core::{Connection, GraphObject};

use crate::queries::TraversalDialect;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph connection error: {0}")]
    Connection(String),

    #[error("Traversal failed: {0}")]
    Query(String),

    #[error("Traversal exceeded its {millis}ms deadline")]
    Timeout { millis: u64 },

    #[error("Graph not found: {graph}")]
    GraphNotFound { graph: String },

    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode traversal output: {0}")]
    Decode(String),
}

impl GraphError {
    /// Whether retrying the same traversal later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GraphError::Connection(_) | GraphError::Timeout { .. } => true,
            GraphError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// Which backend serves traversals.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    /// Gremlin over HTTP (HugeGraph-compatible `/gremlin` endpoint).
    #[default]
    Gremlin,
    /// Cypher over Bolt.
    Neo4j,
    /// In-process graph loaded from a JSON fixture.
    Memory,
}

/// Client configuration (`[graph]` section).
///
/// Connection targets (URI, graph name) come from each notebook's
/// [`Connection`]; this carries what is shared across connections.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub backend: GraphBackend,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
    /// JSON fixture for the memory backend.
    #[serde(default)]
    pub memory_fixture: Option<String>,
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "notegraph-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::default(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
            memory_fixture: None,
        }
    }
}

/// The objects yielded by one traversal, in query output order.
///
/// Forward-only: consumers get exactly one pass. Backends materialize the
/// wire response before handing it over, so callers needing several passes
/// collect it once into a `Vec`.
#[derive(Debug)]
pub struct ResultSet {
    objects: std::vec::IntoIter<GraphObject>,
}

impl ResultSet {
    pub fn new(objects: Vec<GraphObject>) -> Self {
        Self {
            objects: objects.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Objects not yet consumed.
    pub fn remaining(&self) -> usize {
        self.objects.len()
    }
}

impl Iterator for ResultSet {
    type Item = GraphObject;

    fn next(&mut self) -> Option<Self::Item> {
        self.objects.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.objects.size_hint()
    }
}

/// Executes opaque traversal strings against a named graph.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// The traversal language this client speaks.
    fn dialect(&self) -> TraversalDialect;

    /// Run `traversal` against the graph `connection` points at.
    async fn execute(&self, traversal: &str, connection: &Connection)
        -> Result<ResultSet, GraphError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.backend, GraphBackend::Gremlin);
        assert_eq!(config.max_connections, 16);
        assert!(config.memory_fixture.is_none());
    }

    #[test]
    fn result_set_is_single_pass() {
        let mut rs = ResultSet::new(vec![GraphObject::Integer(1), GraphObject::Integer(2)]);
        assert_eq!(rs.remaining(), 2);
        assert_eq!(rs.next(), Some(GraphObject::Integer(1)));
        let rest: Vec<_> = rs.by_ref().collect();
        assert_eq!(rest, vec![GraphObject::Integer(2)]);
        assert_eq!(rs.next(), None);
    }

    #[test]
    fn timeouts_are_transient() {
        assert!(GraphError::Timeout { millis: 10 }.is_transient());
        assert!(!GraphError::Query("bad".into()).is_transient());
    }
}
