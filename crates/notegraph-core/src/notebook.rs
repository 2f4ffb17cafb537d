//! Notebook, cell, and query result types.
//!
//! A [`QueryResult`] is the durable graph state of a cell: it is created once
//! per execution and its `graph` is later augmented in place by neighborhood
//! expansion. Its wire form is shared with the UI, so field names and the
//! `null`-versus-empty distinction of the graph collections are stable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{dedup_by_id, Edge, Vertex};

// ── Connections & Notebooks ───────────────────────────────────────

/// A named graph database a notebook's traversals run against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Connection {
    pub id: String,
    pub name: String,
    /// Graph (or database) name inside the remote store.
    pub graph_name: String,
    /// Base URI of the remote store, e.g. `http://localhost:8080`.
    pub connection_uri: String,
}

/// A notebook: an ordered list of cells bound to one connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub name: String,
    pub connection: Connection,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Notebook {
    pub fn cell(&self, cell_id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == cell_id)
    }

    pub fn cell_mut(&mut self, cell_id: &str) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == cell_id)
    }
}

// ── Cells ─────────────────────────────────────────────────────────

/// Source language of a cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CellLanguage {
    Gremlin,
    Cypher,
    Markdown,
}

impl CellLanguage {
    /// Whether cells in this language are sent to the remote store.
    pub fn is_traversal(&self) -> bool {
        !matches!(self, CellLanguage::Markdown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellLanguage::Gremlin => "gremlin",
            CellLanguage::Cypher => "cypher",
            CellLanguage::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for CellLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notebook cell and its last computed result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: String,
    pub code: String,
    pub language: CellLanguage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResult>,
}

impl Cell {
    pub fn new(id: impl Into<String>, language: CellLanguage, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            language,
            result: None,
        }
    }
}

// ── Results ───────────────────────────────────────────────────────

/// Semantic tag of a query result, decided by its first element.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultType {
    Vertex,
    Edge,
    Path,
    Number,
    Markdown,
    Empty,
    Other,
}

impl ResultType {
    /// Whether a result of this type carries renderable graph data.
    pub fn has_graph(&self) -> bool {
        matches!(self, ResultType::Vertex | ResultType::Edge | ResultType::Path)
    }
}

/// The vertex and edge sets rendered for a result.
///
/// `None` means "no applicable graph" and is distinct from an empty set.
/// Both setters de-duplicate by id, keeping the first-seen element.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResultGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vertices: Option<Vec<Vertex>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edges: Option<Vec<Edge>>,
}

impl ResultGraph {
    pub fn new(vertices: Option<Vec<Vertex>>, edges: Option<Vec<Edge>>) -> Self {
        let mut graph = Self::default();
        graph.set_vertices(vertices);
        graph.set_edges(edges);
        graph
    }

    pub fn vertices(&self) -> Option<&[Vertex]> {
        self.vertices.as_deref()
    }

    pub fn edges(&self) -> Option<&[Edge]> {
        self.edges.as_deref()
    }

    pub fn set_vertices(&mut self, vertices: Option<Vec<Vertex>>) {
        self.vertices = vertices.map(dedup_by_id);
    }

    pub fn set_edges(&mut self, edges: Option<Vec<Edge>>) {
        self.edges = edges.map(dedup_by_id);
    }

    /// True when neither collection is set.
    pub fn is_unset(&self) -> bool {
        self.vertices.is_none() && self.edges.is_none()
    }
}

/// The outcome of one query execution (or one expansion delta).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    pub id: String,
    #[serde(default)]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(rename = "type", default)]
    pub result_type: Option<ResultType>,
    /// Wall-clock milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default)]
    pub graph: ResultGraph,
}

impl QueryResult {
    /// A fresh result with a newly generated id and no graph data.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data: None,
            result_type: None,
            duration: None,
            graph: ResultGraph::default(),
        }
    }

    pub fn with_type(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(result_type);
        self
    }
}

impl Default for QueryResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_type_serializes_by_name() {
        let json = serde_json::to_string(&ResultType::Markdown).unwrap();
        assert_eq!(json, "\"MARKDOWN\"");
        let parsed: ResultType = serde_json::from_str("\"PATH\"").unwrap();
        assert_eq!(parsed, ResultType::Path);
        assert!(parsed.has_graph());
        assert!(!ResultType::Other.has_graph());
    }

    #[test]
    fn unset_graph_collections_are_absent_on_the_wire() {
        let result = QueryResult::new().with_type(ResultType::Number);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "NUMBER");
        assert!(value["graph"].get("vertices").is_none());
        assert!(value["graph"].get("edges").is_none());
    }

    #[test]
    fn empty_graph_collections_stay_empty_not_null() {
        let mut result = QueryResult::new();
        result.graph = ResultGraph::new(Some(Vec::new()), Some(Vec::new()));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["graph"]["vertices"], json!([]));

        let back: QueryResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.graph.vertices(), Some(&[][..]));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let value = json!({
            "id": "r-1",
            "data": [1],
            "type": "NUMBER",
            "duration": 12,
            "graph": {"layout": "force"},
            "renderHints": {"color": "red"}
        });
        let result: QueryResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.id, "r-1");
        assert_eq!(result.duration, Some(12));
        assert!(result.graph.is_unset());
    }

    #[test]
    fn graph_setters_deduplicate_first_seen() {
        let graph = ResultGraph::new(
            Some(vec![
                Vertex::new("v1", "person").with_property("name", json!("x")),
                Vertex::new("v1", "person").with_property("name", json!("y")),
            ]),
            None,
        );
        let vertices = graph.vertices().unwrap();
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].properties["name"], "x");
        assert!(graph.edges().is_none());
    }

    #[test]
    fn cell_language_round_trip() {
        let cell = Cell::new("c1", CellLanguage::Gremlin, "g.V()");
        let value = serde_json::to_value(&cell).unwrap();
        assert_eq!(value["language"], "gremlin");
        assert!(CellLanguage::Cypher.is_traversal());
        assert!(!CellLanguage::Markdown.is_traversal());
    }
}
