//! Neighborhood expansion of an already rendered vertex.
//!
//! Expansion fetches the incident edges of one vertex, keeps only elements
//! the cell graph does not hold yet, and produces two distinct things:
//! the augmented persisted graph ([`Expansion::commit`]) and a separate
//! delta result for the caller ([`Expansion::into_result`]).

use notegraph_core::{Cell, Edge, ExpansionVertexSource, QueryResult, ResultType, Vertex};

use crate::accumulate::{merge, Frontier};
use crate::error::{EngineError, Result};
use crate::extract::endpoint_ids;
use crate::fetch::{keep_edges, Fetcher};

/// Elements an expansion found that the cell graph did not contain.
#[derive(Debug, Clone)]
pub struct Expansion {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    /// JSON of every object the incident-edge query returned, in order.
    pub data: Vec<serde_json::Value>,
}

/// Validate that `cell` can expand `vertex_id` and return its result.
///
/// Runs before any query is issued.
pub fn check_preconditions<'c>(
    cell: &'c Cell,
    vertex_id: &str,
    fetcher: &Fetcher<'_>,
) -> Result<&'c QueryResult> {
    let expected = fetcher.dialect().language();
    if cell.language != expected {
        return Err(EngineError::WrongLanguage {
            cell_id: cell.id.clone(),
            expected,
            found: cell.language,
        });
    }
    let result = cell
        .result
        .as_ref()
        .filter(|r| r.graph.vertices().is_some())
        .ok_or_else(|| EngineError::MissingGraph {
            cell_id: cell.id.clone(),
        })?;
    if !Frontier::of(&result.graph).contains_vertex(vertex_id) {
        return Err(EngineError::VertexNotInGraph {
            cell_id: cell.id.clone(),
            vertex_id: vertex_id.to_string(),
        });
    }
    Ok(result)
}

/// Fetch the neighborhood of `vertex_id` and compute what is new relative
/// to `current`. Nothing is mutated.
pub async fn expand(
    fetcher: &Fetcher<'_>,
    current: &QueryResult,
    vertex_id: &str,
    source: ExpansionVertexSource,
) -> Result<Expansion> {
    let mut frontier = Frontier::of(&current.graph);

    let fetched = fetcher.vertex_edges(vertex_id).await?;
    let data: Vec<serde_json::Value> = fetched.iter().map(|o| o.to_json()).collect();
    let fetched_edges = keep_edges(fetched);

    let mut edges = Vec::new();
    for edge in &fetched_edges {
        if frontier.admit_edge(edge) {
            edges.push(edge.clone());
        }
    }

    let known_edges = current.graph.edges().unwrap_or_default();
    let candidate_ids: Vec<String> = match source {
        ExpansionVertexSource::KnownEdges => endpoint_ids(known_edges),
        ExpansionVertexSource::KnownAndFetchedEdges => {
            endpoint_ids(known_edges.iter().chain(&fetched_edges))
        }
    }
    .into_iter()
    .filter(|id| !frontier.contains_vertex(id))
    .collect();

    let vertices: Vec<Vertex> = fetcher
        .vertices_by_ids(&candidate_ids)
        .await?
        .into_iter()
        .filter(|v| frontier.admit_vertex(v))
        .collect();

    tracing::debug!(
        vertex_id,
        fetched = fetched_edges.len(),
        new_vertices = vertices.len(),
        new_edges = edges.len(),
        "Computed expansion delta"
    );
    Ok(Expansion {
        vertices,
        edges,
        data,
    })
}

impl Expansion {
    /// Union the delta into the persisted result's graph. The result keeps
    /// its id, type and data.
    pub fn commit(&self, persisted: &mut QueryResult) {
        persisted.graph = merge(
            &persisted.graph,
            Some(self.vertices.clone()),
            Some(self.edges.clone()),
        );
    }

    /// A fresh result holding only the delta.
    pub fn into_result(self, duration_ms: u64) -> QueryResult {
        let mut result = QueryResult::new().with_type(ResultType::Edge);
        result.data = Some(self.data);
        result.duration = Some(duration_ms);
        result.graph.set_vertices(Some(self.vertices));
        result.graph.set_edges(Some(self.edges));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use notegraph_core::{CellLanguage, Connection, Element, ResultGraph};
    use notegraph_graph::MemoryGraphClient;

    fn conn() -> Connection {
        Connection {
            id: "c".into(),
            name: "local".into(),
            graph_name: "g".into(),
            connection_uri: "memory://".into(),
        }
    }

    /// Store holds V-W and V-X; the cell has only seen V, W and V-W.
    fn setup() -> (MemoryGraphClient, Cell) {
        let client = MemoryGraphClient::new();
        for id in ["V", "W", "X"] {
            client.add_vertex("g", Vertex::new(id, "node"));
        }
        client.add_edge("g", Edge::new("VW", "link", "V", "W"));
        client.add_edge("g", Edge::new("VX", "link", "V", "X"));

        let mut result = QueryResult::new().with_type(ResultType::Vertex);
        result.graph = ResultGraph::new(
            Some(vec![Vertex::new("V", "node"), Vertex::new("W", "node")]),
            Some(vec![Edge::new("VW", "link", "V", "W")]),
        );
        let mut cell = Cell::new("cell", CellLanguage::Gremlin, "g.V('V','W')");
        cell.result = Some(result);
        (client, cell)
    }

    fn ids<T: Element>(items: &[T]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    #[tokio::test]
    async fn delta_holds_only_unseen_elements() {
        let (client, cell) = setup();
        let c = conn();
        let fetcher = Fetcher::new(&client, &c, Duration::from_secs(5));
        let current = check_preconditions(&cell, "V", &fetcher).unwrap();

        let expansion = expand(&fetcher, current, "V", ExpansionVertexSource::KnownAndFetchedEdges)
            .await
            .unwrap();

        assert_eq!(ids(&expansion.vertices), vec!["X"]);
        assert_eq!(ids(&expansion.edges), vec!["VX"]);
        assert_eq!(expansion.data.len(), 2);
        assert_eq!(
            client.history(),
            vec!["g.V('V').bothE()".to_string(), r#"g.V("X")"#.to_string()]
        );
    }

    #[tokio::test]
    async fn known_edges_source_skips_fetched_endpoints() {
        let (client, cell) = setup();
        let c = conn();
        let fetcher = Fetcher::new(&client, &c, Duration::from_secs(5));
        let current = check_preconditions(&cell, "V", &fetcher).unwrap();

        let expansion = expand(&fetcher, current, "V", ExpansionVertexSource::KnownEdges)
            .await
            .unwrap();

        assert!(expansion.vertices.is_empty());
        assert_eq!(ids(&expansion.edges), vec!["VX"]);
        // Known edge endpoints are all rendered already, so no lookup is issued.
        assert_eq!(client.query_count(), 1);
    }

    #[tokio::test]
    async fn commit_keeps_identity_and_unions_graph() {
        let (client, cell) = setup();
        let c = conn();
        let fetcher = Fetcher::new(&client, &c, Duration::from_secs(5));
        let mut persisted = check_preconditions(&cell, "V", &fetcher).unwrap().clone();
        let original_id = persisted.id.clone();

        let expansion = expand(&fetcher, &persisted, "V", ExpansionVertexSource::default())
            .await
            .unwrap();
        expansion.commit(&mut persisted);
        let delta = expansion.into_result(7);

        assert_eq!(persisted.id, original_id);
        assert_eq!(persisted.result_type, Some(ResultType::Vertex));
        assert_eq!(ids(persisted.graph.vertices().unwrap()), vec!["V", "W", "X"]);
        assert_eq!(ids(persisted.graph.edges().unwrap()), vec!["VW", "VX"]);

        assert_ne!(delta.id, original_id);
        assert_eq!(delta.result_type, Some(ResultType::Edge));
        assert_eq!(delta.duration, Some(7));
        assert_eq!(ids(delta.graph.vertices().unwrap()), vec!["X"]);
    }

    #[tokio::test]
    async fn preconditions_reject_unknown_vertex_and_missing_graph() {
        let (client, mut cell) = setup();
        let c = conn();
        let fetcher = Fetcher::new(&client, &c, Duration::from_secs(5));

        let err = check_preconditions(&cell, "X", &fetcher).unwrap_err();
        assert!(matches!(err, EngineError::VertexNotInGraph { .. }));

        cell.result.as_mut().unwrap().graph = ResultGraph::default();
        let err = check_preconditions(&cell, "V", &fetcher).unwrap_err();
        assert!(matches!(err, EngineError::MissingGraph { .. }));

        cell.result = None;
        let err = check_preconditions(&cell, "V", &fetcher).unwrap_err();
        assert!(matches!(err, EngineError::MissingGraph { .. }));

        cell.language = CellLanguage::Markdown;
        let err = check_preconditions(&cell, "V", &fetcher).unwrap_err();
        assert!(matches!(err, EngineError::WrongLanguage { .. }));
        assert_eq!(client.query_count(), 0);
    }
}
