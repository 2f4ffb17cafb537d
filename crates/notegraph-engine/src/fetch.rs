//! Remote round-trips through the query client.
//!
//! Every traversal runs under the configured deadline and is materialized
//! once into an ordered `Vec`. The batched lookups take a whole id set so
//! extraction costs a constant number of round-trips per result.

use std::time::{Duration, Instant};

use notegraph_core::{Connection, Edge, GraphObject, Vertex};
use notegraph_graph::{GraphError, QueryClient, TraversalDialect};

use crate::error::Result;

/// Issues traversals for one notebook connection.
pub struct Fetcher<'a> {
    client: &'a dyn QueryClient,
    connection: &'a Connection,
    timeout: Duration,
}

impl<'a> Fetcher<'a> {
    pub fn new(client: &'a dyn QueryClient, connection: &'a Connection, timeout: Duration) -> Self {
        Self {
            client,
            connection,
            timeout,
        }
    }

    pub fn dialect(&self) -> TraversalDialect {
        self.client.dialect()
    }

    /// Execute `traversal` and collect its output in query order.
    pub async fn run(&self, traversal: &str) -> Result<Vec<GraphObject>> {
        let start = Instant::now();
        let result_set = tokio::time::timeout(
            self.timeout,
            self.client.execute(traversal, self.connection),
        )
        .await
        .map_err(|_| GraphError::Timeout {
            millis: self.timeout.as_millis() as u64,
        })??;

        let objects: Vec<GraphObject> = result_set.collect();
        tracing::debug!(
            graph = %self.connection.graph_name,
            traversal,
            objects = objects.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Traversal completed"
        );
        Ok(objects)
    }

    /// Fetch vertices by id in one lookup. An empty id set issues no query.
    pub async fn vertices_by_ids(&self, ids: &[String]) -> Result<Vec<Vertex>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let objects = self.run(&self.dialect().vertices_by_ids(ids)).await?;
        Ok(keep_vertices(objects))
    }

    /// Incident edges of a vertex set, each edge once. An empty id set
    /// issues no query.
    pub async fn incident_edges(&self, ids: &[String]) -> Result<Vec<Edge>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let objects = self.run(&self.dialect().incident_edges(ids)).await?;
        Ok(keep_edges(objects))
    }

    /// Raw output of the both-direction incident edge query for one vertex.
    pub async fn vertex_edges(&self, id: &str) -> Result<Vec<GraphObject>> {
        self.run(&self.dialect().vertex_edges(id)).await
    }
}

fn keep_vertices(objects: Vec<GraphObject>) -> Vec<Vertex> {
    let total = objects.len();
    let vertices: Vec<Vertex> = objects
        .into_iter()
        .filter_map(|o| match o {
            GraphObject::Vertex(v) => Some(v),
            _ => None,
        })
        .collect();
    if vertices.len() < total {
        tracing::warn!(dropped = total - vertices.len(), "Vertex lookup returned non-vertex objects");
    }
    vertices
}

pub(crate) fn keep_edges(objects: Vec<GraphObject>) -> Vec<Edge> {
    let total = objects.len();
    let edges: Vec<Edge> = objects
        .into_iter()
        .filter_map(|o| match o {
            GraphObject::Edge(e) => Some(e),
            _ => None,
        })
        .collect();
    if edges.len() < total {
        tracing::warn!(dropped = total - edges.len(), "Edge lookup returned non-edge objects");
    }
    edges
}
