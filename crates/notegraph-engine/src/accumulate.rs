//! De-duplicating graph accumulation.
//!
//! Merging only decides set membership by id. Elements are never modified,
//! and when two share an id the one seen first stays.

use std::collections::HashSet;

use notegraph_core::{Edge, ResultGraph, Vertex};

/// Fold candidate elements into `existing`.
///
/// A `None` candidate set means "nothing new of this kind": the existing
/// collection is kept as it is, including when it is itself unset.
pub fn merge(
    existing: &ResultGraph,
    candidate_vertices: Option<Vec<Vertex>>,
    candidate_edges: Option<Vec<Edge>>,
) -> ResultGraph {
    ResultGraph::new(
        union(existing.vertices(), candidate_vertices),
        union(existing.edges(), candidate_edges),
    )
}

fn union<T: Clone>(existing: Option<&[T]>, candidates: Option<Vec<T>>) -> Option<Vec<T>> {
    match (existing, candidates) {
        (existing, None) => existing.map(<[T]>::to_vec),
        (None, Some(new)) => Some(new),
        (Some(old), Some(new)) => Some(old.iter().cloned().chain(new).collect()),
    }
}

/// Ids already present in a cell graph.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    vertex_ids: HashSet<String>,
    edge_ids: HashSet<String>,
}

impl Frontier {
    pub fn of(graph: &ResultGraph) -> Self {
        Self {
            vertex_ids: graph
                .vertices()
                .unwrap_or_default()
                .iter()
                .map(|v| v.id.clone())
                .collect(),
            edge_ids: graph
                .edges()
                .unwrap_or_default()
                .iter()
                .map(|e| e.id.clone())
                .collect(),
        }
    }

    pub fn contains_vertex(&self, id: &str) -> bool {
        self.vertex_ids.contains(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_ids.contains(id)
    }

    /// Record a vertex; true if it was not seen before.
    pub fn admit_vertex(&mut self, vertex: &Vertex) -> bool {
        self.vertex_ids.insert(vertex.id.clone())
    }

    /// Record an edge; true if it was not seen before.
    pub fn admit_edge(&mut self, edge: &Edge) -> bool {
        self.edge_ids.insert(edge.id.clone())
    }
}
