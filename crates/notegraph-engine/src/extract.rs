//! Graph extraction: the renderable vertex and edge sets of a result.
//!
//! Whatever kind of object a traversal yielded, the rendered graph is the
//! induced subgraph on the vertices the result touches. Missing halves are
//! fetched with batched lookups, so a result costs at most two round-trips
//! no matter how many objects it holds.

use std::collections::HashSet;

use notegraph_core::{Edge, GraphObject, ResultGraph, ResultType, Vertex};

use crate::error::Result;
use crate::fetch::Fetcher;

/// Derive the graph for a classified result.
///
/// Types without graph data yield an unset graph, never empty collections.
pub async fn extract(
    fetcher: &Fetcher<'_>,
    result_type: ResultType,
    objects: &[GraphObject],
) -> Result<ResultGraph> {
    let (vertices, edges) = match result_type {
        ResultType::Vertex => {
            let vertices: Vec<Vertex> =
                objects.iter().filter_map(|o| o.as_vertex().cloned()).collect();
            let edges = induced_edges(fetcher, &vertices).await?;
            (vertices, edges)
        }
        ResultType::Edge => {
            let edges: Vec<Edge> = objects.iter().filter_map(|o| o.as_edge().cloned()).collect();
            let vertices = vertices_from_edges(fetcher, &edges).await?;
            (vertices, edges)
        }
        ResultType::Path => {
            let vertices = vertices_from_paths(fetcher, objects).await?;
            let edges = induced_edges(fetcher, &vertices).await?;
            (vertices, edges)
        }
        ResultType::Number
        | ResultType::Markdown
        | ResultType::Empty
        | ResultType::Other => return Ok(ResultGraph::default()),
    };

    tracing::debug!(
        result_type = ?result_type,
        vertices = vertices.len(),
        edges = edges.len(),
        "Extracted result graph"
    );
    Ok(ResultGraph::new(Some(vertices), Some(edges)))
}

/// Source and target ids of `edges`, first-seen order, no repeats.
pub fn endpoint_ids<'e>(edges: impl IntoIterator<Item = &'e Edge>) -> Vec<String> {
    unique_ids(edges.into_iter().flat_map(|e| [e.source.as_str(), e.target.as_str()]))
}

/// Fetch every vertex the edges reference in one lookup.
pub async fn vertices_from_edges(fetcher: &Fetcher<'_>, edges: &[Edge]) -> Result<Vec<Vertex>> {
    fetcher.vertices_by_ids(&endpoint_ids(edges)).await
}

/// Edges with both endpoints inside `vertices`, each once.
pub async fn induced_edges(fetcher: &Fetcher<'_>, vertices: &[Vertex]) -> Result<Vec<Edge>> {
    let ids = unique_ids(vertices.iter().map(|v| v.id.as_str()));
    let members: HashSet<&str> = ids.iter().map(String::as_str).collect();

    let incident = fetcher.incident_edges(&ids).await?;
    Ok(incident
        .into_iter()
        .filter(|e| members.contains(e.source.as_str()) && members.contains(e.target.as_str()))
        .collect())
}

/// Fetch every vertex referenced by the path objects in one lookup. Vertex
/// steps and both endpoints of edge steps count; non-path objects are skipped.
pub async fn vertices_from_paths(
    fetcher: &Fetcher<'_>,
    objects: &[GraphObject],
) -> Result<Vec<Vertex>> {
    let ids = unique_ids(
        objects
            .iter()
            .filter_map(|o| match o {
                GraphObject::Path(p) => Some(p.referenced_vertex_ids()),
                _ => None,
            })
            .flatten(),
    );
    fetcher.vertices_by_ids(&ids).await
}

fn unique_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
