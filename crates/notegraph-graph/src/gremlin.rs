//! Gremlin over HTTP, against a HugeGraph-compatible `/gremlin` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use notegraph_core::types::Properties;
use notegraph_core::{Connection, Edge, GraphObject, Path, PathStep, Vertex};

use crate::client::{GraphError, QueryClient, ResultSet};
use crate::queries::TraversalDialect;

/// Request payload for `POST /gremlin`.
#[derive(Debug, Serialize)]
struct GremlinRequest<'a> {
    gremlin: &'a str,
    bindings: serde_json::Map<String, Value>,
    language: &'static str,
    aliases: GremlinAliases,
}

#[derive(Debug, Serialize)]
struct GremlinAliases {
    graph: String,
    g: String,
}

#[derive(Debug, Deserialize)]
struct GremlinResponse {
    #[serde(default)]
    result: GremlinResultBody,
}

#[derive(Debug, Default, Deserialize)]
struct GremlinResultBody {
    #[serde(default)]
    data: Vec<Value>,
}

/// Stateless HTTP client; clone is cheap (inner Arc).
#[derive(Debug, Clone, Default)]
pub struct GremlinClient {
    http: reqwest::Client,
}

impl GremlinClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn endpoint(connection: &Connection) -> String {
        format!("{}/gremlin", connection.connection_uri.trim_end_matches('/'))
    }
}

#[async_trait]
impl QueryClient for GremlinClient {
    fn dialect(&self) -> TraversalDialect {
        TraversalDialect::Gremlin
    }

    async fn execute(
        &self,
        traversal: &str,
        connection: &Connection,
    ) -> Result<ResultSet, GraphError> {
        let body = GremlinRequest {
            gremlin: traversal,
            bindings: serde_json::Map::new(),
            language: "gremlin-groovy",
            aliases: GremlinAliases {
                graph: connection.graph_name.clone(),
                g: format!("__g_{}", connection.graph_name),
            },
        };

        tracing::debug!(graph = %connection.graph_name, gremlin = %traversal, "Executing traversal");

        let response = self
            .http
            .post(Self::endpoint(connection))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GraphError::Query(format!(
                "{status}: {}",
                error_message(&text)
            )));
        }

        let parsed: GremlinResponse = response.json().await?;
        let objects = parsed.result.data.into_iter().map(decode_object).collect();
        Ok(ResultSet::new(objects))
    }
}

/// Pull a human-readable message out of an error body, if it is JSON.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("exception"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Decode one element of `result.data`.
pub fn decode_object(value: Value) -> GraphObject {
    if let Some(vertex) = decode_vertex(&value) {
        return GraphObject::Vertex(vertex);
    }
    if let Some(edge) = decode_edge(&value) {
        return GraphObject::Edge(edge);
    }
    if let Some(objects) = value.get("objects").and_then(Value::as_array) {
        let steps = objects
            .iter()
            .map(|obj| {
                decode_vertex(obj)
                    .map(PathStep::Vertex)
                    .or_else(|| decode_edge(obj).map(PathStep::Edge))
                    .unwrap_or_else(|| PathStep::Other(obj.clone()))
            })
            .collect();
        return GraphObject::Path(Path::new(steps));
    }
    GraphObject::from_plain_value(value)
}

fn decode_vertex(value: &Value) -> Option<Vertex> {
    if value.get("type").and_then(Value::as_str) != Some("vertex") {
        return None;
    }
    Some(Vertex {
        id: id_string(value.get("id")?)?,
        label: label(value),
        properties: properties(value),
    })
}

fn decode_edge(value: &Value) -> Option<Edge> {
    if value.get("type").and_then(Value::as_str) != Some("edge") {
        return None;
    }
    Some(Edge {
        id: id_string(value.get("id")?)?,
        label: label(value),
        source: id_string(value.get("outV")?)?,
        target: id_string(value.get("inV")?)?,
        properties: properties(value),
    })
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn label(value: &Value) -> String {
    value
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// HugeGraph sends flat property maps; GraphSON-style servers send lists
/// of `{id, value}` per key. Both collapse to `key -> value`.
fn properties(value: &Value) -> Properties {
    let Some(map) = value.get("properties").and_then(Value::as_object) else {
        return Properties::new();
    };
    map.iter()
        .map(|(key, v)| {
            let flat = match v {
                Value::Array(items) => items
                    .first()
                    .and_then(|first| first.get("value"))
                    .cloned()
                    .unwrap_or_else(|| v.clone()),
                _ => v.clone(),
            };
            (key.clone(), flat)
        })
        .collect()
}
