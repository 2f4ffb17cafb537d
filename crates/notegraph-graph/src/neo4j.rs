//! Neo4j connection management and Cypher execution.
//!
//! Cypher cells must return the objects to render under the `result`
//! column (`RETURN n AS result`); rows without it decode as opaque nulls.
//! Vertex and edge identities are Neo4j's internal integer ids.

use std::collections::HashMap;

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Row};
use tokio::sync::Mutex;

use notegraph_core::types::Properties;
use notegraph_core::{Connection, Edge, GraphObject, Path, PathStep, Vertex};

use crate::client::{GraphConfig, GraphError, QueryClient, ResultSet};
use crate::queries::{TraversalDialect, CYPHER_RESULT_COLUMN};

/// Thread-safe Neo4j client with one connection pool per notebook connection.
pub struct Neo4jClient {
    config: GraphConfig,
    pools: Mutex<HashMap<String, Graph>>,
}

impl Neo4jClient {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            config,
            pools: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or open) the pool serving `connection`.
    async fn graph_for(&self, connection: &Connection) -> Result<Graph, GraphError> {
        let key = format!("{}#{}", connection.connection_uri, connection.graph_name);
        let mut pools = self.pools.lock().await;
        if let Some(graph) = pools.get(&key) {
            return Ok(graph.clone());
        }

        let neo_config = ConfigBuilder::default()
            .uri(connection.connection_uri.as_str())
            .user(self.config.user.as_str())
            .password(self.config.password.as_str())
            .db(connection.graph_name.as_str())
            .max_connections(self.config.max_connections as usize)
            .fetch_size(self.config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %connection.connection_uri, db = %connection.graph_name, "Connected to Neo4j");
        pools.insert(key, graph.clone());
        Ok(graph)
    }
}

#[async_trait]
impl QueryClient for Neo4jClient {
    fn dialect(&self) -> TraversalDialect {
        TraversalDialect::Cypher
    }

    async fn execute(
        &self,
        traversal: &str,
        connection: &Connection,
    ) -> Result<ResultSet, GraphError> {
        let graph = self.graph_for(connection).await?;
        tracing::debug!(db = %connection.graph_name, cypher = %traversal, "Executing traversal");

        let mut stream = graph.execute(query(traversal)).await?;
        let mut objects = Vec::new();
        while let Some(row) = stream.next().await? {
            objects.push(row_to_object(&row));
        }
        Ok(ResultSet::new(objects))
    }
}

/// Convert the `result` column of a row into a graph object.
fn row_to_object(row: &Row) -> GraphObject {
    if let Ok(node) = row.get::<neo4rs::Node>(CYPHER_RESULT_COLUMN) {
        return GraphObject::Vertex(node_to_vertex(&node));
    }
    if let Ok(rel) = row.get::<neo4rs::Relation>(CYPHER_RESULT_COLUMN) {
        return GraphObject::Edge(relation_to_edge(&rel));
    }
    if let Ok(path) = row.get::<neo4rs::Path>(CYPHER_RESULT_COLUMN) {
        return GraphObject::Path(path_to_path(&path));
    }
    if let Ok(n) = row.get::<i64>(CYPHER_RESULT_COLUMN) {
        return GraphObject::Integer(n);
    }
    match row.get::<serde_json::Value>(CYPHER_RESULT_COLUMN) {
        Ok(value) => GraphObject::from_plain_value(value),
        Err(e) => {
            tracing::warn!(error = %e, "Row has no decodable result column");
            GraphObject::Opaque(serde_json::Value::Null)
        }
    }
}

fn node_to_vertex(node: &neo4rs::Node) -> Vertex {
    let mut properties = Properties::new();
    for key in node.keys() {
        if let Ok(v) = node.get::<serde_json::Value>(&key) {
            properties.insert(key.to_string(), v);
        }
    }
    Vertex {
        id: node.id().to_string(),
        label: node
            .labels()
            .first()
            .map(|l| l.to_string())
            .unwrap_or_default(),
        properties,
    }
}

fn relation_to_edge(rel: &neo4rs::Relation) -> Edge {
    let mut properties = Properties::new();
    for key in rel.keys() {
        if let Ok(v) = rel.get::<serde_json::Value>(&key) {
            properties.insert(key.to_string(), v);
        }
    }
    Edge {
        id: rel.id().to_string(),
        label: rel.typ().to_string(),
        source: rel.start_node_id().to_string(),
        target: rel.end_node_id().to_string(),
        properties,
    }
}

/// Path relationships carry no endpoints of their own; each is placed
/// between the nodes on either side of it in walk order. A relationship
/// walked against its direction therefore comes out reversed: the driver
/// does not expose the direction of path segments.
fn path_to_path(path: &neo4rs::Path) -> Path {
    let nodes = path.nodes();
    let rels = path.rels();
    let mut steps = Vec::with_capacity(nodes.len() + rels.len());

    for (i, node) in nodes.iter().enumerate() {
        steps.push(PathStep::Vertex(node_to_vertex(node)));
        if let (Some(rel), Some(next)) = (rels.get(i), nodes.get(i + 1)) {
            let mut properties = Properties::new();
            for key in rel.keys() {
                if let Ok(v) = rel.get::<serde_json::Value>(&key) {
                    properties.insert(key.to_string(), v);
                }
            }
            steps.push(PathStep::Edge(Edge {
                id: rel.id().to_string(),
                label: rel.typ().to_string(),
                source: node.id().to_string(),
                target: next.id().to_string(),
                properties,
            }));
        }
    }
    Path::new(steps)
}
