//! In-process graph backend.
//!
//! Holds named graphs in memory and evaluates a small Gremlin subset:
//! `g.V(ids?)` or `g.E(ids?)` followed by any of `outE() inE() bothE()
//! outV() inV() bothV() dedup() count()`. Traversals outside the subset
//! can be answered by scripting an exact response. Every executed traversal
//! is recorded in order.

use std::collections::{HashMap, HashSet};
use std::iter::Peekable;
use std::str::Chars;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use notegraph_core::{Connection, Edge, GraphObject, Vertex};

use crate::client::{GraphError, QueryClient, ResultSet};
use crate::queries::TraversalDialect;

/// One named graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGraph {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl MemoryGraph {
    fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == id)
    }
}

/// Graph store living inside the process.
#[derive(Default)]
pub struct MemoryGraphClient {
    graphs: RwLock<HashMap<String, MemoryGraph>>,
    scripted: RwLock<HashMap<String, Vec<GraphObject>>>,
    history: Mutex<Vec<String>>,
}

impl MemoryGraphClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load graphs from a JSON fixture: `{"<graph name>": {"vertices": [..], "edges": [..]}}`.
    pub fn from_fixture(path: &std::path::Path) -> Result<Self, GraphError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GraphError::Connection(format!("{}: {e}", path.display())))?;
        let graphs: HashMap<String, MemoryGraph> =
            serde_json::from_str(&raw).map_err(|e| GraphError::Decode(e.to_string()))?;
        tracing::info!(fixture = %path.display(), graphs = graphs.len(), "Loaded in-memory graphs");
        Ok(Self {
            graphs: RwLock::new(graphs),
            ..Self::default()
        })
    }

    /// Add (or replace by id) a vertex, creating the graph if needed.
    pub fn add_vertex(&self, graph: &str, vertex: Vertex) {
        let mut graphs = self.graphs.write();
        let g = graphs.entry(graph.to_string()).or_default();
        g.vertices.retain(|v| v.id != vertex.id);
        g.vertices.push(vertex);
    }

    /// Add (or replace by id) an edge, creating the graph if needed.
    pub fn add_edge(&self, graph: &str, edge: Edge) {
        let mut graphs = self.graphs.write();
        let g = graphs.entry(graph.to_string()).or_default();
        g.edges.retain(|e| e.id != edge.id);
        g.edges.push(edge);
    }

    /// Answer `traversal` (matched exactly, ignoring surrounding whitespace)
    /// with `objects` instead of evaluating it.
    pub fn script(&self, traversal: &str, objects: Vec<GraphObject>) {
        self.scripted
            .write()
            .insert(traversal.trim().to_string(), objects);
    }

    /// Traversals executed so far, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.history.lock().len()
    }

    fn evaluate(&self, traversal: &str, graph_name: &str) -> Result<Vec<GraphObject>, GraphError> {
        let graphs = self.graphs.read();
        let graph = graphs.get(graph_name).ok_or_else(|| GraphError::GraphNotFound {
            graph: graph_name.to_string(),
        })?;

        if let Some(objects) = self.scripted.read().get(traversal.trim()) {
            return Ok(objects.clone());
        }

        let steps = parse_traversal(traversal)?;
        let mut traversers = Traversers::Vertices(Vec::new());
        for (i, step) in steps.iter().enumerate() {
            traversers = match (i, step.name.as_str()) {
                (0, "V") => Traversers::Vertices(start_vertices(graph, &step.args)),
                (0, "E") => Traversers::Edges(start_edges(graph, &step.args)),
                (0, _) => return Err(unsupported(traversal)),
                (_, name) => apply_step(graph, traversers, name)
                    .ok_or_else(|| unsupported(traversal))?,
            };
        }
        Ok(traversers.into_objects())
    }
}

#[async_trait]
impl QueryClient for MemoryGraphClient {
    fn dialect(&self) -> TraversalDialect {
        TraversalDialect::Gremlin
    }

    async fn execute(
        &self,
        traversal: &str,
        connection: &Connection,
    ) -> Result<ResultSet, GraphError> {
        self.history.lock().push(traversal.to_string());
        tracing::debug!(graph = %connection.graph_name, gremlin = %traversal, "Executing traversal");
        self.evaluate(traversal, &connection.graph_name)
            .map(ResultSet::new)
    }
}

// ── Evaluation ───────────────────────────────────────────────────

enum Traversers {
    Vertices(Vec<Vertex>),
    Edges(Vec<Edge>),
    Count(i64),
}

impl Traversers {
    fn into_objects(self) -> Vec<GraphObject> {
        match self {
            Traversers::Vertices(vs) => vs.into_iter().map(GraphObject::Vertex).collect(),
            Traversers::Edges(es) => es.into_iter().map(GraphObject::Edge).collect(),
            Traversers::Count(n) => vec![GraphObject::Integer(n)],
        }
    }
}

fn start_vertices(graph: &MemoryGraph, ids: &[String]) -> Vec<Vertex> {
    if ids.is_empty() {
        return graph.vertices.clone();
    }
    ids.iter().filter_map(|id| graph.vertex(id).cloned()).collect()
}

fn start_edges(graph: &MemoryGraph, ids: &[String]) -> Vec<Edge> {
    if ids.is_empty() {
        return graph.edges.clone();
    }
    ids.iter()
        .filter_map(|id| graph.edges.iter().find(|e| &e.id == id).cloned())
        .collect()
}

fn apply_step(graph: &MemoryGraph, traversers: Traversers, step: &str) -> Option<Traversers> {
    let next = match (traversers, step) {
        (Traversers::Vertices(vs), "outE" | "inE" | "bothE") => {
            let out = step != "inE";
            let inc = step != "outE";
            let edges = vs
                .iter()
                .flat_map(|v| {
                    let outgoing = graph.edges.iter().filter(move |e| out && e.source == v.id);
                    let incoming = graph.edges.iter().filter(move |e| inc && e.target == v.id);
                    outgoing.chain(incoming).cloned()
                })
                .collect();
            Traversers::Edges(edges)
        }
        (Traversers::Edges(es), "outV" | "inV" | "bothV") => {
            let vertices = es
                .iter()
                .flat_map(|e| match step {
                    "outV" => vec![&e.source],
                    "inV" => vec![&e.target],
                    _ => vec![&e.source, &e.target],
                })
                .filter_map(|id| graph.vertex(id).cloned())
                .collect();
            Traversers::Vertices(vertices)
        }
        (Traversers::Vertices(vs), "dedup") => {
            let mut seen = HashSet::new();
            Traversers::Vertices(vs.into_iter().filter(|v| seen.insert(v.id.clone())).collect())
        }
        (Traversers::Edges(es), "dedup") => {
            let mut seen = HashSet::new();
            Traversers::Edges(es.into_iter().filter(|e| seen.insert(e.id.clone())).collect())
        }
        (Traversers::Vertices(vs), "count") => Traversers::Count(vs.len() as i64),
        (Traversers::Edges(es), "count") => Traversers::Count(es.len() as i64),
        _ => return None,
    };
    Some(next)
}

// ── Parsing ──────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Step {
    name: String,
    args: Vec<String>,
}

fn unsupported(traversal: &str) -> GraphError {
    GraphError::Query(format!("unsupported traversal: {traversal}"))
}

fn parse_traversal(src: &str) -> Result<Vec<Step>, GraphError> {
    let rest = src.trim().strip_prefix("g.").ok_or_else(|| unsupported(src))?;
    let mut chars = rest.chars().peekable();
    let mut steps = Vec::new();

    loop {
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() || chars.next() != Some('(') {
            return Err(unsupported(src));
        }
        let args = parse_args(&mut chars).ok_or_else(|| unsupported(src))?;
        steps.push(Step { name, args });

        match chars.next() {
            None => break,
            Some('.') => continue,
            Some(_) => return Err(unsupported(src)),
        }
    }
    Ok(steps)
}

/// Parse a comma-separated argument list up to and including `)`.
fn parse_args(chars: &mut Peekable<Chars<'_>>) -> Option<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                current.push(chars.next()?);
            } else if c == q {
                quote = None;
            } else {
                current.push(c);
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote = Some(c);
                quoted = true;
            }
            ',' => {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            ')' => {
                if !current.is_empty() || quoted {
                    args.push(current);
                }
                return Some(args);
            }
            c if c.is_whitespace() => {}
            c => current.push(c),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(graph: &str) -> Connection {
        Connection {
            id: "c".into(),
            name: "test".into(),
            graph_name: graph.into(),
            connection_uri: "memory://".into(),
        }
    }

    fn sample() -> MemoryGraphClient {
        let client = MemoryGraphClient::new();
        for id in ["1", "2", "3"] {
            client.add_vertex("g", Vertex::new(id, "person"));
        }
        client.add_edge("g", Edge::new("e12", "knows", "1", "2"));
        client.add_edge("g", Edge::new("e31", "knows", "3", "1"));
        client
    }

    async fn run(client: &MemoryGraphClient, q: &str) -> Vec<GraphObject> {
        client.execute(q, &conn("g")).await.unwrap().collect()
    }

    #[test]
    fn parses_quoted_and_bare_args() {
        let steps = parse_traversal(r#"g.V('1', "a\"b", 3).bothE().dedup()"#).unwrap();
        assert_eq!(steps[0].args, vec!["1", "a\"b", "3"]);
        assert_eq!(steps[1], Step { name: "bothE".into(), args: vec![] });
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn rejects_non_traversals() {
        assert!(parse_traversal("MATCH (n) RETURN n").is_err());
        assert!(parse_traversal("g.V(").is_err());
        assert!(parse_traversal("g.V()x").is_err());
    }

    #[tokio::test]
    async fn both_e_covers_both_directions() {
        let client = sample();
        let edges = run(&client, "g.V('1').bothE()").await;
        let ids: Vec<_> = edges.iter().filter_map(|o| o.as_edge()).map(|e| e.id.clone()).collect();
        assert_eq!(ids, vec!["e12", "e31"]);
    }

    #[tokio::test]
    async fn dedup_and_count() {
        let client = sample();
        let edges = run(&client, r#"g.V("1","2").bothE().dedup()"#).await;
        assert_eq!(edges.len(), 2);
        assert_eq!(run(&client, "g.V().count()").await, vec![GraphObject::Integer(3)]);
    }

    #[tokio::test]
    async fn missing_ids_are_skipped() {
        let client = sample();
        let vertices = run(&client, r#"g.V("1","99")"#).await;
        assert_eq!(vertices.len(), 1);
    }

    #[tokio::test]
    async fn scripted_responses_win() {
        let client = sample();
        client.script("g.V().values('age').mean()", vec![GraphObject::Integer(7)]);
        assert_eq!(
            run(&client, " g.V().values('age').mean() ").await,
            vec![GraphObject::Integer(7)]
        );
        assert_eq!(client.query_count(), 1);
    }

    #[tokio::test]
    async fn unknown_graph_is_an_error() {
        let client = sample();
        let err = client.execute("g.V()", &conn("nope")).await.unwrap_err();
        assert!(matches!(err, GraphError::GraphNotFound { .. }));
    }
}
