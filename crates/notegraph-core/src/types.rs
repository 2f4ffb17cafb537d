//! Graph element types returned by a remote traversal.
//!
//! These mirror what a graph store hands back for a single query: vertices,
//! edges, paths, and the scalar or opaque values a traversal may yield
//! instead of elements.

use serde::{Deserialize, Serialize};

/// Property bag attached to vertices and edges.
pub type Properties = serde_json::Map<String, serde_json::Value>;

// ── Elements ──────────────────────────────────────────────────────

/// Anything with a stable, store-assigned identity.
pub trait Element {
    fn id(&self) -> &str;
}

/// A vertex fetched from the remote store.
///
/// Immutable once fetched within a session: the engine only decides set
/// membership, it never patches fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vertex {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Vertex {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// Drop later elements whose id was already seen, keeping first-seen order.
pub fn dedup_by_id<T: Element>(elements: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    elements
        .into_iter()
        .filter(|e| seen.insert(e.id().to_string()))
        .collect()
}

impl Element for Vertex {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A directed edge. `source` and `target` are vertex ids that need not be
/// present in any particular vertex set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            source: source.into(),
            target: target.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

impl Element for Edge {
    fn id(&self) -> &str {
        &self.id
    }
}

// ── Paths ─────────────────────────────────────────────────────────

/// One step of a path. Depending on the traversal, a step may be a vertex,
/// an edge, or something the store could not express as either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PathStep {
    Vertex(Vertex),
    Edge(Edge),
    Other(serde_json::Value),
}

/// An ordered walk through the graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub objects: Vec<PathStep>,
}

impl Path {
    pub fn new(objects: Vec<PathStep>) -> Self {
        Self { objects }
    }

    /// Every vertex id the path references, in walk order, including both
    /// endpoints of edge steps. May contain repeats.
    pub fn referenced_vertex_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.objects.iter().flat_map(|step| {
            let ids: Vec<&str> = match step {
                PathStep::Vertex(v) => vec![v.id.as_str()],
                PathStep::Edge(e) => vec![e.source.as_str(), e.target.as_str()],
                PathStep::Other(_) => Vec::new(),
            };
            ids
        })
    }
}

// ── Query output ──────────────────────────────────────────────────

/// A single object yielded by a traversal.
///
/// Query clients decode their wire format into this union so downstream
/// code can match exhaustively instead of probing runtime types.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphObject {
    Vertex(Vertex),
    Edge(Edge),
    Path(Path),
    /// Integral number, e.g. the output of `count()`.
    Integer(i64),
    /// Non-integral scalar: float, string, or boolean.
    Scalar(serde_json::Value),
    /// Anything else (maps, lists, nulls).
    Opaque(serde_json::Value),
}

impl GraphObject {
    /// Classify a raw JSON scalar/opaque value that is not a graph element.
    pub fn from_plain_value(value: serde_json::Value) -> Self {
        match &value {
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => GraphObject::Integer(i),
                None => GraphObject::Scalar(value),
            },
            serde_json::Value::String(_) | serde_json::Value::Bool(_) => {
                GraphObject::Scalar(value)
            }
            _ => GraphObject::Opaque(value),
        }
    }

    /// JSON rendering used for a result's `data` array.
    pub fn to_json(&self) -> serde_json::Value {
        let rendered = match self {
            GraphObject::Vertex(v) => serde_json::to_value(v),
            GraphObject::Edge(e) => serde_json::to_value(e),
            GraphObject::Path(p) => serde_json::to_value(p),
            GraphObject::Integer(i) => return serde_json::Value::from(*i),
            GraphObject::Scalar(v) | GraphObject::Opaque(v) => return v.clone(),
        };
        rendered.unwrap_or(serde_json::Value::Null)
    }

    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            GraphObject::Vertex(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            GraphObject::Edge(e) => Some(e),
            _ => None,
        }
    }
}
