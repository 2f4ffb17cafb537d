//! notegraph-graph: Remote query clients for notebook traversals.
//!
//! Every traversal a notebook issues, whether typed by the user or generated
//! by the engine, flows through the [`QueryClient`] boundary. Backends decode
//! their wire formats into [`notegraph_core::GraphObject`] so callers can
//! match on the result instead of inspecting runtime types.

pub mod client;
pub mod gremlin;
pub mod memory;
pub mod neo4j;
pub mod queries;

pub use client::{GraphBackend, GraphConfig, GraphError, QueryClient, ResultSet};
pub use gremlin::GremlinClient;
pub use memory::MemoryGraphClient;
pub use neo4j::Neo4jClient;
pub use queries::TraversalDialect;
