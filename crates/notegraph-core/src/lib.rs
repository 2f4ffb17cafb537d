//! notegraph-core: Shared types, configuration, and error handling for Notegraph.
//!
//! This crate provides the foundational types used across all Notegraph components:
//! - Graph elements (vertices, edges, paths) and the tagged query output union
//! - Notebooks, cells, and the persisted query result with its graph
//! - Startup configuration
//! - Common error types

pub mod config;
pub mod error;
pub mod notebook;
pub mod types;

pub use config::{ExpansionVertexSource, StudioConfig};
pub use error::NotegraphError;
pub use notebook::{Cell, CellLanguage, Connection, Notebook, QueryResult, ResultGraph, ResultType};
pub use types::{Edge, Element, GraphObject, Path, PathStep, Vertex};
