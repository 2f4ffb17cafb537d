//! Configuration management for Notegraph services.
//!
//! Configuration is loaded once at startup from (in priority order):
//! 1. Environment variables (NOTEGRAPH__ prefix, `__` separator)
//! 2. Config file (notegraph.toml)
//! 3. Defaults
//!
//! The resulting value is passed by reference to whatever needs it; there is
//! no process-wide option registry.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::NotegraphError;

/// Which edges neighborhood expansion resolves new vertices from.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionVertexSource {
    /// Only the edges the cell graph held before the expansion.
    KnownEdges,
    /// The pre-expansion edges plus the freshly fetched incident edges.
    ///
    /// Departs from the recorded studio behavior, which only resolved
    /// vertices from the pre-expansion edges; select `KnownEdges` for that.
    #[default]
    KnownAndFetchedEdges,
}

/// Top-level studio configuration (`[studio]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct StudioConfig {
    /// Root for user data. A leading `~` is replaced by `$HOME`.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Notebook directory, relative to `base_dir`.
    #[serde(default = "default_notebooks_dir")]
    pub notebooks_dir: String,

    /// Deadline for a single remote round-trip.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    #[serde(default)]
    pub expansion_vertex_source: ExpansionVertexSource,
}

fn default_base_dir() -> String {
    "~/.notegraph".to_string()
}

fn default_notebooks_dir() -> String {
    "notebooks".to_string()
}

fn default_query_timeout_ms() -> u64 {
    30_000
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            notebooks_dir: default_notebooks_dir(),
            query_timeout_ms: default_query_timeout_ms(),
            expansion_vertex_source: ExpansionVertexSource::default(),
        }
    }
}

impl StudioConfig {
    /// Load the `[studio]` section from `<file_prefix>.toml` and the
    /// environment. A missing file or section yields defaults.
    pub fn load(file_prefix: &str) -> Result<Self, NotegraphError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("NOTEGRAPH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        match cfg.get::<StudioConfig>("studio") {
            Ok(c) => Ok(c),
            Err(config::ConfigError::NotFound(_)) => Ok(StudioConfig::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// `base_dir` with home-directory references expanded.
    pub fn base_dir(&self) -> PathBuf {
        let raw = if self.base_dir.is_empty() || self.base_dir == "null" {
            default_base_dir()
        } else {
            self.base_dir.clone()
        };
        PathBuf::from(expand_home(&raw, std::env::var("HOME").ok().as_deref()))
    }

    pub fn notebooks_dir(&self) -> PathBuf {
        self.base_dir().join(&self.notebooks_dir)
    }

    pub fn query_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.query_timeout_ms)
    }
}

fn expand_home(path: &str, home: Option<&str>) -> String {
    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) => format!("{home}{rest}"),
        _ => path.to_string(),
    }
}
