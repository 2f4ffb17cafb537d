//! Traversal builders for the queries the engine issues on its own.
//!
//! User-typed cells are sent verbatim; only the batched lookups used for
//! graph extraction and expansion are generated here. Every builder takes
//! the whole id batch so each lookup is a single round-trip.

use notegraph_core::CellLanguage;

/// Column every generated Cypher query returns its objects under.
pub const CYPHER_RESULT_COLUMN: &str = "result";

/// The traversal language a client speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDialect {
    Gremlin,
    Cypher,
}

impl TraversalDialect {
    /// Cell language whose code this dialect executes.
    pub fn language(&self) -> CellLanguage {
        match self {
            TraversalDialect::Gremlin => CellLanguage::Gremlin,
            TraversalDialect::Cypher => CellLanguage::Cypher,
        }
    }

    /// Fetch the vertices with the given ids.
    pub fn vertices_by_ids(&self, ids: &[String]) -> String {
        match self {
            TraversalDialect::Gremlin => format!("g.V({})", gremlin_id_list(ids)),
            TraversalDialect::Cypher => format!(
                "MATCH (v) WHERE id(v) IN [{}] RETURN v AS {CYPHER_RESULT_COLUMN}",
                cypher_id_list(ids)
            ),
        }
    }

    /// Incident edges (both directions) of the given vertices, each edge once.
    pub fn incident_edges(&self, ids: &[String]) -> String {
        match self {
            TraversalDialect::Gremlin => {
                format!("g.V({}).bothE().dedup()", gremlin_id_list(ids))
            }
            TraversalDialect::Cypher => format!(
                "MATCH (v)-[r]-() WHERE id(v) IN [{}] RETURN DISTINCT r AS {CYPHER_RESULT_COLUMN}",
                cypher_id_list(ids)
            ),
        }
    }

    /// Incident edges (both directions) of a single vertex.
    pub fn vertex_edges(&self, id: &str) -> String {
        match self {
            TraversalDialect::Gremlin => format!("g.V('{}').bothE()", escape(id, '\'')),
            TraversalDialect::Cypher => format!(
                "MATCH (v)-[r]-() WHERE id(v) IN [{}] RETURN r AS {CYPHER_RESULT_COLUMN}",
                cypher_id_list(&[id.to_string()])
            ),
        }
    }
}

fn gremlin_id_list(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("\"{}\"", escape(id, '"')))
        .collect::<Vec<_>>()
        .join(",")
}

/// Neo4j identities are the store's internal integer ids; anything that
/// does not parse cannot name a node there and is dropped.
fn cypher_id_list(ids: &[String]) -> String {
    ids.iter()
        .filter_map(|id| id.parse::<i64>().ok())
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn escape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn gremlin_batches_ids_into_one_traversal() {
        let d = TraversalDialect::Gremlin;
        assert_eq!(d.vertices_by_ids(&ids(&["1", "2"])), r#"g.V("1","2")"#);
        assert_eq!(
            d.incident_edges(&ids(&["1", "2"])),
            r#"g.V("1","2").bothE().dedup()"#
        );
        assert_eq!(d.vertex_edges("1"), "g.V('1').bothE()");
    }

    #[test]
    fn gremlin_ids_are_escaped() {
        let d = TraversalDialect::Gremlin;
        assert_eq!(d.vertices_by_ids(&ids(&[r#"a"b"#])), r#"g.V("a\"b")"#);
        assert_eq!(d.vertex_edges("o'neil"), r"g.V('o\'neil').bothE()");
    }

    #[test]
    fn cypher_uses_internal_ids_and_result_column() {
        let d = TraversalDialect::Cypher;
        assert_eq!(
            d.vertices_by_ids(&ids(&["4", "x", "7"])),
            "MATCH (v) WHERE id(v) IN [4,7] RETURN v AS result"
        );
        assert!(d.incident_edges(&ids(&["4"])).contains("RETURN DISTINCT r AS result"));
        assert_eq!(d.language(), CellLanguage::Cypher);
    }
}
