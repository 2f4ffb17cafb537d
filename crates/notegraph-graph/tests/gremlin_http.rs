//! Gremlin HTTP client against a mocked `/gremlin` endpoint.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notegraph_core::{Connection, GraphObject};
use notegraph_graph::{GraphError, GremlinClient, QueryClient};

fn connection(uri: &str) -> Connection {
    Connection {
        id: "c1".to_string(),
        name: "mock".to_string(),
        graph_name: "hugegraph".to_string(),
        connection_uri: uri.to_string(),
    }
}

#[tokio::test]
async fn posts_traversal_with_graph_aliases() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin"))
        .and(body_partial_json(json!({
            "gremlin": "g.V('1').bothE()",
            "language": "gremlin-groovy",
            "aliases": {"graph": "hugegraph", "g": "__g_hugegraph"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requestId": "r1",
            "status": {"message": "", "code": 200, "attributes": {}},
            "result": {
                "data": [
                    {"id": "e12", "label": "knows", "type": "edge", "outV": "1", "inV": "2", "properties": {}},
                    {"id": "e13", "label": "knows", "type": "edge", "outV": "1", "inV": "3", "properties": {}}
                ],
                "meta": {}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GremlinClient::new();
    let objects: Vec<GraphObject> = client
        .execute("g.V('1').bothE()", &connection(&server.uri()))
        .await
        .unwrap()
        .collect();

    assert_eq!(objects.len(), 2);
    assert_eq!(objects[1].as_edge().map(|e| e.target.as_str()), Some("3"));
}

#[tokio::test]
async fn server_errors_surface_as_query_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "exception": "class java.lang.IllegalArgumentException",
            "message": "Invalid traversal"
        })))
        .mount(&server)
        .await;

    let client = GremlinClient::new();
    let err = client
        .execute("g.bogus()", &connection(&server.uri()))
        .await
        .unwrap_err();

    match err {
        GraphError::Query(msg) => assert!(msg.contains("Invalid traversal")),
        other => panic!("expected query error, got {other:?}"),
    }
}

#[tokio::test]
async fn trailing_slash_in_uri_is_tolerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gremlin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"data": [3]}
        })))
        .mount(&server)
        .await;

    let client = GremlinClient::new();
    let uri = format!("{}/", server.uri());
    let objects: Vec<GraphObject> = client
        .execute("g.V().count()", &connection(&uri))
        .await
        .unwrap()
        .collect();
    assert_eq!(objects, vec![GraphObject::Integer(3)]);
}
