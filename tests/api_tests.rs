//! Tests for the HTTP routes

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use datai_mcp_server::{api, config::Config, AppState};

const ADDR: &str = "0x218e312fF5181290A46e3f87A73A8aD40C05A944";

fn app_with(config: Config) -> Router {
    api::router(AppState::new(config))
}

fn app() -> Router {
    app_with(Config::default())
}

fn keyed_config() -> Config {
    Config {
        api_key: Some("test-key".into()),
        api_base_url: mockito::server_url(),
        ..Config::default()
    }
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(b) => {
            builder = builder.header("content-type", "application/json");
            Body::from(b.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(), Method::GET, "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["plugin"], "datai");
    assert_eq!(body["actions"], 25);
    assert_eq!(body["apiKeyConfigured"], false);
}

#[tokio::test]
async fn test_list_actions() {
    let (status, body) = send(app(), Method::GET, "/api/actions", None).await;

    assert_eq!(status, StatusCode::OK);
    let actions = body["actions"].as_array().unwrap();
    assert_eq!(actions.len(), 25);
    let nfts = actions
        .iter()
        .find(|a| a["name"] == "GET_USER_NFTS_LIST_DATAI")
        .unwrap();
    assert!(nfts["similes"].as_array().unwrap().contains(&json!("SHOW_ALL_NFTS")));
    assert!(!nfts["examples"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_action_is_404() {
    let (status, body) =
        send(app(), Method::POST, "/api/actions/NOT_AN_ACTION", Some(json!({"text": "hi"}))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Unknown action: NOT_AN_ACTION");
}

#[tokio::test]
async fn test_run_action_without_key() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/api/actions/GET_USER_NFTS_LIST_DATAI",
        Some(json!({"text": format!("list NFTs for {}", ADDR)})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isError"], true);
    assert_eq!(body["error"], "Missing API key: DATAI_API_KEY");
    assert_eq!(
        body["content"][0]["text"],
        "Error: API key not found. Please configure the DATAI_API_KEY environment variable."
    );
}

#[tokio::test]
async fn test_run_action_by_simile_against_mock() {
    let addr = "0x6666666666666666666666666666666666666666";
    let _m = mockito::mock("GET", mockito::Matcher::Regex(format!("^/api/merlin/public/balances/nft/all/{}", addr)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create();

    let (status, body) = send(
        app_with(keyed_config()),
        Method::POST,
        "/api/actions/SHOW_ALL_NFTS",
        Some(json!({"text": format!("show my NFTs {}", addr)})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "GET_USER_NFTS_LIST_DATAI");
    assert_eq!(body["success"], true);
    assert_eq!(body["content"][0]["text"], format!("No NFTs found for address {}.", addr));
    assert_eq!(body["data"], json!({"nfts": []}));
}

#[tokio::test]
async fn test_route_needs_a_key() {
    let text = json!({"text": format!("Give me a transaction overview for {}", ADDR)});

    let (_, body) = send(app(), Method::POST, "/api/route", Some(text.clone())).await;
    assert_eq!(body["actions"], json!([]));

    let (status, body) = send(app_with(keyed_config()), Method::POST, "/api/route", Some(text)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["actions"]
        .as_array()
        .unwrap()
        .contains(&json!("GET_USER_TRANSACTION_OVERVIEW_DATAI")));
}

#[tokio::test]
async fn test_rpc_tools_list() {
    let (status, body) = send(
        app(),
        Method::POST,
        "/api/rpc",
        Some(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_rpc_unknown_tool_lists_available() {
    let (_, body) = send(
        app(),
        Method::POST,
        "/api/rpc",
        Some(json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "tools/call",
            "params": {"name": "NOPE", "arguments": {"text": "hi"}}
        })),
    )
    .await;

    assert_eq!(body["error"]["code"], -32602);
    assert_eq!(body["error"]["message"], "Unknown tool: NOPE");
    assert_eq!(body["error"]["data"]["available"].as_array().unwrap().len(), 25);
}

#[tokio::test]
async fn test_rpc_notification_is_rejected() {
    let (_, body) = send(
        app(),
        Method::POST,
        "/api/rpc",
        Some(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
    )
    .await;

    assert_eq!(body["error"]["code"], -32600);
}
