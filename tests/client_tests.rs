//! Tests for the Datai HTTP client against a mock upstream

use datai_mcp_server::datai::{DataiApiClient, DataiError};
use datai_mcp_server::runtime::StaticRuntime;
use mockito::{mock, Matcher};
use serde_json::{json, Value};

fn client() -> DataiApiClient {
    DataiApiClient::new("test-key", Some(&mockito::server_url()), Some(5_000))
}

#[tokio::test]
async fn test_success_sends_raw_authorization_header() {
    let m = mock("GET", "/client/ok")
        .match_header("authorization", "test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"chain": "eth"}, {"chain": "base"}]).to_string())
        .expect(1)
        .create();

    let res = client().get_json("/client/ok").await;

    m.assert();
    assert!(res.success);
    assert_eq!(res.status_code, Some(200));
    assert_eq!(res.data, Some(json!([{"chain": "eth"}, {"chain": "base"}])));
}

#[tokio::test]
async fn test_error_status_uses_upstream_message() {
    let _m = mock("GET", "/client/unauthorized")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Invalid API key"}"#)
        .create();

    let res = client().get_json("/client/unauthorized").await;

    assert!(!res.success);
    assert_eq!(res.status_code, Some(401));
    assert_eq!(res.error.as_deref(), Some("Invalid API key"));
    assert!(res.data.is_none());
}

#[tokio::test]
async fn test_error_status_without_message() {
    let _m = mock("GET", "/client/down")
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create();

    let res = client().get_json("/client/down").await;

    assert_eq!(res.error.as_deref(), Some("API error: 503"));
}

#[tokio::test]
async fn test_non_json_body_is_a_failure() {
    let _m = mock("GET", "/client/html")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>maintenance</html>")
        .create();

    let res = client().get_json("/client/html").await;

    assert!(!res.success);
    assert_eq!(
        res.error.as_deref(),
        Some("API returned non-JSON response: <html>maintenance</html>")
    );
}

#[tokio::test]
async fn test_typed_get_reports_decode_errors() {
    let _m = mock("GET", Matcher::Regex(r"^/client/typed".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"not":"a list"}"#)
        .create();

    let res = client().get::<Vec<Value>>("/client/typed?limit=1").await;

    assert!(!res.success);
    assert!(res.error.unwrap_or_default().starts_with("Failed to decode response:"));
}

#[test]
fn test_from_runtime_requires_key() {
    let err = DataiApiClient::from_runtime(&StaticRuntime::new()).unwrap_err();
    assert_eq!(err, DataiError::MissingApiKey);
    assert_eq!(err.to_string(), "Datai API key is required but not provided");

    let runtime = StaticRuntime::new()
        .with_setting("DATAI_API_KEY", "k")
        .with_setting("DATAI_API_BASE_URL", "http://localhost:9/");
    let client = DataiApiClient::from_runtime(&runtime).unwrap();
    assert_eq!(client.base_url(), "http://localhost:9");
}

#[tokio::test]
async fn test_transport_failure_has_no_status() {
    let client = DataiApiClient::new("test-key", Some("http://127.0.0.1:1"), Some(200));

    let res = client.get_json("/client/unreachable").await;

    assert!(!res.success);
    assert_eq!(res.status_code, None);
    assert!(res.error.unwrap_or_default().starts_with("API request failed:"));
}
