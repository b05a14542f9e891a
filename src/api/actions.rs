// src/api/actions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::actions::Memory;
use crate::mcp::handler::{handle_mcp_request, tool_result};
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::AppState;

// Body of POST /actions/:name and POST /route.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub text: String,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub strict: bool,
}

pub async fn list_actions_handler(State(state): State<AppState>) -> impl IntoResponse {
    let actions: Vec<Value> = state
        .plugin
        .actions
        .iter()
        .map(|a| {
            json!({
                "name": a.name(),
                "similes": a.similes(),
                "description": a.description(),
                "examples": a.examples(),
            })
        })
        .collect();
    Json(json!({ "plugin": state.plugin.name, "description": state.plugin.description, "actions": actions }))
}

pub async fn run_action_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ActionRequest>,
) -> impl IntoResponse {
    info!("Running action {} over HTTP", name);
    let message = Memory::from_text(body.text);
    let options = body.options.as_ref().filter(|o| o.is_object());
    match state.plugin.run(&state.config, &name, &message, options, body.strict).await {
        Some(run) => (StatusCode::OK, Json(tool_result(&run))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Unknown action: {}", name) })),
        )
            .into_response(),
    }
}

pub async fn route_handler(State(state): State<AppState>, Json(body): Json<ActionRequest>) -> impl IntoResponse {
    let names = state.plugin.matching_actions(&state.config, &Memory::from_text(body.text)).await;
    debug!("Routed to {:?}", names);
    Json(json!({ "actions": names }))
}

// Forward JSON-RPC requests over HTTP to the MCP handler
pub async fn rpc_handler(State(state): State<AppState>, Json(req): Json<Request>) -> Json<Response> {
    match handle_mcp_request(req, state).await {
        Some(resp) => Json(resp),
        None => Json(Response::error(
            Value::Null,
            error_codes::INVALID_REQUEST,
            "Notifications are not supported over HTTP".into(),
        )),
    }
}
