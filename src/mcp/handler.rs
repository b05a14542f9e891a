//! # MCP Handler Module
//!
//! Dispatches JSON-RPC requests to the Datai actions.
//!
//! ## Methods
//! - `initialize` - server info and capabilities
//! - `tools/list` - one tool per registered action
//! - `tools/call` - runs an action against `arguments.text`
//! - `route_message` - names the actions whose validators accept a text
//!
//! Action names and similes may also be used directly as the method; they
//! are rewritten into `tools/call`.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::actions::Memory;
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::plugin::ActionRun;
use crate::AppState;

pub const SERVER_NAME: &str = "datai_mcp";
pub const PROTOCOL_VERSION: &str = "2025-06-18";

/// Handles one request. Notifications produce no response.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req, &state),
        "tools/call" => handle_tool_call(&req, &state).await,
        "route_message" => handle_route_message(&req, &state).await,
        method if state.plugin.get_action(method).is_some() => {
            let wrapped = Request::new(
                req.id.clone(),
                "tools/call",
                Some(json!({
                    "name": method,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            );
            handle_tool_call(&wrapped, &state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

fn handle_initialize(req: &Request) -> Response {
    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "instructions": "Datai (Merlin) blockchain data: DeFi positions, balances, NFTs and transaction history. Pass the user's request as `text`."
        }),
    )
}

fn tool_input_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": {"type": "string", "description": "The user's request, including wallet address and chain where relevant."},
            "options": {"type": "object", "description": "Optional overrides such as limit, hash, positionId, walletAddress or dateRange {startDate, endDate}."},
            "strict": {"type": "boolean", "description": "Skip the action when its validator rejects the text."}
        },
        "required": ["text"]
    })
}

fn handle_tools_list(req: &Request, state: &AppState) -> Response {
    let tools: Vec<Value> = state
        .plugin
        .actions
        .iter()
        .map(|a| {
            json!({
                "name": a.name(),
                "description": a.description(),
                "similes": a.similes(),
                "inputSchema": tool_input_schema()
            })
        })
        .collect();
    Response::success(req.id.clone(), json!({ "tools": tools }))
}

fn required_text<'a>(args: &'a Value, req_id: &Value) -> Result<&'a str, Response> {
    args.get("text").and_then(Value::as_str).ok_or_else(|| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            "Missing or invalid required argument: 'text'".into(),
        )
    })
}

/// Tool result for one action run.
pub fn tool_result(run: &ActionRun) -> Value {
    let last = run.last();
    let text = if run.responses.is_empty() {
        format!("{} did not accept this request.", run.action)
    } else {
        run.text()
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": !run.success,
        "action": run.action,
        "success": run.success,
        "validated": run.validated,
        "data": last.and_then(|r| r.content.data.clone()),
        "error": last.and_then(|r| r.content.error.clone()),
    })
}

async fn handle_tool_call(req: &Request, state: &AppState) -> Response {
    let Some(params) = req.params.as_ref() else {
        return Response::error(req.id.clone(), error_codes::INVALID_PARAMS, "Missing 'params' object".into());
    };
    let Some(tool_name) = params.get("name").and_then(Value::as_str) else {
        return Response::error(
            req.id.clone(),
            error_codes::INVALID_PARAMS,
            "Missing 'name' field in params".into(),
        );
    };
    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let text = match required_text(args, &req.id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let options = args.get("options").filter(|o| o.is_object());
    let strict = args.get("strict").and_then(Value::as_bool).unwrap_or(false);

    debug!("tools/call {} (strict: {})", tool_name, strict);
    let message = Memory::from_text(text);
    match state.plugin.run(&state.config, tool_name, &message, options, strict).await {
        Some(run) => Response::success(req.id.clone(), tool_result(&run)),
        None => {
            let available: Vec<&str> = state.plugin.actions.iter().map(|a| a.name()).collect();
            Response::error_with_data(
                req.id.clone(),
                error_codes::INVALID_PARAMS,
                format!("Unknown tool: {}", tool_name),
                json!({ "available": available }),
            )
        }
    }
}

async fn handle_route_message(req: &Request, state: &AppState) -> Response {
    let empty = json!({});
    let params = req.params.as_ref().unwrap_or(&empty);
    let text = match required_text(params, &req.id) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    let names = state.plugin.matching_actions(&state.config, &Memory::from_text(text)).await;
    Response::success(req.id.clone(), json!({ "actions": names }))
}
