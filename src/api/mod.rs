//! # API Module
//!
//! HTTP surface over the Datai actions.
//!
//! ## Available Endpoints
//! - `GET /api/health` - liveness and whether an API key is configured
//! - `GET /api/actions` - registered actions with similes and examples
//! - `POST /api/actions/:name` - run one action on `{text, options?, strict?}`
//! - `POST /api/route` - actions whose validators accept `{text}`
//! - `POST /api/rpc` - JSON-RPC (MCP) over HTTP

pub mod actions;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// The full application router with every route nested under `/api`.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/actions", get(actions::list_actions_handler))
        .route("/actions/:name", post(actions::run_action_handler))
        .route("/route", post(actions::route_handler))
        .route("/rpc", post(actions::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
