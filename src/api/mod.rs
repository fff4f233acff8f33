//! # API Module
//!
//! HTTP handlers for the transaction registry. Action providers create
//! transactions; the UI and chain watchers poll and report status.
//!
//! ## Available Endpoints
//!
//! ### Service
//! - `GET /health` - Liveness plus registry counts
//! - `GET /networks` - Supported chains and explorers
//!
//! ### Transactions
//! - `GET /transactions?status=` - List transactions in creation order
//! - `POST /transactions` - Record a transaction intent
//! - `GET /transactions/pending` - Transactions awaiting a wallet
//! - `GET /transactions/latest` - Most recently created transaction
//! - `GET /transactions/:tx_id` - Look up by id
//! - `POST /transactions/:tx_id/update` - Set status and hash
//!
//! ### JSON-RPC
//! - `POST /rpc` - MCP tool calls over HTTP

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod health;
pub mod networks;
pub mod rpc;
pub mod transactions;

/// Builds the full application: every route nested under `/api`.
pub fn create_app(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/networks", get(networks::list_networks_handler))
        .merge(transactions::create_transaction_router())
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
