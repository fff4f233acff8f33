use axum::{extract::State, response::IntoResponse, Json};

use crate::{registry::TransactionStatus, AppState};

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "evm-tx-registry",
        "network": state.config.default_chain,
        "supportedNetworks": state.config.supported_chains(),
        "transactions": {
            "total": state.registry.count(),
            "pending": state.registry.count_by_status(TransactionStatus::Pending),
        }
    }))
}
