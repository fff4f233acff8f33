use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    registry::chains::{Chain, NetworkInfo},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct NetworksResponse {
    /// Chain used when no routing rule matches
    pub default: Chain,
    pub networks: Vec<NetworkInfo>,
}

// GET /networks
pub async fn list_networks_handler(State(state): State<AppState>) -> Json<NetworksResponse> {
    Json(NetworksResponse {
        default: state.registry.rules().fallback(),
        networks: Chain::ALL.iter().map(Chain::info).collect(),
    })
}
