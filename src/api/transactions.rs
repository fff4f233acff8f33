use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};
use validator::Validate;

use crate::{
    registry::{NewTransaction, TransactionRecord, TransactionStatus},
    AppState,
};

type ApiError = (StatusCode, Json<Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({ "success": false, "message": message.into() })),
    )
}

fn not_found(tx_id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        format!("Transaction with ID {} not found", tx_id),
    )
}

fn parse_status(raw: &str) -> Result<TransactionStatus, ApiError> {
    raw.parse::<TransactionStatus>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

// --- Request and Response Models ---

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub success: bool,
    pub transactions: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub success: bool,
    pub transaction: TransactionRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

impl TransactionResponse {
    fn new(transaction: TransactionRecord) -> Self {
        Self {
            success: true,
            explorer_url: transaction.explorer_url(),
            transaction,
        }
    }
}

/// Request to record a new transaction intent
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// Target address, with or without the 0x prefix
    #[validate(length(min = 1, message = "'to' must not be empty"))]
    pub to: String,
    /// Wei integer, 0x hex, or a decimal whole-token amount
    #[serde(default)]
    pub value: String,
    pub data: Option<String>,
    #[serde(alias = "walletAddress")]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub success: bool,
    pub id: String,
    pub transaction: TransactionRecord,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub hash: Option<String>,
}

// --- Handlers ---

/// List transactions, optionally filtered with `?status=`
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    Ok(Json(TransactionListResponse {
        success: true,
        transactions: state.registry.list(status),
    }))
}

/// Transactions still waiting for a wallet
pub async fn list_pending_handler(State(state): State<AppState>) -> Json<TransactionListResponse> {
    Json(TransactionListResponse {
        success: true,
        transactions: state.registry.list(Some(TransactionStatus::Pending)),
    })
}

pub async fn get_latest_handler(
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, ApiError> {
    state
        .registry
        .most_recent()
        .map(|tx| Json(TransactionResponse::new(tx)))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No transactions recorded yet"))
}

pub async fn get_transaction_handler(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
) -> Result<Json<TransactionResponse>, ApiError> {
    state
        .registry
        .get_by_id(&tx_id)
        .map(|tx| Json(TransactionResponse::new(tx)))
        .ok_or_else(|| not_found(&tx_id))
}

pub async fn create_transaction_handler(
    State(state): State<AppState>,
    Json(input): Json<CreateTransactionRequest>,
) -> Result<Json<CreateTransactionResponse>, ApiError> {
    input
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let id = state.registry.create(NewTransaction {
        to: input.to,
        value: input.value,
        data: input.data,
        wallet_address: input.wallet_address,
        metadata: input.metadata,
    });

    let transaction = state.registry.get_by_id(&id).ok_or_else(|| {
        error!("Transaction {} vanished right after creation", id);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Transaction was not recorded")
    })?;

    Ok(Json(CreateTransactionResponse {
        success: true,
        id,
        transaction,
    }))
}

/// Status report from the UI or a chain watcher
pub async fn update_transaction_handler(
    State(state): State<AppState>,
    Path(tx_id): Path<String>,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let status = parse_status(&input.status)?;

    let updated = state
        .registry
        .update_status(&tx_id, status, input.hash)
        .ok_or_else(|| not_found(&tx_id))?;

    info!(
        "Transaction {} updated: status={}, hash={}",
        tx_id,
        updated.status,
        updated.hash.as_deref().unwrap_or("N/A")
    );
    Ok(Json(TransactionResponse::new(updated)))
}

/// Routes for `/transactions`
pub fn create_transaction_router() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions_handler).post(create_transaction_handler),
        )
        .route("/transactions/pending", get(list_pending_handler))
        .route("/transactions/latest", get(get_latest_handler))
        .route("/transactions/:tx_id", get(get_transaction_handler))
        .route("/transactions/:tx_id/update", post(update_transaction_handler))
}
