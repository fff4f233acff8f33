//! Tests for the transaction HTTP endpoints

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use evm_tx_registry::{
    api::create_app,
    config::Config,
    registry::{Chain, NewTransaction},
    AppState,
};

const TREEHOUSE_CHECKSUMMED: &str = "0x5E4ACCa7a9989007cD74aE4ed1b096c000779DCC";
const PLAIN_TARGET: &str = "0x000000000000000000000000000000000000beef";

fn create_test_state() -> AppState {
    let mut config = Config::default();
    config.default_chain = Chain::Base;
    AppState::new(config)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(b) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&b).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_health_reports_counts() {
    let state = create_test_state();
    state.registry.create(NewTransaction::new(PLAIN_TARGET, "1"));
    let app = create_app(state);

    let (status, body) = send(app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["network"], "base");
    assert_eq!(body["transactions"]["total"], 1);
    assert_eq!(body["transactions"]["pending"], 1);
    assert_eq!(body["supportedNetworks"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_create_and_fetch_transaction() {
    let state = create_test_state();
    let app = create_app(state.clone());

    let (status, body) = send(
        app.clone(),
        Method::POST,
        "/api/transactions",
        Some(json!({
            "to": TREEHOUSE_CHECKSUMMED.trim_start_matches("0x"),
            "value": "1.5",
            "data": "6e553f65",
            "walletAddress": "0x00000000000000000000000000000000000000aa",
            "metadata": { "displaySymbol": "cmETH" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let id = body["id"].as_str().unwrap().to_string();
    let tx = &body["transaction"];
    assert_eq!(tx["to"], TREEHOUSE_CHECKSUMMED);
    assert_eq!(tx["value"], "1500000000000000000");
    assert_eq!(tx["data"], "0x6e553f65");
    assert_eq!(tx["status"], "pending");
    assert_eq!(tx["metadata"]["chain"], "mantle");
    assert_eq!(tx["metadata"]["dataType"], "treehouse-staking");
    assert_eq!(tx["metadata"]["source"], "frontend-wallet");
    assert_eq!(tx["metadata"]["requiresSignature"], true);
    assert_eq!(tx["metadata"]["displaySymbol"], "cmETH");

    let (status, fetched) = send(app, Method::GET, &format!("/api/transactions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["transaction"]["id"], id.as_str());
    assert_eq!(state.registry.count(), 1);
}

#[tokio::test]
async fn test_create_rejects_empty_target() {
    let app = create_app(create_test_state());
    let (status, body) = send(app, Method::POST, "/api/transactions", Some(json!({ "to": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_value_defaults_to_zero() {
    let app = create_app(create_test_state());
    let (status, body) = send(
        app,
        Method::POST,
        "/api/transactions",
        Some(json!({ "to": PLAIN_TARGET, "value": "ten MNT" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["value"], "0");
    assert_eq!(body["transaction"]["metadata"]["chain"], "base");
    assert_eq!(body["transaction"]["metadata"]["dataType"], "native-transfer");
}

#[tokio::test]
async fn test_update_status_flow() {
    let state = create_test_state();
    let first = state.registry.create(NewTransaction::new(PLAIN_TARGET, "1"));
    let second = state.registry.create(NewTransaction::new(PLAIN_TARGET, "2"));
    let app = create_app(state);

    let hash = "0x9f2c000000000000000000000000000000000000000000000000000000000001";
    let (status, body) = send(
        app.clone(),
        Method::POST,
        &format!("/api/transactions/{}/update", first),
        Some(json!({ "status": "completed", "hash": hash })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["status"], "completed");
    assert_eq!(body["transaction"]["hash"], hash);
    assert_eq!(body["explorer_url"], format!("https://basescan.org/tx/{}", hash));

    let (_, pending) = send(app.clone(), Method::GET, "/api/transactions/pending", None).await;
    let ids: Vec<&str> = pending["transactions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![second.as_str()]);

    let (_, completed) = send(app, Method::GET, "/api/transactions?status=completed", None).await;
    assert_eq!(completed["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(completed["transactions"][0]["id"], first.as_str());
}

#[tokio::test]
async fn test_update_unknown_transaction_is_404() {
    let state = create_test_state();
    state.registry.create(NewTransaction::new(PLAIN_TARGET, "1"));
    let app = create_app(state.clone());

    let (status, body) = send(
        app,
        Method::POST,
        "/api/transactions/tx-0-nope/update",
        Some(json!({ "status": "rejected" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Transaction with ID tx-0-nope not found");
    assert_eq!(state.registry.list(None)[0].status.as_str(), "pending");
}

#[tokio::test]
async fn test_invalid_status_is_400() {
    let state = create_test_state();
    let id = state.registry.create(NewTransaction::new(PLAIN_TARGET, "1"));
    let app = create_app(state);

    let (status, _) = send(
        app.clone(),
        Method::POST,
        &format!("/api/transactions/{}/update", id),
        Some(json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(app, Method::GET, "/api/transactions?status=lost", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_transaction() {
    let state = create_test_state();
    let app = create_app(state.clone());

    let (status, _) = send(app.clone(), Method::GET, "/api/transactions/latest", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    state.registry.create(NewTransaction::new(PLAIN_TARGET, "1"));
    let last = state.registry.create(NewTransaction::new(PLAIN_TARGET, "2"));
    let (status, body) = send(app, Method::GET, "/api/transactions/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction"]["id"], last.as_str());
}

#[tokio::test]
async fn test_networks_endpoint() {
    let app = create_app(create_test_state());
    let (status, body) = send(app, Method::GET, "/api/networks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["default"], "base");
    let mantle = body["networks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == "mantle")
        .unwrap();
    assert_eq!(mantle["chainId"], 5000);
    assert_eq!(mantle["txExplorer"], "https://mantlescan.xyz/tx/");
}
