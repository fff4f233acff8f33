//! # MCP Handler Module
//!
//! Implements the Model Context Protocol (MCP) surface used by agent-side
//! action providers. Producers record transaction intents here; relays and
//! UIs read them back and report status changes.
//!
//! ## Supported Tools
//!
//! ### Producers
//! - `create_pending_transaction` - Record a transaction for wallet signing
//!
//! ### Consumers
//! - `list_transactions` - List recorded transactions, optionally by status
//! - `get_transaction` - Look up a transaction by id
//! - `get_latest_transaction` - Most recently created transaction
//! - `update_transaction_status` - Report signing/confirmation results
//!
//! ### Reference
//! - `list_networks` - Chains transactions can be routed to

use crate::{
    mcp::protocol::{error_codes, Request, Response},
    registry::{
        value::format_wei_as_ether, Chain, NewTransaction, TransactionRecord, TransactionRegistry,
        TransactionStatus,
    },
    utils, AppState,
};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

/// Methods that may be called directly instead of through `tools/call`.
const TOOL_NAMES: [&str; 6] = [
    "create_pending_transaction",
    "list_transactions",
    "get_transaction",
    "get_latest_transaction",
    "update_transaction_status",
    "list_networks",
];

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(text: String, payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": text }]);
    match payload {
        Value::Object(mut map) => {
            if !map.contains_key("content") {
                map.insert("content".into(), content);
            }
            Value::Object(map)
        }
        other => json!({
            "data": other,
            "content": content
        }),
    }
}

fn describe(tx: &TransactionRecord) -> String {
    let mut line = format!(
        "{} [{}] {} -> {} ({} {}) on {}",
        tx.id,
        tx.status,
        tx.metadata.data_type,
        tx.to,
        format_wei_as_ether(&tx.value),
        tx.chain().native_symbol(),
        tx.chain().display_name(),
    );
    if let Some(url) = tx.explorer_url() {
        line.push_str(&format!(" {}", url));
    }
    line
}

fn not_found(req_id: &Value, tx_id: &str) -> Response {
    Response::error_with_data(
        req_id.clone(),
        error_codes::NOT_FOUND,
        format!("Transaction with ID {} not found", tx_id),
        json!({ "id": tx_id }),
    )
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let is_alias = TOOL_NAMES.contains(&req.method.as_str());
    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Convenience aliases to support direct method calls from CLI
        _ if is_alias => handle_tool_call(req.into_tool_call(), state).await,
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let req_id = &req.id;
    let registry = &state.registry;

    let res = match tool_name {
        "create_pending_transaction" => create_pending_transaction(args, req_id, registry),
        "list_transactions" => list_transactions(args, req_id, registry),
        "get_transaction" => get_transaction(args, req_id, registry),
        "get_latest_transaction" => {
            let result = match registry.most_recent() {
                Some(tx) => make_texty_result(describe(&tx), json!({ "transaction": tx })),
                None => make_texty_result(
                    "No transactions recorded yet".to_string(),
                    json!({ "transaction": null }),
                ),
            };
            Ok(Response::success(req_id.clone(), result))
        }
        "update_transaction_status" => update_transaction_status(args, req_id, registry),
        "list_networks" => {
            let networks: Vec<_> = Chain::ALL.iter().map(Chain::info).collect();
            let default_chain = registry.rules().fallback();
            let text = format!(
                "Supported networks: {} (default: {})",
                Chain::ALL.iter().map(Chain::as_str).collect::<Vec<_>>().join(", "),
                default_chain
            );
            Ok(Response::success(
                req_id.clone(),
                make_texty_result(text, json!({ "networks": networks, "default": default_chain })),
            ))
        }
        _ => {
            warn!("Unknown tool requested: {}", tool_name);
            Err(Response::error(
                req_id.clone(),
                error_codes::METHOD_NOT_FOUND,
                format!("Tool not found: {}", tool_name),
            ))
        }
    };

    res.unwrap_or_else(|err_resp| err_resp)
}

fn create_pending_transaction(
    args: &Value,
    req_id: &Value,
    registry: &TransactionRegistry,
) -> Result<Response, Response> {
    let to = utils::get_required_arg::<String>(args, "to", req_id)?;
    let value = utils::get_optional_arg::<String>(args, "value", req_id)?.unwrap_or_default();
    let data = utils::get_optional_arg::<String>(args, "data", req_id)?;
    let wallet_address = utils::get_optional_arg::<String>(args, "wallet_address", req_id)?;
    let metadata =
        utils::get_optional_arg::<Map<String, Value>>(args, "metadata", req_id)?.unwrap_or_default();

    let id = registry.create(NewTransaction {
        to,
        value,
        data,
        wallet_address,
        metadata,
    });
    let tx = registry.get_by_id(&id).ok_or_else(|| not_found(req_id, &id))?;
    let summary = if tx.metadata.requires_signature {
        format!(
            "Created transaction {} on {}. It has been sent to {} for signing.",
            id,
            tx.chain().display_name(),
            tx.metadata.wallet_address
        )
    } else {
        format!("Created transaction {} on {}.", id, tx.chain().display_name())
    };
    Ok(Response::success(
        req_id.clone(),
        make_texty_result(summary, json!({ "id": id, "transaction": tx })),
    ))
}

fn list_transactions(
    args: &Value,
    req_id: &Value,
    registry: &TransactionRegistry,
) -> Result<Response, Response> {
    let status = utils::get_optional_arg::<String>(args, "status", req_id)?
        .map(|s| utils::parse_arg::<TransactionStatus>(&s, "status", req_id))
        .transpose()?;
    let txs = registry.list(status);
    let mut text = match status {
        Some(s) => format!("{} {} transaction(s)", txs.len(), s),
        None => format!("{} transaction(s)", txs.len()),
    };
    for tx in &txs {
        text.push('\n');
        text.push_str(&describe(tx));
    }
    Ok(Response::success(
        req_id.clone(),
        make_texty_result(text, json!({ "transactions": txs })),
    ))
}

fn get_transaction(
    args: &Value,
    req_id: &Value,
    registry: &TransactionRegistry,
) -> Result<Response, Response> {
    let id = utils::get_required_arg::<String>(args, "id", req_id)?;
    let tx = registry.get_by_id(&id).ok_or_else(|| not_found(req_id, &id))?;
    Ok(Response::success(
        req_id.clone(),
        make_texty_result(describe(&tx), json!({ "transaction": tx })),
    ))
}

fn update_transaction_status(
    args: &Value,
    req_id: &Value,
    registry: &TransactionRegistry,
) -> Result<Response, Response> {
    let id = utils::get_required_arg::<String>(args, "id", req_id)?;
    let raw_status = utils::get_required_arg::<String>(args, "status", req_id)?;
    let status = utils::parse_arg::<TransactionStatus>(&raw_status, "status", req_id)?;
    let hash = utils::get_optional_arg::<String>(args, "hash", req_id)?;

    let tx = registry
        .update_status(&id, status, hash)
        .ok_or_else(|| not_found(req_id, &id))?;
    Ok(Response::success(
        req_id.clone(),
        make_texty_result(
            format!("Transaction {} is now {}", id, tx.status),
            json!({ "transaction": tx, "explorer_url": tx.explorer_url() }),
        ),
    ))
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "evm_tx_registry",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Pending transaction registry: record EVM transaction intents for wallet signing, route them to a chain, and track their status.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    let tools = json!([
        {
            "name": "create_pending_transaction",
            "description": "Record a transaction intent for wallet signing. The target chain is detected from the contract address.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "to": {"type": "string", "description": "Target contract or recipient address."},
                    "value": {"type": "string", "description": "Native amount: wei integer, 0x hex, or a decimal whole-token amount like '1.5'."},
                    "data": {"type": "string", "description": "ABI-encoded call data."},
                    "wallet_address": {"type": "string", "description": "Address of the wallet that will sign."},
                    "metadata": {"type": "object", "description": "Extra attributes; known keys (chain, dataType, ...) override detection."}
                },
                "required": ["to"]
            }
        },
        {
            "name": "list_transactions",
            "description": "List recorded transactions in creation order.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "status": {"type": "string", "enum": ["pending", "signed", "rejected", "completed"]}
                }
            }
        },
        {
            "name": "get_transaction",
            "description": "Get a recorded transaction by id.",
            "inputSchema": {"type": "object", "properties": {"id": {"type": "string"}}, "required": ["id"]}
        },
        {
            "name": "get_latest_transaction",
            "description": "Get the most recently recorded transaction.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": "update_transaction_status",
            "description": "Set the status of a recorded transaction, optionally with its on-chain hash.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id": {"type": "string"},
                    "status": {"type": "string", "enum": ["pending", "signed", "rejected", "completed"]},
                    "hash": {"type": "string", "description": "0x... transaction hash"}
                },
                "required": ["id", "status"]
            }
        },
        {
            "name": "list_networks",
            "description": "List the chains transactions can be routed to.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
    ]);
    Response::success(req.id.clone(), json!({ "tools": tools }))
}
