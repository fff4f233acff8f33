//! Utility functions shared by the HTTP and MCP surfaces

use serde::de::DeserializeOwned;
use serde_json::{Value, from_value};
use crate::mcp::protocol::{Response, error_codes};

/// Helper function to extract a required argument from a JSON object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}

/// Like [`get_required_arg`], but absent or null keys yield `Ok(None)`
pub fn get_optional_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<Option<T>, Response> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => get_required_arg(args, key, req_id).map(Some),
    }
}

/// Parses a `FromStr` argument given as a string, e.g. a status or chain name
pub fn parse_arg<T>(raw: &str, key: &str, req_id: &Value) -> Result<T, Response>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Invalid argument '{}': {}", key, e),
        )
    })
}
