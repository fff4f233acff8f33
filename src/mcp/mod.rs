// MCP JSON-RPC protocol types and the tool dispatcher
pub mod handler;
pub mod protocol;
