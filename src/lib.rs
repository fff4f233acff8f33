// src/lib.rs

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod mcp;
pub mod registry;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Ledger of transactions awaiting signature or confirmation
    pub registry: Arc<registry::TransactionRegistry>,
}

impl AppState {
    /// Builds the state, including a fresh registry routed by `config`
    pub fn new(config: config::Config) -> Self {
        let registry = registry::TransactionRegistry::new(config.chain_rules());
        Self {
            config,
            registry: Arc::new(registry),
        }
    }
}
