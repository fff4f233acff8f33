// src/registry/mod.rs

pub mod chains;
pub mod manager;
pub mod models;
pub mod value;

pub use chains::{Chain, ChainRules, Classification, DataType};
pub use manager::TransactionRegistry;
pub use models::{NewTransaction, TransactionMetadata, TransactionRecord, TransactionStatus};
