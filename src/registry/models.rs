// src/registry/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

use super::chains::Chain;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown transaction status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle state of a recorded transaction intent.
///
/// Any status may follow any other; callers own transition legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Signed,
    Rejected,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Signed => "signed",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Rejected | TransactionStatus::Completed)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "signed" => Ok(TransactionStatus::Signed),
            "rejected" => Ok(TransactionStatus::Rejected),
            "completed" => Ok(TransactionStatus::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Who asked for the transaction to be created.
pub const SOURCE_FRONTEND_WALLET: &str = "frontend-wallet";
pub const SOURCE_BACKEND_WALLET: &str = "backend-wallet";

/// Attributes derived at creation time plus whatever the producer added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetadata {
    pub source: String,
    pub wallet_address: String,
    pub requires_signature: bool,
    pub data_size: usize,
    pub data_type: String,
    pub chain: Chain,
    /// Producer-supplied attributes with no dedicated field
    /// (e.g. `displayAmount`, `targetContract`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionMetadata {
    /// Shallow-merges `overrides` on top of the derived fields.
    ///
    /// A known key whose value has the wrong shape (say `chain: "polygon"`)
    /// is logged and dropped so the derived value stays in place.
    pub fn apply_overrides(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            let applied = match key.as_str() {
                "source" => assign(&mut self.source, value.clone()),
                "walletAddress" => assign(&mut self.wallet_address, value.clone()),
                "requiresSignature" => assign(&mut self.requires_signature, value.clone()),
                "dataSize" => assign(&mut self.data_size, value.clone()),
                "dataType" => assign(&mut self.data_type, value.clone()),
                "chain" => assign(&mut self.chain, value.clone()),
                _ => {
                    self.extra.insert(key, value);
                    continue;
                }
            };
            if !applied {
                warn!("Ignoring metadata override {}={} (invalid value)", key, value);
            }
        }
    }
}

fn assign<T: serde::de::DeserializeOwned>(slot: &mut T, value: Value) -> bool {
    match serde_json::from_value(value) {
        Ok(v) => {
            *slot = v;
            true
        }
        Err(_) => false,
    }
}

/// A transaction this process has asked a wallet to sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub to: String,
    /// Wei, as a decimal string or an untouched `0x` hex string.
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    pub metadata: TransactionMetadata,
}

impl TransactionRecord {
    pub fn chain(&self) -> Chain {
        self.metadata.chain
    }

    /// Explorer link for the on-chain hash, once known.
    pub fn explorer_url(&self) -> Option<String> {
        self.hash.as_deref().map(|h| self.chain().tx_url(h))
    }
}

/// Input to [`TransactionRegistry::create`](super::TransactionRegistry::create).
#[derive(Debug, Clone, Default)]
pub struct NewTransaction {
    pub to: String,
    pub value: String,
    pub data: Option<String>,
    pub wallet_address: Option<String>,
    /// Merged over the derived metadata; see [`TransactionMetadata::apply_overrides`].
    pub metadata: Map<String, Value>,
}

impl NewTransaction {
    pub fn new(to: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn wallet(mut self, wallet_address: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet_address.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
