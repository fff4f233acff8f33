// src/registry/manager.rs

//! In-memory ledger of transaction intents.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde_json::Map;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::chains::{Chain, ChainRules, DataType};
use super::models::{
    NewTransaction, TransactionMetadata, TransactionRecord, TransactionStatus,
    SOURCE_BACKEND_WALLET, SOURCE_FRONTEND_WALLET,
};
use super::value::normalize_value;

#[derive(Debug, Default)]
struct Ledger {
    // Insertion order is creation order.
    records: Vec<TransactionRecord>,
    index: HashMap<String, usize>,
}

/// Process-wide record of every transaction handed to a wallet for signing.
///
/// Records are never removed. Mutations are serialized behind the write
/// lock; reads hand out clones.
#[derive(Debug)]
pub struct TransactionRegistry {
    rules: ChainRules,
    ledger: RwLock<Ledger>,
}

impl TransactionRegistry {
    pub fn new(rules: ChainRules) -> Self {
        Self {
            rules,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub fn rules(&self) -> &ChainRules {
        &self.rules
    }

    // A panic elsewhere must not take the ledger down with it.
    fn read(&self) -> RwLockReadGuard<'_, Ledger> {
        self.ledger.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger> {
        self.ledger.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a new intent and returns its id. Never fails: malformed
    /// amounts become `"0"` and unroutable targets land on the fallback chain.
    pub fn create(&self, tx: NewTransaction) -> String {
        let NewTransaction {
            to,
            value,
            data,
            wallet_address,
            metadata: mut overrides,
        } = tx;

        let to = with_hex_prefix(to.trim());
        let value = normalize_value(&value);
        let data = data
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .map(|d| with_hex_prefix(&d));

        // An invalid requested chain stays in the overrides so it gets logged and dropped.
        let requested = overrides
            .get("chain")
            .and_then(|v| serde_json::from_value::<Chain>(v.clone()).ok());
        if requested.is_some() {
            overrides.remove("chain");
        }

        let classification = self.rules.resolve(&to, data.as_deref(), requested);
        match (&classification.rule, requested) {
            (Some(rule), _) => debug!("Matched {} rule, routing to {}", rule, classification.chain),
            (None, Some(_)) => debug!("Using requested chain {}", classification.chain),
            (None, None) => debug!("No chain rule matched, using default {}", classification.chain),
        }
        let data_type = DataType::derive(classification.chain, &to, data.as_deref());

        let mut metadata = TransactionMetadata {
            source: if wallet_address.is_some() {
                SOURCE_FRONTEND_WALLET
            } else {
                SOURCE_BACKEND_WALLET
            }
            .to_string(),
            wallet_address: wallet_address.clone().unwrap_or_else(|| to.clone()),
            requires_signature: wallet_address.is_some(),
            data_size: data.as_ref().map_or(0, String::len),
            data_type: data_type.to_string(),
            chain: classification.chain,
            extra: Map::new(),
        };
        metadata.apply_overrides(overrides);

        let timestamp = Utc::now().timestamp_millis();
        let mut ledger = self.write();
        let id = loop {
            let candidate = generate_id(timestamp);
            if !ledger.index.contains_key(&candidate) {
                break candidate;
            }
        };

        let record = TransactionRecord {
            id: id.clone(),
            to,
            value,
            data,
            status: TransactionStatus::Pending,
            hash: None,
            timestamp,
            metadata,
        };

        info!(
            "✅ Transaction created with ID: {} on {} ({})",
            id,
            record.metadata.chain.as_str().to_uppercase(),
            record.metadata.data_type
        );
        if let Some(wallet) = &wallet_address {
            info!("⏳ Waiting for wallet signature from {}...", wallet);
        }

        let position = ledger.records.len();
        ledger.index.insert(id.clone(), position);
        ledger.records.push(record);

        id
    }

    /// Sets the status (and hash, when given) of an existing record.
    /// Returns `None` for an unknown id.
    pub fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
        hash: Option<String>,
    ) -> Option<TransactionRecord> {
        let mut ledger = self.write();
        let Some(&position) = ledger.index.get(id) else {
            warn!("Status update for unknown transaction {}", id);
            return None;
        };

        let record = &mut ledger.records[position];
        if record.status.is_terminal() {
            debug!("Transaction {} leaving terminal status {}", id, record.status);
        }
        info!(
            "Transaction {} updated: status={} -> {}, hash={}",
            id,
            record.status,
            status,
            hash.as_deref().unwrap_or("N/A")
        );
        record.status = status;
        if let Some(hash) = hash.filter(|h| !h.is_empty()) {
            record.hash = Some(hash);
        }
        Some(record.clone())
    }

    /// All records, or those in `status`, in creation order.
    pub fn list(&self, status: Option<TransactionStatus>) -> Vec<TransactionRecord> {
        self.read()
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<TransactionRecord> {
        let ledger = self.read();
        ledger.index.get(id).map(|&i| ledger.records[i].clone())
    }

    pub fn most_recent(&self) -> Option<TransactionRecord> {
        self.read().records.last().cloned()
    }

    pub fn count(&self) -> usize {
        self.read().records.len()
    }

    pub fn count_by_status(&self, status: TransactionStatus) -> usize {
        self.read().records.iter().filter(|r| r.status == status).count()
    }
}

impl Default for TransactionRegistry {
    fn default() -> Self {
        Self::new(ChainRules::default())
    }
}

fn with_hex_prefix(s: &str) -> String {
    if s.starts_with("0x") {
        s.to_string()
    } else {
        format!("0x{}", s)
    }
}

fn generate_id(timestamp: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("tx-{}-{}", timestamp, &suffix[..8])
}
