// src/registry/chains.rs

//! Supported networks and the rule table used to route a transaction
//! intent to one of them.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// --- Known contracts ---

pub const CMETH_TOKEN: &str = "0xe6829d9a7ee3040e1276fa75293bde931859e8fa";
pub const TREEHOUSE_STAKING: &str = "0x5e4acca7a9989007cd74ae4ed1b096c000779dcc";
pub const XOC_BASE: &str = "0xa411c9aa00e020e4f88bc19996d29c5b7adb4acf";
pub const MXNB_ARBITRUM: &str = "0xf197ffc28c23e0309b5559e7a166f2c6164c80aa";
pub const USDT_MANTLE: &str = "0x201eba5cc46d216ce6dc03f6a759e8e766e956ae";
pub const MERCHANT_MOE_ROUTER: &str = "0x45a62b090df48243f12a21897e7ed91863e2c86b";
pub const USDT_ZKSYNC: &str = "0x493257fd37edb34451f62edf8d2a0c418852ba4c";

/// Leading bytes of a Merchant Moe swap call with native MNT value.
const MERCHANT_MOE_SWAP_PREFIX: &str = "0xf1910f7";
/// ERC-20 `approve(address,uint256)`.
const APPROVE_SELECTOR: &str = "0x095ea7b3";

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unsupported chain: {0}")]
pub struct UnknownChain(pub String);

/// A network this process can route transactions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Celo,
    Base,
    Arbitrum,
    Mantle,
    Zksync,
}

impl Chain {
    pub const ALL: [Chain; 5] = [
        Chain::Celo,
        Chain::Base,
        Chain::Arbitrum,
        Chain::Mantle,
        Chain::Zksync,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Celo => "celo",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::Mantle => "mantle",
            Chain::Zksync => "zksync",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Celo => 42220,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::Mantle => 5000,
            Chain::Zksync => 324,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Chain::Celo => "Celo",
            Chain::Base => "Base",
            Chain::Arbitrum => "Arbitrum One",
            Chain::Mantle => "Mantle",
            Chain::Zksync => "zkSync Era",
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Celo => "CELO",
            Chain::Mantle => "MNT",
            Chain::Base | Chain::Arbitrum | Chain::Zksync => "ETH",
        }
    }

    fn explorer_base(&self) -> &'static str {
        match self {
            Chain::Celo => "https://celoscan.io",
            Chain::Base => "https://basescan.org",
            Chain::Arbitrum => "https://arbiscan.io",
            Chain::Mantle => "https://mantlescan.xyz",
            Chain::Zksync => "https://explorer.zksync.io",
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base(), hash)
    }

    /// Summary used by the networks endpoint and the `list_networks` tool.
    pub fn info(&self) -> NetworkInfo {
        NetworkInfo {
            id: *self,
            chain_id: self.chain_id(),
            name: self.display_name(),
            native_symbol: self.native_symbol(),
            tx_explorer: format!("{}/tx/", self.explorer_base()),
            address_explorer: format!("{}/address/", self.explorer_base()),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = UnknownChain;

    /// Accepts the lowercase identifier or the numeric chain id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Chain::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle || c.chain_id().to_string() == needle)
            .ok_or_else(|| UnknownChain(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub id: Chain,
    pub chain_id: u64,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub tx_explorer: String,
    pub address_explorer: String,
}

// --- Classification rules ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Exact, case-insensitive match on the call target.
    Target(String),
    /// Case-insensitive substring match on the call data. The address is
    /// stored without its `0x` so ABI-padded arguments are found too.
    DataContains(String),
}

impl Matcher {
    pub fn target(address: &str) -> Self {
        Matcher::Target(address.to_lowercase())
    }

    pub fn data_contains(address: &str) -> Self {
        let lower = address.to_lowercase();
        Matcher::DataContains(lower.trim_start_matches("0x").to_string())
    }

    /// `to` and `data` must already be lowercased.
    fn matches(&self, to: &str, data: Option<&str>) -> bool {
        match self {
            Matcher::Target(addr) => to == addr,
            Matcher::DataContains(needle) => data.is_some_and(|d| d.contains(needle.as_str())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainRule {
    pub label: String,
    pub matcher: Matcher,
    pub chain: Chain,
    /// Applies even when the caller asked for a specific chain.
    pub pinned: bool,
}

impl ChainRule {
    pub fn new(label: impl Into<String>, matcher: Matcher, chain: Chain) -> Self {
        Self {
            label: label.into(),
            matcher,
            chain,
            pinned: false,
        }
    }

    fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

lazy_static! {
    static ref BUILTIN_RULES: Vec<ChainRule> = vec![
        ChainRule::new("cmETH token", Matcher::target(CMETH_TOKEN), Chain::Mantle).pinned(),
        ChainRule::new("Treehouse staking", Matcher::target(TREEHOUSE_STAKING), Chain::Mantle)
            .pinned(),
        // Bare hex, not "0x5e4a...": ABI-encoded arguments carry no 0x prefix.
        ChainRule::new(
            "Treehouse staking approval",
            Matcher::data_contains(TREEHOUSE_STAKING),
            Chain::Mantle,
        )
        .pinned(),
        ChainRule::new("XOC token", Matcher::target(XOC_BASE), Chain::Base),
        ChainRule::new("MXNB token", Matcher::target(MXNB_ARBITRUM), Chain::Arbitrum),
        ChainRule::new("USDT (Mantle)", Matcher::target(USDT_MANTLE), Chain::Mantle),
        ChainRule::new("Merchant Moe router", Matcher::target(MERCHANT_MOE_ROUTER), Chain::Mantle),
        ChainRule::new("USDT (zkSync Era)", Matcher::target(USDT_ZKSYNC), Chain::Zksync),
    ];
}

/// Outcome of running the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub chain: Chain,
    /// Label of the rule that fired, `None` when the fallback was used.
    pub rule: Option<String>,
}

/// Ordered rule table; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct ChainRules {
    rules: Vec<ChainRule>,
    fallback: Chain,
}

impl ChainRules {
    pub fn builtin(fallback: Chain) -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
            fallback,
        }
    }

    /// Built-in rules followed by `extra` (target matches, lowest priority).
    pub fn with_extra<'a, I>(fallback: Chain, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a Chain)>,
    {
        let mut table = Self::builtin(fallback);
        for (address, chain) in extra {
            let address = if address.starts_with("0x") {
                address.clone()
            } else {
                format!("0x{}", address)
            };
            table.rules.push(ChainRule::new(
                format!("configured {}", address),
                Matcher::target(&address),
                *chain,
            ));
        }
        table
    }

    pub fn fallback(&self) -> Chain {
        self.fallback
    }

    pub fn classify(&self, to: &str, data: Option<&str>) -> Classification {
        self.resolve(to, data, None)
    }

    /// Like [`classify`](Self::classify), but a `requested` chain beats
    /// every rule except the pinned ones (cmETH and Treehouse).
    pub fn resolve(&self, to: &str, data: Option<&str>, requested: Option<Chain>) -> Classification {
        let to = to.to_lowercase();
        let data = data.map(str::to_lowercase);

        if let Some(chain) = requested {
            return self
                .rules
                .iter()
                .filter(|rule| rule.pinned)
                .find(|rule| rule.matcher.matches(&to, data.as_deref()))
                .map(|rule| Classification {
                    chain: rule.chain,
                    rule: Some(rule.label.clone()),
                })
                .unwrap_or(Classification { chain, rule: None });
        }

        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(&to, data.as_deref()))
            .map(|rule| Classification {
                chain: rule.chain,
                rule: Some(rule.label.clone()),
            })
            .unwrap_or(Classification {
                chain: self.fallback,
                rule: None,
            })
    }
}

impl Default for ChainRules {
    fn default() -> Self {
        Self::builtin(Chain::Mantle)
    }
}

// --- Payload shape ---

/// Coarse description of what a transaction does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    ContractCall,
    TokenApproval,
    NativeTransfer,
    TreehouseStaking,
    MerchantMoeSwap,
    Unknown,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::ContractCall => "contract-call",
            DataType::TokenApproval => "token-approval",
            DataType::NativeTransfer => "native-transfer",
            DataType::TreehouseStaking => "treehouse-staking",
            DataType::MerchantMoeSwap => "merchant-moe-swap",
            DataType::Unknown => "unknown",
        }
    }

    /// `to` and `data` are the normalized (0x-prefixed) forms.
    pub fn derive(chain: Chain, to: &str, data: Option<&str>) -> Self {
        let to = to.to_lowercase();
        let data = data.map(str::to_lowercase);

        if chain == Chain::Mantle && to == TREEHOUSE_STAKING {
            return DataType::TreehouseStaking;
        }

        match data.as_deref() {
            Some(d) if chain == Chain::Mantle
                && to == MERCHANT_MOE_ROUTER
                && d.starts_with(MERCHANT_MOE_SWAP_PREFIX) =>
            {
                DataType::MerchantMoeSwap
            }
            Some(d) if d.starts_with("0x6") => DataType::ContractCall,
            Some(d) if d.starts_with("0xa9") || d.starts_with(APPROVE_SELECTOR) => {
                DataType::TokenApproval
            }
            Some(_) => DataType::Unknown,
            None => DataType::NativeTransfer,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
