// src/config.rs

use std::collections::HashMap;
use std::env;
use std::net::IpAddr;
use anyhow::{anyhow, bail, Context, Result};

use crate::registry::{Chain, ChainRules};

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,
    pub bind_address: IpAddr,

    /// Chain used when no routing rule matches a transaction.
    /// Supported chains:
    /// - Celo (42220)
    /// - Base (8453)
    /// - Arbitrum One (42161)
    /// - Mantle (5000)
    /// - zkSync Era (324)
    pub default_chain: Chain,

    /// Extra `address -> chain` routes, checked after the built-in ones
    pub chain_address_rules: HashMap<String, Chain>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            bind_address: IpAddr::from([127, 0, 0, 1]),
            default_chain: Chain::Mantle,
            chain_address_rules: HashMap::new(),
        }
    }
}

impl Config {
    /// Returns the identifiers of every chain transactions can be routed to
    pub fn supported_chains(&self) -> Vec<&'static str> {
        Chain::ALL.iter().map(Chain::as_str).collect()
    }

    /// Builds the routing table described by this configuration
    pub fn chain_rules(&self) -> ChainRules {
        ChainRules::with_extra(self.default_chain, &self.chain_address_rules)
    }

    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let default_chain = match env::var("DEFAULT_CHAIN") {
            Ok(name) => name
                .parse::<Chain>()
                .context("DEFAULT_CHAIN must be one of celo, base, arbitrum, mantle, zksync")?,
            Err(_) => defaults.default_chain,
        };

        // Optional JSON map of contract address -> chain
        let chain_address_rules = match env::var("CHAIN_ADDRESS_RULES") {
            Ok(raw) if !raw.trim().is_empty() => parse_address_rules(&raw)?,
            _ => HashMap::new(),
        };

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| defaults.port.to_string())
                .parse()
                .context("PORT must be a valid number")?,
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| defaults.bind_address.to_string())
                .parse()
                .context("BIND_ADDRESS must be a valid IP address")?,
            default_chain,
            chain_address_rules,
        })
    }
}

fn parse_address_rules(raw: &str) -> Result<HashMap<String, Chain>> {
    let entries: HashMap<String, String> = serde_json::from_str(raw)
        .context("Invalid CHAIN_ADDRESS_RULES JSON format")?;

    let mut rules = HashMap::with_capacity(entries.len());
    for (address, chain) in entries {
        let chain = chain
            .parse::<Chain>()
            .map_err(|e| anyhow!("CHAIN_ADDRESS_RULES entry for {}: {}", address, e))?;
        let key = normalize_address(&address);
        if let Some(previous) = rules.insert(key.clone(), chain) {
            if previous != chain {
                bail!("CHAIN_ADDRESS_RULES maps {} to both {} and {}", key, previous, chain);
            }
        }
    }
    Ok(rules)
}

// "abc", "0xABC" and "0XAbc" must all land on the same key.
fn normalize_address(address: &str) -> String {
    let lower = address.trim().to_lowercase();
    format!("0x{}", lower.strip_prefix("0x").unwrap_or(&lower))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_rules_parse_and_lowercase() {
        let rules = parse_address_rules(r#"{"0xAbC": "base", "0xdef": "42161"}"#).unwrap();
        assert_eq!(rules.get("0xabc"), Some(&Chain::Base));
        assert_eq!(rules.get("0xdef"), Some(&Chain::Arbitrum));
    }

    #[test]
    fn address_rules_collapse_prefix_variants() {
        let rules = parse_address_rules(r#"{"abc": "celo", "0xABC": "celo", "def": "base"}"#).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("0xabc"), Some(&Chain::Celo));
        assert_eq!(rules.get("0xdef"), Some(&Chain::Base));

        assert!(parse_address_rules(r#"{"abc": "celo", "0xabc": "base"}"#).is_err());
    }

    #[test]
    fn address_rules_reject_unknown_chain() {
        assert!(parse_address_rules(r#"{"0xabc": "solana"}"#).is_err());
        assert!(parse_address_rules("not json").is_err());
    }

    #[test]
    fn configured_rules_feed_the_router() {
        let mut config = Config::default();
        config.chain_address_rules.insert("0xabc".into(), Chain::Celo);
        let rules = config.chain_rules();
        assert_eq!(rules.fallback(), Chain::Mantle);
        assert_eq!(rules.classify("0xABC", None).chain, Chain::Celo);
    }
}
