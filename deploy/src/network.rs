use std::collections::HashMap;
use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use maplit::hashmap;
use reqwest::Url;

use crate::error::{DeployError, Result};

pub const DEFAULT_NETWORK: &str = "hardhat";

/// Where a network's signing accounts come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSource {
    /// Accounts unlocked on the node itself (`eth_accounts`).
    Remote,
    /// A single hex private key read from the named env var.
    Env(&'static str),
}

#[derive(Debug, Clone)]
pub struct NetworkSpec {
    pub url: &'static str,
    pub chain_id: Option<u64>,
    pub accounts: AccountSource,
}

#[derive(Debug, Clone)]
pub enum Accounts {
    Remote,
    Local(Vec<PrivateKeySigner>),
}

#[derive(Debug, Clone)]
pub struct Network {
    pub name: String,
    pub url: Url,
    pub chain_id: Option<u64>,
    pub accounts: Accounts,
}

pub fn networks() -> HashMap<&'static str, NetworkSpec> {
    hashmap! {
        "hardhat" => NetworkSpec {
            url: "http://127.0.0.1:8545",
            chain_id: Some(1337),
            accounts: AccountSource::Remote,
        },
        "localhost" => NetworkSpec {
            url: "http://127.0.0.1:8545",
            chain_id: None,
            accounts: AccountSource::Remote,
        },
        "testnet_aurora" => NetworkSpec {
            url: "https://testnet.aurora.dev",
            chain_id: Some(1313161555),
            accounts: AccountSource::Env("AURORA_PRIVATE_KEY"),
        },
    }
}

/// Looks up `name` in the network table and loads its credentials.
///
/// Only the selected network's env vars are read, so a missing key for a
/// network that isn't used never fails the run.
pub fn resolve(name: &str) -> Result<Network> {
    let spec = networks()
        .remove(name)
        .ok_or_else(|| DeployError::UnknownNetwork(name.to_string()))?;
    let accounts = match spec.accounts {
        AccountSource::Remote => Accounts::Remote,
        AccountSource::Env(var) => {
            let key = std::env::var(var).map_err(|_| DeployError::MissingEnv {
                var,
                network: name.to_string(),
            })?;
            Accounts::Local(vec![parse_private_key(name, 0, &key)?])
        }
    };
    Ok(Network {
        name: name.to_string(),
        // table urls are literals
        url: Url::parse(spec.url).expect("static network url"),
        chain_id: spec.chain_id,
        accounts,
    })
}

/// Accepts keys with or without the `0x` prefix.
pub fn parse_private_key(network: &str, index: usize, key: &str) -> Result<PrivateKeySigner> {
    let key = key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    PrivateKeySigner::from_str(key).map_err(|_| DeployError::InvalidPrivateKey {
        network: network.to_string(),
        index,
    })
}
