use std::path::PathBuf;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use dotenvy::dotenv;
use tracing::{debug, info};

use crate::error::{DeployError, Result};
use crate::network::{self, Accounts, Network};

/// Compiler version the artifacts are expected to be built with.
pub const SOLIDITY_VERSION: &str = "0.8.21";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

#[derive(Debug, Clone)]
pub struct Config {
    pub solidity: String,
    pub network: Network,
    pub artifacts: PathBuf,
}

/// Loads `.env` (if any) and resolves the named network.
///
/// `artifacts` falls back to `ARTIFACTS_DIR`, then to `artifacts/`.
pub fn config(network_name: &str, artifacts: Option<PathBuf>) -> Result<Config> {
    if let Ok(path) = dotenv() {
        debug!(path = %path.display(), "loaded env file");
    }
    let artifacts = artifacts
        .or_else(|| std::env::var_os("ARTIFACTS_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR));
    let network = network::resolve(network_name)?;
    info!(network = %network.name, url = %network.url, "selected network");
    Ok(Config {
        solidity: SOLIDITY_VERSION.to_string(),
        network,
        artifacts,
    })
}

/// An account able to submit transactions on the selected network.
#[derive(Debug, Clone)]
pub enum Signer {
    /// Signs locally with a configured key.
    Local(PrivateKeySigner),
    /// Unlocked on the node; transactions go through `eth_sendTransaction`.
    Remote(Address),
}

impl Signer {
    pub fn address(&self) -> Address {
        match self {
            Signer::Local(signer) => signer.address(),
            Signer::Remote(address) => *address,
        }
    }
}

pub async fn get_signers(network: &Network) -> Result<Vec<Signer>> {
    match &network.accounts {
        Accounts::Local(keys) => Ok(keys.iter().cloned().map(Signer::Local).collect()),
        Accounts::Remote => {
            let provider = ProviderBuilder::new().connect_http(network.url.clone());
            let accounts = provider.get_accounts().await?;
            debug!(count = accounts.len(), "node accounts");
            Ok(accounts.into_iter().map(Signer::Remote).collect())
        }
    }
}

/// First signer of the network, the one contracts are deployed with.
pub async fn get_deployer(network: &Network) -> Result<Signer> {
    get_signers(network)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DeployError::NoSigners(network.name.clone()))
}

pub fn connect(network: &Network, signer: &Signer) -> DynProvider {
    match signer {
        Signer::Local(key) => ProviderBuilder::new()
            .wallet(key.clone())
            .connect_http(network.url.clone())
            .erased(),
        Signer::Remote(_) => ProviderBuilder::new()
            .connect_http(network.url.clone())
            .erased(),
    }
}

/// Fails when the node's chain id differs from the one the network declares.
pub async fn check_chain_id(network: &Network, provider: &DynProvider) -> Result<u64> {
    let actual = provider.get_chain_id().await?;
    match network.chain_id {
        Some(expected) if expected != actual => Err(DeployError::ChainIdMismatch {
            network: network.name.clone(),
            expected,
            actual,
        }),
        _ => Ok(actual),
    }
}
