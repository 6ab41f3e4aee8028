use std::path::PathBuf;

use alloy::node_bindings::{Anvil, AnvilInstance};
use alloy::signers::local::PrivateKeySigner;
use tanda_deploy::deployer::{self, DeployTarget, LocalDeployParams};
use tanda_deploy::error::Result;
use tanda_deploy::fixture::Fixture;
use tanda_deploy::network::{Accounts, Network};
use tanda_deploy::shared::SOLIDITY_VERSION;

pub const CHAIN_ID: u64 = 1337;

pub fn artifacts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("artifacts")
}

/// Starts a dev chain. Tests using it are `#[ignore]`d and need `anvil` on PATH.
pub fn spawn_chain() -> AnvilInstance {
    Anvil::new()
        .chain_id(CHAIN_ID)
        .try_spawn()
        .expect("failed to start anvil")
}

pub fn dev_key(anvil: &AnvilInstance, index: usize) -> PrivateKeySigner {
    anvil.keys()[index].clone().into()
}

pub fn local_network(anvil: &AnvilInstance) -> Network {
    Network {
        name: "local".to_string(),
        url: anvil.endpoint_url(),
        chain_id: Some(CHAIN_ID),
        accounts: Accounts::Local(vec![dev_key(anvil, 0)]),
    }
}

pub fn node_network(anvil: &AnvilInstance) -> Network {
    Network {
        accounts: Accounts::Remote,
        ..local_network(anvil)
    }
}

pub async fn deploy_to(network: Network, artifacts: PathBuf) -> Result<Fixture> {
    deployer::deploy(DeployTarget::Local(LocalDeployParams {
        network,
        artifacts,
        solidity: SOLIDITY_VERSION.to_string(),
    }))
    .await
}
