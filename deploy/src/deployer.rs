use std::path::PathBuf;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::TransactionRequest;
use tracing::{debug, info};

use crate::artifact::{get_contract_factory, ConstructorArg, ContractFactory};
use crate::error::{DeployError, Result};
use crate::fixture::Fixture;
use crate::network::Network;
use crate::shared::{check_chain_id, config, connect, get_deployer, Signer};

pub const CONTRACT_NAME: &str = "Tanda";

pub fn tanda_args() -> Vec<ConstructorArg> {
    vec![
        "MetaTanda".into(),
        "Tanda test".into(),
        2.into(),
        1.into(),
    ]
}

#[derive(Debug, Clone)]
pub struct DeployResult {
    pub contract: String,
    pub address: Address,
    pub deployer: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub chain_id: u64,
    pub args: Vec<ConstructorArg>,
}

pub struct LocalDeployParams {
    pub network: Network,
    pub artifacts: PathBuf,
    pub solidity: String,
}

pub struct OnChainParams {
    pub network: String,
    pub artifacts: Option<PathBuf>,
}

pub enum DeployTarget {
    Local(LocalDeployParams),
    OnChain(OnChainParams),
}

pub async fn deploy(target: DeployTarget) -> Result<Fixture> {
    let (network, artifacts, solidity) = match target {
        DeployTarget::Local(p) => (p.network, p.artifacts, p.solidity),
        DeployTarget::OnChain(p) => {
            let config = config(&p.network, p.artifacts)?;
            (config.network, config.artifacts, config.solidity)
        }
    };

    let deployer = get_deployer(&network).await?;
    println!("Deploy contracts with: {}", deployer.address());

    let factory = get_contract_factory(&artifacts, CONTRACT_NAME)?;
    factory.check_compiler(&solidity);
    let args = tanda_args();
    // encode before touching the node so bad args never reach it
    let code = factory.deploy_code(&args)?;

    let provider = connect(&network, &deployer);
    let chain_id = check_chain_id(&network, &provider).await?;
    debug!(network = %network.name, chain_id, "connected");

    let result = _deploy(&provider, &deployer, &factory, code, args, chain_id).await?;
    println!("Contract deployed: {}", result.address);

    Ok(Fixture {
        deployer,
        provider,
        factory,
        result,
    })
}

/// Sends one creation transaction and waits for its receipt.
///
/// Every call creates a new contract instance.
pub(crate) async fn _deploy(
    provider: &DynProvider,
    deployer: &Signer,
    factory: &ContractFactory,
    code: Bytes,
    args: Vec<ConstructorArg>,
    chain_id: u64,
) -> Result<DeployResult> {
    let tx = TransactionRequest::default()
        .with_from(deployer.address())
        .with_deploy_code(code);

    info!(contract = %factory.name, deployer = %deployer.address(), "sending deployment transaction");
    let pending = provider.send_transaction(tx).await?;
    let tx_hash = *pending.tx_hash();
    debug!(%tx_hash, "deployment transaction sent");

    let receipt = pending.get_receipt().await?;
    if !receipt.status() {
        return Err(DeployError::Reverted(tx_hash));
    }
    let address = receipt
        .contract_address
        .ok_or(DeployError::MissingContractAddress(tx_hash))?;
    info!(contract = %factory.name, %address, block = ?receipt.block_number, "contract deployed");

    Ok(DeployResult {
        contract: factory.name.clone(),
        address,
        deployer: deployer.address(),
        tx_hash,
        block_number: receipt.block_number,
        chain_id,
        args,
    })
}
