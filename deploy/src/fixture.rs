use alloy::consensus::Transaction as _;
use alloy::primitives::Bytes;
use alloy::providers::{DynProvider, Provider};

use crate::artifact::ContractFactory;
use crate::deployer::{DeployResult, _deploy};
use crate::error::Result;
use crate::shared::Signer;

/// A deployed contract together with the connection that deployed it.
pub struct Fixture {
    pub deployer: Signer,
    pub provider: DynProvider,
    pub factory: ContractFactory,
    pub result: DeployResult,
}

impl Fixture {
    /// Runtime code currently stored at the deployed address.
    pub async fn code(&self) -> Result<Bytes> {
        Ok(self.provider.get_code_at(self.result.address).await?)
    }

    /// Input data of the creation transaction, i.e. init code plus encoded
    /// constructor arguments. `None` if the node no longer serves the tx.
    pub async fn creation_input(&self) -> Result<Option<Bytes>> {
        let tx = self
            .provider
            .get_transaction_by_hash(self.result.tx_hash)
            .await?;
        Ok(tx.map(|tx| tx.input().clone()))
    }

    /// Deploys the same contract with the same arguments again.
    pub async fn redeploy(&self) -> Result<DeployResult> {
        let code = self.factory.deploy_code(&self.result.args)?;
        _deploy(
            &self.provider,
            &self.deployer,
            &self.factory,
            code,
            self.result.args.clone(),
            self.result.chain_id,
        )
        .await
    }
}
