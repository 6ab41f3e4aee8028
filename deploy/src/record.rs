use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deployer::DeployResult;
use crate::error::{DeployError, Result};

pub const DEFAULT_DEPLOYMENTS_DIR: &str = "deployments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract: String,
    pub network: String,
    pub chain_id: u64,
    pub address: Address,
    pub deployer: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub args: Vec<String>,
    pub deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn new(network: &str, result: &DeployResult) -> Self {
        DeploymentRecord {
            contract: result.contract.clone(),
            network: network.to_string(),
            chain_id: result.chain_id,
            address: result.address,
            deployer: result.deployer,
            tx_hash: result.tx_hash,
            block_number: result.block_number,
            args: result.args.iter().map(ToString::to_string).collect(),
            deployed_at: Utc::now(),
        }
    }
}

fn record_path(dir: &Path, network: &str) -> PathBuf {
    dir.join(format!("{network}.json"))
}

pub fn load(dir: &Path, network: &str) -> Result<Vec<DeploymentRecord>> {
    let path = record_path(dir, network);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&path).map_err(|source| DeployError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DeployError::Json { path, source })
}

/// Appends `record` to `<dir>/<network>.json`, creating it if needed.
pub fn save(dir: &Path, record: DeploymentRecord) -> Result<PathBuf> {
    let mut records = load(dir, &record.network)?;
    let path = record_path(dir, &record.network);
    records.push(record);

    let io_err = |source| DeployError::Io {
        path: path.clone(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    let content = serde_json::to_string_pretty(&records).map_err(|source| DeployError::Json {
        path: path.clone(),
        source,
    })?;
    fs::write(&path, content).map_err(io_err)?;
    Ok(path)
}
