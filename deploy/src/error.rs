use std::path::PathBuf;

use alloy::primitives::TxHash;
use thiserror::Error;

pub type Result<T, E = DeployError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),

    #[error("missing env var {var} (required by network `{network}`)")]
    MissingEnv { var: &'static str, network: String },

    #[error("invalid private key #{index} for network `{network}`")]
    InvalidPrivateKey { network: String, index: usize },

    #[error("network `{0}` has no accounts to sign with")]
    NoSigners(String),

    #[error("artifact for contract `{name}` not found in {}", dir.display())]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("multiple artifacts match contract `{name}`: {candidates:?}")]
    AmbiguousArtifact { name: String, candidates: Vec<PathBuf> },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("contract `{0}` is abstract and can't be deployed")]
    AbstractContract(String),

    #[error("contract `{0}` has unlinked library references")]
    UnlinkedLibraries(String),

    #[error("invalid bytecode for contract `{name}`")]
    InvalidBytecode {
        name: String,
        #[source]
        source: alloy::hex::FromHexError,
    },

    #[error("constructor expects {expected} arguments, got {got}")]
    ConstructorArity { expected: usize, got: usize },

    #[error("constructor argument #{index} can't be encoded as {ty}: {reason}")]
    ConstructorArg {
        index: usize,
        ty: String,
        reason: String,
    },

    #[error(transparent)]
    Abi(#[from] alloy::dyn_abi::Error),

    #[error("network `{network}` expects chain id {expected}, node reports {actual}")]
    ChainIdMismatch {
        network: String,
        expected: u64,
        actual: u64,
    },

    #[error("rpc request failed")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("deployment transaction failed")]
    PendingTx(#[from] alloy::providers::PendingTransactionError),

    #[error("deployment transaction {0} reverted")]
    Reverted(TxHash),

    #[error("receipt of {0} carries no contract address")]
    MissingContractAddress(TxHash),
}
