//! Contract factories built from compiled artifacts.
//!
//! Both artifact layouts in common use are understood: Hardhat's
//! (`artifacts/contracts/<File>.sol/<Name>.json`, hex `bytecode` string) and
//! Foundry's (`out/<File>.sol/<Name>.json`, `bytecode.object`).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use alloy::dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier};
use alloy::hex;
use alloy::json_abi::JsonAbi;
use alloy::primitives::{Bytes, I256, U256};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{DeployError, Result};

/// A literal constructor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArg {
    Text(String),
    Number(u64),
}

impl fmt::Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Text(text) => write!(f, "{text:?}"),
            ConstructorArg::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ConstructorArg {
    fn from(text: &str) -> Self {
        ConstructorArg::Text(text.to_string())
    }
}

impl From<u64> for ConstructorArg {
    fn from(n: u64) -> Self {
        ConstructorArg::Number(n)
    }
}

impl ConstructorArg {
    fn to_sol_value(&self, index: usize, ty: &DynSolType) -> Result<DynSolValue> {
        let invalid = |reason: String| DeployError::ConstructorArg {
            index,
            ty: ty.sol_type_name().into_owned(),
            reason,
        };
        match (self, ty) {
            (ConstructorArg::Text(text), DynSolType::String) => Ok(DynSolValue::String(text.clone())),
            (ConstructorArg::Text(text), _) => ty.coerce_str(text).map_err(|e| invalid(e.to_string())),
            (ConstructorArg::Number(n), DynSolType::Uint(bits)) => {
                if *bits < 64 && *n >> bits != 0 {
                    return Err(invalid(format!("{n} overflows uint{bits}")));
                }
                Ok(DynSolValue::Uint(U256::from(*n), *bits))
            }
            (ConstructorArg::Number(n), DynSolType::Int(bits)) => {
                if *bits <= 64 && *n >> (bits - 1) != 0 {
                    return Err(invalid(format!("{n} overflows int{bits}")));
                }
                let value = I256::try_from(*n).map_err(|e| invalid(e.to_string()))?;
                Ok(DynSolValue::Int(value, *bits))
            }
            (ConstructorArg::Number(_), _) => Err(invalid("expected a numeric parameter".to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn hex(&self) -> &str {
        match self {
            BytecodeField::Hex(hex) => hex,
            BytecodeField::Object { object } => object,
        }
    }
}

#[derive(Deserialize)]
struct CompilerInfo {
    version: String,
}

#[derive(Deserialize)]
struct ArtifactMetadata {
    compiler: Option<CompilerInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    abi: JsonAbi,
    bytecode: BytecodeField,
    #[serde(default)]
    link_references: BTreeMap<String, serde_json::Value>,
    // foundry stores metadata as an object, hardhat doesn't store it at all
    #[serde(default, deserialize_with = "lenient_metadata")]
    metadata: Option<ArtifactMetadata>,
}

fn lenient_metadata<'de, D>(deserializer: D) -> std::result::Result<Option<ArtifactMetadata>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Binds a compiled contract's ABI and creation bytecode to deployment.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
    pub compiler: Option<String>,
    pub path: PathBuf,
}

impl ContractFactory {
    pub fn from_file(name: &str, path: &Path) -> Result<Self> {
        let raw = read_artifact(path)?;
        let code = raw.bytecode.hex().trim();
        let code = code.strip_prefix("0x").unwrap_or(code);
        if code.is_empty() {
            return Err(DeployError::AbstractContract(name.to_string()));
        }
        if !raw.link_references.is_empty() || code.contains("__$") {
            return Err(DeployError::UnlinkedLibraries(name.to_string()));
        }
        let bytecode = hex::decode(code).map_err(|source| DeployError::InvalidBytecode {
            name: name.to_string(),
            source,
        })?;
        Ok(ContractFactory {
            name: name.to_string(),
            abi: raw.abi,
            bytecode: bytecode.into(),
            compiler: raw.metadata.and_then(|m| m.compiler).map(|c| c.version),
            path: path.to_path_buf(),
        })
    }

    /// Creation bytecode followed by the ABI-encoded constructor arguments.
    pub fn deploy_code(&self, args: &[ConstructorArg]) -> Result<Bytes> {
        let Some(constructor) = &self.abi.constructor else {
            if !args.is_empty() {
                return Err(DeployError::ConstructorArity {
                    expected: 0,
                    got: args.len(),
                });
            }
            return Ok(self.bytecode.clone());
        };
        if constructor.inputs.len() != args.len() {
            return Err(DeployError::ConstructorArity {
                expected: constructor.inputs.len(),
                got: args.len(),
            });
        }
        let values = constructor
            .inputs
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (param, arg))| {
                let ty: DynSolType = param.resolve()?;
                arg.to_sol_value(index, &ty)
            })
            .collect::<Result<Vec<_>>>()?;
        let encoded = constructor.abi_encode_input(&values)?;

        let mut code = self.bytecode.to_vec();
        code.extend_from_slice(&encoded);
        Ok(code.into())
    }

    /// False only when the artifact records a version other than `expected`.
    pub fn compiler_matches(&self, expected: &str) -> bool {
        self.compiler
            .as_deref()
            .map_or(true, |version| version.starts_with(expected))
    }

    /// Logs a warning when the artifact wasn't built with `expected`.
    pub fn check_compiler(&self, expected: &str) {
        if !self.compiler_matches(expected) {
            warn!(
                contract = %self.name,
                version = ?self.compiler,
                %expected,
                "artifact was built with a different compiler version"
            );
        }
    }
}

/// Resolves the artifact named `name` under `dir` into a factory.
pub fn get_contract_factory(dir: &Path, name: &str) -> Result<ContractFactory> {
    let mut found = Vec::new();
    find_artifacts(dir, &format!("{name}.json"), &mut found)?;
    let candidates = match found.len() {
        0 | 1 => found,
        _ => {
            // same file name in different sources; only keep real matches
            let mut matching = Vec::new();
            for path in found {
                if read_artifact(&path)?.contract_name.as_deref().unwrap_or(name) == name {
                    matching.push(path);
                }
            }
            matching
        }
    };
    match candidates.len() {
        0 => Err(DeployError::ArtifactNotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        }),
        1 => {
            let path = &candidates[0];
            debug!(contract = name, path = %path.display(), "resolved artifact");
            ContractFactory::from_file(name, path)
        }
        _ => Err(DeployError::AmbiguousArtifact {
            name: name.to_string(),
            candidates,
        }),
    }
}

fn read_artifact(path: &Path) -> Result<RawArtifact> {
    let content = fs::read_to_string(path).map_err(|source| DeployError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DeployError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn find_artifacts(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    let entries = fs::read_dir(dir).map_err(|source| DeployError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| DeployError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "build-info") {
                continue;
            }
            find_artifacts(&path, file_name, found)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            found.push(path);
        }
    }
    found.sort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const INIT_CODE: &str = "0x6001600c60003960016000f300";

    fn tanda_abi() -> serde_json::Value {
        json!([{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "_name", "type": "string", "internalType": "string" },
                { "name": "_description", "type": "string", "internalType": "string" },
                { "name": "_a", "type": "uint256", "internalType": "uint256" },
                { "name": "_b", "type": "uint8", "internalType": "uint8" }
            ]
        }])
    }

    fn write(dir: &Path, rel: &str, value: serde_json::Value) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    fn hardhat_artifact(name: &str, bytecode: &str) -> serde_json::Value {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": format!("contracts/{name}.sol"),
            "abi": tanda_abi(),
            "bytecode": bytecode,
            "deployedBytecode": "0x00",
            "linkReferences": {},
            "deployedLinkReferences": {}
        })
    }

    fn args() -> Vec<ConstructorArg> {
        vec!["MetaTanda".into(), "Tanda test".into(), 2.into(), 1.into()]
    }

    #[test]
    fn test_resolve_hardhat_artifact() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "contracts/Tanda.sol/Tanda.json", hardhat_artifact("Tanda", INIT_CODE));
        write(dir.path(), "contracts/Tanda.sol/Tanda.dbg.json", json!({ "buildInfo": "../../build-info/x.json" }));
        write(dir.path(), "build-info/Tanda.json", json!({ "solcVersion": "0.8.21" }));

        let factory = get_contract_factory(dir.path(), "Tanda").unwrap();
        assert_eq!(factory.name, "Tanda");
        assert_eq!(factory.path, path);
        assert_eq!(factory.bytecode, hex::decode(INIT_CODE).unwrap());
        assert_eq!(factory.compiler, None);
        assert!(factory.compiler_matches("0.8.21"));
        assert_eq!(factory.abi.constructor.as_ref().unwrap().inputs.len(), 4);
    }

    #[test]
    fn test_resolve_foundry_artifact() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Tanda.sol/Tanda.json",
            json!({
                "abi": tanda_abi(),
                "bytecode": { "object": INIT_CODE, "linkReferences": {} },
                "metadata": { "compiler": { "version": "0.8.21+commit.d9974bed" } }
            }),
        );
        let factory = get_contract_factory(dir.path(), "Tanda").unwrap();
        assert_eq!(factory.compiler.as_deref(), Some("0.8.21+commit.d9974bed"));
        assert_eq!(factory.bytecode.len(), 13);
        assert!(factory.compiler_matches("0.8.21"));
        assert!(!factory.compiler_matches("0.8.20"));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "contracts/Other.sol/Other.json", hardhat_artifact("Other", INIT_CODE));
        let err = get_contract_factory(dir.path(), "Tanda").unwrap_err();
        assert!(matches!(err, DeployError::ArtifactNotFound { name, .. } if name == "Tanda"));

        let err = get_contract_factory(&dir.path().join("nope"), "Tanda").unwrap_err();
        assert!(matches!(err, DeployError::ArtifactNotFound { .. }));
    }

    #[test]
    fn test_ambiguous_artifact() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "contracts/A.sol/Tanda.json", hardhat_artifact("Tanda", INIT_CODE));
        write(dir.path(), "contracts/B.sol/Tanda.json", hardhat_artifact("Tanda", INIT_CODE));
        let err = get_contract_factory(dir.path(), "Tanda").unwrap_err();
        match err {
            DeployError::AmbiguousArtifact { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_abstract_and_unlinked_contracts() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "a/Tanda.json", hardhat_artifact("Tanda", "0x"));
        assert!(matches!(
            ContractFactory::from_file("Tanda", &path),
            Err(DeployError::AbstractContract(_))
        ));

        let path = write(
            dir.path(),
            "b/Tanda.json",
            hardhat_artifact("Tanda", "0x6001__$1f2e3d4c5b6a79887766554433221100ff$__00"),
        );
        assert!(matches!(
            ContractFactory::from_file("Tanda", &path),
            Err(DeployError::UnlinkedLibraries(_))
        ));

        let path = write(dir.path(), "c/Tanda.json", hardhat_artifact("Tanda", "0x60zz"));
        assert!(matches!(
            ContractFactory::from_file("Tanda", &path),
            Err(DeployError::InvalidBytecode { .. })
        ));
    }

    #[test]
    fn test_malformed_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Tanda.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            get_contract_factory(dir.path(), "Tanda"),
            Err(DeployError::Json { .. })
        ));
    }

    #[test]
    fn test_deploy_code_appends_constructor_args() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Tanda.json", hardhat_artifact("Tanda", INIT_CODE));
        let factory = ContractFactory::from_file("Tanda", &path).unwrap();

        let code = factory.deploy_code(&args()).unwrap();
        let (init, encoded) = code.split_at(factory.bytecode.len());
        assert_eq!(init, &factory.bytecode[..]);

        let types = DynSolType::Tuple(vec![
            DynSolType::String,
            DynSolType::String,
            DynSolType::Uint(256),
            DynSolType::Uint(8),
        ]);
        let decoded = types.abi_decode_params(encoded).unwrap();
        assert_eq!(
            decoded,
            DynSolValue::Tuple(vec![
                DynSolValue::String("MetaTanda".to_string()),
                DynSolValue::String("Tanda test".to_string()),
                DynSolValue::Uint(U256::from(2), 256),
                DynSolValue::Uint(U256::from(1), 8),
            ])
        );
    }

    #[test]
    fn test_deploy_code_arity() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Tanda.json", hardhat_artifact("Tanda", INIT_CODE));
        let factory = ContractFactory::from_file("Tanda", &path).unwrap();
        let err = factory.deploy_code(&args()[..3]).unwrap_err();
        assert!(matches!(err, DeployError::ConstructorArity { expected: 4, got: 3 }));

        let mut no_ctor = factory.clone();
        no_ctor.abi = JsonAbi::default();
        assert_eq!(no_ctor.deploy_code(&[]).unwrap(), factory.bytecode);
        assert!(matches!(
            no_ctor.deploy_code(&args()),
            Err(DeployError::ConstructorArity { expected: 0, got: 4 })
        ));
    }

    #[test]
    fn test_constructor_arg_types() {
        let overflow = ConstructorArg::Number(256).to_sol_value(3, &DynSolType::Uint(8));
        assert!(matches!(overflow, Err(DeployError::ConstructorArg { index: 3, .. })));

        let signed = ConstructorArg::Number(127).to_sol_value(0, &DynSolType::Int(8)).unwrap();
        assert_eq!(signed, DynSolValue::Int(I256::try_from(127).unwrap(), 8));
        assert!(ConstructorArg::Number(128).to_sol_value(0, &DynSolType::Int(8)).is_err());

        let wrong = ConstructorArg::Number(1).to_sol_value(1, &DynSolType::String);
        assert!(matches!(wrong, Err(DeployError::ConstructorArg { index: 1, ty, .. }) if ty == "string"));

        let address = ConstructorArg::from("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
            .to_sol_value(0, &DynSolType::Address)
            .unwrap();
        assert!(matches!(address, DynSolValue::Address(_)));
        assert!(ConstructorArg::from("MetaTanda").to_sol_value(0, &DynSolType::Address).is_err());
    }
}
