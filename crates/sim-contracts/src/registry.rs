//! Named contract artifacts.
//!
//! Deployment helpers refer to contracts by name. The registry resolves a name to the bytecode
//! and deterministic-deployment parameters recorded for it.

use std::{collections::BTreeMap, path::Path};

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::deterministic_deployment_proxy;

/// Errors raised while resolving contract artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// No artifact is registered under the name
    #[error("no artifact registered for contract {0}")]
    NotFound(String),

    /// The artifact has no init bytecode
    #[error("no init bytecode for contract {0}")]
    MissingInitBytecode(String),

    /// The artifact has no deployed bytecode
    #[error("no deployed bytecode for contract {0}")]
    MissingDeployedBytecode(String),

    /// The artifact has no deterministic deployment salt
    #[error("no deployment salt for contract {0}")]
    MissingDeploymentSalt(String),

    /// Failed to read an artifact file
    #[error("failed to read artifacts: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse artifact JSON
    #[error("failed to parse artifacts: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deployment artifact of a single contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    /// Creation code, executed by a deployment transaction.
    #[serde(default)]
    pub init_bytecode: Bytes,
    /// Runtime code, injected as-is when the contract is a predeploy.
    #[serde(default)]
    pub deployed_bytecode: Bytes,
    /// Salt used for deterministic deployment through a `CREATE2` proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_salt: Option<B256>,
    /// Address of the `CREATE2` proxy. Defaults to the deterministic deployment proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer_address: Option<Address>,
}

impl ContractArtifact {
    /// Creates an artifact with the given creation and runtime code.
    pub fn new(init_bytecode: impl Into<Bytes>, deployed_bytecode: impl Into<Bytes>) -> Self {
        Self {
            init_bytecode: init_bytecode.into(),
            deployed_bytecode: deployed_bytecode.into(),
            ..Default::default()
        }
    }

    /// Creates a runtime-only artifact, usable as a predeploy.
    pub fn predeploy(deployed_bytecode: impl Into<Bytes>) -> Self {
        Self { deployed_bytecode: deployed_bytecode.into(), ..Default::default() }
    }

    /// Sets the deterministic deployment salt.
    pub fn with_deployment_salt(mut self, salt: B256) -> Self {
        self.deployment_salt = Some(salt);
        self
    }

    /// Sets the `CREATE2` proxy used for deterministic deployment.
    pub fn with_deployer_address(mut self, deployer: Address) -> Self {
        self.deployer_address = Some(deployer);
        self
    }
}

/// Registry of contract artifacts keyed by contract name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<String, ContractArtifact>,
}

impl ArtifactRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in predeploys.
    pub fn with_predeploys() -> Self {
        Self::new().with_artifact(
            deterministic_deployment_proxy::NAME,
            ContractArtifact::predeploy(deterministic_deployment_proxy::CODE),
        )
    }

    /// Parses a registry from a JSON object mapping names to artifacts.
    pub fn from_json_str(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a registry from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Registers an artifact, returning the one it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        artifact: ContractArtifact,
    ) -> Option<ContractArtifact> {
        self.artifacts.insert(name.into(), artifact)
    }

    /// Registers an artifact.
    pub fn with_artifact(mut self, name: impl Into<String>, artifact: ContractArtifact) -> Self {
        self.insert(name, artifact);
        self
    }

    /// Merges another registry into this one. Entries of `other` win on name clashes.
    pub fn extend(&mut self, other: Self) {
        self.artifacts.extend(other.artifacts);
    }

    /// Returns the registered contract names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    /// Returns the artifact registered under `name`.
    pub fn get(&self, name: &str) -> Result<&ContractArtifact, ArtifactError> {
        self.artifacts.get(name).ok_or_else(|| ArtifactError::NotFound(name.to_string()))
    }

    /// Returns the runtime code of `name`.
    pub fn deployed_bytecode(&self, name: &str) -> Result<&Bytes, ArtifactError> {
        let artifact = self.get(name)?;
        if artifact.deployed_bytecode.is_empty() {
            return Err(ArtifactError::MissingDeployedBytecode(name.to_string()));
        }
        Ok(&artifact.deployed_bytecode)
    }

    /// Returns the creation code of `name`.
    pub fn init_bytecode(&self, name: &str) -> Result<&Bytes, ArtifactError> {
        let artifact = self.get(name)?;
        if artifact.init_bytecode.is_empty() {
            return Err(ArtifactError::MissingInitBytecode(name.to_string()));
        }
        Ok(&artifact.init_bytecode)
    }

    /// Returns the deterministic deployment salt of `name`.
    pub fn deployment_salt(&self, name: &str) -> Result<B256, ArtifactError> {
        self.get(name)?
            .deployment_salt
            .ok_or_else(|| ArtifactError::MissingDeploymentSalt(name.to_string()))
    }

    /// Returns the `CREATE2` proxy address used to deploy `name`.
    pub fn deployer_address(&self, name: &str) -> Result<Address, ArtifactError> {
        Ok(self.get(name)?.deployer_address.unwrap_or(deterministic_deployment_proxy::ADDRESS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes, keccak256};
    use rstest::rstest;

    const ARTIFACTS_JSON: &str = r#"{
        "Answer": {
            "initBytecode": "0x600a600c600039600a6000f3602a60005260206000f3",
            "deployedBytecode": "0x602a60005260206000f3",
            "deploymentSalt": "0x0000000000000000000000000000000000000000000000000000000000000001"
        },
        "Relayed": {
            "initBytecode": "0x00",
            "deployerAddress": "0x00000000000000000000000000000000000000aa"
        }
    }"#;

    #[test]
    fn test_proxy_code_matches_hash() {
        assert_eq!(
            keccak256(&deterministic_deployment_proxy::CODE),
            deterministic_deployment_proxy::CODE_HASH
        );
        assert_eq!(
            deterministic_deployment_proxy::ADDRESS,
            address!("4e59b44847b379578588920cA78FbF26c0B4956C")
        );
    }

    #[test]
    fn test_registry_from_json() {
        let registry = ArtifactRegistry::from_json_str(ARTIFACTS_JSON).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Answer", "Relayed"]);
        assert_eq!(
            registry.deployed_bytecode("Answer").unwrap(),
            &bytes!("602a60005260206000f3")
        );
        assert_eq!(
            registry.deployment_salt("Answer").unwrap(),
            b256!("0000000000000000000000000000000000000000000000000000000000000001")
        );
        assert_eq!(
            registry.deployer_address("Answer").unwrap(),
            deterministic_deployment_proxy::ADDRESS
        );
        assert_eq!(
            registry.deployer_address("Relayed").unwrap(),
            address!("00000000000000000000000000000000000000aa")
        );
    }

    #[rstest]
    #[case::unknown("Missing")]
    #[case::no_salt("Relayed")]
    fn test_deployment_salt_errors(#[case] name: &str) {
        let registry = ArtifactRegistry::from_json_str(ARTIFACTS_JSON).unwrap();
        let err = registry.deployment_salt(name).unwrap_err();
        match name {
            "Missing" => assert!(matches!(err, ArtifactError::NotFound(n) if n == name)),
            _ => assert!(matches!(err, ArtifactError::MissingDeploymentSalt(n) if n == name)),
        }
    }

    #[test]
    fn test_empty_bytecode_is_missing() {
        let registry = ArtifactRegistry::with_predeploys();
        assert!(matches!(
            registry.init_bytecode(deterministic_deployment_proxy::NAME),
            Err(ArtifactError::MissingInitBytecode(_))
        ));
        assert!(registry.deployed_bytecode(deterministic_deployment_proxy::NAME).is_ok());

        let registry = ArtifactRegistry::from_json_str(ARTIFACTS_JSON).unwrap();
        assert!(matches!(
            registry.deployed_bytecode("Relayed"),
            Err(ArtifactError::MissingDeployedBytecode(_))
        ));
    }

    #[test]
    fn test_extend_overrides() {
        let mut registry = ArtifactRegistry::from_json_str(ARTIFACTS_JSON).unwrap();
        let stub = ContractArtifact::predeploy(bytes!("00"));
        registry.extend(ArtifactRegistry::new().with_artifact("Answer", stub));
        assert_eq!(registry.deployed_bytecode("Answer").unwrap(), &bytes!("00"));
        assert!(matches!(
            registry.init_bytecode("Answer"),
            Err(ArtifactError::MissingInitBytecode(_))
        ));
    }
}
