//! Genesis configuration of the simulated chain.

mod hardfork;
pub use hardfork::*;

use std::{collections::BTreeMap, path::Path};

use alloy_genesis::{Genesis, GenesisAccount};
use alloy_primitives::{Address, B256, U256};
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use sim_contracts::{deterministic_deployment_proxy, ArtifactRegistry};
use tracing::{debug, trace};

use crate::{
    constants::{
        DEFAULT_BLOCK_GAS_LIMIT, DEFAULT_BLOCK_TIME, DEFAULT_CHAIN_ID, DEFAULT_FUNDED_ETHER,
        TEST_KEY, WEI_PER_ETHER,
    },
    ConfigError,
};

/// Configuration of a simulated backend.
///
/// Every field has a default, so a JSON document only needs the values it overrides:
///
/// ```json
/// {
///   "chainId": 901,
///   "predeploys": {
///     "DeterministicDeploymentProxy": "0x4e59b44847b379578588920cA78FbF26c0B4956C"
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackendConfig {
    /// Chain ID of the simulated chain.
    pub chain_id: u64,
    /// Timestamp of the genesis block.
    pub genesis_timestamp: u64,
    /// Seconds added to the timestamp of every sealed block.
    pub block_time: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Base fee of every block. The simulated chain does not adjust it.
    pub base_fee: u64,
    /// Latest hardfork activated at genesis.
    pub hardfork: Hardfork,
    /// Secret key of the pre-funded test account.
    pub funded_key: B256,
    /// Genesis balance of the pre-funded test account, in wei.
    pub funded_balance: U256,
    /// Contracts injected into genesis state, by artifact name.
    pub predeploys: BTreeMap<String, Address>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            genesis_timestamp: 0,
            block_time: DEFAULT_BLOCK_TIME,
            gas_limit: DEFAULT_BLOCK_GAS_LIMIT,
            base_fee: 0,
            hardfork: Hardfork::default(),
            funded_key: TEST_KEY,
            funded_balance: U256::from(DEFAULT_FUNDED_ETHER) * U256::from(WEI_PER_ETHER),
            predeploys: BTreeMap::new(),
        }
    }
}

impl BackendConfig {
    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading backend config");
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Sets the chain ID.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the genesis timestamp.
    pub fn with_genesis_timestamp(mut self, timestamp: u64) -> Self {
        self.genesis_timestamp = timestamp;
        self
    }

    /// Sets the latest hardfork activated at genesis.
    pub fn with_hardfork(mut self, hardfork: Hardfork) -> Self {
        self.hardfork = hardfork;
        self
    }

    /// Injects the artifact `name` at `address` in genesis.
    pub fn with_predeploy(mut self, name: impl Into<String>, address: Address) -> Self {
        self.predeploys.insert(name.into(), address);
        self
    }

    /// Injects the deterministic deployment proxy at its canonical address.
    pub fn with_deterministic_deployer(self) -> Self {
        self.with_predeploy(
            deterministic_deployment_proxy::NAME,
            deterministic_deployment_proxy::ADDRESS,
        )
    }

    /// Returns the signer of the pre-funded test account.
    pub fn funded_signer(&self) -> Result<PrivateKeySigner, ConfigError> {
        PrivateKeySigner::from_bytes(&self.funded_key)
            .map_err(|err| ConfigError::InvalidFundedKey(err.to_string()))
    }

    /// Builds the genesis of the simulated chain.
    ///
    /// The bytecode of every predeploy is looked up by name in `registry`.
    pub fn genesis(&self, registry: &ArtifactRegistry) -> Result<Genesis, ConfigError> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidChainId(self.chain_id));
        }

        let funded = self.funded_signer()?;
        let mut alloc = BTreeMap::new();
        alloc.insert(
            funded.address(),
            GenesisAccount {
                balance: self.funded_balance,
                private_key: Some(self.funded_key),
                ..Default::default()
            },
        );

        for (name, address) in &self.predeploys {
            let code = registry.deployed_bytecode(name)?;
            trace!(%name, %address, code_len = code.len(), "Adding predeploy");
            alloc.entry(*address).or_insert_with(GenesisAccount::default).code = Some(code.clone());
        }

        Ok(Genesis {
            config: self.hardfork.chain_config(self.chain_id),
            timestamp: self.genesis_timestamp,
            gas_limit: self.gas_limit,
            difficulty: U256::ZERO,
            base_fee_per_gas: Some(self.base_fee.into()),
            alloc,
            ..Default::default()
        })
    }
}
