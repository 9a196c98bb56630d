//! Error types for the simulated chain and the deployment helpers.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use revm::context::result::HaltReason;
use sim_contracts::ArtifactError;

/// Errors raised while turning a [`BackendConfig`](crate::BackendConfig) into a chain.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Chain ID zero cannot be signed for (EIP-155)
    #[error("invalid chain id: {0}")]
    InvalidChainId(u64),

    /// A named predeploy could not be resolved
    #[error("predeploy lookup failed: {0}")]
    Artifact(#[from] ArtifactError),

    /// The funded key is not a valid secp256k1 secret
    #[error("invalid funded key: {0}")]
    InvalidFundedKey(String),

    /// Failed to read a configuration file
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse configuration JSON
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by a [`SimulatedChain`](crate::SimulatedChain).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The transaction has not been mined (yet)
    #[error("receipt not found for transaction {0}")]
    ReceiptNotFound(TxHash),

    /// The transaction signature does not recover to a signer
    #[error("invalid transaction signature")]
    InvalidSignature,

    /// The transaction is signed for another chain
    #[error("chain id mismatch: expected {expected}, got {got}")]
    ChainIdMismatch {
        /// Chain ID of the backend
        expected: u64,
        /// Chain ID of the transaction
        got: u64,
    },

    /// The transaction nonce has already been used
    #[error("nonce too low for {sender}: next nonce {expected}, transaction nonce {tx}")]
    NonceTooLow {
        /// Sender of the transaction
        sender: Address,
        /// Next nonce of the sender, counting pending transactions
        expected: u64,
        /// Nonce of the transaction
        tx: u64,
    },

    /// The transaction nonce leaves a gap after the sender's last transaction
    #[error("nonce too high for {sender}: next nonce {expected}, transaction nonce {tx}")]
    NonceTooHigh {
        /// Sender of the transaction
        sender: Address,
        /// Next nonce of the sender, counting pending transactions
        expected: u64,
        /// Nonce of the transaction
        tx: u64,
    },

    /// The sender cannot pay for the transaction on top of its pending ones
    #[error("insufficient funds for {sender}: balance {balance}, cost {cost}")]
    InsufficientFunds {
        /// Sender of the transaction
        sender: Address,
        /// Balance of the sender in the latest block
        balance: U256,
        /// Maximum cost of the transaction plus the sender's pending transactions
        cost: U256,
    },

    /// The sender is a contract (EIP-3607)
    #[error("sender {0} has deployed code")]
    SenderHasCode(Address),

    /// The transaction does not cover the block base fee
    #[error("fee cap {fee_cap} below base fee {base_fee}")]
    FeeCapTooLow {
        /// Maximum fee per gas of the transaction
        fee_cap: u128,
        /// Base fee of the next block
        base_fee: u64,
    },

    /// The transaction can never fit in a block
    #[error("transaction gas limit {gas_limit} exceeds block gas limit {block_gas_limit}")]
    GasLimitExceeded {
        /// Gas limit of the transaction
        gas_limit: u64,
        /// Gas limit of the block
        block_gas_limit: u64,
    },

    /// The transaction type is not supported by the simulated chain
    #[error("unsupported transaction type: {0}")]
    UnsupportedTransactionType(u8),

    /// A read-only call reverted
    #[error("call reverted with data {0}")]
    CallReverted(Bytes),

    /// A read-only call halted
    #[error("call halted: {0:?}")]
    CallHalted(HaltReason),

    /// The EVM rejected the execution
    #[error("execution error: {0}")]
    Execution(String),
}

/// Errors returned while waiting for a transaction to be mined.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// The caller cancelled the wait
    #[error("wait for transaction {0} cancelled")]
    Cancelled(TxHash),
}

/// Errors returned by the deployment helpers.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Failed to sign a transaction
    #[error("failed to sign transaction: {0}")]
    Signer(#[from] alloy_signer::Error),

    /// The backend refused a transaction
    #[error("failed to submit transaction: {0}")]
    Backend(#[from] BackendError),

    /// An artifact could not be resolved
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Submitting the deployment of a named contract failed
    #[error("{name}: {source}")]
    Submission {
        /// Name of the deployment
        name: String,
        /// Underlying error
        #[source]
        source: Box<DeployError>,
    },

    /// Waiting for the deployment of a named contract failed
    #[error("{name}: {source}")]
    Mining {
        /// Name of the deployment
        name: String,
        /// Underlying error
        #[source]
        source: WaitError,
    },

    /// The creation transaction was mined without producing a contract address
    #[error("no address for {0}")]
    NoAddress(String),

    /// The deployed code could not be fetched
    #[error("cannot fetch code for {name}: {source}")]
    CodeFetch {
        /// Name of the deployment
        name: String,
        /// Underlying error
        #[source]
        source: BackendError,
    },

    /// No code was found at the deployed address
    #[error("no code found for {name} at: {address}")]
    NoCode {
        /// Name of the deployment
        name: String,
        /// Address that was expected to hold code
        address: Address,
    },

    /// The deterministic deployment proxy transaction failed
    #[error("failed to deploy {name} using proxy deployer (transaction {tx_hash})")]
    ProxyDeploymentFailed {
        /// Name of the deployment
        name: String,
        /// Hash of the failed proxy transaction
        tx_hash: TxHash,
    },
}

impl DeployError {
    /// Wraps a submission error with the name of the failed deployment.
    pub fn submission(name: impl Into<String>, source: Self) -> Self {
        Self::Submission { name: name.into(), source: Box::new(source) }
    }
}
