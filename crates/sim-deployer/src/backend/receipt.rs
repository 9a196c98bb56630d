use alloy_consensus::Header;
use alloy_primitives::{Address, Log, TxHash, B256};

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction.
    pub transaction_hash: TxHash,
    /// Position of the transaction in its block.
    pub transaction_index: u64,
    /// Hash of the block containing the transaction.
    pub block_hash: B256,
    /// Number of the block containing the transaction.
    pub block_number: u64,
    /// Recovered sender.
    pub from: Address,
    /// Recipient; `None` for contract creations.
    pub to: Option<Address>,
    /// Whether the transaction succeeded.
    pub status: bool,
    /// Gas used by the transaction alone.
    pub gas_used: u64,
    /// Gas used by the block up to and including the transaction.
    pub cumulative_gas_used: u64,
    /// Price paid per unit of gas.
    pub effective_gas_price: u128,
    /// Address a creation transaction deploys to, whether or not it succeeded.
    pub contract_address: Option<Address>,
    /// Logs emitted by the transaction.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Returns `true` if the transaction succeeded.
    pub const fn is_success(&self) -> bool {
        self.status
    }
}

/// A sealed block of the simulated chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedBlock {
    /// Block header.
    pub header: Header,
    /// Hash of the header.
    pub hash: B256,
    /// Hashes of the included transactions, in execution order.
    pub transactions: Vec<TxHash>,
}

impl SimulatedBlock {
    /// Seals `header` into a block.
    pub fn new(header: Header, transactions: Vec<TxHash>) -> Self {
        let hash = header.hash_slow();
        Self { header, hash, transactions }
    }

    /// Block number.
    pub const fn number(&self) -> u64 {
        self.header.number
    }

    /// Block timestamp.
    pub const fn timestamp(&self) -> u64 {
        self.header.timestamp
    }
}
