//! The simulated chain the deployment helpers drive.

mod receipt;
mod simulated;
mod state;

pub use receipt::*;
pub use simulated::*;
pub use state::*;

use alloy_consensus::TxEnvelope;
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use auto_impl::auto_impl;

use crate::BackendError;

/// A chain whose blocks are sealed on demand.
///
/// Transactions sent to the chain stay pending until [`commit`](SimulatedChain::commit) seals
/// them into a block. Implementations are used through `&mut` by a single caller at a time.
#[auto_impl(&mut, Box)]
pub trait SimulatedChain {
    /// Seals the pending transactions into a new block and returns its hash.
    ///
    /// A block is produced even if nothing is pending.
    fn commit(&mut self) -> B256;

    /// Validates a signed transaction and adds it to the pending pool.
    fn send_transaction(&mut self, tx: TxEnvelope) -> Result<TxHash, BackendError>;

    /// Returns the receipt of a mined transaction.
    ///
    /// Fails with [`BackendError::ReceiptNotFound`] while the transaction is pending.
    fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Receipt, BackendError>;

    /// Returns the runtime code at `address` in the latest block.
    fn code_at(&self, address: Address) -> Result<Bytes, BackendError>;

    /// Returns the chain ID.
    fn chain_id(&self) -> u64;

    /// Returns the next nonce for `address`, counting pending transactions.
    fn pending_nonce_at(&self, address: Address) -> u64;

    /// Returns the balance of `address` in the latest block.
    fn balance_at(&self, address: Address) -> U256;

    /// Returns the number of the latest block.
    fn block_number(&self) -> u64;
}
