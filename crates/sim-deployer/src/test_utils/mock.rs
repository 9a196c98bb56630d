use std::cell::RefCell;

use alloy_consensus::TxEnvelope;
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};

use crate::{BackendError, Receipt, SimulatedChain};

/// A call made to a [`MockChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainCall {
    /// [`SimulatedChain::commit`]
    Commit,
    /// [`SimulatedChain::transaction_receipt`]
    Receipt,
}

/// A chain that mines every transaction after a fixed number of commits.
#[derive(Debug, Default)]
pub struct MockChain {
    mined_after: Option<usize>,
    commits: usize,
    calls: RefCell<Vec<ChainCall>>,
}

impl MockChain {
    /// Creates a chain whose receipts exist once `commits` blocks have been committed.
    pub fn mined_after(commits: usize) -> Self {
        Self { mined_after: Some(commits), ..Default::default() }
    }

    /// Creates a chain that never mines anything.
    pub fn never_mined() -> Self {
        Self::default()
    }

    /// Returns the number of commits so far.
    pub const fn commits(&self) -> usize {
        self.commits
    }

    /// Returns the calls made so far, in order.
    pub fn calls(&self) -> Vec<ChainCall> {
        self.calls.borrow().clone()
    }
}

impl SimulatedChain for MockChain {
    fn commit(&mut self) -> B256 {
        self.commits += 1;
        self.calls.borrow_mut().push(ChainCall::Commit);
        B256::with_last_byte(self.commits as u8)
    }

    fn send_transaction(&mut self, tx: TxEnvelope) -> Result<TxHash, BackendError> {
        Ok(*tx.tx_hash())
    }

    fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Receipt, BackendError> {
        self.calls.borrow_mut().push(ChainCall::Receipt);
        match self.mined_after {
            Some(commits) if self.commits >= commits => Ok(Receipt {
                transaction_hash: tx_hash,
                transaction_index: 0,
                block_hash: B256::with_last_byte(self.commits as u8),
                block_number: self.commits as u64,
                from: Address::ZERO,
                to: None,
                status: true,
                gas_used: 0,
                cumulative_gas_used: 0,
                effective_gas_price: 0,
                contract_address: None,
                logs: Vec::new(),
            }),
            _ => Err(BackendError::ReceiptNotFound(tx_hash)),
        }
    }

    fn code_at(&self, _address: Address) -> Result<Bytes, BackendError> {
        Ok(Bytes::new())
    }

    fn chain_id(&self) -> u64 {
        crate::constants::DEFAULT_CHAIN_ID
    }

    fn pending_nonce_at(&self, _address: Address) -> u64 {
        0
    }

    fn balance_at(&self, _address: Address) -> U256 {
        U256::ZERO
    }

    fn block_number(&self) -> u64 {
        self.commits as u64
    }
}
