use std::collections::{HashMap, HashSet, VecDeque};

use alloy_consensus::{
    proofs::calculate_transaction_root, transaction::SignerRecoverable, Header, TxEnvelope,
};
use alloy_genesis::{ChainConfig, Genesis};
use alloy_primitives::{logs_bloom, Address, Bytes, TxHash, TxKind, B256, U256};
use revm::{
    context::{
        result::{ExecutionResult, HaltReason},
        BlockEnv, CfgEnv, TxEnv,
    },
    primitives::hardfork::SpecId,
    Context, ExecuteCommitEvm, MainBuilder, MainContext,
};
use sim_contracts::ArtifactRegistry;
use tracing::{debug, trace, warn};

use crate::{spec_id_at, BackendConfig, BackendError, ConfigError};

use super::{ChainState, Receipt, SimulatedBlock, SimulatedChain};

/// A transaction accepted into the pending pool.
#[derive(Debug, Clone)]
struct PendingTransaction {
    hash: TxHash,
    sender: Address,
    envelope: TxEnvelope,
    tx: TxEnv,
    effective_gas_price: u128,
}

/// Environment of the block a transaction executes in.
#[derive(Debug, Clone, Copy)]
struct BlockParams {
    chain_id: u64,
    spec: SpecId,
    number: u64,
    timestamp: u64,
    gas_limit: u64,
    base_fee: u64,
}

/// In-memory chain executing transactions with `revm`.
///
/// Blocks are only sealed by [`commit`](SimulatedChain::commit). Pending transactions execute in
/// submission order; those that do not fit in the remaining block gas wait for the next block.
/// Transactions are validated against the pending pool when sent, so an accepted transaction is
/// mined by a later commit.
#[derive(Debug)]
pub struct SimulatedBackend {
    config: ChainConfig,
    gas_limit: u64,
    base_fee: u64,
    block_time: u64,
    state: ChainState,
    pending: VecDeque<PendingTransaction>,
    blocks: Vec<SimulatedBlock>,
    receipts: HashMap<TxHash, Receipt>,
}

impl SimulatedBackend {
    /// Creates a backend from a configuration, resolving predeploys in `registry`.
    pub fn new(config: &BackendConfig, registry: &ArtifactRegistry) -> Result<Self, ConfigError> {
        let genesis = config.genesis(registry)?;
        Ok(Self::from_genesis(genesis, config.block_time))
    }

    /// Creates a backend whose first block is `genesis`.
    ///
    /// Every block sealed afterwards is `block_time` seconds later than its parent.
    pub fn from_genesis(genesis: Genesis, block_time: u64) -> Self {
        let state = ChainState::from_alloc(&genesis.alloc);
        let base_fee = genesis
            .base_fee_per_gas
            .map(|fee| u64::try_from(fee).unwrap_or(u64::MAX))
            .unwrap_or_default();

        let header = Header {
            number: genesis.number.unwrap_or_default(),
            timestamp: genesis.timestamp,
            gas_limit: genesis.gas_limit,
            base_fee_per_gas: Some(base_fee),
            difficulty: genesis.difficulty,
            extra_data: genesis.extra_data.clone(),
            mix_hash: genesis.mix_hash,
            beneficiary: genesis.coinbase,
            ..Default::default()
        };
        let block = SimulatedBlock::new(header, Vec::new());
        debug!(
            chain_id = genesis.config.chain_id,
            hash = %block.hash,
            accounts = genesis.alloc.len(),
            "Created simulated chain"
        );

        let mut backend = Self {
            config: genesis.config,
            gas_limit: genesis.gas_limit,
            base_fee,
            block_time,
            state,
            pending: VecDeque::new(),
            blocks: Vec::new(),
            receipts: HashMap::new(),
        };
        backend.push_block(block);
        backend
    }

    /// Returns the chain config the backend was created with.
    pub const fn chain_config(&self) -> &ChainConfig {
        &self.config
    }

    /// Returns the world state of the latest block.
    pub const fn state(&self) -> &ChainState {
        &self.state
    }

    /// Returns the latest sealed block.
    pub fn latest_block(&self) -> &SimulatedBlock {
        // The genesis block is sealed on construction.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Returns the sealed block with the given number.
    pub fn block_by_number(&self, number: u64) -> Option<&SimulatedBlock> {
        let first = self.blocks.first()?.number();
        let index = usize::try_from(number.checked_sub(first)?).ok()?;
        self.blocks.get(index)
    }

    /// Returns the nonce of `address` in the latest block, ignoring pending transactions.
    pub fn nonce_at(&self, address: Address) -> u64 {
        self.state.nonce(address)
    }

    /// Returns the number of transactions waiting to be mined.
    pub fn pending_transaction_count(&self) -> usize {
        self.pending.len()
    }

    /// Executes a call against the latest state without committing it.
    ///
    /// The call is free: gas price and base fee are zero.
    pub fn call(&self, from: Address, to: Address, data: Bytes) -> Result<Bytes, BackendError> {
        let mut state = self.state.clone();
        let latest = self.latest_block();
        let params = BlockParams {
            base_fee: 0,
            ..self.block_params(latest.number(), latest.timestamp())
        };
        let tx = TxEnv {
            caller: from,
            kind: TxKind::Call(to),
            data,
            gas_limit: self.gas_limit,
            gas_price: 0,
            nonce: state.nonce(from),
            chain_id: Some(params.chain_id),
            ..Default::default()
        };

        match transact(&mut state, params, tx)? {
            ExecutionResult::Success { output, .. } => Ok(output.into_data()),
            ExecutionResult::Revert { output, .. } => Err(BackendError::CallReverted(output)),
            ExecutionResult::Halt { reason, .. } => Err(BackendError::CallHalted(reason)),
        }
    }

    fn block_params(&self, number: u64, timestamp: u64) -> BlockParams {
        BlockParams {
            chain_id: self.config.chain_id,
            spec: spec_id_at(&self.config, number, timestamp),
            number,
            timestamp,
            gas_limit: self.gas_limit,
            base_fee: self.base_fee,
        }
    }

    fn push_block(&mut self, block: SimulatedBlock) {
        self.state.insert_block_hash(block.number(), block.hash);
        self.blocks.push(block);
    }

    /// Rejects a transaction the next block could not include, given the pending transactions
    /// queued before it.
    fn validate_against_pending(&self, sender: Address, tx: &TxEnv) -> Result<(), BackendError> {
        let expected = self.pending_nonce_at(sender);
        if tx.nonce < expected {
            return Err(BackendError::NonceTooLow { sender, expected, tx: tx.nonce });
        }
        if tx.nonce > expected {
            return Err(BackendError::NonceTooHigh { sender, expected, tx: tx.nonce });
        }
        if !self.state.code(sender).is_empty() {
            return Err(BackendError::SenderHasCode(sender));
        }
        if tx.gas_price < u128::from(self.base_fee) {
            let base_fee = self.base_fee;
            return Err(BackendError::FeeCapTooLow { fee_cap: tx.gas_price, base_fee });
        }

        let balance = self.state.balance(sender);
        let cost = self
            .pending
            .iter()
            .filter(|pending| pending.sender == sender)
            .map(|pending| max_cost(&pending.tx))
            .fold(max_cost(tx), U256::saturating_add);
        if balance < cost {
            return Err(BackendError::InsufficientFunds { sender, balance, cost });
        }

        // Remaining checks (intrinsic gas, fee fields) are left to the EVM, on a copy of the state
        // the transaction will execute on.
        let mut state = self.state.clone();
        let latest = self.latest_block();
        let params = self.block_params(
            latest.number() + 1,
            latest.timestamp().saturating_add(self.block_time),
        );
        for pending in &self.pending {
            if let Err(err) = transact(&mut state, params, pending.tx.clone()) {
                trace!(tx_hash = %pending.hash, %err, "Pending transaction fails replay");
            }
        }
        transact(&mut state, params, tx.clone()).map(drop)
    }

    fn effective_gas_price(&self, envelope: &TxEnvelope) -> u128 {
        match envelope {
            TxEnvelope::Eip1559(signed) => {
                let tx = signed.tx();
                tx.max_fee_per_gas
                    .min(u128::from(self.base_fee).saturating_add(tx.max_priority_fee_per_gas))
            }
            TxEnvelope::Legacy(signed) => signed.tx().gas_price,
            _ => 0,
        }
    }
}

impl SimulatedChain for SimulatedBackend {
    fn commit(&mut self) -> B256 {
        let (parent_hash, parent_number, parent_timestamp) = {
            let parent = self.latest_block();
            (parent.hash, parent.number(), parent.timestamp())
        };
        let params =
            self.block_params(parent_number + 1, parent_timestamp.saturating_add(self.block_time));

        let mut gas_used = 0u64;
        let mut included = Vec::new();
        let mut receipts = Vec::new();
        let mut deferred = VecDeque::new();
        // Senders with a deferred transaction keep their later transactions pending too, so their
        // nonces stay in order.
        let mut deferred_senders = HashSet::new();

        for pending in std::mem::take(&mut self.pending) {
            let remaining = params.gas_limit - gas_used;
            if deferred_senders.contains(&pending.sender) || pending.tx.gas_limit > remaining {
                trace!(tx_hash = %pending.hash, remaining, "Deferring transaction to next block");
                deferred_senders.insert(pending.sender);
                deferred.push_back(pending);
                continue;
            }

            let result = match transact(&mut self.state, params, pending.tx.clone()) {
                Ok(result) => result,
                Err(err) => {
                    warn!(tx_hash = %pending.hash, %err, "Dropping invalid transaction");
                    continue;
                }
            };
            gas_used += result.gas_used();

            let contract_address = match pending.tx.kind {
                TxKind::Create => Some(pending.sender.create(pending.tx.nonce)),
                TxKind::Call(_) => None,
            };

            receipts.push(Receipt {
                transaction_hash: pending.hash,
                transaction_index: included.len() as u64,
                block_hash: B256::ZERO,
                block_number: params.number,
                from: pending.sender,
                to: pending.tx.kind.to().copied(),
                status: result.is_success(),
                gas_used: result.gas_used(),
                cumulative_gas_used: gas_used,
                effective_gas_price: pending.effective_gas_price,
                contract_address,
                logs: result.logs().to_vec(),
            });
            included.push(pending);
        }
        self.pending = deferred;

        let envelopes = included.iter().map(|pending| pending.envelope.clone()).collect::<Vec<_>>();
        let header = Header {
            parent_hash,
            number: params.number,
            timestamp: params.timestamp,
            gas_limit: params.gas_limit,
            gas_used,
            base_fee_per_gas: Some(params.base_fee),
            transactions_root: calculate_transaction_root(&envelopes),
            logs_bloom: logs_bloom(receipts.iter().flat_map(|receipt| &receipt.logs)),
            ..Default::default()
        };
        let block = SimulatedBlock::new(
            header,
            included.iter().map(|pending| pending.hash).collect(),
        );
        let hash = block.hash;

        for mut receipt in receipts {
            receipt.block_hash = hash;
            self.receipts.insert(receipt.transaction_hash, receipt);
        }
        debug!(
            number = params.number,
            %hash,
            transactions = block.transactions.len(),
            gas_used,
            pending = self.pending.len(),
            "Sealed block"
        );
        self.push_block(block);
        hash
    }

    fn send_transaction(&mut self, envelope: TxEnvelope) -> Result<TxHash, BackendError> {
        let hash = *envelope.tx_hash();
        let sender = envelope.recover_signer().map_err(|_| BackendError::InvalidSignature)?;
        let tx = tx_env(&envelope, sender)?;

        let chain_id = self.config.chain_id;
        if let Some(got) = tx.chain_id.filter(|got| *got != chain_id) {
            return Err(BackendError::ChainIdMismatch { expected: chain_id, got });
        }
        if tx.gas_limit > self.gas_limit {
            return Err(BackendError::GasLimitExceeded {
                gas_limit: tx.gas_limit,
                block_gas_limit: self.gas_limit,
            });
        }
        self.validate_against_pending(sender, &tx)?;

        debug!(tx_hash = %hash, %sender, nonce = tx.nonce, "Queued transaction");
        let effective_gas_price = self.effective_gas_price(&envelope);
        self.pending.push_back(PendingTransaction {
            hash,
            sender,
            envelope,
            tx,
            effective_gas_price,
        });
        Ok(hash)
    }

    fn transaction_receipt(&self, tx_hash: TxHash) -> Result<Receipt, BackendError> {
        self.receipts.get(&tx_hash).cloned().ok_or(BackendError::ReceiptNotFound(tx_hash))
    }

    fn code_at(&self, address: Address) -> Result<Bytes, BackendError> {
        Ok(self.state.code(address))
    }

    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    fn pending_nonce_at(&self, address: Address) -> u64 {
        self.pending
            .iter()
            .filter(|pending| pending.sender == address)
            .map(|pending| pending.tx.nonce + 1)
            .fold(self.state.nonce(address), u64::max)
    }

    fn balance_at(&self, address: Address) -> U256 {
        self.state.balance(address)
    }

    fn block_number(&self) -> u64 {
        self.latest_block().number()
    }
}

/// Executes `tx` on top of `state` and commits the resulting changes.
fn transact(
    state: &mut ChainState,
    params: BlockParams,
    tx: TxEnv,
) -> Result<ExecutionResult<HaltReason>, BackendError> {
    let mut cfg = CfgEnv::default();
    cfg.chain_id = params.chain_id;
    cfg.spec = params.spec;

    let block = BlockEnv {
        number: U256::from(params.number),
        timestamp: U256::from(params.timestamp),
        gas_limit: params.gas_limit,
        basefee: params.base_fee,
        prevrandao: Some(B256::ZERO),
        ..Default::default()
    };

    let mut evm = Context::mainnet().with_db(state).with_cfg(cfg).with_block(block).build_mainnet();
    evm.transact_commit(tx).map_err(|err| BackendError::Execution(err.to_string()))
}

/// Upper bound of what `tx` can take from its sender.
fn max_cost(tx: &TxEnv) -> U256 {
    U256::from(tx.gas_limit)
        .saturating_mul(U256::from(tx.gas_price))
        .saturating_add(tx.value)
}

/// Converts a signed envelope into the `revm` transaction environment.
///
/// Access lists are not forwarded.
fn tx_env(envelope: &TxEnvelope, caller: Address) -> Result<TxEnv, BackendError> {
    let tx = match envelope {
        TxEnvelope::Legacy(signed) => {
            let tx = signed.tx();
            TxEnv {
                tx_type: 0,
                caller,
                gas_limit: tx.gas_limit,
                gas_price: tx.gas_price,
                kind: tx.to,
                value: tx.value,
                data: tx.input.clone(),
                nonce: tx.nonce,
                chain_id: tx.chain_id,
                ..Default::default()
            }
        }
        TxEnvelope::Eip1559(signed) => {
            let tx = signed.tx();
            TxEnv {
                tx_type: 2,
                caller,
                gas_limit: tx.gas_limit,
                gas_price: tx.max_fee_per_gas,
                gas_priority_fee: Some(tx.max_priority_fee_per_gas),
                kind: tx.to,
                value: tx.value,
                data: tx.input.clone(),
                nonce: tx.nonce,
                chain_id: Some(tx.chain_id),
                ..Default::default()
            }
        }
        other => return Err(BackendError::UnsupportedTransactionType(other.tx_type() as u8)),
    };
    Ok(tx)
}
