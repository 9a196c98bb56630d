//! Signing and submission of transactions from a local key.

use alloy_consensus::{SignableTransaction, Transaction, TxEnvelope, TxLegacy};
use alloy_primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use tracing::debug;

use crate::{
    constants::{DEFAULT_DEPLOY_GAS_LIMIT, DEFAULT_GAS_PRICE},
    BackendConfig, ConfigError, DeployError, SimulatedChain,
};

/// Options of the transactions sent by the deployment helpers.
#[derive(Debug, Clone)]
pub struct TransactOpts {
    /// Key signing the transactions.
    pub signer: PrivateKeySigner,
    /// Chain ID the transactions are signed for (EIP-155).
    pub chain_id: u64,
    /// Gas limit of every transaction.
    pub gas_limit: u64,
    /// Gas price of every transaction.
    pub gas_price: u128,
    /// Value transferred by every transaction.
    pub value: U256,
    /// Nonce of the next transaction. The pending nonce of the signer is used when unset.
    pub nonce: Option<u64>,
}

impl TransactOpts {
    /// Creates options signing with `signer` for `chain_id`.
    pub fn new_keyed(signer: PrivateKeySigner, chain_id: u64) -> Self {
        Self {
            signer,
            chain_id,
            gas_limit: DEFAULT_DEPLOY_GAS_LIMIT,
            gas_price: DEFAULT_GAS_PRICE,
            value: U256::ZERO,
            nonce: None,
        }
    }

    /// Creates options signing with the funded key of `config`.
    pub fn from_config(config: &BackendConfig) -> Result<Self, ConfigError> {
        Ok(Self::new_keyed(config.funded_signer()?, config.chain_id))
    }

    /// Returns the address of the signer.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sets the chain ID.
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Sets the gas limit.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Sets the gas price.
    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Sets the transferred value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Pins the nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Builds and signs a legacy transaction without sending it.
    pub fn sign<C>(&self, backend: &C, to: TxKind, input: Bytes) -> Result<TxEnvelope, DeployError>
    where
        C: SimulatedChain + ?Sized,
    {
        let nonce = match self.nonce {
            Some(nonce) => nonce,
            None => backend.pending_nonce_at(self.address()),
        };
        let tx = TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to,
            value: self.value,
            input,
        };
        let signature = self.signer.sign_hash_sync(&tx.signature_hash())?;
        Ok(TxEnvelope::Legacy(tx.into_signed(signature)))
    }

    /// Signs a transaction and submits it to `backend`.
    pub fn transact<C>(
        &self,
        backend: &mut C,
        to: TxKind,
        input: Bytes,
    ) -> Result<TxHash, DeployError>
    where
        C: SimulatedChain + ?Sized,
    {
        let envelope = self.sign(backend, to, input)?;
        debug!(
            from = %self.address(),
            to = ?envelope.kind(),
            tx_hash = %envelope.tx_hash(),
            "Sending transaction"
        );
        Ok(backend.send_transaction(envelope)?)
    }

    /// Submits a contract creation running `init_code` with ABI-encoded constructor `args`
    /// appended.
    pub fn deploy_code<C>(
        &self,
        backend: &mut C,
        init_code: &[u8],
        args: &[u8],
    ) -> Result<TxHash, DeployError>
    where
        C: SimulatedChain + ?Sized,
    {
        let input = [init_code, args].concat();
        self.transact(backend, TxKind::Create, input.into())
    }
}
