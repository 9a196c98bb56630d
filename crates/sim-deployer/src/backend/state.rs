use core::convert::Infallible;
use std::collections::{BTreeMap, HashMap};

use alloy_genesis::GenesisAccount;
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use delegate::delegate;
use revm::{
    database::{CacheDB, EmptyDB},
    primitives::{StorageKey, StorageValue},
    state::{AccountInfo, Bytecode},
};

/// World state of the simulated chain.
///
/// Accounts live in an in-memory [`CacheDB`]; there is no backing store to fall through to.
#[derive(Debug, Default, Clone, derive_more::Deref, derive_more::DerefMut)]
pub struct ChainState {
    #[deref]
    #[deref_mut]
    db: CacheDB<EmptyDB>,
    block_hashes: HashMap<u64, B256>,
}

impl ChainState {
    /// Creates the state described by a genesis allocation.
    pub fn from_alloc(alloc: &BTreeMap<Address, GenesisAccount>) -> Self {
        let mut state = Self::default();
        for (address, account) in alloc {
            state.insert_genesis_account(*address, account);
        }
        state
    }

    /// Inserts an account, replacing any previous one at `address`.
    pub fn insert_genesis_account(&mut self, address: Address, account: &GenesisAccount) {
        let code = account.code.clone().map(Bytecode::new_raw).unwrap_or_default();
        let code_hash = code.hash_slow();
        let info =
            AccountInfo::new(account.balance, account.nonce.unwrap_or_default(), code_hash, code);
        self.db.insert_account_info(address, info);

        for (slot, value) in account.storage.iter().flatten() {
            self.db
                .insert_account_storage(
                    address,
                    U256::from_be_bytes(slot.0),
                    U256::from_be_bytes(value.0),
                )
                .unwrap_or_else(|never| match never {});
        }
    }

    /// Records the hash of a sealed block, served to the `BLOCKHASH` opcode.
    pub fn insert_block_hash(&mut self, number: u64, hash: B256) {
        self.block_hashes.insert(number, hash);
    }

    /// Returns the account at `address`, if it exists.
    pub fn account(&self, address: Address) -> Option<&AccountInfo> {
        self.db.cache.accounts.get(&address).map(|account| &account.info)
    }

    /// Returns the balance of `address`.
    pub fn balance(&self, address: Address) -> U256 {
        self.account(address).map(|info| info.balance).unwrap_or_default()
    }

    /// Returns the nonce of `address`.
    pub fn nonce(&self, address: Address) -> u64 {
        self.account(address).map(|info| info.nonce).unwrap_or_default()
    }

    /// Returns the runtime code at `address`. Accounts without code return empty bytes.
    pub fn code(&self, address: Address) -> Bytes {
        let Some(info) = self.account(address) else {
            return Bytes::new();
        };
        match &info.code {
            Some(code) => code.original_bytes(),
            None => self
                .db
                .cache
                .contracts
                .get(&info.code_hash)
                .map(Bytecode::original_bytes)
                .unwrap_or_default(),
        }
    }
}

impl revm::Database for ChainState {
    type Error = Infallible;

    delegate! {
        to self.db {
            fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error>;
            fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error>;
            fn storage(
                &mut self,
                address: Address,
                index: StorageKey,
            ) -> Result<StorageValue, Self::Error>;
        }
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        Ok(self
            .block_hashes
            .get(&number)
            .copied()
            .unwrap_or_else(|| keccak256(number.to_string().as_bytes())))
    }
}

impl revm::DatabaseCommit for ChainState {
    delegate! {
        to self.db {
            fn commit(&mut self, changes: revm::primitives::HashMap<Address, revm::state::Account>);
        }
    }
}
