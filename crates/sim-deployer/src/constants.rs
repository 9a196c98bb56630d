//! Constants for the simulated chain and the deployment helpers.

use core::time::Duration;

use alloy_primitives::{b256, B256};

/// Chain ID used for simulated backends unless configured otherwise.
pub const DEFAULT_CHAIN_ID: u64 = 1337;

/// Block gas limit of the simulated chain.
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Gas limit attached to deployment transactions.
pub const DEFAULT_DEPLOY_GAS_LIMIT: u64 = 15_000_000;

/// Gas price attached to deployment transactions (1 gwei).
pub const DEFAULT_GAS_PRICE: u128 = 1_000_000_000;

/// Seconds between consecutive sealed blocks.
pub const DEFAULT_BLOCK_TIME: u64 = 1;

/// The same test key that geth uses.
pub const TEST_KEY: B256 =
    b256!("b71c71a67e1177ad4e901695e1b4b9ee17ae16c6668d313eac2f96dbcda3f291");

/// Wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Ether pre-funded to the test account.
pub const DEFAULT_FUNDED_ETHER: u64 = 1000;

/// Interval between receipt polls while waiting for a transaction to be mined.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(100);
