//! Deterministic (`CREATE2`) contract address derivation.
//!
//! The address of a contract created with `CREATE2` only depends on the creator, a salt and the
//! hash of the init code (EIP-1014):
//!
//! ```text
//! address = keccak256(0xff ‖ creator ‖ salt ‖ keccak256(init_code))[12..]
//! ```

use alloy_primitives::{keccak256, Address, B256};

/// Prefix byte distinguishing `CREATE2` preimages from RLP-encoded `CREATE` preimages.
const CREATE2_PREFIX: u8 = 0xff;

/// Computes the address of a contract created with `CREATE2`.
///
/// Any byte length is accepted for the creator and the salt; on-chain the creator is always 20
/// bytes and the salt 32 bytes.
pub fn create2_address(
    creator: impl AsRef<[u8]>,
    salt: impl AsRef<[u8]>,
    init_code: impl AsRef<[u8]>,
) -> Address {
    create2_address_from_hash(creator, salt, keccak256(init_code))
}

/// Computes the address of a contract created with `CREATE2` from the init code hash.
pub fn create2_address_from_hash(
    creator: impl AsRef<[u8]>,
    salt: impl AsRef<[u8]>,
    init_code_hash: B256,
) -> Address {
    let creator = creator.as_ref();
    let salt = salt.as_ref();

    let mut payload = Vec::with_capacity(1 + creator.len() + salt.len() + 32);
    payload.push(CREATE2_PREFIX);
    payload.extend_from_slice(creator);
    payload.extend_from_slice(salt);
    payload.extend_from_slice(init_code_hash.as_slice());

    Address::from_word(keccak256(payload))
}
