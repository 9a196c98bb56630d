use alloy_genesis::ChainConfig;
use alloy_primitives::U256;
use revm::primitives::hardfork::SpecId;
use serde::{Deserialize, Serialize};

/// The latest hardfork activated at genesis. Every earlier fork is activated as well.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hardfork {
    /// Shanghai (withdrawals, `PUSH0`).
    Shanghai,
    /// Cancun (transient storage, `MCOPY`, blobs).
    Cancun,
    /// Prague (EIP-7702, calldata floor cost).
    #[default]
    Prague,
}

impl Hardfork {
    /// Builds a chain config with every fork up to and including `self` activated at block and
    /// time zero.
    ///
    /// Proof of stake is active from genesis: blocks are sealed on demand, so there is no
    /// difficulty to reach and no wall-clock check on block timestamps.
    pub fn chain_config(self, chain_id: u64) -> ChainConfig {
        ChainConfig {
            chain_id,
            homestead_block: Some(0),
            eip150_block: Some(0),
            eip155_block: Some(0),
            eip158_block: Some(0),
            byzantium_block: Some(0),
            constantinople_block: Some(0),
            petersburg_block: Some(0),
            istanbul_block: Some(0),
            muir_glacier_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            arrow_glacier_block: Some(0),
            gray_glacier_block: Some(0),
            merge_netsplit_block: Some(0),
            terminal_total_difficulty: Some(U256::ZERO),
            terminal_total_difficulty_passed: true,
            shanghai_time: Some(0),
            cancun_time: (self >= Self::Cancun).then_some(0),
            prague_time: (self >= Self::Prague).then_some(0),
            ..Default::default()
        }
    }
}

/// Returns the [`SpecId`] in effect for a block, following the activation table of `config`.
pub fn spec_id_at(config: &ChainConfig, number: u64, timestamp: u64) -> SpecId {
    let at_block = |fork: Option<u64>| fork.is_some_and(|block| block <= number);
    let at_time = |fork: Option<u64>| fork.is_some_and(|time| time <= timestamp);

    if at_time(config.prague_time) {
        SpecId::PRAGUE
    } else if at_time(config.cancun_time) {
        SpecId::CANCUN
    } else if at_time(config.shanghai_time) {
        SpecId::SHANGHAI
    } else if config.terminal_total_difficulty_passed || at_block(config.merge_netsplit_block) {
        SpecId::MERGE
    } else if at_block(config.gray_glacier_block) {
        SpecId::GRAY_GLACIER
    } else if at_block(config.arrow_glacier_block) {
        SpecId::ARROW_GLACIER
    } else if at_block(config.london_block) {
        SpecId::LONDON
    } else if at_block(config.berlin_block) {
        SpecId::BERLIN
    } else if at_block(config.muir_glacier_block) {
        SpecId::MUIR_GLACIER
    } else if at_block(config.istanbul_block) {
        SpecId::ISTANBUL
    } else if at_block(config.petersburg_block) {
        SpecId::PETERSBURG
    } else if at_block(config.constantinople_block) {
        SpecId::CONSTANTINOPLE
    } else if at_block(config.byzantium_block) {
        SpecId::BYZANTIUM
    } else if at_block(config.eip158_block) {
        SpecId::SPURIOUS_DRAGON
    } else if at_block(config.eip150_block) {
        SpecId::TANGERINE
    } else if at_block(config.homestead_block) {
        SpecId::HOMESTEAD
    } else {
        SpecId::FRONTIER
    }
}
