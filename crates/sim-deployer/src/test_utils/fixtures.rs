use alloy_primitives::{Bytes, B256};
use revm::bytecode::opcode::{CODECOPY, CODESIZE, MSTORE, PUSH32, SUB};
use sim_contracts::{ArtifactRegistry, ContractArtifact};

use crate::{
    test_utils::{init_code_for, BytecodeBuilder},
    BackendConfig, SimulatedBackend,
};

/// Contract returning 42 on every call.
pub const ANSWER: &str = "Answer";

/// Contract returning the word passed to its constructor on every call.
pub const CONSTANT: &str = "Constant";

/// Contract whose creation always reverts.
pub const REVERTER: &str = "Reverter";

/// Salt of the deterministic deployment of [`ANSWER`].
pub const ANSWER_SALT: B256 = B256::ZERO;

/// Runtime code of [`ANSWER`].
pub fn answer_runtime() -> Bytes {
    BytecodeBuilder::default().mstore_number(0, 42).return_memory(0, 32).build()
}

/// Init code of [`CONSTANT`]. The constructor argument is the last 32 bytes of the creation
/// input.
pub fn constant_init_code() -> Bytes {
    // PUSH32 <word> MSTORE(0) RETURN(0, 32), with the word patched in by the constructor.
    let template = BytecodeBuilder::default()
        .push_bytes([0u8; 32])
        .push_number(0)
        .append(MSTORE)
        .return_memory(0, 32)
        .build();
    debug_assert_eq!(template[0], PUSH32);

    let header = |template_offset| {
        BytecodeBuilder::default()
            .push_number(template.len())
            .push_number(template_offset)
            .push_number(0)
            .append(CODECOPY)
            .push_number(32)
            .push_number(32)
            .append(CODESIZE)
            .append(SUB)
            .push_number(1)
            .append(CODECOPY)
            .return_memory(0, template.len())
    };
    let header_len = header(0).len();
    header(header_len).append_many(template.iter().copied()).build()
}

/// Init code of [`REVERTER`].
pub fn reverter_init_code() -> Bytes {
    BytecodeBuilder::default().revert().build()
}

/// Registry holding the predeploys and the fixture contracts.
pub fn fixture_registry() -> ArtifactRegistry {
    let answer = answer_runtime();
    ArtifactRegistry::with_predeploys()
        .with_artifact(
            ANSWER,
            ContractArtifact::new(init_code_for(&answer), answer).with_deployment_salt(ANSWER_SALT),
        )
        .with_artifact(CONSTANT, ContractArtifact::new(constant_init_code(), Bytes::new()))
        .with_artifact(
            REVERTER,
            ContractArtifact::new(reverter_init_code(), Bytes::new())
                .with_deployment_salt(B256::with_last_byte(1)),
        )
}

/// Default configuration with the deterministic deployment proxy predeployed.
pub fn backend_config() -> BackendConfig {
    BackendConfig::default().with_deterministic_deployer()
}

/// Creates a backend from `config` with the fixture registry.
pub fn simulated_backend(config: &BackendConfig) -> SimulatedBackend {
    SimulatedBackend::new(config, &fixture_registry()).expect("valid backend config")
}
