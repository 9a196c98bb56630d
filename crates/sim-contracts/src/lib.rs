//! Contract artifacts for the simulated-chain deployer.
//!
//! This crate provides bytecode constants for the contracts that are injected into genesis
//! (predeploys) and a registry that maps contract names to their deployment artifacts.
//! The predeploy bytecode is validated at compile time against its recorded code hash.

#![warn(missing_docs)]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![deny(unused_must_use)]

pub use alloy_primitives;

mod registry;
pub use registry::*;

/// Arachnid's deterministic deployment proxy.
///
/// The proxy takes `salt ‖ init_code` as calldata, creates the contract with `CREATE2` and
/// returns the 20-byte address of the new contract. Creation failures revert.
pub mod deterministic_deployment_proxy {
    include!(concat!(env!("OUT_DIR"), "/deterministic_deployment_proxy.rs"));

    /// Registry name of the proxy.
    pub const NAME: &str = "DeterministicDeploymentProxy";
}
