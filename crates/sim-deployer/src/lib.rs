//! Deployment of contracts onto a `revm`-backed simulated chain, for integration tests.
//!
//! The chain is created from a [`BackendConfig`] and only produces blocks when asked to
//! ([`SimulatedChain::commit`]). Contracts are deployed either from constructors ([`deploy`]) or
//! through the deterministic deployment proxy ([`deploy_with_deterministic_deployer`]), in which
//! case their address is given by [`create2_address`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod backend;
pub use backend::*;

mod create2;
pub use create2::*;

mod deploy;
pub use deploy::*;

mod error;
pub use error::*;

mod genesis;
pub use genesis::*;

mod tx;
pub use tx::*;

mod wait;
pub use wait::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
