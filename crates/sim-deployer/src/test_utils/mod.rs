//! Test utilities for the simulated-chain deployer.

mod bytecode;
mod fixtures;
mod mock;

pub use bytecode::*;
pub use fixtures::*;
pub use mock::*;

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a test-friendly tracing subscriber.
///
/// The filter comes from `RUST_LOG` and logging is off when it is unset. Calling this more than
/// once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}
