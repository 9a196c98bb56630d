//! Contract deployment onto a simulated chain.
//!
//! Two flows are supported:
//!
//! - [`deploy`] submits one creation transaction per [`Constructor`], through a pluggable
//!   [`Deployer`], and verifies that each one left code behind.
//! - [`deploy_with_deterministic_deployer`] sends `salt ‖ init_code` to a `CREATE2` proxy, so the
//!   contract lands at the same address on every chain the proxy exists on.

use alloy_primitives::{Address, Bytes, TxHash, TxKind};
use sim_contracts::ArtifactRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{create2_address, wait_mined, DeployError, Receipt, SimulatedChain, TransactOpts};

/// A contract to deploy with a creation transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constructor {
    /// Name of the contract.
    pub name: String,
    /// ABI-encoded constructor arguments, appended to the init code.
    pub args: Bytes,
}

impl Constructor {
    /// Creates a constructor without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: Bytes::new() }
    }

    /// Sets the ABI-encoded constructor arguments.
    pub fn with_args(mut self, args: impl Into<Bytes>) -> Self {
        self.args = args.into();
        self
    }
}

/// A contract found on chain after its deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Name of the contract.
    pub name: String,
    /// Runtime code read back from the chain.
    pub bytecode: Bytes,
    /// Address of the contract.
    pub address: Address,
}

/// Submits the creation transaction of a [`Constructor`].
///
/// Implemented for closures with the same signature as [`Deployer::deploy`].
pub trait Deployer<C: ?Sized> {
    /// Submits the creation transaction and returns its hash.
    fn deploy(
        &mut self,
        backend: &mut C,
        opts: &TransactOpts,
        constructor: &Constructor,
    ) -> Result<TxHash, DeployError>;
}

impl<C, F> Deployer<C> for F
where
    C: ?Sized,
    F: FnMut(&mut C, &TransactOpts, &Constructor) -> Result<TxHash, DeployError>,
{
    fn deploy(
        &mut self,
        backend: &mut C,
        opts: &TransactOpts,
        constructor: &Constructor,
    ) -> Result<TxHash, DeployError> {
        self(backend, opts, constructor)
    }
}

/// Deploys the init code registered under the constructor name.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactDeployer<'a> {
    registry: &'a ArtifactRegistry,
}

impl<'a> ArtifactDeployer<'a> {
    /// Creates a deployer resolving init code in `registry`.
    pub const fn new(registry: &'a ArtifactRegistry) -> Self {
        Self { registry }
    }
}

impl<C> Deployer<C> for ArtifactDeployer<'_>
where
    C: SimulatedChain + ?Sized,
{
    fn deploy(
        &mut self,
        backend: &mut C,
        opts: &TransactOpts,
        constructor: &Constructor,
    ) -> Result<TxHash, DeployError> {
        let init_code = self.registry.init_bytecode(&constructor.name)?;
        opts.deploy_code(backend, init_code, &constructor.args)
    }
}

/// Deploys `constructors` one after the other.
///
/// Each creation transaction is waited for before the next one is submitted. The returned
/// deployments are in the order of `constructors`. The first failure aborts the remaining
/// deployments.
pub async fn deploy<C, D>(
    cancel: &CancellationToken,
    backend: &mut C,
    opts: &TransactOpts,
    constructors: &[Constructor],
    mut deployer: D,
) -> Result<Vec<Deployment>, DeployError>
where
    C: SimulatedChain + ?Sized,
    D: Deployer<C>,
{
    let mut deployments = Vec::with_capacity(constructors.len());
    for constructor in constructors {
        let name = &constructor.name;
        let tx_hash = deployer
            .deploy(backend, opts, constructor)
            .map_err(|err| DeployError::submission(name, err))?;
        let receipt = wait_for(cancel, backend, name, tx_hash).await?;

        let address = receipt
            .contract_address
            .filter(|address| !address.is_zero())
            .ok_or_else(|| DeployError::NoAddress(name.clone()))?;
        let bytecode = code_at(backend, name, address)?;

        info!(%name, %address, code_len = bytecode.len(), "Deployed contract");
        deployments.push(Deployment { name: name.clone(), bytecode, address });
    }
    Ok(deployments)
}

/// Deploys the artifact `name` through its `CREATE2` proxy.
///
/// The proxy, the salt and the init code are looked up in `registry`. The transaction is signed
/// for the chain ID of `backend`, whatever chain ID `opts` carries. Deploying the same artifact
/// twice on one chain fails with [`DeployError::ProxyDeploymentFailed`], since the `CREATE2`
/// address is already taken.
pub async fn deploy_with_deterministic_deployer<C>(
    cancel: &CancellationToken,
    backend: &mut C,
    opts: &TransactOpts,
    registry: &ArtifactRegistry,
    name: &str,
) -> Result<Deployment, DeployError>
where
    C: SimulatedChain + ?Sized,
{
    let opts = opts.clone().with_chain_id(backend.chain_id());
    let deployer = registry.deployer_address(name)?;
    let salt = registry.deployment_salt(name)?;
    let init_code = registry.init_bytecode(name)?;

    // The proxy call needs a block on top of genesis.
    backend.commit();

    let input = [salt.as_slice(), &init_code[..]].concat();
    let tx_hash = opts
        .transact(backend, TxKind::Call(deployer), input.into())
        .map_err(|err| DeployError::submission(name, err))?;
    let receipt = wait_for(cancel, backend, name, tx_hash).await?;
    if !receipt.is_success() {
        return Err(DeployError::ProxyDeploymentFailed { name: name.to_string(), tx_hash });
    }

    let address = create2_address(deployer, salt, init_code);
    let bytecode = code_at(backend, name, address)?;

    info!(%name, %address, %deployer, "Deployed contract through proxy");
    Ok(Deployment { name: name.to_string(), bytecode, address })
}

async fn wait_for<C>(
    cancel: &CancellationToken,
    backend: &mut C,
    name: &str,
    tx_hash: TxHash,
) -> Result<Receipt, DeployError>
where
    C: SimulatedChain + ?Sized,
{
    debug!(%name, %tx_hash, "Waiting for deployment");
    wait_mined(cancel, backend, tx_hash)
        .await
        .map_err(|source| DeployError::Mining { name: name.to_string(), source })
}

fn code_at<C>(backend: &C, name: &str, address: Address) -> Result<Bytes, DeployError>
where
    C: SimulatedChain + ?Sized,
{
    let code = backend
        .code_at(address)
        .map_err(|source| DeployError::CodeFetch { name: name.to_string(), source })?;
    if code.is_empty() {
        return Err(DeployError::NoCode { name: name.to_string(), address });
    }
    Ok(code)
}
