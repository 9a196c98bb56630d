//! Tests for the revm-backed simulated chain.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEip2930, TxEnvelope, TxLegacy};
use alloy_primitives::{address, Address, Bytes, Signature, TxHash, TxKind, U256};
use alloy_signer::SignerSync;
use alloy_sol_types::{sol, SolCall};
use sim_contracts::{deterministic_deployment_proxy, ContractArtifact};
use sim_deployer::{constants::DEFAULT_GAS_PRICE, test_utils::*, *};

sol! {
    function answer() external view returns (uint256);
}

const RECIPIENT: Address = address!("00000000000000000000000000000000000000aa");

fn setup(config: &BackendConfig) -> (SimulatedBackend, TransactOpts) {
    init_tracing();
    (simulated_backend(config), TransactOpts::from_config(config).unwrap())
}

fn transfer(backend: &mut SimulatedBackend, opts: &TransactOpts) -> Result<TxHash, DeployError> {
    opts.transact(backend, TxKind::Call(RECIPIENT), Bytes::new())
}

#[test]
fn test_genesis_state() {
    let config = backend_config().with_chain_id(901).with_genesis_timestamp(1_000);
    let (backend, opts) = setup(&config);

    assert_eq!(backend.chain_id(), 901);
    assert_eq!(backend.block_number(), 0);
    assert_eq!(backend.latest_block().timestamp(), 1_000);
    assert_eq!(backend.latest_block().header.gas_limit, 30_000_000);
    assert_eq!(backend.balance_at(opts.address()), config.funded_balance);
    assert_eq!(
        backend.code_at(deterministic_deployment_proxy::ADDRESS).unwrap(),
        deterministic_deployment_proxy::CODE
    );
    assert!(backend.code_at(RECIPIENT).unwrap().is_empty());
}

#[test]
fn test_empty_commits_advance_chain() {
    let (mut backend, _) = setup(&backend_config().with_genesis_timestamp(1_000));
    let genesis = backend.latest_block().hash;

    let first = backend.commit();
    let second = backend.commit();

    assert_ne!(first, second);
    assert_eq!(backend.block_number(), 2);
    let block = backend.block_by_number(1).unwrap();
    assert_eq!(block.hash, first);
    assert_eq!(block.header.parent_hash, genesis);
    assert_eq!(block.timestamp(), 1_001);
    assert!(block.transactions.is_empty());
    let block = backend.block_by_number(2).unwrap();
    assert_eq!(block.header.parent_hash, first);
    assert_eq!(block.timestamp(), 1_002);
    assert!(backend.block_by_number(3).is_none());
}

#[test]
fn test_transfer() {
    let (mut backend, opts) = setup(&backend_config());
    let opts = opts.with_value(U256::from(5));
    let before = backend.balance_at(opts.address());

    let tx_hash = transfer(&mut backend, &opts).unwrap();
    assert!(matches!(
        backend.transaction_receipt(tx_hash),
        Err(BackendError::ReceiptNotFound(hash)) if hash == tx_hash
    ));
    assert_eq!(backend.pending_transaction_count(), 1);
    let block_hash = backend.commit();

    let receipt = backend.transaction_receipt(tx_hash).unwrap();
    assert!(receipt.is_success());
    assert_eq!(receipt.block_hash, block_hash);
    assert_eq!(receipt.block_number, 1);
    assert_eq!(receipt.to, Some(RECIPIENT));
    assert_eq!(receipt.gas_used, 21_000);
    assert_eq!(receipt.contract_address, None);
    assert_eq!(backend.latest_block().transactions, vec![tx_hash]);
    assert_eq!(backend.balance_at(RECIPIENT), U256::from(5));
    assert_eq!(
        backend.balance_at(opts.address()),
        before - U256::from(5) - U256::from(21_000 * DEFAULT_GAS_PRICE)
    );
}

#[test]
fn test_chain_id_mismatch() {
    let (mut backend, opts) = setup(&backend_config());
    let err = transfer(&mut backend, &opts.with_chain_id(1)).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::ChainIdMismatch { expected: 1337, got: 1 })
    ));
    assert_eq!(backend.pending_transaction_count(), 0);
}

#[test]
fn test_nonce_too_low() {
    let (mut backend, opts) = setup(&backend_config());
    transfer(&mut backend, &opts).unwrap();
    backend.commit();

    let err = transfer(&mut backend, &opts.with_nonce(0)).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::NonceTooLow { expected: 1, tx: 0, .. })
    ));
}

#[test]
fn test_nonce_already_pending() {
    let (mut backend, opts) = setup(&backend_config());
    let opts = opts.with_nonce(0);
    transfer(&mut backend, &opts).unwrap();

    let err = transfer(&mut backend, &opts).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::NonceTooLow { expected: 1, tx: 0, .. })
    ));
    assert_eq!(backend.pending_transaction_count(), 1);
}

#[test]
fn test_gas_limit_exceeded() {
    let (mut backend, opts) = setup(&backend_config());
    let err = transfer(&mut backend, &opts.with_gas_limit(30_000_001)).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::GasLimitExceeded {
            gas_limit: 30_000_001,
            block_gas_limit: 30_000_000
        })
    ));
}

#[test]
fn test_nonce_gap_rejected() {
    let (mut backend, opts) = setup(&backend_config());
    let err = transfer(&mut backend, &opts.with_nonce(5)).unwrap_err();

    assert!(matches!(
        err,
        DeployError::Backend(BackendError::NonceTooHigh { expected: 0, tx: 5, .. })
    ));
    assert_eq!(backend.pending_transaction_count(), 0);
}

#[test]
fn test_insufficient_funds_counts_pending_spend() {
    // Enough for one 21k-gas transfer at 1 gwei, not two.
    let transfer_cost = 21_000 * DEFAULT_GAS_PRICE;
    let config =
        BackendConfig { funded_balance: U256::from(transfer_cost * 3 / 2), ..backend_config() };
    let (mut backend, opts) = setup(&config);
    let opts = opts.with_gas_limit(21_000);

    transfer(&mut backend, &opts).unwrap();
    let err = transfer(&mut backend, &opts).unwrap_err();

    match err {
        DeployError::Backend(BackendError::InsufficientFunds { sender, balance, cost }) => {
            assert_eq!(sender, opts.address());
            assert_eq!(balance, config.funded_balance);
            assert_eq!(cost, U256::from(2 * transfer_cost));
        }
        err => panic!("unexpected error: {err}"),
    }
    assert_eq!(backend.pending_transaction_count(), 1);
}

#[test]
fn test_value_above_balance_rejected() {
    let (mut backend, opts) = setup(&backend_config());
    let err = transfer(&mut backend, &opts.with_value(U256::MAX / U256::from(2))).unwrap_err();
    assert!(matches!(err, DeployError::Backend(BackendError::InsufficientFunds { .. })));
}

#[test]
fn test_sender_with_code_rejected() {
    let funded = TransactOpts::from_config(&backend_config()).unwrap().address();
    let (mut backend, opts) = setup(&backend_config().with_predeploy(ANSWER, funded));

    let err = transfer(&mut backend, &opts).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::SenderHasCode(sender)) if sender == funded
    ));
}

#[test]
fn test_fee_cap_below_base_fee() {
    let config = BackendConfig { base_fee: 2_000_000_000, ..backend_config() };
    let (mut backend, opts) = setup(&config);

    let err = transfer(&mut backend, &opts).unwrap_err();
    assert!(matches!(
        err,
        DeployError::Backend(BackendError::FeeCapTooLow {
            fee_cap: DEFAULT_GAS_PRICE,
            base_fee: 2_000_000_000
        })
    ));
}

#[test]
fn test_gas_below_intrinsic_rejected() {
    let (mut backend, opts) = setup(&backend_config());
    let err = transfer(&mut backend, &opts.with_gas_limit(20_000)).unwrap_err();

    assert!(matches!(err, DeployError::Backend(BackendError::Execution(_))));
    assert_eq!(backend.pending_transaction_count(), 0);
}

#[test]
fn test_accepted_transactions_are_mined() {
    let (mut backend, opts) = setup(&backend_config());
    let hashes = (0..3).map(|_| transfer(&mut backend, &opts).unwrap()).collect::<Vec<_>>();

    backend.commit();

    assert_eq!(backend.pending_transaction_count(), 0);
    assert_eq!(backend.latest_block().transactions, hashes);
    for hash in hashes {
        assert!(backend.transaction_receipt(hash).unwrap().is_success());
    }
}

#[test]
fn test_invalid_signature() {
    let (mut backend, _) = setup(&backend_config());
    let tx = TxLegacy {
        chain_id: Some(1337),
        gas_price: DEFAULT_GAS_PRICE,
        gas_limit: 21_000,
        to: TxKind::Call(RECIPIENT),
        ..Default::default()
    };
    let signature = Signature::new(U256::ZERO, U256::ZERO, false);
    let envelope = TxEnvelope::Legacy(tx.into_signed(signature));

    let err = backend.send_transaction(envelope).unwrap_err();
    assert!(matches!(err, BackendError::InvalidSignature));
    assert_eq!(backend.pending_transaction_count(), 0);
}

#[test]
fn test_reverted_creation() {
    let (mut backend, opts) = setup(&backend_config());
    let before = backend.balance_at(opts.address());

    let tx_hash = opts.deploy_code(&mut backend, &reverter_init_code(), &[]).unwrap();
    backend.commit();

    let receipt = backend.transaction_receipt(tx_hash).unwrap();
    let created = opts.address().create(0);
    assert!(!receipt.is_success());
    assert_eq!(receipt.contract_address, Some(created));
    assert!(backend.code_at(created).unwrap().is_empty());
    assert_eq!(backend.nonce_at(opts.address()), 1);
    assert_eq!(
        backend.balance_at(opts.address()),
        before - U256::from(u128::from(receipt.gas_used) * DEFAULT_GAS_PRICE)
    );
}

#[test]
fn test_transactions_past_block_gas_wait() {
    let config = BackendConfig { gas_limit: 50_000, ..backend_config() };
    let (mut backend, opts) = setup(&config);
    let opts = opts.with_gas_limit(30_000);

    let first = transfer(&mut backend, &opts).unwrap();
    let second = transfer(&mut backend, &opts).unwrap();
    assert_eq!(backend.pending_nonce_at(opts.address()), 2);

    backend.commit();
    assert_eq!(backend.transaction_receipt(first).unwrap().block_number, 1);
    assert!(backend.transaction_receipt(second).is_err());
    assert_eq!(backend.pending_transaction_count(), 1);
    assert_eq!(backend.latest_block().header.gas_used, 21_000);

    backend.commit();
    assert_eq!(backend.transaction_receipt(second).unwrap().block_number, 2);
    assert_eq!(backend.pending_transaction_count(), 0);
}

#[test]
fn test_call() {
    let (mut backend, opts) = setup(&backend_config());
    let tx_hash = opts.deploy_code(&mut backend, &init_code_for(answer_runtime()), &[]).unwrap();
    backend.commit();
    let address = backend.transaction_receipt(tx_hash).unwrap().contract_address.unwrap();

    let input = answerCall {}.abi_encode().into();
    let output = backend.call(opts.address(), address, input).unwrap();

    assert_eq!(U256::from_be_slice(&output), U256::from(42));
    // Calls do not touch the chain.
    assert_eq!(backend.nonce_at(opts.address()), 1);
    assert_eq!(backend.block_number(), 1);
}

#[test]
fn test_call_reverted() {
    let target = address!("00000000000000000000000000000000000000bb");
    let reverter = ContractArtifact::predeploy(BytecodeBuilder::default().revert().build());
    let registry = fixture_registry().with_artifact("Revert", reverter);
    let config = backend_config().with_predeploy("Revert", target);
    let backend = SimulatedBackend::new(&config, &registry).unwrap();

    let err = backend.call(RECIPIENT, target, Bytes::new()).unwrap_err();
    assert!(matches!(err, BackendError::CallReverted(data) if data.is_empty()));
}

#[test]
fn test_eip1559_transaction() {
    let (mut backend, opts) = setup(&backend_config());
    let tx = TxEip1559 {
        chain_id: 1337,
        nonce: 0,
        gas_limit: 21_000,
        max_fee_per_gas: 2 * DEFAULT_GAS_PRICE,
        max_priority_fee_per_gas: DEFAULT_GAS_PRICE,
        to: TxKind::Call(RECIPIENT),
        value: U256::from(7),
        ..Default::default()
    };
    let signature = opts.signer.sign_hash_sync(&tx.signature_hash()).unwrap();
    let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));
    let tx_hash = backend.send_transaction(envelope).unwrap();

    backend.commit();

    let receipt = backend.transaction_receipt(tx_hash).unwrap();
    assert!(receipt.is_success());
    // Base fee is zero, so only the tip is paid.
    assert_eq!(receipt.effective_gas_price, DEFAULT_GAS_PRICE);
    assert_eq!(backend.balance_at(RECIPIENT), U256::from(7));
}

#[test]
fn test_unsupported_transaction_type() {
    let (mut backend, opts) = setup(&backend_config());
    let tx = TxEip2930 {
        chain_id: 1337,
        gas_price: DEFAULT_GAS_PRICE,
        gas_limit: 21_000,
        to: TxKind::Call(RECIPIENT),
        ..Default::default()
    };
    let signature = opts.signer.sign_hash_sync(&tx.signature_hash()).unwrap();

    let envelope = TxEnvelope::Eip2930(tx.into_signed(signature));
    let err = backend.send_transaction(envelope).unwrap_err();
    assert!(matches!(err, BackendError::UnsupportedTransactionType(1)));
}
