//! Waiting for transactions to be mined.

use core::time::Duration;

use alloy_primitives::TxHash;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{constants::RECEIPT_POLL_INTERVAL, Receipt, SimulatedChain, WaitError};

/// Waits until `tx_hash` is mined, polling every [`RECEIPT_POLL_INTERVAL`].
///
/// See [`wait_mined_with_interval`].
pub async fn wait_mined<C>(
    cancel: &CancellationToken,
    backend: &mut C,
    tx_hash: TxHash,
) -> Result<Receipt, WaitError>
where
    C: SimulatedChain + ?Sized,
{
    wait_mined_with_interval(cancel, backend, tx_hash, RECEIPT_POLL_INTERVAL).await
}

/// Waits until `tx_hash` is mined, polling every `interval`.
///
/// Every tick seals a block with [`SimulatedChain::commit`] and then asks for the receipt. The
/// first tick fires immediately. Failed lookups are logged and retried on the next tick; there is
/// no retry limit, so the wait only ends without a receipt when `cancel` is cancelled. A
/// cancellation takes precedence over a tick that is ready at the same time.
pub async fn wait_mined_with_interval<C>(
    cancel: &CancellationToken,
    backend: &mut C,
    tx_hash: TxHash,
    interval: Duration,
) -> Result<Receipt, WaitError>
where
    C: SimulatedChain + ?Sized,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%tx_hash, "Wait for transaction cancelled");
                return Err(WaitError::Cancelled(tx_hash));
            }
            _ = ticker.tick() => {}
        }

        backend.commit();
        match backend.transaction_receipt(tx_hash) {
            Ok(receipt) => {
                debug!(%tx_hash, block_number = receipt.block_number, "Transaction mined");
                return Ok(receipt);
            }
            Err(err) => warn!(%tx_hash, %err, "Failed to get transaction receipt"),
        }
    }
}
