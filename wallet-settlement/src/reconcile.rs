//! Reconciliation sweep
//!
//! Finds orders that completed escrow release without a surviving earning
//! entry, the window where the ledger credit and the compensating revert
//! both failed. There is no automatic repair: each hit is logged and handed
//! to an operator.

use crate::Result;
use std::sync::Arc;
use wallet_ledger::{OrderId, WalletStore};

/// Scan for released orders missing their ledger credit
pub async fn released_orders_missing_credit(store: &Arc<WalletStore>) -> Result<Vec<OrderId>> {
    let missing = store.reconcile_released_orders()?;

    for order_id in &missing {
        tracing::warn!(
            order_id = %order_id,
            "Order completed without an escrow credit; manual reconciliation required"
        );
    }

    Ok(missing)
}
