//! Escrow coordinator
//!
//! Releases held funds to the seller when the buyer confirms receipt.
//! The order update and the ledger credit are two writes; if the credit
//! fails the coordinator reverts the order and surfaces `Persistence`. If
//! the revert itself fails the order is left completed without its credit;
//! that inconsistency is logged, audited, and found by the reconciliation
//! sweep.

use crate::{
    audit::AuditTrail,
    fees::platform_fee,
    notify::{notify_best_effort, Notifier},
    types::EscrowRelease,
    Error, Result, StateError,
};
use std::sync::Arc;
use wallet_ledger::{
    meta, AppendOutcome, AuditOutcome, EntryStatus, EntryType, EscrowStatus, LedgerEntry, Order,
    OrderId, OrderStatus, Reference, UserId, WalletStore,
};

const ACTION: &str = "escrow-release";

/// Escrow coordinator
pub struct EscrowCoordinator {
    store: Arc<WalletStore>,
    notifier: Arc<dyn Notifier>,
    audit: AuditTrail,
}

impl EscrowCoordinator {
    /// Create the coordinator
    pub fn new(store: Arc<WalletStore>, notifier: Arc<dyn Notifier>) -> Self {
        let audit = AuditTrail::new(store.clone());
        Self {
            store,
            notifier,
            audit,
        }
    }

    /// Release escrowed funds for an order. Only the order's buyer may call;
    /// the order must be delivered and still holding.
    pub async fn release(&self, order_id: &OrderId, caller: &UserId) -> Result<EscrowRelease> {
        let order = self.store.get_order(order_id).map_err(|e| match e {
            wallet_ledger::Error::OrderNotFound(id) => {
                Error::Validation(format!("unknown order {}", id))
            }
            other => Error::from(other),
        })?;

        if &order.buyer_id != caller {
            self.audit
                .record(
                    caller,
                    ACTION,
                    order_id.as_str(),
                    AuditOutcome::Failure,
                    Some("caller is not the buyer".to_string()),
                )
                .await;
            return Err(Error::Auth(
                "only the order's buyer may release escrow".to_string(),
            ));
        }

        let reference = Reference::escrow_release(order_id);

        // Idempotent replay: a prior release already settled this order
        if let Some(existing) = self.store.find_by_reference(&reference)? {
            tracing::info!(order_id = %order_id, reference = %reference,
                "Escrow release replayed, no writes");
            return Ok(Self::release_from_entry(&order, &existing));
        }

        if !order.release_permitted() {
            self.audit
                .record(
                    caller,
                    ACTION,
                    order_id.as_str(),
                    AuditOutcome::Failure,
                    Some("order not delivered/holding".to_string()),
                )
                .await;
            return Err(Error::State(StateError::InvalidEscrowTransition));
        }

        let (fee, net) = platform_fee(order.total_amount);

        self.store
            .update_order_state(order_id.clone(), OrderStatus::Completed, EscrowStatus::Released)
            .await?;

        let entry = LedgerEntry::new(
            order.seller_id.clone(),
            EntryType::Earning,
            net,
            EntryStatus::Success,
            reference.clone(),
        )
        .with_metadata(meta::FEE_DEDUCTED, fee.to_string())
        .with_metadata(meta::GROSS_AMOUNT, order.total_amount.to_string())
        .with_metadata(meta::ORDER_ID, order_id.to_string());

        match self.store.append_entry_if_absent(entry).await {
            Ok(AppendOutcome::Inserted) => {}
            Ok(AppendOutcome::AlreadyExists(existing)) => {
                // Lost the race to a concurrent release of the same order;
                // the earlier winner's credit stands
                tracing::info!(order_id = %order_id, reference = %reference,
                    "Escrow release raced a concurrent replay, no writes");
                return Ok(Self::release_from_entry(&order, &existing));
            }
            Err(e) => return Err(self.compensate(&order, caller, e).await),
        }

        tracing::info!(
            order_id = %order_id,
            seller_id = %order.seller_id,
            amount_released = net,
            fee_deducted = fee,
            "Escrow released"
        );
        self.audit
            .record(caller, ACTION, order_id.as_str(), AuditOutcome::Success, None)
            .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &order.seller_id,
            &format!("Order {} completed, {} credited to your wallet", order_id, net),
        )
        .await;

        Ok(EscrowRelease {
            amount_released: net,
            fee_deducted: fee,
            already_processed: false,
        })
    }

    /// Revert the order after a failed ledger credit
    async fn compensate(&self, order: &Order, caller: &UserId, cause: wallet_ledger::Error) -> Error {
        tracing::warn!(order_id = %order.id, error = %cause,
            "Escrow ledger credit failed, reverting order");

        let revert = self
            .store
            .update_order_state(order.id.clone(), OrderStatus::Delivered, EscrowStatus::Holding)
            .await;

        match revert {
            Ok(_) => {
                self.audit
                    .record(
                        caller,
                        ACTION,
                        order.id.as_str(),
                        AuditOutcome::Failure,
                        Some("ledger credit failed, order reverted".to_string()),
                    )
                    .await;
            }
            Err(revert_err) => {
                // Order is now completed without its credit: needs the
                // reconciliation sweep
                tracing::error!(
                    order_id = %order.id,
                    error = %revert_err,
                    "Compensating revert failed; order completed without ledger credit"
                );
                self.audit
                    .record(
                        caller,
                        ACTION,
                        order.id.as_str(),
                        AuditOutcome::Failure,
                        Some("ledger credit and compensating revert both failed".to_string()),
                    )
                    .await;
            }
        }

        Error::from(cause)
    }

    /// Rebuild the release amounts from the recorded earning entry
    fn release_from_entry(order: &Order, entry: &LedgerEntry) -> EscrowRelease {
        let fee_deducted = entry
            .metadata
            .get(meta::FEE_DEDUCTED)
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| platform_fee(order.total_amount).0);

        EscrowRelease {
            amount_released: entry.amount,
            fee_deducted,
            already_processed: true,
        }
    }
}
