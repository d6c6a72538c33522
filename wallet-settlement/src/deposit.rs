//! Deposit initiation service
//!
//! Order of effects matters: freeze check, then the provider call, then the
//! pending ledger entry. A provider failure leaves no partial ledger effect.
//! A ledger failure after a successful provider call is surfaced to the
//! caller and logged with the reference; the provider-side payment request
//! is then orphaned until reconciliation picks it up.

use crate::{
    audit::AuditTrail,
    guard::{ensure_not_frozen, FreezeGuard},
    notify::{notify_best_effort, Notifier},
    types::DepositInitiation,
    Error, Result,
};
use std::sync::Arc;
use wallet_ledger::{
    meta, AuditOutcome, EntryStatus, EntryType, LedgerEntry, Reference, UserId, WalletStore,
};
use wallet_provider::{PaymentProvider, PaymentRequest};

const ACTION: &str = "deposit-initiate";

/// Deposit initiation service
pub struct DepositService {
    store: Arc<WalletStore>,
    provider: Arc<dyn PaymentProvider>,
    guard: Arc<dyn FreezeGuard>,
    notifier: Arc<dyn Notifier>,
    audit: AuditTrail,
}

impl DepositService {
    /// Create the service
    pub fn new(
        store: Arc<WalletStore>,
        provider: Arc<dyn PaymentProvider>,
        guard: Arc<dyn FreezeGuard>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let audit = AuditTrail::new(store.clone());
        Self {
            store,
            provider,
            guard,
            notifier,
            audit,
        }
    }

    /// Start a deposit: create a provider payment request and a pending
    /// ledger entry
    pub async fn initiate(&self, user_id: UserId, amount: u64) -> Result<DepositInitiation> {
        if amount == 0 {
            return Err(Error::Validation(
                "deposit amount must be a positive integer".to_string(),
            ));
        }

        // Freeze check comes before any provider call
        if let Err(e) = ensure_not_frozen(self.guard.as_ref(), &user_id).await {
            self.audit
                .record(
                    &user_id,
                    ACTION,
                    user_id.as_str(),
                    AuditOutcome::Failure,
                    Some(e.safe_message()),
                )
                .await;
            return Err(e);
        }

        let reference = Reference::deposit(&user_id);

        let payment = match self
            .provider
            .create_payment_request(&PaymentRequest {
                user_id: user_id.to_string(),
                amount,
                idempotency_key: reference.to_string(),
            })
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                tracing::warn!(user_id = %user_id, reference = %reference, error = %e,
                    "Provider payment request failed");
                self.audit
                    .record(
                        &user_id,
                        ACTION,
                        reference.as_str(),
                        AuditOutcome::Failure,
                        Some("provider call failed".to_string()),
                    )
                    .await;
                return Err(Error::from(e));
            }
        };

        let entry = LedgerEntry::new(
            user_id.clone(),
            EntryType::Deposit,
            amount,
            EntryStatus::Pending,
            reference.clone(),
        )
        .with_provider(self.provider.name())
        .with_metadata(meta::PROVIDER_PAYMENT_ID, payment.payment_id.clone());

        if let Err(e) = self.store.append_entry_if_absent(entry).await {
            // The provider-side payment request now exists without a ledger
            // entry; reconciliation has to pick it up by reference.
            tracing::warn!(
                user_id = %user_id,
                reference = %reference,
                payment_id = %payment.payment_id,
                error = %e,
                "Ledger write failed after provider call; provider request orphaned"
            );
            self.audit
                .record(
                    &user_id,
                    ACTION,
                    reference.as_str(),
                    AuditOutcome::Failure,
                    Some("ledger write failed after provider call".to_string()),
                )
                .await;
            return Err(Error::from(e));
        }

        tracing::info!(user_id = %user_id, reference = %reference, amount, "Deposit initiated");
        self.audit
            .record(&user_id, ACTION, reference.as_str(), AuditOutcome::Success, None)
            .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &user_id,
            &format!("Deposit of {} initiated, code {}", amount, payment.redemption_instructions),
        )
        .await;

        Ok(DepositInitiation {
            reference,
            redemption_instructions: payment.redemption_instructions,
            amount,
            expires_at: payment.expires_at,
            status: EntryStatus::Pending,
        })
    }
}
