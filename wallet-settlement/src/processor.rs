//! Settlement processor
//!
//! Two entry points, both idempotent through the store's conditional
//! insert-if-absent primitive keyed by reference:
//! - admin review of a wallet request (approve appends exactly one ledger
//!   entry, colocated with the request mutation in one storage transaction)
//! - provider webhook confirmation (exactly-once pending transition)
//!
//! A best-effort notification follows either path; its failure never rolls
//! back the settlement.

use crate::{
    audit::AuditTrail,
    auth::{ensure_admin, Authorizer},
    fees::platform_fee,
    notify::{notify_best_effort, Notifier},
    types::{ReviewAction, ReviewOutcome, WebhookOutcome},
    Error, Result, StateError,
};
use std::sync::Arc;
use uuid::Uuid;
use wallet_ledger::{
    meta, AppendOutcome, AuditOutcome, EntryStatus, LedgerEntry, Reference, RequestStatus,
    RequestType, SettleOutcome, UserId, WalletStore,
};
use wallet_provider::{WebhookEvent, WebhookStatus};

const ACTION_REVIEW: &str = "wallet-request-review";
const ACTION_WEBHOOK: &str = "provider-webhook";

/// Settlement processor
pub struct SettlementProcessor {
    store: Arc<WalletStore>,
    authorizer: Arc<dyn Authorizer>,
    notifier: Arc<dyn Notifier>,
    audit: AuditTrail,
}

impl SettlementProcessor {
    /// Create the processor
    pub fn new(
        store: Arc<WalletStore>,
        authorizer: Arc<dyn Authorizer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let audit = AuditTrail::new(store.clone());
        Self {
            store,
            authorizer,
            notifier,
            audit,
        }
    }

    /// Admin review of a wallet request
    pub async fn review(
        &self,
        request_id: Uuid,
        action: ReviewAction,
        admin: UserId,
        admin_notes: Option<String>,
    ) -> Result<ReviewOutcome> {
        if let Err(e) = ensure_admin(self.authorizer.as_ref(), &admin).await {
            self.audit
                .record(
                    &admin,
                    ACTION_REVIEW,
                    &request_id.to_string(),
                    AuditOutcome::Failure,
                    Some(e.safe_message()),
                )
                .await;
            return Err(e);
        }

        let mut request = self.store.get_request(request_id).map_err(|e| match e {
            wallet_ledger::Error::RequestNotFound(id) => {
                Error::Validation(format!("unknown wallet request {}", id))
            }
            other => Error::from(other),
        })?;

        if request.status != RequestStatus::Pending {
            self.audit
                .record(
                    &admin,
                    ACTION_REVIEW,
                    &request_id.to_string(),
                    AuditOutcome::Failure,
                    Some("already processed".to_string()),
                )
                .await;
            return Err(Error::State(StateError::RequestAlreadyProcessed));
        }

        let result = match action {
            ReviewAction::Reject => self.reject(&mut request, &admin, admin_notes).await,
            ReviewAction::Approve => self.approve(&mut request, &admin, admin_notes).await,
        };
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                self.audit
                    .record(
                        &admin,
                        ACTION_REVIEW,
                        &request_id.to_string(),
                        AuditOutcome::Failure,
                        Some(e.kind().as_str().to_string()),
                    )
                    .await;
                return Err(e);
            }
        };

        self.audit
            .record(
                &admin,
                ACTION_REVIEW,
                &request_id.to_string(),
                AuditOutcome::Success,
                Some(outcome.status.to_string()),
            )
            .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &request.user_id,
            &format!(
                "Your {} request for {} was {}",
                request.request_type.as_str(),
                request.amount,
                outcome.status
            ),
        )
        .await;

        Ok(outcome)
    }

    async fn reject(
        &self,
        request: &mut wallet_ledger::WalletRequest,
        admin: &UserId,
        admin_notes: Option<String>,
    ) -> Result<ReviewOutcome> {
        request.finalize(RequestStatus::Rejected, admin.clone(), admin_notes)?;
        self.store.put_request(request.clone()).await?;

        tracing::info!(request_id = %request.id, admin = %admin, "Wallet request rejected");

        Ok(ReviewOutcome {
            status: RequestStatus::Rejected,
            entry_reference: None,
        })
    }

    async fn approve(
        &self,
        request: &mut wallet_ledger::WalletRequest,
        admin: &UserId,
        admin_notes: Option<String>,
    ) -> Result<ReviewOutcome> {
        request.finalize(RequestStatus::Approved, admin.clone(), admin_notes)?;

        let reference = Reference::wallet_request(request.id);
        let mut entry = LedgerEntry::new(
            request.user_id.clone(),
            request.request_type.entry_type(),
            request.amount,
            EntryStatus::Success,
            reference.clone(),
        );

        // Deposits carry zero fee; withdrawals record the gross debit with
        // the fee and net payout in metadata
        if request.request_type == RequestType::Withdrawal {
            let (fee, net) = platform_fee(request.amount);
            entry = entry
                .with_metadata(meta::FEE_AMOUNT, fee.to_string())
                .with_metadata(meta::NET_PAYOUT, net.to_string());
        }

        let outcome = self
            .store
            .approve_request_with_entry(request.clone(), entry)
            .await?;

        if let AppendOutcome::AlreadyExists(_) = outcome {
            // A previous approval already landed the entry for this request
            return Err(Error::State(StateError::RequestAlreadyProcessed));
        }

        tracing::info!(
            request_id = %request.id,
            admin = %admin,
            reference = %reference,
            amount = request.amount,
            "Wallet request approved"
        );

        Ok(ReviewOutcome {
            status: RequestStatus::Approved,
            entry_reference: Some(reference),
        })
    }

    /// Provider webhook confirmation: drive the matching pending entry to
    /// its terminal status, exactly once
    pub async fn confirm_webhook(&self, event: &WebhookEvent) -> Result<WebhookOutcome> {
        let reference = Reference::new(event.reference.clone());

        let entry = self
            .store
            .find_by_reference(&reference)?
            .ok_or_else(|| {
                tracing::warn!(reference = %reference, event_id = %event.event_id,
                    "Webhook for unknown reference");
                Error::Validation(format!("unknown reference {}", reference))
            })?;

        let target = match event.status {
            WebhookStatus::Succeeded => EntryStatus::Success,
            WebhookStatus::Failed => EntryStatus::Failed,
        };

        let outcome = match self.store.settle_entry(reference.clone(), target).await? {
            SettleOutcome::Settled(settled) => {
                tracing::info!(reference = %reference, status = %settled.status,
                    "Webhook settled ledger entry");
                WebhookOutcome {
                    reference: reference.clone(),
                    status: settled.status,
                    already_settled: false,
                }
            }
            SettleOutcome::AlreadySettled(existing) => {
                if existing.status != target {
                    tracing::warn!(
                        reference = %reference,
                        recorded = %existing.status,
                        requested = %target,
                        "Conflicting webhook replay ignored"
                    );
                }
                WebhookOutcome {
                    reference: reference.clone(),
                    status: existing.status,
                    already_settled: true,
                }
            }
        };

        self.audit
            .record(
                &entry.user_id,
                ACTION_WEBHOOK,
                reference.as_str(),
                AuditOutcome::Success,
                Some(outcome.status.to_string()),
            )
            .await;
        notify_best_effort(
            self.notifier.as_ref(),
            &entry.user_id,
            &format!("Your deposit of {} is {}", entry.amount, outcome.status),
        )
        .await;

        Ok(outcome)
    }
}
