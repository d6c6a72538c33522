//! Audit trail for admin-driven and money-moving actions
//!
//! Every such action produces a record (actor, action, target, outcome) on
//! both success and failure, independent of downstream notifications. A
//! failed audit write is logged at error; it does not undo a settlement that
//! already landed.

use std::sync::Arc;
use wallet_ledger::{AuditOutcome, AuditRecord, UserId, WalletStore};

/// Audit trail writer over the wallet store
#[derive(Clone)]
pub struct AuditTrail {
    store: Arc<WalletStore>,
}

impl AuditTrail {
    /// Create a trail over the store
    pub fn new(store: Arc<WalletStore>) -> Self {
        Self { store }
    }

    /// Record an action outcome
    pub async fn record(
        &self,
        actor: &UserId,
        action: &str,
        target: &str,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) {
        let record = AuditRecord::new(actor.clone(), action, target, outcome, detail);

        if let Err(e) = self.store.append_audit(record).await {
            tracing::error!(
                actor = %actor,
                action,
                target,
                error = %e,
                "Audit record write failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_ledger::Config;

    #[tokio::test]
    async fn test_record_lands_in_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let store = Arc::new(WalletStore::open(config).await.unwrap());

        let trail = AuditTrail::new(store.clone());
        trail
            .record(
                &UserId::new("admin"),
                "wallet-request-review",
                "req-42",
                AuditOutcome::Failure,
                Some("already processed".to_string()),
            )
            .await;

        let records = store.audit_for_target("req-42").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].outcome, AuditOutcome::Failure);

        store.shutdown().await.unwrap();
    }
}
