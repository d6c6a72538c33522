//! Main wallet store orchestration layer
//!
//! Ties together storage, the single-writer actor, and metrics into the
//! high-level API the settlement services consume.
//!
//! # Example
//!
//! ```no_run
//! use wallet_ledger::{Config, WalletStore};
//!
//! #[tokio::main]
//! async fn main() -> wallet_ledger::Result<()> {
//!     let config = Config::default();
//!     let store = WalletStore::open(config).await?;
//!
//!     let balance = store.balance(&wallet_ledger::UserId::new("u1"))?;
//!     println!("balance: {}", balance);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_store_actor, StoreHandle},
    metrics::Metrics,
    storage::{AppendOutcome, SettleOutcome, Storage},
    types::{
        AuditRecord, EntryStatus, EscrowStatus, LedgerEntry, Order, OrderId, OrderStatus,
        Reference, RequestType, UserId, WalletFreeze, WalletRequest,
    },
    Config, Error, Result,
};
use std::sync::Arc;
use uuid::Uuid;

/// Main wallet store interface
///
/// Mutations go through the single-writer actor; reads hit storage directly.
pub struct WalletStore {
    /// Actor handle for mutations
    handle: StoreHandle,

    /// Direct storage access (for reads)
    storage: Arc<Storage>,

    /// Metrics collector
    metrics: Metrics,

    /// Test support: fail the next append with a storage error
    #[cfg(feature = "testkit")]
    fail_next_append: std::sync::atomic::AtomicBool,
}

impl WalletStore {
    /// Open store with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let handle = spawn_store_actor(storage.clone());
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            handle,
            storage,
            metrics,
            #[cfg(feature = "testkit")]
            fail_next_append: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Metrics collector (for exposition endpoints)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // Ledger operations

    /// Insert a ledger entry unless its reference already exists.
    ///
    /// This is the one idempotent-append primitive used by deposit initiation,
    /// admin settlement, and escrow release alike.
    pub async fn append_entry_if_absent(&self, entry: LedgerEntry) -> Result<AppendOutcome> {
        self.validate_entry(&entry)?;

        #[cfg(feature = "testkit")]
        if self
            .fail_next_append
            .swap(false, std::sync::atomic::Ordering::SeqCst)
        {
            return Err(Error::Storage("injected append failure".to_string()));
        }

        let timer = self.metrics.append_duration.start_timer();
        let outcome = self.handle.append_entry(entry).await?;
        timer.observe_duration();

        match &outcome {
            AppendOutcome::Inserted => self.metrics.entries_appended.inc(),
            AppendOutcome::AlreadyExists(existing) => {
                self.metrics.duplicate_references.inc();
                tracing::debug!(reference = %existing.reference, "Duplicate reference, append skipped");
            }
        }

        Ok(outcome)
    }

    /// Transition a pending entry to success/failed, exactly once
    pub async fn settle_entry(
        &self,
        reference: Reference,
        status: EntryStatus,
    ) -> Result<SettleOutcome> {
        let outcome = self.handle.settle_entry(reference, status).await?;
        if matches!(outcome, SettleOutcome::Settled(_)) {
            self.metrics.entries_settled.inc();
        }
        Ok(outcome)
    }

    /// Get entry by ID
    pub fn get_entry(&self, entry_id: Uuid) -> Result<LedgerEntry> {
        self.storage.get_entry(entry_id)
    }

    /// Look up an entry by its idempotency reference
    pub fn find_by_reference(&self, reference: &Reference) -> Result<Option<LedgerEntry>> {
        self.storage.find_by_reference(reference)
    }

    /// All entries for a user, oldest first
    pub fn entries_for_user(&self, user_id: &UserId) -> Result<Vec<LedgerEntry>> {
        self.storage.entries_for_user(user_id)
    }

    /// Current balance: signed sum over success-status entries only.
    /// Deposits, earnings, and refunds credit; withdrawals debit.
    pub fn balance(&self, user_id: &UserId) -> Result<i64> {
        Ok(self
            .storage
            .entries_for_user(user_id)?
            .iter()
            .filter(|e| e.status == EntryStatus::Success)
            .map(LedgerEntry::signed_amount)
            .sum())
    }

    /// Sum of pending credits, surfaced separately as "processing"
    pub fn pending_credit(&self, user_id: &UserId) -> Result<u64> {
        Ok(self
            .storage
            .entries_for_user(user_id)?
            .iter()
            .filter(|e| e.status == EntryStatus::Pending && e.entry_type.sign() > 0)
            .map(|e| e.amount)
            .sum())
    }

    // Wallet request operations

    /// Create a pending wallet request
    pub async fn create_request(
        &self,
        user_id: UserId,
        request_type: RequestType,
        amount: u64,
    ) -> Result<WalletRequest> {
        if amount == 0 {
            return Err(Error::InvalidEntry(
                "request amount must be positive".to_string(),
            ));
        }

        let request = WalletRequest::new(user_id, request_type, amount);
        self.handle.put_request(request.clone()).await?;
        Ok(request)
    }

    /// Get wallet request by ID
    pub fn get_request(&self, request_id: Uuid) -> Result<WalletRequest> {
        self.storage.get_request(request_id)
    }

    /// Overwrite a wallet request (rejection path; no ledger effect)
    pub async fn put_request(&self, request: WalletRequest) -> Result<()> {
        self.handle.put_request(request).await
    }

    /// Write an approved request and its ledger entry in one storage
    /// transaction. Replays that hit the entry reference write neither.
    pub async fn approve_request_with_entry(
        &self,
        request: WalletRequest,
        entry: LedgerEntry,
    ) -> Result<AppendOutcome> {
        self.validate_entry(&entry)?;

        let outcome = self.handle.approve_request(request, entry).await?;
        match &outcome {
            AppendOutcome::Inserted => self.metrics.entries_appended.inc(),
            AppendOutcome::AlreadyExists(_) => self.metrics.duplicate_references.inc(),
        }
        Ok(outcome)
    }

    // Order operations

    /// Create or overwrite an order record
    pub async fn put_order(&self, order: Order) -> Result<()> {
        self.handle.put_order(order).await
    }

    /// Get order by ID
    pub fn get_order(&self, order_id: &OrderId) -> Result<Order> {
        self.storage.get_order(order_id)
    }

    /// Rewrite an order's status pair (escrow transition or compensating
    /// revert). Lifecycle guards live in the escrow coordinator.
    pub async fn update_order_state(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        escrow_status: EscrowStatus,
    ) -> Result<Order> {
        self.handle
            .update_order_state(order_id, status, escrow_status)
            .await
    }

    // Freeze operations

    /// Check moderation freeze flag
    pub fn is_frozen(&self, user_id: &UserId) -> Result<bool> {
        self.storage.is_frozen(user_id)
    }

    /// Write freeze flag (moderation ingestion only)
    pub async fn set_freeze(&self, freeze: WalletFreeze) -> Result<()> {
        self.handle.set_freeze(freeze).await
    }

    // Audit operations

    /// Append an audit record
    pub async fn append_audit(&self, record: AuditRecord) -> Result<()> {
        self.handle.append_audit(record).await
    }

    /// Audit records for a target, in time order
    pub fn audit_for_target(&self, target: &str) -> Result<Vec<AuditRecord>> {
        self.storage.audit_for_target(target)
    }

    // Reconciliation

    /// Orders whose escrow was released without a surviving earning entry
    pub fn reconcile_released_orders(&self) -> Result<Vec<OrderId>> {
        self.storage.released_orders_missing_credit()
    }

    /// Shutdown the writer actor
    pub async fn shutdown(&self) -> Result<()> {
        self.handle.shutdown().await
    }

    /// Test support: make the next `append_entry_if_absent` fail
    #[cfg(feature = "testkit")]
    pub fn fail_next_append(&self) {
        self.fail_next_append
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Validate entry invariants before any write
    fn validate_entry(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.amount == 0 {
            return Err(Error::InvalidEntry("amount must be positive".to_string()));
        }

        if entry.amount > i64::MAX as u64 {
            return Err(Error::InvalidEntry(
                "amount exceeds the representable balance range".to_string(),
            ));
        }

        if entry.reference.as_str().is_empty() {
            return Err(Error::InvalidEntry("reference must not be empty".to_string()));
        }

        Ok(())
    }
}
