//! Core types for the wallet ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Whole-unit integer amounts (no fractional arithmetic at the ledger boundary)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Marketplace user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marketplace order identifier (owned by the order subsystem)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    /// Create new order ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Idempotency reference: a globally unique key ensuring a retried operation
/// has effect at most once. Uniqueness is enforced at the storage level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference(String);

impl Reference {
    /// Create from a raw string
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Reference for a new deposit initiation. UUIDv7 carries the timestamp
    /// component, so references sort in creation order.
    pub fn deposit(user_id: &UserId) -> Self {
        Self(format!("dep:{}:{}", user_id, Uuid::now_v7()))
    }

    /// Reference for a reviewed wallet request
    pub fn wallet_request(request_id: Uuid) -> Self {
        Self(format!("wallet-request:{}", request_id))
    }

    /// Reference for an escrow release
    pub fn escrow_release(order_id: &OrderId) -> Self {
        Self(format!("escrow-release:{}", order_id))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Well-known metadata keys carried on ledger entries
pub mod meta {
    /// Provider-side payment handle for a pending deposit
    pub const PROVIDER_PAYMENT_ID: &str = "providerPaymentId";
    /// Platform fee charged on an approved withdrawal
    pub const FEE_AMOUNT: &str = "feeAmount";
    /// Net amount paid out after the withdrawal fee
    pub const NET_PAYOUT: &str = "netPayout";
    /// Platform fee deducted from an escrow release
    pub const FEE_DEDUCTED: &str = "feeDeducted";
    /// Gross order amount before the escrow fee
    pub const GROSS_AMOUNT: &str = "grossAmount";
    /// Order that produced an earning entry
    pub const ORDER_ID: &str = "orderId";
}

/// Kind of monetary movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntryType {
    /// Funds entering the wallet from the payment provider
    Deposit = 1,
    /// Funds leaving the wallet (gross, fee recorded in metadata)
    Withdrawal = 2,
    /// Seller credit from an escrow release
    Earning = 3,
    /// Returned funds
    Refund = 4,
}

impl EntryType {
    /// Sign of this entry in the balance fold: credits +1, debits -1
    pub fn sign(&self) -> i64 {
        match self {
            EntryType::Deposit | EntryType::Earning | EntryType::Refund => 1,
            EntryType::Withdrawal => -1,
        }
    }

    /// Stable string form (audit records, logs)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Deposit => "deposit",
            EntryType::Withdrawal => "withdrawal",
            EntryType::Earning => "earning",
            EntryType::Refund => "refund",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntryStatus {
    /// Awaiting provider confirmation or admin review
    Pending = 1,
    /// Finalized, counted in the balance
    Success = 2,
    /// Finalized, excluded from the balance
    Failed = 3,
}

impl EntryStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, EntryStatus::Success | EntryStatus::Failed)
    }

    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Success => "success",
            EntryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One monetary movement in the append-only ledger
///
/// Entries are immutable after creation except for exactly one
/// pending → success/failed transition per reference, and are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Wallet owner
    pub user_id: UserId,

    /// Kind of movement
    pub entry_type: EntryType,

    /// Amount in whole currency units, always non-negative; the sign comes
    /// from the entry type
    pub amount: u64,

    /// Settlement status
    pub status: EntryStatus,

    /// Idempotency reference, unique across the whole ledger
    pub reference: Reference,

    /// External payment provider, if one was involved
    pub provider: Option<String>,

    /// Free-form key/value metadata (see [`meta`])
    #[serde(default)]
    pub metadata: HashMap<String, String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry
    pub fn new(
        user_id: UserId,
        entry_type: EntryType,
        amount: u64,
        status: EntryStatus,
        reference: Reference,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            entry_type,
            amount,
            status,
            reference,
            provider: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the provider name
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Attach one metadata key/value pair
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Amount signed by entry type, for the balance fold
    pub fn signed_amount(&self) -> i64 {
        self.entry_type.sign() * self.amount as i64
    }
}

/// Kind of human-reviewed wallet claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestType {
    /// User claims an out-of-band deposit
    Deposit = 1,
    /// User asks to withdraw funds
    Withdrawal = 2,
}

impl RequestType {
    /// Ledger entry type produced when the request is approved
    pub fn entry_type(&self) -> EntryType {
        match self {
            RequestType::Deposit => EntryType::Deposit,
            RequestType::Withdrawal => EntryType::Withdrawal,
        }
    }

    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Deposit => "deposit",
            RequestType::Withdrawal => "withdrawal",
        }
    }
}

/// Review status of a wallet request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestStatus {
    /// Awaiting admin review
    Pending = 1,
    /// Approved; exactly one ledger entry was appended
    Approved = 2,
    /// Rejected; no ledger effect
    Rejected = 3,
}

impl RequestStatus {
    /// Approved and rejected requests are never reopened
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human-reviewed deposit/withdrawal claim, distinct from the ledger.
/// Created by the user, mutated exactly once by an admin action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Requesting user
    pub user_id: UserId,

    /// Deposit or withdrawal claim
    pub request_type: RequestType,

    /// Claimed amount in whole currency units
    pub amount: u64,

    /// Review status
    pub status: RequestStatus,

    /// Admin who reviewed the request
    pub reviewed_by: Option<UserId>,

    /// Review timestamp
    pub reviewed_at: Option<DateTime<Utc>>,

    /// Free-form admin notes
    pub admin_notes: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl WalletRequest {
    /// Create a pending request
    pub fn new(user_id: UserId, request_type: RequestType, amount: u64) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            request_type,
            amount,
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            admin_notes: None,
            created_at: Utc::now(),
        }
    }

    /// Apply the one permitted review transition. Fails if the request is
    /// already terminal or the target status is `Pending`.
    pub fn finalize(
        &mut self,
        status: RequestStatus,
        reviewed_by: UserId,
        admin_notes: Option<String>,
    ) -> crate::Result<()> {
        if self.status.is_terminal() {
            return Err(crate::Error::InvalidTransition(format!(
                "wallet request {} already {}",
                self.id, self.status
            )));
        }
        if !status.is_terminal() {
            return Err(crate::Error::InvalidTransition(
                "review must settle to approved or rejected".to_string(),
            ));
        }

        self.status = status;
        self.reviewed_by = Some(reviewed_by);
        self.reviewed_at = Some(Utc::now());
        self.admin_notes = admin_notes;
        Ok(())
    }
}

/// Order lifecycle status (owned jointly with the order subsystem; this core
/// only advances delivered → completed on escrow release)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    /// Placed, not yet shipped
    Pending = 1,
    /// Shipped by the seller
    Shipped = 2,
    /// Receipt confirmed possible
    Delivered = 3,
    /// Escrow released, terminal
    Completed = 4,
    /// Cancelled, terminal
    Cancelled = 5,
}

/// Escrow state for an order. Moves forward only: holding → released | refunded,
/// both terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EscrowStatus {
    /// Funds notionally held against the order
    Holding = 1,
    /// Funds credited to the seller
    Released = 2,
    /// Funds returned to the buyer
    Refunded = 3,
}

/// Marketplace order, as seen by the escrow core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Order ID
    pub id: OrderId,

    /// Buyer (the only caller allowed to release escrow)
    pub buyer_id: UserId,

    /// Seller credited on release
    pub seller_id: UserId,

    /// Gross order amount in whole currency units
    pub total_amount: u64,

    /// Order lifecycle status
    pub status: OrderStatus,

    /// Escrow state
    pub escrow_status: EscrowStatus,
}

impl Order {
    /// Escrow release precondition: delivered and still holding
    pub fn release_permitted(&self) -> bool {
        self.status == OrderStatus::Delivered && self.escrow_status == EscrowStatus::Holding
    }
}

/// Active-freeze flag set by an external moderation action; read-only to this
/// core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletFreeze {
    /// Frozen user
    pub user_id: UserId,

    /// Whether the freeze is currently active
    pub is_active: bool,
}

/// Outcome of an audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AuditOutcome {
    /// Action completed
    Success = 1,
    /// Action failed or was refused
    Failure = 2,
}

impl AuditOutcome {
    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
        }
    }
}

/// Audit record for an admin-driven or money-moving action. Written on both
/// success and failure, independent of downstream notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique record ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// Who performed the action
    pub actor: UserId,

    /// Action name, e.g. `deposit-initiate`, `escrow-release`
    pub action: String,

    /// Target of the action: a reference, request ID, or order ID
    pub target: String,

    /// Outcome
    pub outcome: AuditOutcome,

    /// Optional safe detail (never raw store error text)
    pub detail: Option<String>,

    /// Timestamp
    pub at: DateTime<Utc>,
}

impl AuditRecord {
    /// Create a record
    pub fn new(
        actor: UserId,
        action: impl Into<String>,
        target: impl Into<String>,
        outcome: AuditOutcome,
        detail: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor,
            action: action.into(),
            target: target.into(),
            outcome,
            detail,
            at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_amount() {
        let credit = LedgerEntry::new(
            UserId::new("u1"),
            EntryType::Deposit,
            100,
            EntryStatus::Success,
            Reference::new("r1"),
        );
        assert_eq!(credit.signed_amount(), 100);

        let debit = LedgerEntry::new(
            UserId::new("u1"),
            EntryType::Withdrawal,
            40,
            EntryStatus::Success,
            Reference::new("r2"),
        );
        assert_eq!(debit.signed_amount(), -40);
    }

    #[test]
    fn test_reference_constructors() {
        let order = OrderId::new("ord-9");
        assert_eq!(
            Reference::escrow_release(&order).as_str(),
            "escrow-release:ord-9"
        );

        let id = Uuid::now_v7();
        assert_eq!(
            Reference::wallet_request(id).as_str(),
            format!("wallet-request:{}", id)
        );

        let dep = Reference::deposit(&UserId::new("u1"));
        assert!(dep.as_str().starts_with("dep:u1:"));
    }

    #[test]
    fn test_request_finalize_once() {
        let mut request = WalletRequest::new(UserId::new("u1"), RequestType::Withdrawal, 1000);
        request
            .finalize(RequestStatus::Approved, UserId::new("admin"), None)
            .unwrap();
        assert_eq!(request.status, RequestStatus::Approved);
        assert!(request.reviewed_at.is_some());

        // Terminal requests are never reopened
        let again = request.finalize(RequestStatus::Rejected, UserId::new("admin"), None);
        assert!(again.is_err());
    }

    #[test]
    fn test_request_finalize_rejects_pending_target() {
        let mut request = WalletRequest::new(UserId::new("u1"), RequestType::Deposit, 10);
        let result = request.finalize(RequestStatus::Pending, UserId::new("admin"), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_release_permitted() {
        let mut order = Order {
            id: OrderId::new("ord-1"),
            buyer_id: UserId::new("buyer"),
            seller_id: UserId::new("seller"),
            total_amount: 10000,
            status: OrderStatus::Delivered,
            escrow_status: EscrowStatus::Holding,
        };
        assert!(order.release_permitted());

        order.status = OrderStatus::Shipped;
        assert!(!order.release_permitted());

        order.status = OrderStatus::Delivered;
        order.escrow_status = EscrowStatus::Released;
        assert!(!order.release_permitted());
    }
}
