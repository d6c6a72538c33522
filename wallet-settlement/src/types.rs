//! Outcome types for settlement operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_ledger::{EntryStatus, Reference, RequestStatus};

/// Result of a successful deposit initiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositInitiation {
    /// Ledger reference, the idempotency key for the whole deposit
    pub reference: Reference,

    /// Provider-supplied redemption instructions (e.g. a short code)
    pub redemption_instructions: String,

    /// Deposit amount in whole currency units
    pub amount: u64,

    /// Provider payment expiry
    pub expires_at: DateTime<Utc>,

    /// Always `Pending` until the provider confirms
    pub status: EntryStatus,
}

/// Admin review decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    /// Approve the request; exactly one ledger entry is appended
    Approve,
    /// Reject the request; no ledger effect
    Reject,
}

/// Result of an admin review
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// Terminal request status after the review
    pub status: RequestStatus,

    /// Ledger reference of the appended entry, approved requests only
    pub entry_reference: Option<Reference>,
}

/// Result of a provider webhook confirmation
#[derive(Debug, Clone)]
pub struct WebhookOutcome {
    /// Settled ledger reference
    pub reference: Reference,

    /// Entry status after handling the event
    pub status: EntryStatus,

    /// True when the entry was already terminal (duplicate delivery)
    pub already_settled: bool,
}

/// Result of an escrow release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowRelease {
    /// Net amount credited to the seller
    pub amount_released: u64,

    /// Platform fee deducted from the gross order amount
    pub fee_deducted: u64,

    /// True when a previous release already settled this order (idempotent
    /// replay; no additional writes were performed)
    pub already_processed: bool,
}
