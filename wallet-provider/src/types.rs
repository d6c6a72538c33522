//! Types for the payment provider contract
//!
//! The wire shapes use camelCase: the provider API and webhook payloads are
//! owned by the external collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One-time payment request sent to the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Wallet owner the deposit is for
    pub user_id: String,

    /// Amount in whole currency units; conversion to the provider's
    /// minor-unit representation is the adapter's concern, not the ledger's
    pub amount: u64,

    /// Ledger reference, passed as the provider idempotency token so retries
    /// of the same request never create two payment requests
    pub idempotency_key: String,
}

/// Provider-side payment handle and redemption instructions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderPayment {
    /// Provider payment handle
    pub payment_id: String,

    /// Redemption instructions shown to the user (e.g. a short code)
    pub redemption_instructions: String,

    /// Payment request expiry
    pub expires_at: DateTime<Utc>,
}

/// Terminal status carried by a webhook confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    /// Payment completed on the provider side
    Succeeded,
    /// Payment failed or expired on the provider side
    Failed,
}

/// Inbound provider confirmation. The core only requires that the payload
/// carry a stable `reference` reusable as the idempotency key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Provider event ID
    pub event_id: String,

    /// Ledger reference this confirmation settles
    pub reference: String,

    /// Provider payment handle, if echoed back
    #[serde(default)]
    pub payment_id: Option<String>,

    /// Terminal payment status
    pub status: WebhookStatus,

    /// Confirmed amount, if echoed back
    #[serde(default)]
    pub amount: Option<u64>,
}
