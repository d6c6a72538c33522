//! Payment provider interface

use crate::{types::*, Result};
use async_trait::async_trait;

/// Payment provider connector trait
///
/// `create_payment_request` must be idempotent on `idempotency_key`: the
/// caller retries timeouts with the same key, and the provider must not
/// create a second payment request for it.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a one-time payment request
    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<ProviderPayment>;

    /// Health check
    async fn health_check(&self) -> Result<()>;

    /// Get provider name (recorded on ledger entries)
    fn name(&self) -> &str;
}
