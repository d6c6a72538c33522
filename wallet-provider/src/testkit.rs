//! Test support: scripted in-memory provider
//!
//! Used by settlement tests to assert call counts (the freeze guard must
//! reject before any provider call) and to inject provider failures without
//! partial ledger effects.

use crate::{
    connector::PaymentProvider,
    types::{PaymentRequest, ProviderPayment},
    Error, Result,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Mutex;

/// Scripted provider behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Every call succeeds with a fresh payment handle
    Succeed,
    /// Every call fails with a provider API error
    FailApi,
    /// Every call times out (unknown outcome)
    FailTimeout,
}

/// In-memory provider double
pub struct MockProvider {
    behavior: MockBehavior,
    requests: Mutex<Vec<PaymentRequest>>,
}

impl MockProvider {
    /// Provider that always succeeds
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Succeed)
    }

    /// Provider with scripted behavior
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of create-payment calls received
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// All requests received, in order
    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<ProviderPayment> {
        self.requests.lock().unwrap().push(request.clone());

        match self.behavior {
            MockBehavior::Succeed => Ok(ProviderPayment {
                payment_id: format!("mock-pay-{}", self.call_count()),
                redemption_instructions: "MOCK-0000".to_string(),
                expires_at: Utc::now() + Duration::minutes(30),
            }),
            MockBehavior::FailApi => Err(Error::Api {
                status_code: 503,
                message: "provider unavailable".to_string(),
            }),
            MockBehavior::FailTimeout => Err(Error::Timeout {
                seconds: 10,
                operation: "create payment request".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock-provider"
    }
}
