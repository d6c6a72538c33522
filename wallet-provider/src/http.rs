//! HTTP payment provider client
//!
//! Transport failures and 5xx responses are retried with exponential backoff,
//! always reusing the same idempotency key: a timed-out request has an
//! unknown outcome, and the key is what makes the retry safe. 4xx responses
//! are permanent.

use crate::{
    connector::PaymentProvider,
    types::{PaymentRequest, ProviderPayment},
    Error, Result,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Header carrying the idempotency token
const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    /// Provider API base URL
    pub base_url: String,

    /// API key sent as a bearer token
    pub api_key: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,

    /// Give up retrying after this long (seconds)
    pub retry_max_elapsed_secs: u64,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8900".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            retry_max_elapsed_secs: 30,
        }
    }
}

/// Wire shape of the provider's create-payment response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentResponse {
    payment_id: String,
    redemption_code: String,
    expires_at: DateTime<Utc>,
}

/// HTTP payment provider client
pub struct HttpProvider {
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpProvider {
    /// Create a client from configuration
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::Config("provider base_url must be set".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_max_elapsed_secs)),
            ..ExponentialBackoff::default()
        }
    }

    async fn post_payment(&self, request: &PaymentRequest) -> Result<ProviderPayment> {
        let url = format!("{}/v1/payment-requests", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header(IDEMPOTENCY_HEADER, &request.idempotency_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: CreatePaymentResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(ProviderPayment {
            payment_id: body.payment_id,
            redemption_instructions: body.redemption_code,
            expires_at: body.expires_at,
        })
    }
}

#[async_trait]
impl PaymentProvider for HttpProvider {
    async fn create_payment_request(&self, request: &PaymentRequest) -> Result<ProviderPayment> {
        let operation = || async {
            self.post_payment(request).await.map_err(|err| match &err {
                // Retry transport failures and provider-side errors with the
                // same idempotency key
                Error::Connection(_) | Error::Timeout { .. } => backoff::Error::transient(err),
                Error::Api { status_code, .. } if *status_code >= 500 => {
                    backoff::Error::transient(err)
                }
                _ => backoff::Error::permanent(err),
            })
        };

        let payment = backoff::future::retry(self.backoff(), operation).await?;

        tracing::debug!(
            idempotency_key = %request.idempotency_key,
            payment_id = %payment.payment_id,
            "Provider payment request created"
        );

        Ok(payment)
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.config.base_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Api {
                status_code: response.status().as_u16(),
                message: "health check failed".to_string(),
            })
        }
    }

    fn name(&self) -> &str {
        "http-provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_base_url() {
        let config = HttpProviderConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(HttpProvider::new(config).is_err());
    }

    #[test]
    fn test_create_payment_response_wire_format() {
        let json = r#"{
            "paymentId": "pay-1",
            "redemptionCode": "QX-7431",
            "expiresAt": "2026-08-30T12:00:00Z"
        }"#;
        let body: CreatePaymentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.payment_id, "pay-1");
        assert_eq!(body.redemption_code, "QX-7431");
    }
}
