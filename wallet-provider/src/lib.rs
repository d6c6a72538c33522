//! Payment provider adapter
//!
//! Consumes exactly two provider contracts: "create payment request" and the
//! inbound "webhook confirmation". Everything provider-specific (minor-unit
//! conversion, wire shapes, retry policy) lives here, never in the ledger.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod connector;
pub mod error;
pub mod http;
pub mod testkit;
pub mod types;

// Re-exports
pub use connector::PaymentProvider;
pub use error::{Error, Result};
pub use http::{HttpProvider, HttpProviderConfig};
pub use types::{PaymentRequest, ProviderPayment, WebhookEvent, WebhookStatus};
