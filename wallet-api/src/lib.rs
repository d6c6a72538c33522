//! HTTP surface for the wallet core
//!
//! Thin axum layer over `wallet-settlement`: identity extraction, payload
//! shapes, and the error-to-status mapping. All invariants are enforced
//! below this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod error;
pub mod routes;

pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::{create_router, AppState};
