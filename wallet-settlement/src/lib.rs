//! Wallet settlement core
//!
//! Coordinates money movement over the append-only wallet ledger:
//!
//! - **Deposit initiation**: freeze check → provider payment request →
//!   pending ledger entry, in that order, with no partial ledger effect on
//!   provider failure
//! - **Settlement processing**: admin review of wallet requests and provider
//!   webhook confirmations, both idempotent by reference
//! - **Escrow coordination**: per-order fund release with fee computation
//!   and a compensating revert when the ledger credit fails
//!
//! Capabilities this core consumes but does not own (role lookup, freeze
//! flags, notification delivery, the payment provider) are injected trait
//! objects.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod audit;
pub mod auth;
pub mod deposit;
pub mod error;
pub mod escrow;
pub mod fees;
pub mod guard;
pub mod notify;
pub mod processor;
pub mod reconcile;
pub mod types;

// Re-exports
pub use audit::AuditTrail;
pub use auth::{Authorizer, Role, StaticAuthorizer};
pub use deposit::DepositService;
pub use error::{Error, ErrorKind, Result, StateError};
pub use escrow::EscrowCoordinator;
pub use fees::platform_fee;
pub use guard::{FreezeGuard, StoreFreezeGuard};
pub use notify::{LogNotifier, Notifier};
pub use processor::SettlementProcessor;
pub use types::{DepositInitiation, EscrowRelease, ReviewAction, ReviewOutcome, WebhookOutcome};
