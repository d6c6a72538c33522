//! Marketplace Wallet Ledger
//!
//! Append-only record of monetary movements per user; sole source of truth
//! for balance.
//!
//! # Architecture
//!
//! - **Append-only**: entries are never mutated after creation except one
//!   pending → success/failed transition per reference, never deleted
//! - **Single Writer**: one logical writer task makes the reference
//!   uniqueness check an atomic conditional insert
//! - **Derived balance**: balance is a fold over success-status entries,
//!   signed by entry type
//!
//! # Invariants
//!
//! - `balance(user) == Σ signed_amount` over success entries, for any history
//! - A reference maps to at most one entry, ever
//! - Escrow state moves forward only; the one backward move is the explicit
//!   compensation after a failed ledger credit

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::WalletStore;
pub use storage::{AppendOutcome, SettleOutcome};
pub use types::meta;
pub use types::{
    AuditOutcome, AuditRecord, EntryStatus, EntryType, EscrowStatus, LedgerEntry, Order, OrderId,
    OrderStatus, Reference, RequestStatus, RequestType, UserId, WalletFreeze, WalletRequest,
};
