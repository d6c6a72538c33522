//! Error taxonomy for settlement operations
//!
//! Five kinds, mapped to HTTP statuses at the API boundary:
//! Validation (400), Auth (401/403), State (400, frozen wallet 403),
//! Provider (500, guaranteed no partial ledger write), Persistence (500,
//! a store write failed after an external side effect or a prior write).
//!
//! User-visible failures surface `kind()` plus `safe_message()`; raw store
//! and provider error text stays in the logs.

use std::fmt;
use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason an operation is invalid for the current record state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    /// Wallet has an active moderation freeze
    WalletFrozen,
    /// Escrow release precondition not met (not delivered, or not holding)
    InvalidEscrowTransition,
    /// Wallet request is already approved or rejected
    RequestAlreadyProcessed,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StateError::WalletFrozen => "wallet is frozen",
            StateError::InvalidEscrowTransition => "order is not eligible for escrow release",
            StateError::RequestAlreadyProcessed => "wallet request already processed",
        };
        write!(f, "{}", text)
    }
}

/// Stable error kind for audit records and HTTP mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// Missing or insufficient capability
    Auth,
    /// Operation invalid for the current record state
    State,
    /// External payment provider failure
    Provider,
    /// Store write failure
    Persistence,
}

impl ErrorKind {
    /// Stable string form
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::State => "state",
            ErrorKind::Provider => "provider",
            ErrorKind::Persistence => "persistence",
        }
    }
}

/// Settlement errors
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or insufficient capability
    #[error("Authorization error: {0}")]
    Auth(String),

    /// Operation invalid for the current WalletRequest/Order state, or
    /// wallet frozen
    #[error("Invalid state: {0}")]
    State(StateError),

    /// External payment provider failure; no partial ledger write occurred
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Store write failure after an external side effect or a prior write
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl Error {
    /// Taxonomy kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::State(_) => ErrorKind::State,
            Error::Provider(_) => ErrorKind::Provider,
            Error::Persistence(_) => ErrorKind::Persistence,
        }
    }

    /// Message safe to show to a user. Provider and store internals are
    /// replaced with canned text; the full error goes to the log.
    pub fn safe_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Auth(msg) => msg.clone(),
            Error::State(state) => state.to_string(),
            Error::Provider(_) => "payment provider is unavailable".to_string(),
            Error::Persistence(_) => "the operation could not be recorded".to_string(),
        }
    }
}

impl From<wallet_ledger::Error> for Error {
    fn from(err: wallet_ledger::Error) -> Self {
        match err {
            wallet_ledger::Error::InvalidEntry(msg) => Error::Validation(msg),
            other => Error::Persistence(other.to_string()),
        }
    }
}

impl From<wallet_provider::Error> for Error {
    fn from(err: wallet_provider::Error) -> Self {
        Error::Provider(err.to_string())
    }
}
