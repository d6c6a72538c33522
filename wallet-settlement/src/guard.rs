//! Wallet freeze guard
//!
//! The freeze flag is owned by the moderation subsystem; this core only
//! reads it. Every debit- or credit-initiating operation checks the guard
//! first and fails with `State(WalletFrozen)` before any side effect.

use crate::{Error, Result, StateError};
use async_trait::async_trait;
use std::sync::Arc;
use wallet_ledger::{UserId, WalletStore};

/// Read-only active-freeze capability
#[async_trait]
pub trait FreezeGuard: Send + Sync {
    /// Whether the user's wallet has an active freeze. No side effects.
    async fn is_frozen(&self, user_id: &UserId) -> Result<bool>;
}

/// Guard backed by the wallet store's freeze records
pub struct StoreFreezeGuard {
    store: Arc<WalletStore>,
}

impl StoreFreezeGuard {
    /// Create a guard over the store
    pub fn new(store: Arc<WalletStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FreezeGuard for StoreFreezeGuard {
    async fn is_frozen(&self, user_id: &UserId) -> Result<bool> {
        Ok(self.store.is_frozen(user_id)?)
    }
}

/// Fail with `State(WalletFrozen)` if the user's wallet is frozen
pub async fn ensure_not_frozen(guard: &dyn FreezeGuard, user_id: &UserId) -> Result<()> {
    if guard.is_frozen(user_id).await? {
        tracing::info!(user_id = %user_id, "Operation refused: wallet frozen");
        return Err(Error::State(StateError::WalletFrozen));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallet_ledger::{Config, WalletFreeze};

    #[tokio::test]
    async fn test_store_guard_reads_freeze_flag() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let store = Arc::new(WalletStore::open(config).await.unwrap());

        let guard = StoreFreezeGuard::new(store.clone());
        let user = UserId::new("u1");

        assert!(ensure_not_frozen(&guard, &user).await.is_ok());

        store
            .set_freeze(WalletFreeze { user_id: user.clone(), is_active: true })
            .await
            .unwrap();

        let result = ensure_not_frozen(&guard, &user).await;
        assert!(matches!(result, Err(Error::State(StateError::WalletFrozen))));

        store.shutdown().await.unwrap();
    }
}
