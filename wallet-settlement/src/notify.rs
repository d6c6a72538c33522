//! Best-effort user notifications
//!
//! Delivery is fire-and-forget: a notification failure never blocks or rolls
//! back a settlement. Callers go through [`notify_best_effort`].

use async_trait::async_trait;
use wallet_ledger::UserId;

/// Outbound notification sink (push/email delivery lives outside this core)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a message to a user
    async fn notify(&self, user_id: &UserId, message: &str) -> anyhow::Result<()>;
}

/// Notifier that only logs, for bootstrap and tests
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: &UserId, message: &str) -> anyhow::Result<()> {
        tracing::info!(user_id = %user_id, message, "Notification");
        Ok(())
    }
}

/// Send a notification, logging failure instead of propagating it
pub async fn notify_best_effort(notifier: &dyn Notifier, user_id: &UserId, message: &str) {
    if let Err(e) = notifier.notify(user_id, message).await {
        tracing::warn!(user_id = %user_id, error = %e, "Notification delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _user_id: &UserId, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("smtp unreachable")
        }
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        // Must not panic or propagate
        notify_best_effort(&FailingNotifier, &UserId::new("u1"), "deposit settled").await;
    }
}
