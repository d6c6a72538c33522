//! Authorization capability
//!
//! Identity issuance is an external collaborator; this core only consumes an
//! injected `has_role` capability, checked before any admin mutation.

use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use wallet_ledger::UserId;

/// Roles this core checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May settle wallet requests
    Admin,
}

/// Injected role-lookup capability
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether the user holds the role
    async fn has_role(&self, user_id: &UserId, role: Role) -> Result<bool>;
}

/// Fixed admin list, for bootstrap and tests
pub struct StaticAuthorizer {
    admins: HashSet<String>,
}

impl StaticAuthorizer {
    /// Create from a list of admin user IDs
    pub fn new(admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn has_role(&self, user_id: &UserId, role: Role) -> Result<bool> {
        match role {
            Role::Admin => Ok(self.admins.contains(user_id.as_str())),
        }
    }
}

/// Fail with `Auth` unless the user holds the admin role
pub async fn ensure_admin(authorizer: &dyn Authorizer, user_id: &UserId) -> Result<()> {
    if !authorizer.has_role(user_id, Role::Admin).await? {
        tracing::info!(user_id = %user_id, "Admin capability refused");
        return Err(Error::Auth(format!(
            "user {} lacks the admin capability",
            user_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_authorizer() {
        let authorizer = StaticAuthorizer::new(vec!["root".to_string()]);

        assert!(ensure_admin(&authorizer, &UserId::new("root")).await.is_ok());

        let denied = ensure_admin(&authorizer, &UserId::new("mallory")).await;
        assert!(matches!(denied, Err(Error::Auth(_))));
    }
}
