use std::sync::Arc;

use async_trait::async_trait;

use inkpost_core::UserId;

use crate::{AuthError, LookupError, Principal};

/// Read access to user accounts, as needed to resolve a principal.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Load the principal for `id`, or `None` if no non-deleted user exists.
    async fn find_principal(&self, id: UserId) -> Result<Option<Principal>, LookupError>;
}

/// Turns a verified token subject into the request's [`Principal`].
#[derive(Clone)]
pub struct IdentityResolver {
    users: Arc<dyn UserLookup>,
}

impl IdentityResolver {
    pub fn new(users: Arc<dyn UserLookup>) -> Self {
        Self { users }
    }

    pub async fn resolve(&self, subject: UserId) -> Result<Principal, AuthError> {
        match self.users.find_principal(subject).await? {
            Some(principal) => Ok(principal),
            None => {
                tracing::debug!(subject = %subject, "token subject has no active account");
                Err(AuthError::InvalidPrincipal)
            }
        }
    }
}
