//! The access gate: verify → resolve → authorize, in that order.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    AuthError, IdentityResolver, JwtValidator, OwnershipLookup, PermissionEvaluator, Policy,
    Principal, RouteParams, UserLookup,
};

/// Composes the credential verifier, identity resolver and permission
/// evaluator for a protected route.
///
/// Handlers only run after [`AccessGate::admit`] returns a principal, so a
/// denied request can never reach a write path.
#[derive(Clone)]
pub struct AccessGate {
    validator: Arc<dyn JwtValidator>,
    resolver: IdentityResolver,
    evaluator: PermissionEvaluator,
}

impl AccessGate {
    pub fn new(
        validator: Arc<dyn JwtValidator>,
        users: Arc<dyn UserLookup>,
        ownership: Arc<dyn OwnershipLookup>,
    ) -> Self {
        Self {
            validator,
            resolver: IdentityResolver::new(users),
            evaluator: PermissionEvaluator::new(ownership),
        }
    }

    pub async fn admit(
        &self,
        credential: Option<&str>,
        policy: Policy,
        params: RouteParams,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = credential.ok_or(AuthError::MissingCredential)?;
        let subject = self.validator.verify(token, now)?;
        let principal = self.resolver.resolve(subject).await?;
        self.evaluator.authorize(&principal, policy, params).await?;
        Ok(principal)
    }
}
