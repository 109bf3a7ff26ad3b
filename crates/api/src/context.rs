use inkpost_auth::Principal;
use inkpost_core::UserId;

/// Principal context for a request (the identity admitted by the access gate).
///
/// Present in the request extensions of every guarded route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }
}
