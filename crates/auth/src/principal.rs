use serde::Serialize;

use inkpost_core::UserId;

/// The authenticated actor of a single request.
///
/// Built fresh from the user record on every request, so role changes and
/// account deletion take effect immediately.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub is_admin: bool,
}

impl Principal {
    pub fn new(id: UserId, is_admin: bool) -> Self {
        Self { id, is_admin }
    }
}
