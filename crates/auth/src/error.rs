use thiserror::Error;

/// Failure of a storage lookup performed on behalf of authentication or
/// authorization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LookupError(String);

impl LookupError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Why a request was refused before reaching its handler.
///
/// Raised once where the failure is detected and propagated unchanged to the
/// HTTP boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Neither the credential cookie nor a bearer header was supplied.
    #[error("authentication token missing")]
    MissingCredential,

    /// Malformed, wrongly signed or expired token. Deliberately uninformative.
    #[error("wrong authentication token")]
    Unauthenticated,

    /// The token is valid but its subject no longer exists.
    #[error("wrong authentication token")]
    InvalidPrincipal,

    /// Authenticated, but the route policy denied the principal.
    #[error("you are not authorized to perform this action")]
    Forbidden,

    /// The resource named by an ownership check does not exist.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

impl AuthError {
    /// Stable machine-readable code used in error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidPrincipal => "invalid_principal",
            AuthError::Forbidden => "forbidden",
            AuthError::NotFound { .. } => "not_found",
            AuthError::Lookup(_) => "lookup_failed",
        }
    }
}
