//! `inkpost-auth`: authentication/authorization boundary.
//!
//! This crate is decoupled from HTTP and storage: it verifies credentials,
//! resolves principals and evaluates route policies through the lookup
//! traits in [`resolver`] and [`authorize`], which the infra layer implements.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod gate;
pub mod password;
pub mod policy;
pub mod principal;
pub mod resolver;
pub mod token;

pub use authorize::{OwnershipLookup, PermissionEvaluator};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use error::{AuthError, LookupError};
pub use gate::AccessGate;
pub use password::{BcryptPasswordHasher, PasswordError, PasswordHasher};
pub use policy::{Policy, RouteParams};
pub use principal::Principal;
pub use resolver::{IdentityResolver, UserLookup};
pub use token::{Hs256JwtIssuer, Hs256JwtValidator, JwtIssuer, JwtValidator, TokenIssueError};
