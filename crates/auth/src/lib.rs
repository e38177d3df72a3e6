//! `cowork-auth`. Identity and access: user accounts, credential rules,
//! roles/permissions and bearer tokens.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, ensure_self_or};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtIssuer, Hs256JwtValidator, IssuedToken, JwtIssuer, JwtValidator, TokenError};
pub use password::{hash_password, verify_password};
pub use permissions::{Permission, permissions_for};
pub use principal::Principal;
pub use roles::Role;
pub use user::{
    Email, NewUser, Password, PersonName, User, UserChanges, UserErrors, ValidatedRegistration,
    ValidatedUserChanges,
};
