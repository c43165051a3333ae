//! Credential handling: password hashing and bearer token issuance.

pub mod password;
pub mod token;

pub use token::{Claims, TokenError, TokenService};
