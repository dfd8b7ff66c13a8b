//! `stockpilot-auth`: authentication boundary for seller-scoped requests.
//!
//! Token issuance lives elsewhere (the dashboard's session layer). This crate
//! only verifies bearer tokens and exposes the tenant/principal they carry.
//! It is intentionally decoupled from HTTP and storage.

pub mod claims;
pub mod jwt;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtError, JwtValidator};
