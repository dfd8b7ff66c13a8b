//! `stockpilot-core`: shared primitives for the inventory decision engine.
//!
//! This crate contains **pure** building blocks (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod sku;

pub use error::{DomainError, DomainResult};
pub use id::{TenantId, UserId};
pub use sku::Sku;
