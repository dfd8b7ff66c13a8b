//! Infrastructure layer: seller data access, the hosted prediction client,
//! configuration, and the per-request optimization service.

pub mod config;
pub mod external;
pub mod optimization;
pub mod read_model;
