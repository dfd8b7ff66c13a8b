//! HTTP API: server wiring, authentication, and JSON mapping for the
//! inventory optimization endpoints.

pub mod app;
pub mod context;
pub mod middleware;
