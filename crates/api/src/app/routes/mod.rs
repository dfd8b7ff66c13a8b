use axum::{Router, routing::get};

pub mod optimization;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/inventory-optimization", get(optimization::get_optimization))
        .route("/inventory-optimization/health", get(optimization::get_health))
}
