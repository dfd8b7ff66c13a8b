use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::TenantContext;

/// Decision records for every SKU in scope plus portfolio metrics.
pub async fn get_optimization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.optimization.optimize(tenant.tenant_id()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::optimization_error_to_response(e),
    }
}

pub async fn get_health(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.optimization.health(tenant.tenant_id()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::optimization_error_to_response(e),
    }
}
