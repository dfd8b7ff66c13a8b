use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockpilot_infra::optimization::OptimizationError;

/// Map a service failure to a response. Store details stay in the logs.
pub fn optimization_error_to_response(err: OptimizationError) -> axum::response::Response {
    match err {
        OptimizationError::Store(e) => {
            error!(error = %e, "seller data store failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "failed to load seller data",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
