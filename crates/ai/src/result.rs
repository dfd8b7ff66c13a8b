use std::time::Duration;

use thiserror::Error;

/// Failure of a remote prediction attempt.
///
/// None of these reach API callers: every variant is absorbed by
/// [`crate::WithLocalFallback`], which substitutes the local heuristic.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("prediction service transport error: {0}")]
    Transport(String),

    #[error("prediction service returned status {status}")]
    Status { status: u16 },

    #[error("prediction service timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed prediction reply: {0}")]
    MalformedReply(String),

    #[error("invalid prediction: {0}")]
    InvalidPrediction(String),
}
