//! Remote prediction backends and predictor selection.

mod groq;

use std::sync::Arc;

use tracing::{info, warn};

use stockpilot_ai::{LocalPredictor, PredictionProvider, RemotePredictor};

use crate::config::PredictorConfig;

pub use groq::GroqPredictor;

/// Pick the prediction strategy once at startup.
///
/// With a Groq key the hosted model is used and every failure degrades to the
/// local heuristic; without one (or if the HTTP client cannot be built) the
/// local heuristic runs alone.
pub fn build_predictor(cfg: &PredictorConfig) -> Arc<dyn PredictionProvider> {
    match &cfg.groq {
        Some(groq) => match GroqPredictor::new(groq.clone()) {
            Ok(remote) => {
                info!(model = %groq.model, "using hosted predictor with local fallback");
                Arc::new(remote.with_local_fallback())
            }
            Err(e) => {
                warn!(error = %e, "hosted predictor unavailable; using local heuristic");
                Arc::new(LocalPredictor)
            }
        },
        None => {
            info!("no prediction API key configured; using local heuristic");
            Arc::new(LocalPredictor)
        }
    }
}
