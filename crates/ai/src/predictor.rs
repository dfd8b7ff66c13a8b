//! Demand prediction: the strategy trait, the local heuristic, and the
//! remote-with-fallback combinator.

use core::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stockpilot_core::Sku;

use crate::result::AiError;
use crate::sales::DEMAND_WINDOW_DAYS;

/// Stock below this fraction of predicted demand is understocked.
pub const INCREASE_BELOW: f64 = 0.9;
/// Stock above this multiple of predicted demand is overstocked.
pub const REDUCE_ABOVE: f64 = 1.2;
/// Turnover reported for a SKU with demand but no stock.
pub const STOCKOUT_TURNOVER: f64 = 2.0;

/// Restock recommendation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Increase,
    Maintain,
    Reduce,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Increase => "INCREASE",
            Decision::Maintain => "MAINTAIN",
            Decision::Reduce => "REDUCE",
        }
    }
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCREASE" => Ok(Decision::Increase),
            "MAINTAIN" => Ok(Decision::Maintain),
            "REDUCE" => Ok(Decision::Reduce),
            other => Err(AiError::InvalidPrediction(format!("unknown decision {other:?}"))),
        }
    }
}

/// Everything a predictor sees about one SKU.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInput {
    pub sku: Sku,
    pub product_name: String,
    pub current_stock: u64,
    pub avg_daily_sales: f64,
    pub total_30d_sales: u64,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
}

/// Forecast and classification for one SKU.
///
/// Invariants: `risk_score` in \[0, 1\], `turnover_ratio >= 0`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_30d_demand: u64,
    pub decision: Decision,
    pub risk_score: f64,
    pub turnover_ratio: f64,
}

/// Demand prediction capability.
///
/// `predict` cannot fail: implementations that talk to something unreliable
/// must resolve to a valid result themselves (see [`WithLocalFallback`]).
#[async_trait]
pub trait PredictionProvider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn predict(&self, input: &PredictionInput) -> PredictionResult;

    /// Whether a remote model is currently reachable. Used for status badges only.
    async fn probe(&self) -> bool {
        false
    }
}

/// Deterministic heuristic: the fallback of record.
///
/// Risk measures *excess* inventory only, so understock clamps to zero.
#[derive(Debug, Default, Copy, Clone)]
pub struct LocalPredictor;

impl LocalPredictor {
    pub fn forecast(&self, input: &PredictionInput) -> PredictionResult {
        let projected = (input.avg_daily_sales * DEMAND_WINDOW_DAYS as f64).round();
        let predicted = if projected.is_finite() && projected > 0.0 {
            projected as u64
        } else {
            0
        };

        let stock = input.current_stock as f64;
        let demand = predicted as f64;

        let turnover_ratio = if input.current_stock > 0 {
            demand / stock
        } else if predicted > 0 {
            STOCKOUT_TURNOVER
        } else {
            0.0
        };

        let decision = if stock < INCREASE_BELOW * demand {
            Decision::Increase
        } else if stock > REDUCE_ABOVE * demand {
            Decision::Reduce
        } else {
            Decision::Maintain
        };

        let risk_score = ((stock - demand) / stock.max(1.0)).clamp(0.0, 1.0);

        PredictionResult {
            predicted_30d_demand: predicted,
            decision,
            risk_score,
            turnover_ratio,
        }
    }
}

#[async_trait]
impl PredictionProvider for LocalPredictor {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn predict(&self, input: &PredictionInput) -> PredictionResult {
        self.forecast(input)
    }
}

/// A predictor that may fail (network model, hosted LLM, ...).
#[async_trait]
pub trait RemotePredictor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn try_predict(&self, input: &PredictionInput) -> Result<PredictionResult, AiError>;

    /// Minimal round-trip to check reachability.
    async fn probe(&self) -> Result<(), AiError>;

    fn with_local_fallback(self) -> WithLocalFallback<Self>
    where
        Self: Sized,
    {
        WithLocalFallback::new(self)
    }
}

/// `remote.try_predict(input)` or else `LocalPredictor.forecast(input)`.
///
/// Failure handling is per call: one SKU falling back does not affect others.
#[derive(Debug)]
pub struct WithLocalFallback<R> {
    remote: R,
    local: LocalPredictor,
}

impl<R> WithLocalFallback<R> {
    pub fn new(remote: R) -> Self {
        Self {
            remote,
            local: LocalPredictor,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }
}

#[async_trait]
impl<R: RemotePredictor> PredictionProvider for WithLocalFallback<R> {
    fn name(&self) -> &'static str {
        self.remote.name()
    }

    async fn predict(&self, input: &PredictionInput) -> PredictionResult {
        match self.remote.try_predict(input).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    predictor = self.remote.name(),
                    sku = %input.sku,
                    error = %e,
                    "remote prediction failed; using local heuristic"
                );
                self.local.forecast(input)
            }
        }
    }

    async fn probe(&self) -> bool {
        match self.remote.probe().await {
            Ok(()) => true,
            Err(e) => {
                debug!(predictor = self.remote.name(), error = %e, "prediction service probe failed");
                false
            }
        }
    }
}
