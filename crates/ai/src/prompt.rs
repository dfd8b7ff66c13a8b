//! Prompt construction and strict reply decoding for chat-completion predictors.
//!
//! The prompt restates the local heuristic's rules, so a hosted model is
//! expected to approximate the deterministic policy rather than contradict it.

use serde::Deserialize;

use crate::predictor::{Decision, INCREASE_BELOW, PredictionInput, PredictionResult, REDUCE_ABOVE};
use crate::result::AiError;

pub const SYSTEM_PROMPT: &str =
    "You are an inventory planning assistant for an online seller. Reply with one JSON object and no other text.";

/// Trivial prompt used to check that the service answers at all.
pub const PROBE_PROMPT: &str = r#"Reply with exactly this JSON object and nothing else: {"ok": true}"#;

pub fn prediction_prompt(input: &PredictionInput) -> String {
    format!(
        "Forecast the next 30 days of demand for one product and recommend a stock action.\n\
         \n\
         Product: {name} (SKU {sku})\n\
         Current stock: {stock} units\n\
         Average daily sales (last 30 days): {avg:.4}\n\
         Total sales (last 30 days): {total} units\n\
         Cost price: {cost}\n\
         Selling price: {price}\n\
         \n\
         Rules:\n\
         - predicted_30d_demand = round(average daily sales * 30), a non-negative integer.\n\
         - decision = \"INCREASE\" if current stock < {inc} * predicted_30d_demand; \
         \"REDUCE\" if current stock > {red} * predicted_30d_demand; otherwise \"MAINTAIN\".\n\
         - risk_score = (current stock - predicted_30d_demand) / max(1, current stock), clamped to [0, 1].\n\
         - turnover_ratio = predicted_30d_demand / current stock; 2 if stock is 0 and demand is positive; otherwise 0.\n\
         \n\
         Respond with JSON only, exactly these keys:\n\
         {{\"predicted_30d_demand\": <integer>, \"decision\": \"INCREASE\"|\"MAINTAIN\"|\"REDUCE\", \
         \"risk_score\": <number>, \"turnover_ratio\": <number>}}",
        name = input.product_name,
        sku = input.sku,
        stock = input.current_stock,
        avg = input.avg_daily_sales,
        total = input.total_30d_sales,
        cost = input.cost_price,
        price = input.selling_price,
        inc = INCREASE_BELOW,
        red = REDUCE_ABOVE,
    )
}

/// Slice from the first `{` to the last `}` of `text`, if both exist in that order.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[derive(Debug, Deserialize)]
struct RawPrediction {
    #[serde(alias = "predicted30dDemand", alias = "predictedDemand")]
    predicted_30d_demand: f64,
    decision: String,
    #[serde(alias = "riskScore")]
    risk_score: f64,
    #[serde(alias = "turnoverRatio")]
    turnover_ratio: f64,
}

/// Decode a model reply into a validated [`PredictionResult`].
///
/// Demand is rounded and floored at zero, risk is clamped to \[0, 1\] and
/// turnover is floored at zero. Anything that is not a finite number, or an
/// unknown decision label, is an error.
pub fn decode_prediction(text: &str) -> Result<PredictionResult, AiError> {
    let json = extract_json_object(text)
        .ok_or_else(|| AiError::MalformedReply("no JSON object in reply".to_string()))?;

    let raw: RawPrediction =
        serde_json::from_str(json).map_err(|e| AiError::MalformedReply(e.to_string()))?;

    if !raw.predicted_30d_demand.is_finite() {
        return Err(AiError::InvalidPrediction(
            "predicted_30d_demand is not a finite number".to_string(),
        ));
    }
    if !raw.risk_score.is_finite() || !raw.turnover_ratio.is_finite() {
        return Err(AiError::InvalidPrediction(
            "risk_score and turnover_ratio must be finite numbers".to_string(),
        ));
    }

    let decision: Decision = raw.decision.parse()?;

    Ok(PredictionResult {
        predicted_30d_demand: raw.predicted_30d_demand.max(0.0).round() as u64,
        decision,
        risk_score: raw.risk_score.clamp(0.0, 1.0),
        turnover_ratio: raw.turnover_ratio.max(0.0),
    })
}

/// Accept any reply that carries a JSON object.
pub fn decode_probe(text: &str) -> Result<(), AiError> {
    let json = extract_json_object(text)
        .ok_or_else(|| AiError::MalformedReply("no JSON object in probe reply".to_string()))?;
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(AiError::MalformedReply("probe reply is not an object".to_string())),
        Err(e) => Err(AiError::MalformedReply(e.to_string())),
    }
}
