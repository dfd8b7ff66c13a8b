//! Per-SKU decision record: prediction plus derived financial metrics.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use stockpilot_core::Sku;

use crate::predictor::{Decision, PredictionInput, PredictionResult};
use crate::sales::AggregatedDemand;
use crate::snapshot::InventorySnapshot;

/// Target stock never drops below this fraction of what is on hand.
const MIN_RETAINED_STOCK: f64 = 0.9;

/// Decision for one SKU: the unit of the optimization response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub sku: Sku,
    pub product_name: String,
    pub current_stock: u64,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub platform_stock_split: BTreeMap<String, u64>,

    pub total_30d_sales: u64,
    pub avg_daily_sales: f64,

    pub predicted_30d_demand: u64,
    pub decision: Decision,
    pub risk_score: f64,
    pub turnover_ratio: f64,

    /// `current_stock * cost_price`.
    pub stock_value: Decimal,
    /// Per-unit margin, floored at zero.
    pub profit_margin: Decimal,
    /// `round(stock_value / (stock_value + 1) * 100)`, capped at 100.
    ///
    /// Kept as-is for existing dashboard consumers. The curve saturates near
    /// 100 for any stock value above a few currency units; use
    /// `capital_share_percent` for a figure that discriminates between SKUs.
    pub capital_locked_percent: u32,
    pub revenue_contribution: Decimal,
    pub stock_utilization_rate: f64,
    pub optimized_stock_level: u64,
    /// Share of the portfolio's total stock value held in this SKU, in percent.
    /// Filled in once the whole portfolio is known.
    pub capital_share_percent: f64,
}

impl DecisionRecord {
    /// Set `capital_share_percent` against the portfolio total.
    pub fn with_capital_share(mut self, total_stock_value: Decimal) -> Self {
        self.capital_share_percent = if total_stock_value.is_zero() {
            0.0
        } else {
            (self.stock_value / total_stock_value * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or(0.0)
        };
        self
    }
}

/// Assemble the predictor input for one SKU.
pub fn prediction_input(
    snapshot: &InventorySnapshot,
    demand: &AggregatedDemand,
    selling_price: Decimal,
) -> PredictionInput {
    PredictionInput {
        sku: snapshot.sku.clone(),
        product_name: snapshot.product_name.clone(),
        current_stock: snapshot.current_stock,
        avg_daily_sales: demand.avg_daily_units,
        total_30d_sales: demand.total_30d_units,
        cost_price: snapshot.unit_cost(),
        selling_price: selling_price.max(Decimal::ZERO),
    }
}

/// Combine inventory, demand and a prediction into a [`DecisionRecord`].
pub fn evaluate(
    snapshot: &InventorySnapshot,
    demand: &AggregatedDemand,
    selling_price: Decimal,
    prediction: PredictionResult,
) -> DecisionRecord {
    let cost_price = snapshot.unit_cost();
    let selling_price = selling_price.max(Decimal::ZERO);
    let stock = snapshot.current_stock;
    let predicted = prediction.predicted_30d_demand;

    let stock_value = Decimal::from(stock)
        .checked_mul(cost_price)
        .unwrap_or(Decimal::MAX);
    let revenue_contribution = Decimal::from(predicted)
        .checked_mul(selling_price)
        .unwrap_or(Decimal::MAX);

    let stock_utilization_rate = if stock > 0 {
        predicted as f64 / stock as f64 * 100.0
    } else {
        0.0
    };

    let retained = (stock as f64 * MIN_RETAINED_STOCK).round() as u64;

    DecisionRecord {
        sku: snapshot.sku.clone(),
        product_name: snapshot.product_name.clone(),
        current_stock: stock,
        cost_price,
        selling_price,
        platform_stock_split: snapshot.platform_stock_split.clone(),
        total_30d_sales: demand.total_30d_units,
        avg_daily_sales: demand.avg_daily_units,
        predicted_30d_demand: predicted,
        decision: prediction.decision,
        risk_score: prediction.risk_score,
        turnover_ratio: prediction.turnover_ratio,
        stock_value,
        profit_margin: (selling_price - cost_price).max(Decimal::ZERO),
        capital_locked_percent: capital_locked_percent(stock_value),
        revenue_contribution,
        stock_utilization_rate,
        optimized_stock_level: predicted.max(retained),
        capital_share_percent: 0.0,
    }
}

fn capital_locked_percent(stock_value: Decimal) -> u32 {
    if stock_value <= Decimal::ZERO {
        return 0;
    }
    let ratio = stock_value / (stock_value + Decimal::ONE) * Decimal::ONE_HUNDRED;
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .min(Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or(100)
}
