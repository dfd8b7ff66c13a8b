//! Read-only input rows, as handed over by the seller data store.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockpilot_core::Sku;

/// Catalog entry: links the product id used by sales rows to a SKU and carries
/// the selling price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub sku: Sku,
    pub name: String,
    #[serde(default)]
    pub selling_price: Option<Decimal>,
}

/// Current stock position for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub sku: Sku,
    pub product_name: String,
    pub current_stock: u64,
    /// Unit cost. Missing costs are treated as zero.
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    /// Units held per sales channel (e.g. `"amazon" -> 40`).
    #[serde(default)]
    pub platform_stock_split: BTreeMap<String, u64>,
}

impl InventorySnapshot {
    /// Unit cost with missing or negative values normalized to zero.
    pub fn unit_cost(&self) -> Decimal {
        self.cost_price.unwrap_or_default().max(Decimal::ZERO)
    }
}

/// One recorded sale.
///
/// `date` is the raw stored value; rows whose date cannot be parsed are
/// ignored by the aggregator rather than rejected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesEvent {
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub amount: Decimal,
    pub date: String,
}
