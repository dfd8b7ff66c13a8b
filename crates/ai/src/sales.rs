//! Sales aggregation: raw sale rows -> 30-day demand per SKU.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use stockpilot_core::Sku;

use crate::snapshot::SalesEvent;

/// Length of the trailing demand window, and the fixed divisor for the daily rate.
pub const DEMAND_WINDOW_DAYS: i64 = 30;

/// Demand signal for one SKU over the trailing window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedDemand {
    pub sku: Sku,
    pub total_30d_units: u64,
    pub avg_daily_units: f64,
}

impl AggregatedDemand {
    pub fn empty(sku: Sku) -> Self {
        Self {
            sku,
            total_30d_units: 0,
            avg_daily_units: 0.0,
        }
    }

    fn from_total(sku: Sku, total: i64) -> Self {
        let total_30d_units = u64::try_from(total).unwrap_or(0);
        Self {
            sku,
            total_30d_units,
            avg_daily_units: total_30d_units as f64 / DEMAND_WINDOW_DAYS as f64,
        }
    }
}

/// Aggregated demand keyed by SKU. Lookups for SKUs without sales yield zero demand.
#[derive(Debug, Clone, Default)]
pub struct DemandBySku {
    inner: HashMap<Sku, AggregatedDemand>,
}

impl DemandBySku {
    pub fn get(&self, sku: &Sku) -> AggregatedDemand {
        self.inner
            .get(sku)
            .cloned()
            .unwrap_or_else(|| AggregatedDemand::empty(sku.clone()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Rolls sales rows into [`AggregatedDemand`] relative to a fixed "now".
///
/// The daily rate always divides by the window length, not by the number of
/// days a SKU actually had sales.
#[derive(Debug, Copy, Clone)]
pub struct SalesAggregator {
    now: DateTime<Utc>,
}

impl SalesAggregator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Oldest instant still inside the window.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(DEMAND_WINDOW_DAYS)
    }

    /// Aggregate `events`, mapping each sale's product id to a SKU.
    ///
    /// Sales with an unparseable date, a date before the cutoff, or an unknown
    /// product id are skipped.
    pub fn aggregate(&self, events: &[SalesEvent], sku_by_product: &HashMap<String, Sku>) -> DemandBySku {
        let cutoff = self.cutoff();
        let mut totals: HashMap<&Sku, i64> = HashMap::new();

        for event in events {
            let Some(sku) = sku_by_product.get(&event.product_id) else {
                continue;
            };
            let Some(sold_at) = parse_sale_date(&event.date) else {
                continue;
            };
            if sold_at < cutoff {
                continue;
            }
            let total = totals.entry(sku).or_insert(0);
            *total = total.saturating_add(event.quantity);
        }

        let inner = totals
            .into_iter()
            .map(|(sku, total)| (sku.clone(), AggregatedDemand::from_total(sku.clone(), total)))
            .collect();

        DemandBySku { inner }
    }
}

/// Parse a stored sale date.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DD[ T]HH:MM:SS[.f]` (read as UTC)
/// and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_sale_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sku(s: &str) -> Sku {
        Sku::new(s).unwrap()
    }

    fn sale(product_id: &str, quantity: i64, date: impl Into<String>) -> SalesEvent {
        SalesEvent {
            product_id: product_id.to_string(),
            quantity,
            amount: Default::default(),
            date: date.into(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap()
    }

    fn catalog() -> HashMap<String, Sku> {
        HashMap::from([
            ("p-1".to_string(), sku("MUG-01")),
            ("p-2".to_string(), sku("CAP-02")),
        ])
    }

    #[test]
    fn sums_quantities_inside_window() {
        let events = vec![
            sale("p-1", 10, "2026-03-30T08:00:00Z"),
            sale("p-1", 20, "2026-03-15"),
            sale("p-2", 3, "2026-03-20 09:30:00"),
        ];

        let demand = SalesAggregator::new(now()).aggregate(&events, &catalog());

        let mug = demand.get(&sku("MUG-01"));
        assert_eq!(mug.total_30d_units, 30);
        assert_eq!(mug.avg_daily_units, 1.0);
        assert_eq!(demand.get(&sku("CAP-02")).total_30d_units, 3);
    }

    #[test]
    fn drops_sales_older_than_cutoff() {
        let events = vec![
            sale("p-1", 5, "2026-02-28T12:00:00Z"),
            sale("p-1", 7, "2026-03-01T12:00:00Z"),
        ];

        let demand = SalesAggregator::new(now()).aggregate(&events, &catalog());

        // cutoff = 2026-03-01T12:00:00Z (inclusive)
        assert_eq!(demand.get(&sku("MUG-01")).total_30d_units, 7);
    }

    #[test]
    fn malformed_dates_are_ignored() {
        let events = vec![
            sale("p-1", 4, "yesterday"),
            sale("p-1", 4, ""),
            sale("p-1", 4, "2026-13-45"),
            sale("p-1", 1, "2026-03-29"),
        ];

        let demand = SalesAggregator::new(now()).aggregate(&events, &catalog());
        assert_eq!(demand.get(&sku("MUG-01")).total_30d_units, 1);
    }

    #[test]
    fn unknown_products_are_ignored() {
        let events = vec![sale("ghost", 50, "2026-03-29")];
        let demand = SalesAggregator::new(now()).aggregate(&events, &catalog());
        assert!(demand.is_empty());
    }

    #[test]
    fn sku_without_sales_has_zero_demand() {
        let demand = SalesAggregator::new(now()).aggregate(&[], &catalog());
        let got = demand.get(&sku("CAP-02"));
        assert_eq!(got, AggregatedDemand::empty(sku("CAP-02")));
    }

    #[test]
    fn returns_cannot_push_total_below_zero() {
        let events = vec![sale("p-1", 2, "2026-03-29"), sale("p-1", -5, "2026-03-30")];
        let demand = SalesAggregator::new(now()).aggregate(&events, &catalog());
        let mug = demand.get(&sku("MUG-01"));
        assert_eq!(mug.total_30d_units, 0);
        assert_eq!(mug.avg_daily_units, 0.0);
    }

    #[test]
    fn parses_supported_date_shapes() {
        assert!(parse_sale_date("2026-03-30T08:00:00+02:00").is_some());
        assert!(parse_sale_date("2026-03-30T08:00:00.123").is_some());
        assert!(parse_sale_date(" 2026-03-30 ").is_some());
        assert!(parse_sale_date("30/03/2026").is_none());
    }
}
