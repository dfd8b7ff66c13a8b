//! Per-request inventory optimization: load, aggregate, predict, evaluate.
//!
//! Nothing here is cached between requests. Per-SKU predictions run
//! concurrently up to `max_concurrency` in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use stockpilot_ai::{
    AggregatedDemand, DecisionRecord, InventorySnapshot, PredictionProvider, SalesAggregator,
    TenantScope, evaluate, prediction_input,
};
use stockpilot_core::{Sku, TenantId};

use crate::config::DEFAULT_PREDICTION_CONCURRENCY;
use crate::read_model::{DataCounts, SellerData, SellerDataStore, StoreError};

#[derive(Debug, Error)]
pub enum OptimizationError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Portfolio-level figures. The model-quality fields are placeholders kept
/// for dashboard compatibility and are always empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub total_stock_value: Decimal,
    pub accuracy: Option<f64>,
    pub confusion_matrix: Option<Vec<Vec<u64>>>,
    pub labels: Vec<String>,
}

impl PortfolioMetrics {
    fn from_total(total_stock_value: Decimal) -> Self {
        Self {
            total_stock_value,
            accuracy: None,
            confusion_matrix: None,
            labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    /// One record per inventory row; order is unspecified.
    pub items: Vec<DecisionRecord>,
    pub metrics: PortfolioMetrics,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub model_loaded: bool,
    pub data_status: &'static str,
    pub drift_level: &'static str,
    pub model_stale: bool,
    pub rollback_active: bool,
    pub groq_connected: bool,
    pub counts: DataCounts,
}

pub struct OptimizationService {
    store: Arc<dyn SellerDataStore>,
    predictor: Arc<dyn PredictionProvider>,
    max_concurrency: usize,
}

impl OptimizationService {
    pub fn new(store: Arc<dyn SellerDataStore>, predictor: Arc<dyn PredictionProvider>) -> Self {
        Self {
            store,
            predictor,
            max_concurrency: DEFAULT_PREDICTION_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn predictor_name(&self) -> &'static str {
        self.predictor.name()
    }

    pub async fn optimize(&self, tenant_id: TenantId) -> Result<OptimizationReport, OptimizationError> {
        self.optimize_at(tenant_id, Utc::now()).await
    }

    /// Same as [`Self::optimize`] with an explicit clock, so the 30-day window is reproducible.
    pub async fn optimize_at(
        &self,
        tenant_id: TenantId,
        now: DateTime<Utc>,
    ) -> Result<OptimizationReport, OptimizationError> {
        let mut data = self.store.load(TenantScope::Tenant(tenant_id)).await?;
        if data.is_empty() {
            info!(tenant = %tenant_id, "tenant has no seller data; evaluating global dataset");
            data = self.store.load(TenantScope::Any).await?;
        }

        let items = self.evaluate_all(data, now).await;

        let total_stock_value = items
            .iter()
            .fold(Decimal::ZERO, |acc, r| acc.saturating_add(r.stock_value));
        let items = items
            .into_iter()
            .map(|r| r.with_capital_share(total_stock_value))
            .collect::<Vec<_>>();

        info!(
            tenant = %tenant_id,
            predictor = self.predictor.name(),
            skus = items.len(),
            "inventory optimization computed"
        );

        Ok(OptimizationReport {
            items,
            metrics: PortfolioMetrics::from_total(total_stock_value),
            generated_at: now,
        })
    }

    async fn evaluate_all(&self, data: SellerData, now: DateTime<Utc>) -> Vec<DecisionRecord> {
        let work = plan(data, now);
        debug!(skus = work.len(), "evaluation planned");

        let predictor = Arc::clone(&self.predictor);
        stream::iter(work)
            .map(move |item| {
                let predictor = Arc::clone(&predictor);
                async move {
                    let input = prediction_input(&item.snapshot, &item.demand, item.selling_price);
                    let prediction = predictor.predict(&input).await;
                    evaluate(&item.snapshot, &item.demand, item.selling_price, prediction)
                }
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await
    }

    /// Tenant-scoped data counts plus a reachability probe of the remote model.
    pub async fn health(&self, tenant_id: TenantId) -> Result<HealthReport, OptimizationError> {
        let (counts, groq_connected) = tokio::join!(
            self.store.counts(TenantScope::Tenant(tenant_id)),
            self.predictor.probe()
        );
        let counts = counts?;

        Ok(HealthReport {
            model_loaded: true,
            data_status: if counts.is_empty() { "empty" } else { "ok" },
            drift_level: "none",
            model_stale: false,
            rollback_active: false,
            groq_connected,
            counts,
        })
    }
}

/// One inventory row with the demand and price resolved inside its own tenant.
#[derive(Debug)]
struct SkuWork {
    snapshot: InventorySnapshot,
    demand: AggregatedDemand,
    selling_price: Decimal,
}

/// Resolve product ids, prices and sales per tenant. Keys are only unique
/// within a tenant, so a global read is never joined across tenants.
fn plan(data: SellerData, now: DateTime<Utc>) -> Vec<SkuWork> {
    let aggregator = SalesAggregator::new(now);
    let mut work = Vec::with_capacity(data.inventory.len());

    for (tenant, rows) in data.by_tenant() {
        let mut sku_by_product: HashMap<String, Sku> = HashMap::with_capacity(rows.products.len());
        let mut price_by_sku: HashMap<Sku, Decimal> = HashMap::with_capacity(rows.products.len());
        for p in rows.products {
            price_by_sku.insert(p.sku.clone(), p.selling_price.unwrap_or_default());
            sku_by_product.insert(p.product_id, p.sku);
        }

        let demand = aggregator.aggregate(&rows.sales, &sku_by_product);
        debug!(tenant = %tenant, skus_with_sales = demand.len(), "sales aggregated");

        work.extend(rows.inventory.into_iter().map(|snapshot| SkuWork {
            demand: demand.get(&snapshot.sku),
            selling_price: price_by_sku.get(&snapshot.sku).copied().unwrap_or_default(),
            snapshot,
        }));
    }

    work
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::TimeZone;
    use stockpilot_ai::{
        Decision, LocalPredictor, PredictionInput, PredictionResult, ProductRecord, SalesEvent,
    };

    use super::*;
    use crate::read_model::{InMemorySellerStore, Owned};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap()
    }

    fn seed_sku(
        store: &InMemorySellerStore,
        tenant: TenantId,
        sku: &str,
        stock: u64,
        cost: i64,
        price: i64,
        sold_30d: i64,
    ) {
        let product_id = format!("p-{sku}");
        store.insert_product(
            tenant,
            ProductRecord {
                product_id: product_id.clone(),
                sku: Sku::new(sku).unwrap(),
                name: sku.to_lowercase(),
                selling_price: Some(Decimal::from(price)),
            },
        );
        store.insert_inventory(
            tenant,
            InventorySnapshot {
                sku: Sku::new(sku).unwrap(),
                product_name: sku.to_lowercase(),
                current_stock: stock,
                cost_price: Some(Decimal::from(cost)),
                platform_stock_split: BTreeMap::from([("shopify".to_string(), stock)]),
            },
        );
        if sold_30d > 0 {
            store.insert_sale(
                tenant,
                SalesEvent {
                    product_id,
                    quantity: sold_30d,
                    amount: Decimal::from(sold_30d * price),
                    date: "2026-03-20".to_string(),
                },
            );
        }
    }

    fn service(store: InMemorySellerStore) -> OptimizationService {
        OptimizationService::new(Arc::new(store), Arc::new(LocalPredictor))
    }

    fn by_sku(report: &OptimizationReport) -> HashMap<String, &DecisionRecord> {
        report
            .items
            .iter()
            .map(|r| (r.sku.as_str().to_string(), r))
            .collect()
    }

    #[tokio::test]
    async fn computes_scenarios_for_tenant() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, tenant, "MUG", 100, 10, 20, 150);
        seed_sku(&store, tenant, "CAP", 100, 4, 3, 30);
        seed_sku(&store, tenant, "PIN", 0, 10, 20, 0);

        let report = service(store).optimize_at(tenant, now()).await.unwrap();
        assert_eq!(report.items.len(), 3);
        let items = by_sku(&report);

        assert_eq!(items["MUG"].decision, Decision::Increase);
        assert_eq!(items["MUG"].predicted_30d_demand, 150);
        assert_eq!(items["CAP"].decision, Decision::Reduce);
        assert_eq!(items["CAP"].risk_score, 0.7);
        assert_eq!(items["PIN"].decision, Decision::Maintain);
        assert_eq!(items["PIN"].stock_value, Decimal::ZERO);

        assert_eq!(report.metrics.total_stock_value, Decimal::from(1400));
        assert!(report.metrics.accuracy.is_none());
        assert!(report.metrics.confusion_matrix.is_none());
        assert!(report.metrics.labels.is_empty());
    }

    #[tokio::test]
    async fn total_is_sum_of_item_values_and_shares_add_up() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, tenant, "A", 10, 3, 5, 4);
        seed_sku(&store, tenant, "B", 30, 1, 2, 90);

        let report = service(store).optimize_at(tenant, now()).await.unwrap();
        let sum: Decimal = report.items.iter().map(|r| r.stock_value).sum();
        assert_eq!(report.metrics.total_stock_value, sum);

        let shares: f64 = report.items.iter().map(|r| r.capital_share_percent).sum();
        assert!((shares - 100.0).abs() < 1e-9);
        assert_eq!(by_sku(&report)["A"].capital_share_percent, 50.0);
    }

    #[tokio::test]
    async fn empty_tenant_falls_back_to_global_data() {
        let other = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, other, "MUG", 100, 10, 20, 150);

        let report = service(store).optimize_at(TenantId::new(), now()).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].sku.as_str(), "MUG");
    }

    fn product(id: &str, sku: &str, price: i64) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            sku: Sku::new(sku).unwrap(),
            name: sku.to_lowercase(),
            selling_price: Some(Decimal::from(price)),
        }
    }

    fn stock(sku: &str, units: u64, cost: i64) -> InventorySnapshot {
        InventorySnapshot {
            sku: Sku::new(sku).unwrap(),
            product_name: sku.to_lowercase(),
            current_stock: units,
            cost_price: Some(Decimal::from(cost)),
            platform_stock_split: BTreeMap::new(),
        }
    }

    fn sale(product_id: &str, quantity: i64) -> SalesEvent {
        SalesEvent {
            product_id: product_id.to_string(),
            quantity,
            amount: Decimal::from(quantity),
            date: "2026-03-20".to_string(),
        }
    }

    #[tokio::test]
    async fn global_fallback_keeps_product_ids_within_their_tenant() {
        let (a, b) = (TenantId::new(), TenantId::new());
        let store = InMemorySellerStore::new();
        store.insert_product(a, product("p-1", "MUG", 20));
        store.insert_inventory(a, stock("MUG", 100, 10));
        store.insert_sale(a, sale("p-1", 90));
        store.insert_product(b, product("p-1", "CAP", 5));
        store.insert_inventory(b, stock("CAP", 100, 2));
        store.insert_sale(b, sale("p-1", 30));

        let report = service(store).optimize_at(TenantId::new(), now()).await.unwrap();
        let items = by_sku(&report);
        assert_eq!(items.len(), 2);
        assert_eq!(items["MUG"].total_30d_sales, 90);
        assert_eq!(items["CAP"].total_30d_sales, 30);
        assert_eq!(items["CAP"].selling_price, Decimal::from(5));
    }

    #[tokio::test]
    async fn global_fallback_keeps_shared_skus_apart() {
        let (a, b) = (TenantId::new(), TenantId::new());
        let store = InMemorySellerStore::new();
        seed_sku(&store, a, "MUG", 100, 10, 20, 150);
        seed_sku(&store, b, "MUG", 100, 10, 8, 6);

        let report = service(store).optimize_at(TenantId::new(), now()).await.unwrap();
        let mut sold: Vec<_> = report
            .items
            .iter()
            .map(|r| (r.total_30d_sales, r.selling_price))
            .collect();
        sold.sort();
        assert_eq!(sold, [(6, Decimal::from(8)), (150, Decimal::from(20))]);
    }

    #[tokio::test]
    async fn optimization_runs_on_spawned_task() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, tenant, "MUG", 100, 10, 20, 150);
        let svc = Arc::new(service(store));

        let task = tokio::spawn({
            let svc = Arc::clone(&svc);
            async move { svc.optimize(tenant).await }
        });
        let report = task.await.unwrap().unwrap();
        assert_eq!(report.items.len(), 1);
    }

    #[tokio::test]
    async fn tenant_with_data_never_sees_other_tenants() {
        let mine = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, mine, "MINE", 5, 1, 2, 0);
        seed_sku(&store, TenantId::new(), "THEIRS", 5, 1, 2, 0);

        let report = service(store).optimize_at(mine, now()).await.unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.items[0].sku.as_str(), "MINE");
    }

    #[tokio::test]
    async fn sales_outside_window_are_ignored() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, tenant, "OLD", 50, 1, 2, 0);
        store.insert_sale(
            tenant,
            SalesEvent {
                product_id: "p-OLD".to_string(),
                quantity: 300,
                amount: Decimal::from(600),
                date: "2026-01-02".to_string(),
            },
        );

        let report = service(store).optimize_at(tenant, now()).await.unwrap();
        assert_eq!(report.items[0].total_30d_sales, 0);
        assert_eq!(report.items[0].decision, Decision::Reduce);
    }

    #[tokio::test]
    async fn repeated_runs_are_identical_with_local_predictor() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        for (i, sku) in ["A", "B", "C", "D", "E"].into_iter().enumerate() {
            seed_sku(&store, tenant, sku, 10 * i as u64, 2, 3, 7 * i as i64);
        }
        let svc = service(store).with_max_concurrency(2);

        let first = svc.optimize_at(tenant, now()).await.unwrap();
        let second = svc.optimize_at(tenant, now()).await.unwrap();

        let a: HashMap<_, _> = by_sku(&first);
        let b: HashMap<_, _> = by_sku(&second);
        assert_eq!(a, b);
        assert_eq!(first.metrics, second.metrics);
    }

    /// Counts how many predictions overlap.
    struct GaugedPredictor {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PredictionProvider for GaugedPredictor {
        fn name(&self) -> &'static str {
            "gauged"
        }

        async fn predict(&self, input: &PredictionInput) -> PredictionResult {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            LocalPredictor.forecast(input)
        }
    }

    #[tokio::test]
    async fn fan_out_respects_concurrency_bound() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        for i in 0..12 {
            seed_sku(&store, tenant, &format!("SKU-{i}"), 10, 1, 2, 5);
        }
        let predictor = Arc::new(GaugedPredictor {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let svc = OptimizationService::new(Arc::new(store), predictor.clone()).with_max_concurrency(3);

        let report = svc.optimize_at(tenant, now()).await.unwrap();
        let skus: HashSet<_> = report.items.iter().map(|r| r.sku.clone()).collect();
        assert_eq!(skus.len(), 12);
        assert!(predictor.peak.load(Ordering::SeqCst) <= 3);
    }

    struct BrokenStore;

    #[async_trait]
    impl SellerDataStore for BrokenStore {
        async fn products(&self, _: TenantScope) -> Result<Vec<Owned<ProductRecord>>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn inventory(
            &self,
            _: TenantScope,
        ) -> Result<Vec<Owned<InventorySnapshot>>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn sales(&self, _: TenantScope) -> Result<Vec<Owned<SalesEvent>>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failure_is_an_error() {
        let svc = OptimizationService::new(Arc::new(BrokenStore), Arc::new(LocalPredictor));
        assert!(matches!(
            svc.optimize(TenantId::new()).await,
            Err(OptimizationError::Store(_))
        ));
        assert!(svc.health(TenantId::new()).await.is_err());
    }

    #[tokio::test]
    async fn health_reports_tenant_counts() {
        let tenant = TenantId::new();
        let store = InMemorySellerStore::new();
        seed_sku(&store, tenant, "MUG", 100, 10, 20, 150);
        seed_sku(&store, TenantId::new(), "CAP", 1, 1, 1, 1);
        let svc = service(store);

        let health = svc.health(tenant).await.unwrap();
        assert_eq!(health.data_status, "ok");
        assert_eq!(
            health.counts,
            DataCounts {
                products: 1,
                inventory: 1,
                sales: 1
            }
        );
        assert!(health.model_loaded);
        assert!(!health.groq_connected);

        let empty = svc.health(TenantId::new()).await.unwrap();
        assert_eq!(empty.data_status, "empty");
        assert_eq!(empty.counts, DataCounts::default());
    }
}
