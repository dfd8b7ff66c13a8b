//! Postgres-backed seller data store.
//!
//! Reads the catalog, stock and sales tables owned by the dashboard's CRUD
//! layer (schema in `migrations/0001_seller_data.sql`). This module never
//! writes.
//!
//! ## Tenant isolation
//!
//! Every query filters on `tenant_id` unless the scope is `TenantScope::Any`,
//! which binds `NULL` and reads the global dataset. Rows always carry their
//! `tenant_id` so callers can keep tenants apart inside a global read.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use stockpilot_ai::{InventorySnapshot, ProductRecord, SalesEvent, TenantScope};
use stockpilot_core::{Sku, TenantId};

use super::store::{DataCounts, Owned, SellerDataStore, StoreError};

pub struct PostgresSellerStore {
    pool: Arc<PgPool>,
}

impl PostgresSellerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }
}

fn scope_param(scope: TenantScope) -> Option<Uuid> {
    scope.tenant_id().map(Uuid::from)
}

fn row_sku(row: &PgRow, table: &'static str) -> Result<Option<Sku>, sqlx::Error> {
    let raw: String = row.try_get("sku")?;
    match Sku::new(raw) {
        Ok(sku) => Ok(Some(sku)),
        Err(e) => {
            warn!(table, error = %e, "skipping row with unusable sku");
            Ok(None)
        }
    }
}

fn row_tenant(row: &PgRow) -> Result<TenantId, sqlx::Error> {
    Ok(TenantId::from(row.try_get::<Uuid, _>("tenant_id")?))
}

fn non_negative(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}

/// Lenient decode of the per-platform stock JSON (`{"amazon": 40, ...}`).
/// Entries that are not non-negative integers are dropped.
fn platform_split(value: Option<serde_json::Value>) -> BTreeMap<String, u64> {
    match value {
        Some(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(platform, units)| units.as_u64().map(|u| (platform, u)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[async_trait]
impl SellerDataStore for PostgresSellerStore {
    async fn products(&self, scope: TenantScope) -> Result<Vec<Owned<ProductRecord>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, product_id, sku, name, selling_price
            FROM products
            WHERE $1::uuid IS NULL OR tenant_id = $1
            "#,
        )
        .bind(scope_param(scope))
        .fetch_all(&*self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(sku) = row_sku(&row, "products")? else {
                continue;
            };
            out.push((
                row_tenant(&row)?,
                ProductRecord {
                    product_id: row.try_get("product_id")?,
                    sku,
                    name: row.try_get("name")?,
                    selling_price: row.try_get::<Option<Decimal>, _>("selling_price")?,
                },
            ));
        }
        Ok(out)
    }

    async fn inventory(
        &self,
        scope: TenantScope,
    ) -> Result<Vec<Owned<InventorySnapshot>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, sku, product_name, current_stock, cost_price, platform_stock_split
            FROM inventory
            WHERE $1::uuid IS NULL OR tenant_id = $1
            "#,
        )
        .bind(scope_param(scope))
        .fetch_all(&*self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(sku) = row_sku(&row, "inventory")? else {
                continue;
            };
            out.push((
                row_tenant(&row)?,
                InventorySnapshot {
                    sku,
                    product_name: row.try_get("product_name")?,
                    current_stock: non_negative(row.try_get("current_stock")?),
                    cost_price: row.try_get::<Option<Decimal>, _>("cost_price")?,
                    platform_stock_split: platform_split(row.try_get("platform_stock_split")?),
                },
            ));
        }
        Ok(out)
    }

    async fn sales(&self, scope: TenantScope) -> Result<Vec<Owned<SalesEvent>>, StoreError> {
        // Dates are read as text: unparseable values are dropped later by the aggregator.
        let rows = sqlx::query(
            r#"
            SELECT tenant_id, product_id, quantity, amount, sale_date::text AS sale_date
            FROM sales
            WHERE $1::uuid IS NULL OR tenant_id = $1
            "#,
        )
        .bind(scope_param(scope))
        .fetch_all(&*self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<Owned<SalesEvent>, StoreError> {
                let sale = SalesEvent {
                    product_id: row.try_get("product_id")?,
                    quantity: row.try_get("quantity")?,
                    amount: row
                        .try_get::<Option<Decimal>, _>("amount")?
                        .unwrap_or_default(),
                    date: row
                        .try_get::<Option<String>, _>("sale_date")?
                        .unwrap_or_default(),
                };
                Ok((row_tenant(&row)?, sale))
            })
            .collect()
    }

    async fn counts(&self, scope: TenantScope) -> Result<DataCounts, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products  WHERE $1::uuid IS NULL OR tenant_id = $1) AS products,
                (SELECT COUNT(*) FROM inventory WHERE $1::uuid IS NULL OR tenant_id = $1) AS inventory,
                (SELECT COUNT(*) FROM sales     WHERE $1::uuid IS NULL OR tenant_id = $1) AS sales
            "#,
        )
        .bind(scope_param(scope))
        .fetch_one(&*self.pool)
        .await?;

        Ok(DataCounts {
            products: non_negative(row.try_get("products")?),
            inventory: non_negative(row.try_get("inventory")?),
            sales: non_negative(row.try_get("sales")?),
        })
    }
}
