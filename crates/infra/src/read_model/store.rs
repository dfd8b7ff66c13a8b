use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use stockpilot_ai::{InventorySnapshot, ProductRecord, SalesEvent, TenantScope};
use stockpilot_core::TenantId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("seller data store unavailable: {0}")]
    Unavailable(String),

    #[error("seller data query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Row counts per dataset.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataCounts {
    pub products: u64,
    pub inventory: u64,
    pub sales: u64,
}

impl DataCounts {
    pub fn is_empty(&self) -> bool {
        self.products == 0 && self.inventory == 0 && self.sales == 0
    }
}

/// A row together with the tenant that owns it.
pub type Owned<T> = (TenantId, T);

/// Everything the decision engine reads for one scope.
///
/// Rows keep their owning tenant: product ids and SKUs are only unique
/// within a tenant, so a `TenantScope::Any` read can hold colliding keys.
#[derive(Debug, Clone, Default)]
pub struct SellerData {
    pub products: Vec<Owned<ProductRecord>>,
    pub inventory: Vec<Owned<InventorySnapshot>>,
    pub sales: Vec<Owned<SalesEvent>>,
}

/// One tenant's slice of [`SellerData`].
#[derive(Debug, Clone, Default)]
pub struct TenantData {
    pub products: Vec<ProductRecord>,
    pub inventory: Vec<InventorySnapshot>,
    pub sales: Vec<SalesEvent>,
}

impl SellerData {
    pub fn counts(&self) -> DataCounts {
        DataCounts {
            products: self.products.len() as u64,
            inventory: self.inventory.len() as u64,
            sales: self.sales.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts().is_empty()
    }

    /// Split rows by owning tenant.
    pub fn by_tenant(self) -> HashMap<TenantId, TenantData> {
        let mut out: HashMap<TenantId, TenantData> = HashMap::new();
        for (tenant, p) in self.products {
            out.entry(tenant).or_default().products.push(p);
        }
        for (tenant, i) in self.inventory {
            out.entry(tenant).or_default().inventory.push(i);
        }
        for (tenant, s) in self.sales {
            out.entry(tenant).or_default().sales.push(s);
        }
        out
    }
}

/// Read-only seller data access.
///
/// Implementations must honour `scope`: `TenantScope::Tenant` never returns
/// another tenant's rows.
#[async_trait]
pub trait SellerDataStore: Send + Sync + 'static {
    async fn products(&self, scope: TenantScope) -> Result<Vec<Owned<ProductRecord>>, StoreError>;

    async fn inventory(&self, scope: TenantScope) -> Result<Vec<Owned<InventorySnapshot>>, StoreError>;

    async fn sales(&self, scope: TenantScope) -> Result<Vec<Owned<SalesEvent>>, StoreError>;

    async fn load(&self, scope: TenantScope) -> Result<SellerData, StoreError> {
        let (products, inventory, sales) =
            tokio::try_join!(self.products(scope), self.inventory(scope), self.sales(scope))?;
        Ok(SellerData {
            products,
            inventory,
            sales,
        })
    }

    async fn counts(&self, scope: TenantScope) -> Result<DataCounts, StoreError> {
        Ok(self.load(scope).await?.counts())
    }
}
