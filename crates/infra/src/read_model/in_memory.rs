use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::Deserialize;

use stockpilot_ai::{InventorySnapshot, ProductRecord, SalesEvent, TenantScope};
use stockpilot_core::TenantId;

use super::store::{Owned, SellerDataStore, StoreError};

/// Seed file layout for the in-memory store (dev/demo).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub tenants: Vec<TenantSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TenantSeed {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub inventory: Vec<InventorySnapshot>,
    #[serde(default)]
    pub sales: Vec<SalesEvent>,
}

#[derive(Debug, Default)]
struct Rows {
    products: Vec<(TenantId, ProductRecord)>,
    inventory: Vec<(TenantId, InventorySnapshot)>,
    sales: Vec<(TenantId, SalesEvent)>,
}

/// In-memory tenant-isolated seller data for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySellerStore {
    inner: RwLock<Rows>,
}

impl InMemorySellerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        for tenant in seed.tenants {
            for p in tenant.products {
                store.insert_product(tenant.tenant_id, p);
            }
            for i in tenant.inventory {
                store.insert_inventory(tenant.tenant_id, i);
            }
            for s in tenant.sales {
                store.insert_sale(tenant.tenant_id, s);
            }
        }
        store
    }

    /// Load a JSON seed file (see [`SeedData`]).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("reading {}: {e}", path.display())))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Unavailable(format!("parsing {}: {e}", path.display())))?;
        Ok(Self::from_seed(seed))
    }

    pub fn insert_product(&self, tenant_id: TenantId, product: ProductRecord) {
        self.write().products.push((tenant_id, product));
    }

    pub fn insert_inventory(&self, tenant_id: TenantId, snapshot: InventorySnapshot) {
        self.write().inventory.push((tenant_id, snapshot));
    }

    pub fn insert_sale(&self, tenant_id: TenantId, sale: SalesEvent) {
        self.write().sales.push((tenant_id, sale));
    }

    // Every mutation is a single push, so a panic elsewhere cannot leave
    // `Rows` half-written. Reads and writes both recover a poisoned lock.
    fn write(&self) -> RwLockWriteGuard<'_, Rows> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, Rows> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn select<T: Clone>(
        &self,
        scope: TenantScope,
        pick: impl Fn(&Rows) -> &Vec<Owned<T>>,
    ) -> Vec<Owned<T>> {
        pick(&self.read())
            .iter()
            .filter(|(t, _)| scope.allows(*t))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SellerDataStore for InMemorySellerStore {
    async fn products(&self, scope: TenantScope) -> Result<Vec<Owned<ProductRecord>>, StoreError> {
        Ok(self.select(scope, |r| &r.products))
    }

    async fn inventory(
        &self,
        scope: TenantScope,
    ) -> Result<Vec<Owned<InventorySnapshot>>, StoreError> {
        Ok(self.select(scope, |r| &r.inventory))
    }

    async fn sales(&self, scope: TenantScope) -> Result<Vec<Owned<SalesEvent>>, StoreError> {
        Ok(self.select(scope, |r| &r.sales))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use stockpilot_core::Sku;

    use super::*;

    fn product(id: &str, sku: &str) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            sku: Sku::new(sku).unwrap(),
            name: sku.to_lowercase(),
            selling_price: None,
        }
    }

    fn snapshot(sku: &str, stock: u64) -> InventorySnapshot {
        InventorySnapshot {
            sku: Sku::new(sku).unwrap(),
            product_name: sku.to_lowercase(),
            current_stock: stock,
            cost_price: None,
            platform_stock_split: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn tenant_scope_is_isolated() {
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let store = InMemorySellerStore::new();
        store.insert_product(t1, product("p-1", "A"));
        store.insert_product(t2, product("p-2", "B"));
        store.insert_inventory(t2, snapshot("B", 3));

        let t1_products = store.products(TenantScope::Tenant(t1)).await.unwrap();
        assert_eq!(t1_products.len(), 1);
        assert_eq!(t1_products[0].0, t1);
        assert_eq!(t1_products[0].1.sku.as_str(), "A");
        assert!(store.inventory(TenantScope::Tenant(t1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn any_scope_sees_every_tenant() {
        let store = InMemorySellerStore::new();
        store.insert_product(TenantId::new(), product("p-1", "A"));
        store.insert_product(TenantId::new(), product("p-2", "B"));

        let counts = store.counts(TenantScope::Any).await.unwrap();
        assert_eq!(counts.products, 2);
        assert_eq!(counts.inventory, 0);
    }

    #[test]
    fn seed_json_is_loaded_per_tenant() {
        let tenant = TenantId::new();
        let raw = serde_json::json!({
            "tenants": [{
                "tenant_id": tenant.to_string(),
                "products": [{ "product_id": "p-1", "sku": "MUG-01", "name": "Mug", "selling_price": 20.0 }],
                "inventory": [{ "sku": "MUG-01", "product_name": "Mug", "current_stock": 100, "cost_price": 10.0,
                                "platform_stock_split": { "amazon": 60, "shopify": 40 } }],
                "sales": [{ "product_id": "p-1", "quantity": 2, "amount": 40.0, "date": "2026-03-01" }]
            }]
        });
        let seed: SeedData = serde_json::from_value(raw).unwrap();
        let store = InMemorySellerStore::from_seed(seed);

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let data = rt.block_on(store.load(TenantScope::Tenant(tenant))).unwrap();
        assert_eq!(data.counts().products, 1);
        assert_eq!(data.inventory[0].0, tenant);
        assert_eq!(data.inventory[0].1.platform_stock_split["amazon"], 60);
        assert_eq!(data.sales[0].1.quantity, 2);
    }

    #[tokio::test]
    async fn any_scope_rows_keep_their_tenant() {
        let t1 = TenantId::new();
        let t2 = TenantId::new();
        let store = InMemorySellerStore::new();
        store.insert_product(t1, product("p-1", "MUG"));
        store.insert_product(t2, product("p-1", "CAP"));

        let by_tenant = store.load(TenantScope::Any).await.unwrap().by_tenant();
        assert_eq!(by_tenant.len(), 2);
        assert_eq!(by_tenant[&t1].products[0].sku.as_str(), "MUG");
        assert_eq!(by_tenant[&t2].products[0].sku.as_str(), "CAP");
    }

    #[tokio::test]
    async fn poisoned_lock_still_accepts_writes_and_reads() {
        let tenant = TenantId::new();
        let store = std::sync::Arc::new(InMemorySellerStore::new());
        store.insert_product(tenant, product("p-1", "A"));

        let poisoner = std::sync::Arc::clone(&store);
        let panicked = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join()
        .is_err();
        assert!(panicked);
        assert!(store.inner.is_poisoned());

        store.insert_product(tenant, product("p-2", "B"));
        let products = store.products(TenantScope::Tenant(tenant)).await.unwrap();
        let skus: Vec<_> = products.iter().map(|(_, p)| p.sku.as_str()).collect();
        assert_eq!(skus, ["A", "B"]);
    }
}
