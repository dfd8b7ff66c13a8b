//! Tenant-scoped, read-only access to seller data (catalog, stock, sales).

pub mod in_memory;
pub mod postgres;
pub mod store;

pub use in_memory::{InMemorySellerStore, SeedData, TenantSeed};
pub use postgres::PostgresSellerStore;
pub use store::{DataCounts, Owned, SellerData, SellerDataStore, StoreError, TenantData};
