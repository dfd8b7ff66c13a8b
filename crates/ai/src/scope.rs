use stockpilot_core::TenantId;

/// Data scope for a read.
///
/// - `Any`: every tenant's rows (the global dataset).
/// - `Tenant`: only rows owned by the specified tenant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    Any,
    Tenant(TenantId),
}

impl TenantScope {
    pub fn allows(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::Any => true,
            TenantScope::Tenant(t) => *t == tenant_id,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match self {
            TenantScope::Any => None,
            TenantScope::Tenant(t) => Some(*t),
        }
    }
}
