use crate::row::{EntitlementRow, OrganizationRow};
use crate::store::LicensingStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tierguard_core::TierguardResult;
use tokio::sync::RwLock;

/// In-process licensing tables, for tests and embedding.
#[derive(Clone, Default)]
pub struct MemoryLicensingStore {
    organizations: Arc<RwLock<HashMap<String, OrganizationRow>>>,
    entitlements: Arc<RwLock<Vec<EntitlementRow>>>,
}

impl MemoryLicensingStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an organization row.
    pub async fn upsert_organization(&self, row: OrganizationRow) {
        self.organizations.write().await.insert(row.id.clone(), row);
    }

    /// Insert or replace an entitlement row, keyed by its `id`.
    pub async fn upsert_entitlement(&self, row: EntitlementRow) {
        let mut rows = self.entitlements.write().await;
        match rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row,
            None => rows.push(row),
        }
    }

    /// Number of stored organizations.
    pub async fn organization_count(&self) -> usize {
        self.organizations.read().await.len()
    }
}

#[async_trait]
impl LicensingStore for MemoryLicensingStore {
    async fn organization(
        &self,
        organization_id: &str,
    ) -> TierguardResult<Option<OrganizationRow>> {
        Ok(self.organizations.read().await.get(organization_id).cloned())
    }

    async fn entitlements(&self, organization_id: &str) -> TierguardResult<Vec<EntitlementRow>> {
        Ok(self
            .entitlements
            .read()
            .await
            .iter()
            .filter(|r| r.organization_id == organization_id)
            .cloned()
            .collect())
    }
}
