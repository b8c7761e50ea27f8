use crate::row::{EntitlementRow, LicensingRows, OrganizationRow};
use async_trait::async_trait;
use tierguard_core::TierguardResult;

/// Read access to the licensing tables.
///
/// Implementations report transport and schema failures as
/// [`TierguardError::Store`](tierguard_core::TierguardError::Store); the
/// loader decides how to recover.
#[async_trait]
pub trait LicensingStore: Send + Sync {
    /// The `organizations` row for `organization_id`, if any.
    async fn organization(&self, organization_id: &str) -> TierguardResult<Option<OrganizationRow>>;

    /// All `organization_framework_entitlements` rows for `organization_id`.
    async fn entitlements(&self, organization_id: &str) -> TierguardResult<Vec<EntitlementRow>>;

    /// Both reads for one organization.
    ///
    /// The default runs them as two independent reads, so a change landing
    /// between them is visible to the second read only. Stores that can
    /// read both tables in one transaction should override this.
    async fn fetch_licensing_rows(&self, organization_id: &str) -> TierguardResult<LicensingRows> {
        let organization = self.organization(organization_id).await?;
        let entitlements = match organization {
            Some(_) => self.entitlements(organization_id).await?,
            None => Vec::new(),
        };
        Ok(LicensingRows {
            organization,
            entitlements,
        })
    }
}
