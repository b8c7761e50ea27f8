use crate::row::{EntitlementRow, OrganizationRow};
use crate::store::LicensingStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tierguard_core::{TierguardError, TierguardResult};

/// On-disk layout of a [`FileLicensingStore`]: one array per table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicensingDocument {
    /// Rows of the `organizations` table.
    #[serde(default)]
    pub organizations: Vec<OrganizationRow>,
    /// Rows of the `organization_framework_entitlements` table.
    #[serde(default)]
    pub organization_framework_entitlements: Vec<EntitlementRow>,
}

/// Licensing tables exported to a single JSON file.
///
/// The file is re-read on every call; nothing is cached between checks.
pub struct FileLicensingStore {
    path: PathBuf,
}

impl FileLicensingStore {
    /// Store backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Write `document` to the store file, creating parent directories.
    pub async fn write_document(&self, document: &LicensingDocument) -> TierguardResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(document)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Insert or replace an organization row, creating the file if needed.
    pub async fn upsert_organization(&self, row: OrganizationRow) -> TierguardResult<()> {
        let mut document = if tokio::fs::try_exists(&self.path).await? {
            self.read_document().await?
        } else {
            LicensingDocument::default()
        };
        match document.organizations.iter_mut().find(|o| o.id == row.id) {
            Some(existing) => *existing = row,
            None => document.organizations.push(row),
        }
        self.write_document(&document).await
    }

    async fn read_document(&self) -> TierguardResult<LicensingDocument> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TierguardError::Store(format!(
                "Failed to read licensing file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            TierguardError::Store(format!(
                "Failed to parse licensing file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl LicensingStore for FileLicensingStore {
    async fn organization(
        &self,
        organization_id: &str,
    ) -> TierguardResult<Option<OrganizationRow>> {
        let document = self.read_document().await?;
        Ok(document
            .organizations
            .into_iter()
            .find(|o| o.id == organization_id))
    }

    async fn entitlements(&self, organization_id: &str) -> TierguardResult<Vec<EntitlementRow>> {
        let document = self.read_document().await?;
        Ok(document
            .organization_framework_entitlements
            .into_iter()
            .filter(|e| e.organization_id == organization_id)
            .collect())
    }
}
