use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw `organizations` row. Licensing columns are nullable until the
/// licensing migration has run on a deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationRow {
    /// Organization id.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Raw tier code.
    #[serde(default)]
    pub license_tier: Option<String>,
    /// Raw framework codes.
    #[serde(default)]
    pub licensed_frameworks: Option<Vec<String>>,
    /// End of the trial, if any.
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Raw billing status code.
    #[serde(default)]
    pub billing_status: Option<String>,
}

impl OrganizationRow {
    /// A row as it looks before the licensing columns exist.
    pub fn unlicensed(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            license_tier: None,
            licensed_frameworks: None,
            trial_ends_at: None,
            billing_status: None,
        }
    }

    /// A row with the given tier and frameworks and active billing.
    pub fn licensed(
        id: impl Into<String>,
        name: impl Into<String>,
        tier: &str,
        frameworks: &[&str],
    ) -> Self {
        Self {
            license_tier: Some(tier.to_string()),
            licensed_frameworks: Some(frameworks.iter().map(|f| (*f).to_string()).collect()),
            billing_status: Some("active".to_string()),
            ..Self::unlicensed(id, name)
        }
    }

    /// True when neither tier nor frameworks are populated.
    pub fn lacks_licensing_columns(&self) -> bool {
        self.license_tier.is_none() && self.licensed_frameworks.is_none()
    }
}

/// Raw `organization_framework_entitlements` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitlementRow {
    /// Row id.
    pub id: String,
    /// Owning organization.
    pub organization_id: String,
    /// Raw framework code.
    pub framework: String,
    /// Whether the entitlement is switched on.
    pub enabled: bool,
    /// Activation time.
    pub activated_at: DateTime<Utc>,
    /// Expiry time, if any.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Module code to on/off, stored as a JSON object.
    #[serde(default)]
    pub modules_enabled: Option<BTreeMap<String, bool>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time; the latest row wins on duplicates.
    pub updated_at: DateTime<Utc>,
}

impl EntitlementRow {
    /// An enabled, non-expiring row with no module map.
    pub fn new(
        id: impl Into<String>,
        organization_id: impl Into<String>,
        framework: &str,
        activated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            organization_id: organization_id.into(),
            framework: framework.to_string(),
            enabled: true,
            activated_at,
            expires_at: None,
            modules_enabled: None,
            created_at: activated_at,
            updated_at: activated_at,
        }
    }

    /// Set one entry of the module map.
    pub fn with_module(mut self, module: &str, enabled: bool) -> Self {
        self.modules_enabled
            .get_or_insert_with(BTreeMap::new)
            .insert(module.to_string(), enabled);
        self
    }
}

/// Result of the two licensing reads for one organization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicensingRows {
    /// The `organizations` row, if present.
    pub organization: Option<OrganizationRow>,
    /// Entitlement rows of the organization.
    pub entitlements: Vec<EntitlementRow>,
}
