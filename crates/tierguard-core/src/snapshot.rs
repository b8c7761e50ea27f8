use crate::framework::{FrameworkCode, FrameworkModule};
use crate::tier::{BillingStatus, LicenseTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-organization, per-framework entitlement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkEntitlement {
    /// Framework this entitlement covers.
    pub framework: FrameworkCode,
    /// Whether the entitlement is switched on.
    pub enabled: bool,
    /// When the entitlement started.
    pub activated_at: DateTime<Utc>,
    /// End of the entitlement, if it has one.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit per-module overrides. `None` means no overrides were stored.
    #[serde(default)]
    pub modules_enabled: Option<BTreeMap<FrameworkModule, bool>>,
}

impl FrameworkEntitlement {
    /// An enabled, non-expiring entitlement with no module overrides.
    pub fn new(framework: FrameworkCode, activated_at: DateTime<Utc>) -> Self {
        Self {
            framework,
            enabled: true,
            activated_at,
            expires_at: None,
            modules_enabled: None,
        }
    }

    /// An enabled entitlement that explicitly turns on exactly `modules`.
    pub fn with_modules(
        framework: FrameworkCode,
        activated_at: DateTime<Utc>,
        modules: &[FrameworkModule],
    ) -> Self {
        Self {
            modules_enabled: Some(modules.iter().map(|m| (*m, true)).collect()),
            ..Self::new(framework, activated_at)
        }
    }

    /// Whether `expires_at` is set and before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp < now)
    }

    /// The explicit override for `module`, if any.
    pub fn module_override(&self, module: FrameworkModule) -> Option<bool> {
        self.modules_enabled
            .as_ref()
            .and_then(|map| map.get(&module).copied())
    }
}

/// Where a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Read from the licensing tables.
    #[default]
    Store,
    /// Synthesized by a fallback strategy because the store could not answer.
    Fallback,
}

/// Point-in-time licensing state of one organization.
///
/// Rebuilt for every access check and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationLicensing {
    /// Organization the snapshot describes.
    pub organization_id: String,
    /// Current license tier.
    pub license_tier: LicenseTier,
    /// Frameworks named by the license.
    pub licensed_frameworks: BTreeSet<FrameworkCode>,
    /// End of the trial, for trial tiers.
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// Subscription billing state.
    pub billing_status: BillingStatus,
    /// Entitlement rows keyed by framework.
    #[serde(default)]
    pub entitlements: BTreeMap<FrameworkCode, FrameworkEntitlement>,
    /// Where the snapshot came from.
    #[serde(default)]
    pub source: SnapshotSource,
}

impl OrganizationLicensing {
    /// A snapshot with the given tier and frameworks, active billing and no entitlements.
    pub fn new(
        organization_id: impl Into<String>,
        license_tier: LicenseTier,
        frameworks: impl IntoIterator<Item = FrameworkCode>,
    ) -> Self {
        Self {
            organization_id: organization_id.into(),
            license_tier,
            licensed_frameworks: frameworks.into_iter().collect(),
            trial_ends_at: None,
            billing_status: BillingStatus::Active,
            entitlements: BTreeMap::new(),
            source: SnapshotSource::Store,
        }
    }

    /// Replace the billing status.
    pub fn with_billing_status(mut self, status: BillingStatus) -> Self {
        self.billing_status = status;
        self
    }

    /// Set the trial end date.
    pub fn with_trial_ends_at(mut self, ends_at: DateTime<Utc>) -> Self {
        self.trial_ends_at = Some(ends_at);
        self
    }

    /// Add or replace the entitlement for its framework.
    pub fn with_entitlement(mut self, entitlement: FrameworkEntitlement) -> Self {
        self.entitlements.insert(entitlement.framework, entitlement);
        self
    }

    /// Entitlement for `framework`, if one is stored.
    pub fn entitlement(&self, framework: FrameworkCode) -> Option<&FrameworkEntitlement> {
        self.entitlements.get(&framework)
    }

    /// Whether `framework` is in the licensed set.
    pub fn is_licensed(&self, framework: FrameworkCode) -> bool {
        self.licensed_frameworks.contains(&framework)
    }
}
