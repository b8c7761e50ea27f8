use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::{
    BillingStatus, FrameworkCode, FrameworkEntitlement, FrameworkModule, LicenseTier,
    OrganizationLicensing, SnapshotSource, TierguardError, TierguardResult,
};
use tierguard_policy::BASE_MODULES;
use tracing::warn;

use FrameworkModule::*;

const DEFAULT_NIS2_MODULES: &[FrameworkModule] = &[Dashboard, Scoring, Gaps, Reports];
const DEFAULT_DORA_MODULES: &[FrameworkModule] = &[
    Dashboard, Scoring, Gaps, Roi, Incidents, Testing, Tprm, Reports,
];

/// What the loader returns when the store cannot produce a snapshot.
///
/// Applies to store errors, a missing organization row, and a row whose
/// licensing columns were never populated. Unknown policy keys are never
/// recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Grant the professional NIS2 + DORA default. Fails open to paid access.
    #[default]
    DefaultSnapshot,
    /// A snapshot with no licensed frameworks.
    DenyAll,
    /// Return the underlying error to the caller.
    Propagate,
}

impl FallbackStrategy {
    /// Turn a load failure into a snapshot or an error according to the strategy.
    pub fn recover(
        &self,
        organization_id: &str,
        error: TierguardError,
        now: DateTime<Utc>,
    ) -> TierguardResult<OrganizationLicensing> {
        if !error.is_recoverable() {
            return Err(error);
        }
        match self {
            FallbackStrategy::DefaultSnapshot => {
                warn!(
                    organization_id,
                    reason = %error,
                    "Licensing unavailable, granting default professional snapshot"
                );
                Ok(default_snapshot(organization_id, now))
            }
            FallbackStrategy::DenyAll => {
                warn!(
                    organization_id,
                    reason = %error,
                    "Licensing unavailable, denying all frameworks"
                );
                Ok(deny_all_snapshot(organization_id))
            }
            FallbackStrategy::Propagate => Err(error),
        }
    }
}

/// The hard-coded snapshot used when licensing data is unavailable.
pub fn default_snapshot(organization_id: &str, now: DateTime<Utc>) -> OrganizationLicensing {
    let mut snapshot = OrganizationLicensing::new(
        organization_id,
        LicenseTier::Professional,
        [FrameworkCode::Nis2, FrameworkCode::Dora],
    )
    .with_entitlement(default_entitlement(FrameworkCode::Nis2, now))
    .with_entitlement(default_entitlement(FrameworkCode::Dora, now));
    snapshot.source = SnapshotSource::Fallback;
    snapshot
}

/// A starter snapshot with no licensed frameworks.
pub fn deny_all_snapshot(organization_id: &str) -> OrganizationLicensing {
    let mut snapshot = OrganizationLicensing::new(organization_id, LicenseTier::Starter, [])
        .with_billing_status(BillingStatus::Active);
    snapshot.source = SnapshotSource::Fallback;
    snapshot
}

/// Entitlement synthesized for a licensed framework that has no stored row.
pub fn default_entitlement(framework: FrameworkCode, now: DateTime<Utc>) -> FrameworkEntitlement {
    let modules: &[FrameworkModule] = match framework {
        FrameworkCode::Nis2 => DEFAULT_NIS2_MODULES,
        FrameworkCode::Dora => DEFAULT_DORA_MODULES,
        FrameworkCode::Gdpr | FrameworkCode::Iso27001 => &BASE_MODULES,
    };
    FrameworkEntitlement::with_modules(framework, now, modules)
}
