use crate::evaluator::{trial_days_remaining_at, DenialReason, Evaluator};
use crate::tables::{framework_modules, required_tier_for_framework, required_tier_for_module};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::{
    BillingStatus, FrameworkCode, FrameworkModule, LicenseTier, OrganizationLicensing,
    SnapshotSource,
};

/// A module the organization cannot open, with the tier that would unlock it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedModule {
    /// The locked module.
    pub module: FrameworkModule,
    /// Human-readable module name.
    pub module_name: String,
    /// Lowest tier that opens the module.
    pub required_tier: LicenseTier,
    /// Why the module is locked.
    pub reason: DenialReason,
}

/// Per-framework view of one organization's licensing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSummary {
    /// Framework this entry describes.
    pub framework: FrameworkCode,
    /// Whether the license names the framework.
    pub licensed: bool,
    /// Whether the framework is open.
    pub accessible: bool,
    /// Lowest tier that opens the framework.
    pub required_tier: LicenseTier,
    /// First failing condition when not accessible.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
    /// Modules currently visible.
    pub enabled_modules: Vec<FrameworkModule>,
    /// Modules of the framework that are locked.
    pub locked_modules: Vec<LockedModule>,
}

/// Everything a settings page needs to render the licensing panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensingSummary {
    /// Organization the summary describes.
    pub organization_id: String,
    /// Current license tier.
    pub license_tier: LicenseTier,
    /// Subscription billing state.
    pub billing_status: BillingStatus,
    /// Where the snapshot came from.
    pub source: SnapshotSource,
    /// Days left in a dated trial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_days_remaining: Option<i64>,
    /// One entry per framework, in canonical order.
    pub frameworks: Vec<FrameworkSummary>,
}

impl Evaluator {
    /// Summarize every framework for `snapshot` at `now`.
    pub fn summarize_at(
        &self,
        snapshot: &OrganizationLicensing,
        now: DateTime<Utc>,
    ) -> LicensingSummary {
        let frameworks = FrameworkCode::ALL
            .into_iter()
            .map(|framework| {
                let denial = self.framework_denial_at(snapshot, framework, now);
                let locked_modules = if denial.is_some() {
                    Vec::new()
                } else {
                    framework_modules(framework)
                        .iter()
                        .filter_map(|module| {
                            self.module_denial_at(snapshot, framework, *module, now)
                                .map(|reason| LockedModule {
                                    module: *module,
                                    module_name: module.display_name().to_string(),
                                    required_tier: required_tier_for_module(framework, *module),
                                    reason,
                                })
                        })
                        .collect()
                };
                FrameworkSummary {
                    framework,
                    licensed: snapshot.is_licensed(framework),
                    accessible: denial.is_none(),
                    required_tier: required_tier_for_framework(framework),
                    denial,
                    enabled_modules: self.enabled_modules_at(snapshot, framework, now),
                    locked_modules,
                }
            })
            .collect();

        LicensingSummary {
            organization_id: snapshot.organization_id.clone(),
            license_tier: snapshot.license_tier,
            billing_status: snapshot.billing_status,
            source: snapshot.source,
            trial_days_remaining: trial_days_remaining_at(snapshot, now),
            frameworks,
        }
    }
}

impl LicensingSummary {
    /// Entry for `framework`.
    pub fn framework(&self, framework: FrameworkCode) -> Option<&FrameworkSummary> {
        self.frameworks.iter().find(|f| f.framework == framework)
    }

    /// Frameworks marked accessible.
    pub fn accessible_frameworks(&self) -> Vec<FrameworkCode> {
        self.frameworks
            .iter()
            .filter(|f| f.accessible)
            .map(|f| f.framework)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_for_starter() {
        let now = Utc::now();
        let snap = OrganizationLicensing::new("org-1", LicenseTier::Starter, [FrameworkCode::Nis2]);
        let summary = Evaluator::default().summarize_at(&snap, now);

        assert_eq!(summary.frameworks.len(), 4);
        assert_eq!(summary.accessible_frameworks(), vec![FrameworkCode::Nis2]);

        let nis2 = summary.framework(FrameworkCode::Nis2).unwrap();
        let locked: Vec<FrameworkModule> = nis2.locked_modules.iter().map(|l| l.module).collect();
        assert_eq!(locked, vec![FrameworkModule::Incidents, FrameworkModule::Tprm]);
        assert!(nis2
            .locked_modules
            .iter()
            .all(|l| l.required_tier == LicenseTier::Professional));

        let dora = summary.framework(FrameworkCode::Dora).unwrap();
        assert!(!dora.licensed);
        assert_eq!(dora.denial, Some(DenialReason::NotLicensed));
        assert!(dora.locked_modules.is_empty());
    }

    #[test]
    fn test_summary_serializes_denial_tag() {
        let snap = OrganizationLicensing::new("org-1", LicenseTier::Starter, [FrameworkCode::Dora]);
        let summary = Evaluator::default().summarize_at(&snap, Utc::now());
        let json = serde_json::to_value(&summary).unwrap();

        let dora = &json["frameworks"][1];
        assert_eq!(dora["framework"], "dora");
        assert_eq!(dora["denial"]["reason"], "tier_too_low");
        assert_eq!(dora["denial"]["required"], "professional");
        assert!(json.get("trial_days_remaining").is_none());
    }
}
