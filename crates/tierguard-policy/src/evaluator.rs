//! Pure access decisions over an [`OrganizationLicensing`] snapshot.
//!
//! Nothing here performs I/O or fails: a denied check is a normal `false`.
//! Every check has an `_at` variant taking an explicit `now` so that trial
//! and entitlement expiry can be evaluated deterministically.

use crate::tables::{
    framework_modules, is_base_module, required_tier_for_framework, required_tier_for_module,
    tier_meets, tier_frameworks, BASE_MODULES,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::{
    BillingStatus, FrameworkCode, FrameworkModule, LicenseTier, OrganizationLicensing,
};

/// Why an access check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DenialReason {
    /// Billing status is `canceled`.
    BillingCanceled,
    /// A trial whose end date has passed.
    TrialExpired,
    /// The framework is not in the organization's licensed set.
    NotLicensed,
    /// The license tier is below the framework's tier.
    TierTooLow {
        /// Lowest tier that opens the framework.
        required: LicenseTier,
    },
    /// The framework entitlement row is switched off.
    EntitlementDisabled,
    /// The framework entitlement row has expired.
    EntitlementExpired,
    /// The module is not part of the framework's module list.
    ModuleNotInFramework,
    /// The license tier is below the module's tier.
    ModuleTierTooLow {
        /// Lowest tier that opens the module.
        required: LicenseTier,
    },
    /// The entitlement maps the module to `false`.
    ModuleDisabled,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::BillingCanceled => write!(f, "billing canceled"),
            DenialReason::TrialExpired => write!(f, "trial expired"),
            DenialReason::NotLicensed => write!(f, "framework not licensed"),
            DenialReason::TierTooLow { required } => write!(f, "requires {required} tier"),
            DenialReason::EntitlementDisabled => write!(f, "entitlement disabled"),
            DenialReason::EntitlementExpired => write!(f, "entitlement expired"),
            DenialReason::ModuleNotInFramework => write!(f, "module not offered by framework"),
            DenialReason::ModuleTierTooLow { required } => {
                write!(f, "module requires {required} tier")
            }
            DenialReason::ModuleDisabled => write!(f, "module disabled by entitlement"),
        }
    }
}

/// How an explicit `false` override on a base module is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseModuleOverride {
    /// Base modules short-circuit to allowed before overrides are consulted.
    #[default]
    Ignore,
    /// An explicit `false` override denies a base module too.
    Honor,
}

/// Access evaluator. Stateless apart from its [`BaseModuleOverride`] setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evaluator {
    base_module_override: BaseModuleOverride,
}

impl Evaluator {
    /// Evaluator with the given base-module override policy.
    pub fn new(base_module_override: BaseModuleOverride) -> Self {
        Self {
            base_module_override,
        }
    }

    /// The configured base-module override policy.
    pub fn base_module_override(&self) -> BaseModuleOverride {
        self.base_module_override
    }

    /// First failing framework condition, or `None` when access is granted.
    pub fn framework_denial_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        now: DateTime<Utc>,
    ) -> Option<DenialReason> {
        if snapshot.billing_status == BillingStatus::Canceled {
            return Some(DenialReason::BillingCanceled);
        }
        if is_trial_expired_at(snapshot, now) {
            return Some(DenialReason::TrialExpired);
        }
        if !snapshot.is_licensed(framework) {
            return Some(DenialReason::NotLicensed);
        }
        let required = required_tier_for_framework(framework);
        if !tier_meets(snapshot.license_tier, required) {
            return Some(DenialReason::TierTooLow { required });
        }
        if let Some(entitlement) = snapshot.entitlement(framework) {
            if !entitlement.enabled {
                return Some(DenialReason::EntitlementDisabled);
            }
            if entitlement.is_expired_at(now) {
                return Some(DenialReason::EntitlementExpired);
            }
        }
        None
    }

    /// First failing module condition, or `None` when access is granted.
    pub fn module_denial_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        module: FrameworkModule,
        now: DateTime<Utc>,
    ) -> Option<DenialReason> {
        if let Some(reason) = self.framework_denial_at(snapshot, framework, now) {
            return Some(reason);
        }
        if !framework_modules(framework).contains(&module) {
            return Some(DenialReason::ModuleNotInFramework);
        }
        let explicitly_disabled = snapshot
            .entitlement(framework)
            .and_then(|e| e.module_override(module))
            == Some(false);

        if is_base_module(module) {
            return match self.base_module_override {
                BaseModuleOverride::Honor if explicitly_disabled => {
                    Some(DenialReason::ModuleDisabled)
                }
                _ => None,
            };
        }
        let required = required_tier_for_module(framework, module);
        if !tier_meets(snapshot.license_tier, required) {
            return Some(DenialReason::ModuleTierTooLow { required });
        }
        if explicitly_disabled {
            return Some(DenialReason::ModuleDisabled);
        }
        None
    }

    /// Whether `framework` is open at `now`.
    pub fn check_framework_access_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        now: DateTime<Utc>,
    ) -> bool {
        self.framework_denial_at(snapshot, framework, now).is_none()
    }

    /// Whether `module` of `framework` is open at `now`.
    pub fn check_module_access_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        module: FrameworkModule,
        now: DateTime<Utc>,
    ) -> bool {
        self.module_denial_at(snapshot, framework, module, now)
            .is_none()
    }

    /// [`Evaluator::check_framework_access_at`] evaluated now.
    pub fn check_framework_access(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
    ) -> bool {
        self.check_framework_access_at(snapshot, framework, Utc::now())
    }

    /// [`Evaluator::check_module_access_at`] evaluated now.
    pub fn check_module_access(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        module: FrameworkModule,
    ) -> bool {
        self.check_module_access_at(snapshot, framework, module, Utc::now())
    }

    /// Modules visible for a framework, in the framework's declaration order.
    ///
    /// Without a stored module map only the base modules are visible.
    pub fn enabled_modules_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        now: DateTime<Utc>,
    ) -> Vec<FrameworkModule> {
        if !self.check_framework_access_at(snapshot, framework, now) {
            return Vec::new();
        }
        let Some(map) = snapshot
            .entitlement(framework)
            .and_then(|e| e.modules_enabled.as_ref())
        else {
            return BASE_MODULES.to_vec();
        };

        framework_modules(framework)
            .iter()
            .copied()
            .filter(|m| map.get(m) != Some(&false))
            .filter(|m| {
                tier_meets(
                    snapshot.license_tier,
                    required_tier_for_module(framework, *m),
                )
            })
            .collect()
    }

    /// [`Evaluator::enabled_modules_at`] evaluated now.
    pub fn enabled_modules(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
    ) -> Vec<FrameworkModule> {
        self.enabled_modules_at(snapshot, framework, Utc::now())
    }

    /// Licensed frameworks that pass [`Evaluator::check_framework_access_at`].
    pub fn accessible_frameworks_at(
        &self,
        snapshot: &OrganizationLicensing,
        now: DateTime<Utc>,
    ) -> Vec<FrameworkCode> {
        snapshot
            .licensed_frameworks
            .iter()
            .copied()
            .filter(|fw| self.check_framework_access_at(snapshot, *fw, now))
            .collect()
    }
}

/// [`Evaluator::check_framework_access`] with the default evaluator.
pub fn check_framework_access(snapshot: &OrganizationLicensing, framework: FrameworkCode) -> bool {
    Evaluator::default().check_framework_access(snapshot, framework)
}

/// [`Evaluator::check_module_access`] with the default evaluator.
pub fn check_module_access(
    snapshot: &OrganizationLicensing,
    framework: FrameworkCode,
    module: FrameworkModule,
) -> bool {
    Evaluator::default().check_module_access(snapshot, framework, module)
}

/// [`Evaluator::enabled_modules`] with the default evaluator.
pub fn enabled_modules(
    snapshot: &OrganizationLicensing,
    framework: FrameworkCode,
) -> Vec<FrameworkModule> {
    Evaluator::default().enabled_modules(snapshot, framework)
}

/// Whether `target` is strictly above the current tier in upgrade order.
///
/// Uses the raw ordinal, so every paid tier is an upgrade from `trial`.
pub fn can_upgrade_to(snapshot: &OrganizationLicensing, target: LicenseTier) -> bool {
    target.ordinal() > snapshot.license_tier.ordinal()
}

/// Frameworks that `target` would unlock beyond what the current tier reaches.
pub fn frameworks_unlocked_by(
    snapshot: &OrganizationLicensing,
    target: LicenseTier,
) -> Vec<FrameworkCode> {
    if !can_upgrade_to(snapshot, target) {
        return Vec::new();
    }
    tier_frameworks(target)
        .iter()
        .copied()
        .filter(|fw| !tier_meets(snapshot.license_tier, required_tier_for_framework(*fw)))
        .collect()
}

/// Whether a dated trial has ended before `now`. Paid tiers never expire.
pub fn is_trial_expired_at(snapshot: &OrganizationLicensing, now: DateTime<Utc>) -> bool {
    snapshot.license_tier == LicenseTier::Trial
        && snapshot.trial_ends_at.is_some_and(|ends| ends < now)
}

/// [`is_trial_expired_at`] evaluated now.
pub fn is_trial_expired(snapshot: &OrganizationLicensing) -> bool {
    is_trial_expired_at(snapshot, Utc::now())
}

/// Whole days left in a trial, rounded up. `None` outside a dated trial.
pub fn trial_days_remaining_at(
    snapshot: &OrganizationLicensing,
    now: DateTime<Utc>,
) -> Option<i64> {
    if snapshot.license_tier != LicenseTier::Trial {
        return None;
    }
    let ends = snapshot.trial_ends_at?;
    let remaining = ends.signed_duration_since(now);
    if remaining <= chrono::Duration::zero() {
        return Some(0);
    }
    let secs = remaining.num_seconds();
    Some((secs + 86_399) / 86_400)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tierguard_core::FrameworkEntitlement;
    use FrameworkCode::*;

    fn snapshot(tier: LicenseTier, frameworks: &[FrameworkCode]) -> OrganizationLicensing {
        OrganizationLicensing::new("org-test", tier, frameworks.iter().copied())
    }

    #[test]
    fn test_canceled_billing_short_circuits() {
        let now = Utc::now();
        let snap = snapshot(LicenseTier::Enterprise, &FrameworkCode::ALL)
            .with_billing_status(BillingStatus::Canceled);
        let eval = Evaluator::default();
        for fw in FrameworkCode::ALL {
            assert_eq!(
                eval.framework_denial_at(&snap, fw, now),
                Some(DenialReason::BillingCanceled)
            );
        }
    }

    #[test]
    fn test_past_due_still_has_access() {
        let snap = snapshot(LicenseTier::Professional, &[Dora])
            .with_billing_status(BillingStatus::PastDue);
        assert!(check_framework_access(&snap, Dora));
    }

    #[test]
    fn test_trial_bypasses_tier_but_not_expiry() {
        let now = Utc::now();
        let active =
            snapshot(LicenseTier::Trial, &[Gdpr]).with_trial_ends_at(now + Duration::days(3));
        let eval = Evaluator::default();
        assert!(eval.check_framework_access_at(&active, Gdpr, now));
        assert!(eval.check_module_access_at(&active, Gdpr, FrameworkModule::Dpia, now));

        let expired =
            snapshot(LicenseTier::Trial, &[Gdpr]).with_trial_ends_at(now - Duration::hours(1));
        assert_eq!(
            eval.framework_denial_at(&expired, Gdpr, now),
            Some(DenialReason::TrialExpired)
        );
    }

    #[test]
    fn test_trial_without_end_date_never_expires() {
        let snap = snapshot(LicenseTier::Trial, &[Iso27001]);
        assert!(!is_trial_expired(&snap));
        assert!(check_framework_access(&snap, Iso27001));
    }

    #[test]
    fn test_unlicensed_framework_denied() {
        let snap = snapshot(LicenseTier::Enterprise, &[Nis2]);
        assert_eq!(
            Evaluator::default().framework_denial_at(&snap, Gdpr, Utc::now()),
            Some(DenialReason::NotLicensed)
        );
    }

    #[test]
    fn test_tier_too_low_for_framework() {
        let snap = snapshot(LicenseTier::Starter, &[Nis2, Dora]);
        assert_eq!(
            Evaluator::default().framework_denial_at(&snap, Dora, Utc::now()),
            Some(DenialReason::TierTooLow {
                required: LicenseTier::Professional
            })
        );
    }

    #[test]
    fn test_disabled_and_expired_entitlements() {
        let now = Utc::now();
        let mut disabled = FrameworkEntitlement::new(Dora, now - Duration::days(10));
        disabled.enabled = false;
        let snap = snapshot(LicenseTier::Enterprise, &[Dora]).with_entitlement(disabled);
        assert_eq!(
            Evaluator::default().framework_denial_at(&snap, Dora, now),
            Some(DenialReason::EntitlementDisabled)
        );

        let mut expired = FrameworkEntitlement::new(Dora, now - Duration::days(10));
        expired.expires_at = Some(now - Duration::days(1));
        let snap = snapshot(LicenseTier::Enterprise, &[Dora]).with_entitlement(expired);
        assert_eq!(
            Evaluator::default().framework_denial_at(&snap, Dora, now),
            Some(DenialReason::EntitlementExpired)
        );
    }

    #[test]
    fn test_base_module_override_ignored_by_default() {
        let now = Utc::now();
        let mut ent = FrameworkEntitlement::with_modules(Nis2, now, &BASE_MODULES);
        ent.modules_enabled
            .as_mut()
            .unwrap()
            .insert(FrameworkModule::Dashboard, false);
        let snap = snapshot(LicenseTier::Starter, &[Nis2]).with_entitlement(ent);

        let ignore = Evaluator::default();
        assert!(ignore.check_module_access_at(&snap, Nis2, FrameworkModule::Dashboard, now));

        let honor = Evaluator::new(BaseModuleOverride::Honor);
        assert_eq!(
            honor.module_denial_at(&snap, Nis2, FrameworkModule::Dashboard, now),
            Some(DenialReason::ModuleDisabled)
        );
        assert!(honor.check_module_access_at(&snap, Nis2, FrameworkModule::Scoring, now));
    }

    #[test]
    fn test_module_outside_framework_is_denied() {
        let now = Utc::now();
        let starter = snapshot(LicenseTier::Starter, &[Nis2]);
        let eval = Evaluator::default();
        for module in [FrameworkModule::Soa, FrameworkModule::Roi] {
            assert_eq!(
                eval.module_denial_at(&starter, Nis2, module, now),
                Some(DenialReason::ModuleNotInFramework)
            );
            assert!(!check_module_access(&starter, Nis2, module));
        }

        let enterprise = snapshot(LicenseTier::Enterprise, &FrameworkCode::ALL);
        assert!(!eval.check_module_access_at(&enterprise, Gdpr, FrameworkModule::Testing, now));
        assert!(eval.check_module_access_at(&enterprise, Dora, FrameworkModule::Testing, now));
        assert_eq!(
            DenialReason::ModuleNotInFramework.to_string(),
            "module not offered by framework"
        );
    }

    #[test]
    fn test_enabled_modules_without_map_is_base_set() {
        let snap = snapshot(LicenseTier::Enterprise, &[Dora]);
        assert_eq!(enabled_modules(&snap, Dora), BASE_MODULES.to_vec());
    }

    #[test]
    fn test_enabled_modules_follow_declaration_order() {
        let now = Utc::now();
        let ent = FrameworkEntitlement::with_modules(
            Dora,
            now,
            &[
                FrameworkModule::Reports,
                FrameworkModule::Tprm,
                FrameworkModule::Dashboard,
            ],
        );
        let snap = snapshot(LicenseTier::Professional, &[Dora]).with_entitlement(ent);
        // Entries absent from the map are not explicitly disabled.
        assert_eq!(
            Evaluator::default().enabled_modules_at(&snap, Dora, now),
            framework_modules(Dora).to_vec()
        );
    }

    #[test]
    fn test_enabled_modules_filters_false_and_tier() {
        let now = Utc::now();
        let mut ent = FrameworkEntitlement::with_modules(Nis2, now, framework_modules(Nis2));
        ent.modules_enabled
            .as_mut()
            .unwrap()
            .insert(FrameworkModule::Gaps, false);
        let snap = snapshot(LicenseTier::Starter, &[Nis2]).with_entitlement(ent);

        assert_eq!(
            Evaluator::default().enabled_modules_at(&snap, Nis2, now),
            vec![
                FrameworkModule::Dashboard,
                FrameworkModule::Scoring,
                FrameworkModule::Reports
            ]
        );
    }

    #[test]
    fn test_enabled_modules_empty_when_inaccessible() {
        let snap = snapshot(LicenseTier::Starter, &[Gdpr]);
        assert!(enabled_modules(&snap, Gdpr).is_empty());
    }

    #[test]
    fn test_can_upgrade_to_is_strict() {
        for tier in LicenseTier::ALL {
            let snap = snapshot(tier, &[]);
            assert!(!can_upgrade_to(&snap, tier));
            for target in LicenseTier::ALL {
                assert_eq!(can_upgrade_to(&snap, target), target.ordinal() > tier.ordinal());
            }
        }
        let trial = snapshot(LicenseTier::Trial, &[]);
        assert!(can_upgrade_to(&trial, LicenseTier::Starter));
    }

    #[test]
    fn test_frameworks_unlocked_by() {
        let snap = snapshot(LicenseTier::Starter, &[Nis2]);
        assert_eq!(
            frameworks_unlocked_by(&snap, LicenseTier::Enterprise),
            vec![Dora, Gdpr, Iso27001]
        );
        assert!(frameworks_unlocked_by(&snap, LicenseTier::Starter).is_empty());
    }

    #[test]
    fn test_trial_days_remaining() {
        let now = Utc::now();
        let snap = snapshot(LicenseTier::Trial, &[]).with_trial_ends_at(now + Duration::hours(30));
        assert_eq!(trial_days_remaining_at(&snap, now), Some(2));

        let snap = snapshot(LicenseTier::Trial, &[]).with_trial_ends_at(now - Duration::days(2));
        assert_eq!(trial_days_remaining_at(&snap, now), Some(0));

        let paid = snapshot(LicenseTier::Professional, &[]);
        assert_eq!(trial_days_remaining_at(&paid, now), None);
    }
}
