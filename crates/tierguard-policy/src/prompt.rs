use crate::evaluator::Evaluator;
use crate::tables::{
    framework_features, framework_modules, required_tier_for_framework, required_tier_for_module,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tierguard_core::{FrameworkCode, FrameworkModule, LicenseTier, OrganizationLicensing};

/// Locked-framework banner metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkUpgradePrompt {
    /// Lowest tier that opens the framework.
    pub required_tier: LicenseTier,
    /// Marketing feature lines for the framework.
    pub features: Vec<String>,
}

/// Locked-module banner metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleUpgradePrompt {
    /// Lowest tier that opens the module.
    pub required_tier: LicenseTier,
    /// Human-readable module name.
    pub module_name: String,
}

impl Evaluator {
    /// `None` when the framework is already accessible.
    pub fn upgrade_prompt_for_framework_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        now: DateTime<Utc>,
    ) -> Option<FrameworkUpgradePrompt> {
        if self.check_framework_access_at(snapshot, framework, now) {
            return None;
        }
        Some(FrameworkUpgradePrompt {
            required_tier: required_tier_for_framework(framework),
            features: framework_features(framework)
                .iter()
                .map(|f| (*f).to_string())
                .collect(),
        })
    }

    /// `None` when the module is already accessible, or when the framework
    /// does not offer it at any tier.
    pub fn upgrade_prompt_for_module_at(
        &self,
        snapshot: &OrganizationLicensing,
        framework: FrameworkCode,
        module: FrameworkModule,
        now: DateTime<Utc>,
    ) -> Option<ModuleUpgradePrompt> {
        if !framework_modules(framework).contains(&module)
            || self.check_module_access_at(snapshot, framework, module, now)
        {
            return None;
        }
        Some(ModuleUpgradePrompt {
            required_tier: required_tier_for_module(framework, module),
            module_name: module.display_name().to_string(),
        })
    }
}

/// Framework upgrade prompt with the default evaluator and the current time.
pub fn upgrade_prompt_for_framework(
    snapshot: &OrganizationLicensing,
    framework: FrameworkCode,
) -> Option<FrameworkUpgradePrompt> {
    Evaluator::default().upgrade_prompt_for_framework_at(snapshot, framework, Utc::now())
}

/// Module upgrade prompt with the default evaluator and the current time.
pub fn upgrade_prompt_for_module(
    snapshot: &OrganizationLicensing,
    framework: FrameworkCode,
    module: FrameworkModule,
) -> Option<ModuleUpgradePrompt> {
    Evaluator::default().upgrade_prompt_for_module_at(snapshot, framework, module, Utc::now())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prompt_when_accessible() {
        let snap = OrganizationLicensing::new(
            "org-1",
            LicenseTier::Professional,
            [FrameworkCode::Dora],
        );
        assert!(upgrade_prompt_for_framework(&snap, FrameworkCode::Dora).is_none());
        assert!(
            upgrade_prompt_for_module(&snap, FrameworkCode::Dora, FrameworkModule::Testing)
                .is_none()
        );
    }

    #[test]
    fn test_framework_prompt_lists_features() {
        let snap = OrganizationLicensing::new("org-1", LicenseTier::Starter, [FrameworkCode::Nis2]);
        let prompt = upgrade_prompt_for_framework(&snap, FrameworkCode::Dora).unwrap();
        assert_eq!(prompt.required_tier, LicenseTier::Professional);
        assert!(prompt.features.iter().any(|f| f.contains("TLPT")));
    }

    #[test]
    fn test_module_prompt_uses_display_name() {
        let snap = OrganizationLicensing::new("org-1", LicenseTier::Starter, [FrameworkCode::Nis2]);
        let prompt =
            upgrade_prompt_for_module(&snap, FrameworkCode::Nis2, FrameworkModule::Incidents)
                .unwrap();
        assert_eq!(prompt.required_tier, LicenseTier::Professional);
        assert_eq!(prompt.module_name, "Incident Management");
    }

    #[test]
    fn test_no_module_prompt_outside_framework() {
        let snap = OrganizationLicensing::new("org-1", LicenseTier::Starter, [FrameworkCode::Nis2]);
        assert!(
            upgrade_prompt_for_module(&snap, FrameworkCode::Nis2, FrameworkModule::Roi).is_none()
        );
    }

    #[test]
    fn test_prompt_wire_format() {
        let prompt = ModuleUpgradePrompt {
            required_tier: LicenseTier::Enterprise,
            module_name: "Statement of Applicability".into(),
        };
        let json = serde_json::to_value(&prompt).unwrap();
        assert_eq!(json["requiredTier"], "enterprise");
        assert_eq!(json["moduleName"], "Statement of Applicability");
    }
}
