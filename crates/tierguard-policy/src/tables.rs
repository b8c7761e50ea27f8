use tierguard_core::{FrameworkCode, FrameworkModule, LicenseTier};

use FrameworkModule::*;

/// Modules every framework exposes to any tier that can reach the framework.
pub const BASE_MODULES: [FrameworkModule; 4] = [Dashboard, Scoring, Gaps, Reports];

const NIS2_MODULES: &[FrameworkModule] = &[Dashboard, Scoring, Gaps, Incidents, Tprm, Reports];
const DORA_MODULES: &[FrameworkModule] = &[
    Dashboard, Scoring, Gaps, Roi, Incidents, Testing, Tprm, Reports,
];
const GDPR_MODULES: &[FrameworkModule] = &[
    Dashboard, Scoring, Gaps, Dpia, Breach, Consent, Reports,
];
const ISO27001_MODULES: &[FrameworkModule] = &[Dashboard, Scoring, Gaps, Soa, Audit, Reports];

const NIS2_PREMIUM: &[FrameworkModule] = &[Incidents, Tprm];
const DORA_PREMIUM: &[FrameworkModule] = &[Roi, Incidents, Testing, Tprm];
const GDPR_PREMIUM: &[FrameworkModule] = &[Dpia, Breach];
const ISO27001_PREMIUM: &[FrameworkModule] = &[Soa, Audit];

/// Modules a framework exposes, in declaration order.
pub fn framework_modules(framework: FrameworkCode) -> &'static [FrameworkModule] {
    match framework {
        FrameworkCode::Nis2 => NIS2_MODULES,
        FrameworkCode::Dora => DORA_MODULES,
        FrameworkCode::Gdpr => GDPR_MODULES,
        FrameworkCode::Iso27001 => ISO27001_MODULES,
    }
}

/// Modules of a framework that require an elevated tier.
pub fn premium_modules(framework: FrameworkCode) -> &'static [FrameworkModule] {
    match framework {
        FrameworkCode::Nis2 => NIS2_PREMIUM,
        FrameworkCode::Dora => DORA_PREMIUM,
        FrameworkCode::Gdpr => GDPR_PREMIUM,
        FrameworkCode::Iso27001 => ISO27001_PREMIUM,
    }
}

/// Whether `module` is open in every framework at the framework's tier.
pub fn is_base_module(module: FrameworkModule) -> bool {
    BASE_MODULES.contains(&module)
}

/// Whether `module` needs a tier above `framework`'s own tier.
pub fn is_premium_module(framework: FrameworkCode, module: FrameworkModule) -> bool {
    premium_modules(framework).contains(&module)
}

/// Frameworks nominally reachable at a tier.
///
/// Informational only: individual checks gate on
/// [`required_tier_for_framework`], not on this table.
pub fn tier_frameworks(tier: LicenseTier) -> &'static [FrameworkCode] {
    use FrameworkCode::*;
    match tier {
        LicenseTier::Trial | LicenseTier::Enterprise => &[Nis2, Dora, Gdpr, Iso27001],
        LicenseTier::Starter => &[Nis2],
        LicenseTier::Professional => &[Nis2, Dora],
    }
}

/// Minimum tier that can reach a framework.
pub fn required_tier_for_framework(framework: FrameworkCode) -> LicenseTier {
    match framework {
        FrameworkCode::Nis2 => LicenseTier::Starter,
        FrameworkCode::Dora => LicenseTier::Professional,
        FrameworkCode::Gdpr | FrameworkCode::Iso27001 => LicenseTier::Enterprise,
    }
}

/// Minimum tier that can reach a module of a framework.
///
/// Premium modules require at least `professional`, even on a `starter` framework.
pub fn required_tier_for_module(framework: FrameworkCode, module: FrameworkModule) -> LicenseTier {
    let framework_tier = required_tier_for_framework(framework);
    if is_base_module(module) {
        return framework_tier;
    }
    if is_premium_module(framework, module) && framework_tier == LicenseTier::Starter {
        return LicenseTier::Professional;
    }
    framework_tier
}

/// Whether `actual` satisfies `required` for gating. `trial` satisfies everything.
pub fn tier_meets(actual: LicenseTier, required: LicenseTier) -> bool {
    actual == LicenseTier::Trial || actual.ordinal() >= required.ordinal()
}

/// Marketing feature list shown when a framework is locked.
pub fn framework_features(framework: FrameworkCode) -> &'static [&'static str] {
    match framework {
        FrameworkCode::Nis2 => &[
            "Essential and important entity classification",
            "Cybersecurity risk-management measures (Art. 21)",
            "Gap analysis against NIS2 requirements",
            "Supply chain security oversight",
            "24h/72h incident reporting workflow",
        ],
        FrameworkCode::Dora => &[
            "Register of Information (RoI) with ESA export",
            "ICT-related incident classification and reporting",
            "Digital operational resilience testing, including TLPT",
            "ICT third-party risk management",
            "Contract lifecycle tracking for critical ICT providers",
        ],
        FrameworkCode::Gdpr => &[
            "Records of processing activities",
            "Data protection impact assessments",
            "72h personal data breach notification",
            "Consent and lawful basis tracking",
        ],
        FrameworkCode::Iso27001 => &[
            "Annex A control mapping",
            "Statement of Applicability",
            "Internal audit programme",
            "ISMS risk treatment planning",
        ],
    }
}
