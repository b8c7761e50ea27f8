use crate::error::TierguardError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported compliance frameworks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkCode {
    /// EU Network and Information Security Directive 2.
    Nis2,
    /// EU Digital Operational Resilience Act.
    Dora,
    /// EU General Data Protection Regulation.
    Gdpr,
    /// ISO/IEC 27001 information security management.
    Iso27001,
}

impl FrameworkCode {
    /// Every framework, in canonical order.
    pub const ALL: [FrameworkCode; 4] = [
        FrameworkCode::Nis2,
        FrameworkCode::Dora,
        FrameworkCode::Gdpr,
        FrameworkCode::Iso27001,
    ];

    /// Stable lowercase code used in storage and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkCode::Nis2 => "nis2",
            FrameworkCode::Dora => "dora",
            FrameworkCode::Gdpr => "gdpr",
            FrameworkCode::Iso27001 => "iso27001",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameworkCode::Nis2 => "NIS2",
            FrameworkCode::Dora => "DORA",
            FrameworkCode::Gdpr => "GDPR",
            FrameworkCode::Iso27001 => "ISO 27001",
        }
    }
}

impl std::fmt::Display for FrameworkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FrameworkCode {
    type Err = TierguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FrameworkCode::ALL
            .into_iter()
            .find(|fw| fw.as_str() == s)
            .ok_or_else(|| TierguardError::unknown("framework", s))
    }
}

/// A feature area within a framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkModule {
    /// Compliance overview.
    Dashboard,
    /// Control scoring.
    Scoring,
    /// Gap analysis.
    Gaps,
    /// Exportable reports.
    Reports,
    /// DORA Register of Information.
    Roi,
    /// Incident reporting workflow.
    Incidents,
    /// Resilience testing, including TLPT.
    Testing,
    /// Third-party risk management.
    Tprm,
    /// Data protection impact assessments.
    Dpia,
    /// Personal data breach handling.
    Breach,
    /// Consent records.
    Consent,
    /// Statement of Applicability.
    Soa,
    /// Internal audit programme.
    Audit,
}

impl FrameworkModule {
    /// Every module.
    pub const ALL: [FrameworkModule; 13] = [
        FrameworkModule::Dashboard,
        FrameworkModule::Scoring,
        FrameworkModule::Gaps,
        FrameworkModule::Reports,
        FrameworkModule::Roi,
        FrameworkModule::Incidents,
        FrameworkModule::Testing,
        FrameworkModule::Tprm,
        FrameworkModule::Dpia,
        FrameworkModule::Breach,
        FrameworkModule::Consent,
        FrameworkModule::Soa,
        FrameworkModule::Audit,
    ];

    /// Stable lowercase code.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameworkModule::Dashboard => "dashboard",
            FrameworkModule::Scoring => "scoring",
            FrameworkModule::Gaps => "gaps",
            FrameworkModule::Reports => "reports",
            FrameworkModule::Roi => "roi",
            FrameworkModule::Incidents => "incidents",
            FrameworkModule::Testing => "testing",
            FrameworkModule::Tprm => "tprm",
            FrameworkModule::Dpia => "dpia",
            FrameworkModule::Breach => "breach",
            FrameworkModule::Consent => "consent",
            FrameworkModule::Soa => "soa",
            FrameworkModule::Audit => "audit",
        }
    }

    /// Name shown in locked-module banners.
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameworkModule::Dashboard => "Dashboard",
            FrameworkModule::Scoring => "Compliance Scoring",
            FrameworkModule::Gaps => "Gap Analysis",
            FrameworkModule::Reports => "Reports",
            FrameworkModule::Roi => "Register of Information",
            FrameworkModule::Incidents => "Incident Management",
            FrameworkModule::Testing => "Resilience Testing",
            FrameworkModule::Tprm => "Third-Party Risk Management",
            FrameworkModule::Dpia => "Data Protection Impact Assessments",
            FrameworkModule::Breach => "Breach Notification",
            FrameworkModule::Consent => "Consent Management",
            FrameworkModule::Soa => "Statement of Applicability",
            FrameworkModule::Audit => "Internal Audit",
        }
    }
}

impl std::fmt::Display for FrameworkModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkModule {
    type Err = TierguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FrameworkModule::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| TierguardError::unknown("module", s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_parse() {
        assert_eq!("dora".parse::<FrameworkCode>().unwrap(), FrameworkCode::Dora);
        assert_eq!(
            "iso27001".parse::<FrameworkCode>().unwrap(),
            FrameworkCode::Iso27001
        );
        assert!("DORA".parse::<FrameworkCode>().is_err());
        assert!("soc2".parse::<FrameworkCode>().is_err());
    }

    #[test]
    fn test_framework_display() {
        assert_eq!(FrameworkCode::Nis2.to_string(), "NIS2");
        assert_eq!(FrameworkCode::Iso27001.to_string(), "ISO 27001");
    }

    #[test]
    fn test_module_parse_matches_serde() {
        for module in FrameworkModule::ALL {
            let json = serde_json::to_string(&module).unwrap();
            assert_eq!(json, format!("\"{}\"", module.as_str()));
            assert_eq!(module.as_str().parse::<FrameworkModule>().unwrap(), module);
        }
    }

    #[test]
    fn test_unknown_module() {
        let err = "payroll".parse::<FrameworkModule>().unwrap_err();
        assert!(matches!(
            err,
            TierguardError::UnknownPolicyKey { kind: "module", .. }
        ));
    }
}
