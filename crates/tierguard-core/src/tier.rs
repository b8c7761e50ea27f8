use crate::error::TierguardError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Commercial license level.
///
/// `Trial` grants full access while it lasts but ranks lowest for upgrade
/// prompts; see [`LicenseTier::ordinal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseTier {
    /// Time-limited evaluation with full access.
    Trial,
    /// Entry tier.
    Starter,
    /// Mid tier.
    Professional,
    /// Top tier.
    Enterprise,
}

impl LicenseTier {
    /// Every tier, in upgrade order.
    pub const ALL: [LicenseTier; 4] = [
        LicenseTier::Trial,
        LicenseTier::Starter,
        LicenseTier::Professional,
        LicenseTier::Enterprise,
    ];

    /// Position in the fixed upgrade order `trial < starter < professional < enterprise`.
    pub fn ordinal(&self) -> u8 {
        match self {
            LicenseTier::Trial => 0,
            LicenseTier::Starter => 1,
            LicenseTier::Professional => 2,
            LicenseTier::Enterprise => 3,
        }
    }

    /// Stable lowercase code.
    pub fn as_str(&self) -> &'static str {
        match self {
            LicenseTier::Trial => "trial",
            LicenseTier::Starter => "starter",
            LicenseTier::Professional => "professional",
            LicenseTier::Enterprise => "enterprise",
        }
    }
}

impl std::fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LicenseTier {
    type Err = TierguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LicenseTier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TierguardError::unknown("license tier", s))
    }
}

/// Billing state of the organization's subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    /// Paid and current.
    Active,
    /// Payment overdue; access continues.
    PastDue,
    /// Subscription ended; all access denied.
    Canceled,
    /// In a billing trial.
    Trialing,
}

impl BillingStatus {
    /// Stable snake_case code.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingStatus::Active => "active",
            BillingStatus::PastDue => "past_due",
            BillingStatus::Canceled => "canceled",
            BillingStatus::Trialing => "trialing",
        }
    }
}

impl std::fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingStatus {
    type Err = TierguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BillingStatus::Active),
            "past_due" => Ok(BillingStatus::PastDue),
            "canceled" => Ok(BillingStatus::Canceled),
            "trialing" => Ok(BillingStatus::Trialing),
            other => Err(TierguardError::unknown("billing status", other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_fixed() {
        let ordinals: Vec<u8> = LicenseTier::ALL.iter().map(LicenseTier::ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(
            "professional".parse::<LicenseTier>().unwrap(),
            LicenseTier::Professional
        );
        assert!("gold".parse::<LicenseTier>().is_err());
    }

    #[test]
    fn test_billing_serde_snake_case() {
        let json = serde_json::to_string(&BillingStatus::PastDue).unwrap();
        assert_eq!(json, "\"past_due\"");
        assert_eq!(
            "past_due".parse::<BillingStatus>().unwrap(),
            BillingStatus::PastDue
        );
        assert!("suspended".parse::<BillingStatus>().is_err());
    }
}
