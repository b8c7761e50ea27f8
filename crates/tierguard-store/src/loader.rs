use crate::fallback::{default_entitlement, FallbackStrategy};
use crate::row::{EntitlementRow, LicensingRows};
use crate::store::LicensingStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tierguard_core::{
    BillingStatus, FrameworkCode, FrameworkEntitlement, FrameworkModule, LicenseTier,
    OrganizationLicensing, SnapshotSource, TierguardError, TierguardResult,
};
use tracing::debug;

/// Builds [`OrganizationLicensing`] snapshots from a [`LicensingStore`].
#[derive(Clone)]
pub struct SnapshotLoader {
    store: Arc<dyn LicensingStore>,
    fallback: FallbackStrategy,
}

impl SnapshotLoader {
    /// Loader over `store` with the default fallback.
    pub fn new(store: Arc<dyn LicensingStore>) -> Self {
        Self {
            store,
            fallback: FallbackStrategy::default(),
        }
    }

    /// Set the fallback strategy.
    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.fallback = fallback;
        self
    }

    /// The configured fallback strategy.
    pub fn fallback(&self) -> FallbackStrategy {
        self.fallback
    }

    /// [`SnapshotLoader::load_at`] evaluated now.
    pub async fn load(&self, organization_id: &str) -> TierguardResult<OrganizationLicensing> {
        self.load_at(organization_id, Utc::now()).await
    }

    /// Load a snapshot, applying the fallback strategy to recoverable failures.
    pub async fn load_at(
        &self,
        organization_id: &str,
        now: DateTime<Utc>,
    ) -> TierguardResult<OrganizationLicensing> {
        let built = match self.store.fetch_licensing_rows(organization_id).await {
            Ok(rows) => build_snapshot(organization_id, rows, now),
            Err(e) => Err(e),
        };
        match built {
            Ok(snapshot) => {
                debug!(
                    organization_id,
                    tier = %snapshot.license_tier,
                    frameworks = snapshot.licensed_frameworks.len(),
                    "Licensing snapshot loaded"
                );
                Ok(snapshot)
            }
            Err(e) => self.fallback.recover(organization_id, e, now),
        }
    }
}

/// Convert raw rows into a snapshot.
///
/// A missing tier defaults to `starter`, missing frameworks to none and
/// missing billing status to `active`. Licensed frameworks without a stored
/// entitlement get a synthesized one.
pub fn build_snapshot(
    organization_id: &str,
    rows: LicensingRows,
    now: DateTime<Utc>,
) -> TierguardResult<OrganizationLicensing> {
    let org = rows
        .organization
        .ok_or_else(|| TierguardError::OrganizationNotFound(organization_id.to_string()))?;
    if org.lacks_licensing_columns() {
        return Err(TierguardError::LicensingSchemaMissing(
            organization_id.to_string(),
        ));
    }

    let license_tier = org
        .license_tier
        .as_deref()
        .map(str::parse::<LicenseTier>)
        .transpose()?
        .unwrap_or(LicenseTier::Starter);
    let licensed_frameworks = org
        .licensed_frameworks
        .unwrap_or_default()
        .iter()
        .map(|code| code.parse::<FrameworkCode>())
        .collect::<TierguardResult<_>>()?;
    let billing_status = org
        .billing_status
        .as_deref()
        .map(str::parse::<BillingStatus>)
        .transpose()?
        .unwrap_or(BillingStatus::Active);

    let mut entitlements: BTreeMap<FrameworkCode, (DateTime<Utc>, FrameworkEntitlement)> =
        BTreeMap::new();
    for row in rows.entitlements {
        let updated_at = row.updated_at;
        let entitlement = convert_entitlement(row)?;
        // Duplicate rows for one framework: the most recently updated wins.
        let newer = entitlements
            .get(&entitlement.framework)
            .map_or(true, |(seen, _)| updated_at >= *seen);
        if newer {
            entitlements.insert(entitlement.framework, (updated_at, entitlement));
        }
    }

    let mut snapshot = OrganizationLicensing {
        organization_id: organization_id.to_string(),
        license_tier,
        licensed_frameworks,
        trial_ends_at: org.trial_ends_at,
        billing_status,
        entitlements: entitlements
            .into_iter()
            .map(|(fw, (_, ent))| (fw, ent))
            .collect(),
        source: SnapshotSource::Store,
    };

    let missing: Vec<FrameworkCode> = snapshot
        .licensed_frameworks
        .iter()
        .copied()
        .filter(|fw| !snapshot.entitlements.contains_key(fw))
        .collect();
    for framework in missing {
        debug!(
            organization_id,
            framework = framework.as_str(),
            "Synthesizing default entitlement"
        );
        snapshot
            .entitlements
            .insert(framework, default_entitlement(framework, now));
    }

    Ok(snapshot)
}

fn convert_entitlement(row: EntitlementRow) -> TierguardResult<FrameworkEntitlement> {
    let modules_enabled = row
        .modules_enabled
        .map(|map| {
            map.into_iter()
                .map(|(module, enabled)| Ok((module.parse::<FrameworkModule>()?, enabled)))
                .collect::<TierguardResult<BTreeMap<_, _>>>()
        })
        .transpose()?;
    Ok(FrameworkEntitlement {
        framework: row.framework.parse()?,
        enabled: row.enabled,
        activated_at: row.activated_at,
        expires_at: row.expires_at,
        modules_enabled,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::row::OrganizationRow;
    use chrono::Duration;

    fn rows(org: OrganizationRow, entitlements: Vec<EntitlementRow>) -> LicensingRows {
        LicensingRows {
            organization: Some(org),
            entitlements,
        }
    }

    #[test]
    fn test_missing_org_is_not_found() {
        let err = build_snapshot("org-1", LicensingRows::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, TierguardError::OrganizationNotFound(_)));
    }

    #[test]
    fn test_null_columns_is_schema_missing() {
        let err = build_snapshot(
            "org-1",
            rows(OrganizationRow::unlicensed("org-1", "Acme"), vec![]),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, TierguardError::LicensingSchemaMissing(_)));
    }

    #[test]
    fn test_partial_columns_default() {
        let mut org = OrganizationRow::unlicensed("org-1", "Acme");
        org.licensed_frameworks = Some(vec!["nis2".into()]);
        let snap = build_snapshot("org-1", rows(org, vec![]), Utc::now()).unwrap();
        assert_eq!(snap.license_tier, LicenseTier::Starter);
        assert_eq!(snap.billing_status, BillingStatus::Active);
        assert!(snap.is_licensed(FrameworkCode::Nis2));
    }

    #[test]
    fn test_synthesizes_missing_entitlements() {
        let now = Utc::now();
        let org =
            OrganizationRow::licensed("org-1", "Acme", "enterprise", &["nis2", "dora", "gdpr"]);
        let stored = EntitlementRow::new("e-1", "org-1", "dora", now - Duration::days(5))
            .with_module("roi", false);
        let snap = build_snapshot("org-1", rows(org, vec![stored]), now).unwrap();

        assert_eq!(snap.entitlements.len(), 3);
        let dora = snap.entitlement(FrameworkCode::Dora).unwrap();
        assert_eq!(dora.module_override(FrameworkModule::Roi), Some(false));
        assert_eq!(dora.module_override(FrameworkModule::Testing), None);

        let gdpr = snap.entitlement(FrameworkCode::Gdpr).unwrap();
        assert_eq!(gdpr.modules_enabled.as_ref().unwrap().len(), 4);
        assert_eq!(gdpr.activated_at, now);
    }

    #[test]
    fn test_latest_duplicate_entitlement_wins() {
        let now = Utc::now();
        let org = OrganizationRow::licensed("org-1", "Acme", "professional", &["dora"]);
        let mut old = EntitlementRow::new("e-old", "org-1", "dora", now - Duration::days(30));
        old.enabled = false;
        let mut new = EntitlementRow::new("e-new", "org-1", "dora", now - Duration::days(30));
        new.updated_at = now - Duration::days(1);

        let snap = build_snapshot("org-1", rows(org, vec![new, old]), now).unwrap();
        assert!(snap.entitlement(FrameworkCode::Dora).unwrap().enabled);
    }

    #[test]
    fn test_unknown_codes_are_errors() {
        let now = Utc::now();
        let org = OrganizationRow::licensed("org-1", "Acme", "professional", &["dora", "sox"]);
        assert!(matches!(
            build_snapshot("org-1", rows(org, vec![]), now),
            Err(TierguardError::UnknownPolicyKey { kind: "framework", .. })
        ));

        let org = OrganizationRow::licensed("org-1", "Acme", "professional", &["dora"]);
        let ent = EntitlementRow::new("e-1", "org-1", "dora", now).with_module("payroll", true);
        assert!(matches!(
            build_snapshot("org-1", rows(org, vec![ent]), now),
            Err(TierguardError::UnknownPolicyKey { kind: "module", .. })
        ));
    }
}
