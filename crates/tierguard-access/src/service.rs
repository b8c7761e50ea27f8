use crate::hooks::{AccessDecision, AccessDecisionHook, DecisionHookChain};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tierguard_core::{FrameworkCode, FrameworkModule, OrganizationLicensing, TierguardResult};
use tierguard_policy::{
    BaseModuleOverride, DenialReason, Evaluator, FrameworkUpgradePrompt, LicensingSummary,
    ModuleUpgradePrompt,
};
use tierguard_store::{FallbackStrategy, LicensingStore, SnapshotLoader};

/// Outcome of a framework check together with the banner to show when denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkAccess {
    /// Whether the framework is open.
    pub allowed: bool,
    /// First failing condition when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
    /// Upgrade banner, `None` when allowed.
    pub prompt: Option<FrameworkUpgradePrompt>,
}

/// Outcome of a module check together with the banner to show when denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccess {
    /// Whether the module is open.
    pub allowed: bool,
    /// First failing condition when denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialReason>,
    /// Upgrade banner, `None` when allowed or when no tier unlocks the module.
    pub prompt: Option<ModuleUpgradePrompt>,
}

/// Server-side licensing checks keyed by organization id.
///
/// Every call loads a fresh snapshot; nothing is cached between calls.
/// Framework and module checks are reported to the decision hooks.
#[derive(Clone)]
pub struct LicensingService {
    store: Arc<dyn LicensingStore>,
    loader: SnapshotLoader,
    evaluator: Evaluator,
    hooks: DecisionHookChain,
}

impl LicensingService {
    /// Service over `store` with the default fallback and evaluator, and no hooks.
    pub fn new(store: Arc<dyn LicensingStore>) -> Self {
        Self {
            loader: SnapshotLoader::new(store.clone()),
            store,
            evaluator: Evaluator::default(),
            hooks: DecisionHookChain::new(),
        }
    }

    /// Use `fallback` when the store cannot answer.
    pub fn with_fallback(mut self, fallback: FallbackStrategy) -> Self {
        self.loader = SnapshotLoader::new(self.store.clone()).with_fallback(fallback);
        self
    }

    /// Set how explicit `false` overrides on base modules are treated.
    pub fn with_base_module_override(mut self, base_module_override: BaseModuleOverride) -> Self {
        self.evaluator = Evaluator::new(base_module_override);
        self
    }

    /// Report every framework and module decision to `hook`.
    pub fn with_hook(mut self, hook: Arc<dyn AccessDecisionHook>) -> Self {
        self.hooks.add(hook);
        self
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn LicensingStore> {
        &self.store
    }

    /// The evaluator applied to every snapshot.
    pub fn evaluator(&self) -> Evaluator {
        self.evaluator
    }

    /// The organization's current licensing snapshot.
    pub async fn snapshot(&self, organization_id: &str) -> TierguardResult<OrganizationLicensing> {
        self.loader.load(organization_id).await
    }

    /// Framework check with denial reason and upgrade prompt.
    pub async fn check_framework(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
    ) -> TierguardResult<FrameworkAccess> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        let denial = self.evaluator.framework_denial_at(&snapshot, framework, now);
        self.hooks
            .emit(&AccessDecision::new(
                organization_id,
                framework,
                None,
                denial,
                snapshot.source,
                now,
            ))
            .await;
        Ok(FrameworkAccess {
            allowed: denial.is_none(),
            denial,
            prompt: self
                .evaluator
                .upgrade_prompt_for_framework_at(&snapshot, framework, now),
        })
    }

    /// Module check with denial reason and upgrade prompt.
    pub async fn check_module(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
        module: FrameworkModule,
    ) -> TierguardResult<ModuleAccess> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        let denial = self
            .evaluator
            .module_denial_at(&snapshot, framework, module, now);
        self.hooks
            .emit(&AccessDecision::new(
                organization_id,
                framework,
                Some(module),
                denial,
                snapshot.source,
                now,
            ))
            .await;
        Ok(ModuleAccess {
            allowed: denial.is_none(),
            denial,
            prompt: self
                .evaluator
                .upgrade_prompt_for_module_at(&snapshot, framework, module, now),
        })
    }

    /// Whether the organization can open `framework`.
    pub async fn has_framework_access(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
    ) -> TierguardResult<bool> {
        Ok(self.check_framework(organization_id, framework).await?.allowed)
    }

    /// Whether the organization can open `module` of `framework`.
    pub async fn has_module_access(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
        module: FrameworkModule,
    ) -> TierguardResult<bool> {
        Ok(self
            .check_module(organization_id, framework, module)
            .await?
            .allowed)
    }

    /// Licensed frameworks the organization can currently open.
    pub async fn enabled_frameworks(
        &self,
        organization_id: &str,
    ) -> TierguardResult<Vec<FrameworkCode>> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        Ok(self.evaluator.accessible_frameworks_at(&snapshot, now))
    }

    /// Modules the organization can open in `framework`.
    pub async fn enabled_modules(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
    ) -> TierguardResult<Vec<FrameworkModule>> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        Ok(self.evaluator.enabled_modules_at(&snapshot, framework, now))
    }

    /// Upgrade prompt for a locked framework.
    pub async fn framework_prompt(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
    ) -> TierguardResult<Option<FrameworkUpgradePrompt>> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        Ok(self
            .evaluator
            .upgrade_prompt_for_framework_at(&snapshot, framework, now))
    }

    /// Upgrade prompt for a locked module.
    pub async fn module_prompt(
        &self,
        organization_id: &str,
        framework: FrameworkCode,
        module: FrameworkModule,
    ) -> TierguardResult<Option<ModuleUpgradePrompt>> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        Ok(self
            .evaluator
            .upgrade_prompt_for_module_at(&snapshot, framework, module, now))
    }

    /// Full licensing summary for the organization.
    pub async fn summary(&self, organization_id: &str) -> TierguardResult<LicensingSummary> {
        let now = Utc::now();
        let snapshot = self.loader.load_at(organization_id, now).await?;
        Ok(self.evaluator.summarize_at(&snapshot, now))
    }
}
