//! Licensing policy tables and the pure access evaluator.
//!
//! Decides framework-level and module-level access from an
//! [`OrganizationLicensing`](tierguard_core::OrganizationLicensing) snapshot
//! using only static policy data. No I/O happens here; loading snapshots is
//! the job of `tierguard-store`.
//!
//! # Main types
//!
//! - [`Evaluator`]: Access checks, enabled-module listing, upgrade prompts.
//! - [`BaseModuleOverride`]: Whether explicit `false` overrides apply to base modules.
//! - [`DenialReason`]: The first failing condition of a denied check.
//! - [`FrameworkUpgradePrompt`] / [`ModuleUpgradePrompt`]: Locked-feature banner metadata.
//! - [`LicensingSummary`]: Serializable per-framework view of an organization.

/// Access decisions.
pub mod evaluator;
/// Upgrade prompt metadata.
pub mod prompt;
/// Per-organization licensing summaries.
pub mod summary;
/// Static framework, module and tier tables.
pub mod tables;

pub use evaluator::{
    can_upgrade_to, check_framework_access, check_module_access, enabled_modules,
    frameworks_unlocked_by, is_trial_expired, is_trial_expired_at, trial_days_remaining_at,
    BaseModuleOverride, DenialReason, Evaluator,
};
pub use prompt::{
    upgrade_prompt_for_framework, upgrade_prompt_for_module, FrameworkUpgradePrompt,
    ModuleUpgradePrompt,
};
pub use summary::{FrameworkSummary, LicensingSummary, LockedModule};
pub use tables::{
    framework_features, framework_modules, premium_modules, required_tier_for_framework,
    required_tier_for_module, tier_frameworks, tier_meets, BASE_MODULES,
};
