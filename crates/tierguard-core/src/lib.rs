//! Core types and error definitions for Tierguard.
//!
//! This crate provides the licensing vocabulary shared across all Tierguard
//! crates: compliance frameworks, feature modules, license tiers, billing
//! states, and the per-organization licensing snapshot that the evaluator
//! consumes.
//!
//! # Main types
//!
//! - [`TierguardError`]: Unified error enum for all Tierguard subsystems.
//! - [`TierguardResult`]: Convenience alias for `Result<T, TierguardError>`.
//! - [`FrameworkCode`]: A compliance regime (NIS2, DORA, GDPR, ISO 27001).
//! - [`FrameworkModule`]: A feature area within a framework.
//! - [`LicenseTier`]: Commercial license level.
//! - [`OrganizationLicensing`]: Point-in-time licensing snapshot of one organization.

/// Error types.
pub mod error;
/// Framework and module identifiers.
pub mod framework;
/// Licensing snapshot types.
pub mod snapshot;
/// License tiers and billing status.
pub mod tier;

pub use error::{TierguardError, TierguardResult};
pub use framework::{FrameworkCode, FrameworkModule};
pub use snapshot::{FrameworkEntitlement, OrganizationLicensing, SnapshotSource};
pub use tier::{BillingStatus, LicenseTier};
