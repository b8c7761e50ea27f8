//! Licensing storage for Tierguard.
//!
//! Reads the `organizations` and `organization_framework_entitlements`
//! tables through the [`LicensingStore`] trait and turns them into an
//! [`OrganizationLicensing`](tierguard_core::OrganizationLicensing) snapshot
//! with [`SnapshotLoader`].
//!
//! Backends:
//! - [`MemoryLicensingStore`]: in-process tables.
//! - [`FileLicensingStore`]: a JSON export of both tables.
//! - `SqliteLicensingStore`: SQLite tables, behind the `sqlite` feature.

/// Recovery when licensing data is unavailable.
pub mod fallback;
/// JSON file backend.
pub mod file;
/// Snapshot construction.
pub mod loader;
/// In-memory backend.
pub mod memory;
/// Raw table rows.
pub mod row;
/// SQLite backend.
#[cfg(feature = "sqlite")]
pub mod sqlite;
/// The store trait.
pub mod store;

pub use fallback::{default_entitlement, default_snapshot, deny_all_snapshot, FallbackStrategy};
pub use file::{FileLicensingStore, LicensingDocument};
pub use loader::{build_snapshot, SnapshotLoader};
pub use memory::MemoryLicensingStore;
pub use row::{EntitlementRow, LicensingRows, OrganizationRow};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteLicensingStore;
pub use store::LicensingStore;
