use crate::row::{EntitlementRow, LicensingRows, OrganizationRow};
use crate::store::LicensingStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tierguard_core::{TierguardError, TierguardResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    license_tier TEXT,
    licensed_frameworks TEXT,
    trial_ends_at TEXT,
    billing_status TEXT
);
CREATE TABLE IF NOT EXISTS organization_framework_entitlements (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL REFERENCES organizations(id),
    framework TEXT NOT NULL,
    enabled INTEGER NOT NULL DEFAULT 1,
    activated_at TEXT NOT NULL,
    expires_at TEXT,
    modules_enabled TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entitlements_org
    ON organization_framework_entitlements(organization_id);
";

const SELECT_ORGANIZATION: &str =
    "SELECT id, name, license_tier, licensed_frameworks, trial_ends_at, billing_status
     FROM organizations WHERE id = ?1";

const SELECT_ENTITLEMENTS: &str =
    "SELECT id, organization_id, framework, enabled, activated_at, expires_at,
            modules_enabled, created_at, updated_at
     FROM organization_framework_entitlements WHERE organization_id = ?1";

/// SQLite-backed licensing tables.
///
/// JSON columns (`licensed_frameworks`, `modules_enabled`) are stored as text,
/// timestamps as RFC 3339 text.
#[derive(Clone)]
pub struct SqliteLicensingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLicensingStore {
    /// Open or create the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> TierguardResult<Self> {
        let conn = Connection::open(path).map_err(store_err)?;
        Ok(Self::from_connection(conn))
    }

    /// A private in-memory database.
    pub fn open_in_memory() -> TierguardResult<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Create the licensing tables if they do not exist.
    pub fn migrate(&self) -> TierguardResult<()> {
        self.conn.lock().execute_batch(SCHEMA).map_err(store_err)
    }

    /// Insert or replace an organization row.
    pub fn insert_organization(&self, row: &OrganizationRow) -> TierguardResult<()> {
        let frameworks = row
            .licensed_frameworks
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO organizations
                 (id, name, license_tier, licensed_frameworks, trial_ends_at, billing_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    row.id,
                    row.name,
                    row.license_tier,
                    frameworks,
                    row.trial_ends_at.map(|t| t.to_rfc3339()),
                    row.billing_status,
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }

    /// Insert or replace an entitlement row.
    pub fn insert_entitlement(&self, row: &EntitlementRow) -> TierguardResult<()> {
        let modules = row
            .modules_enabled
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO organization_framework_entitlements
                 (id, organization_id, framework, enabled, activated_at, expires_at,
                  modules_enabled, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.id,
                    row.organization_id,
                    row.framework,
                    row.enabled,
                    row.activated_at.to_rfc3339(),
                    row.expires_at.map(|t| t.to_rfc3339()),
                    modules,
                    row.created_at.to_rfc3339(),
                    row.updated_at.to_rfc3339(),
                ],
            )
            .map_err(store_err)?;
        Ok(())
    }

    async fn blocking<T, F>(&self, f: F) -> TierguardResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> TierguardResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| TierguardError::Store(format!("SQLite task failed: {e}")))?
    }
}

#[async_trait]
impl LicensingStore for SqliteLicensingStore {
    async fn organization(
        &self,
        organization_id: &str,
    ) -> TierguardResult<Option<OrganizationRow>> {
        let id = organization_id.to_string();
        self.blocking(move |conn| query_organization(conn, &id)).await
    }

    async fn entitlements(&self, organization_id: &str) -> TierguardResult<Vec<EntitlementRow>> {
        let id = organization_id.to_string();
        self.blocking(move |conn| query_entitlements(conn, &id)).await
    }

    /// Reads both tables inside one transaction.
    async fn fetch_licensing_rows(&self, organization_id: &str) -> TierguardResult<LicensingRows> {
        let id = organization_id.to_string();
        self.blocking(move |conn| {
            let tx = conn.transaction().map_err(store_err)?;
            let organization = query_organization(&tx, &id)?;
            let entitlements = match organization {
                Some(_) => query_entitlements(&tx, &id)?,
                None => Vec::new(),
            };
            tx.commit().map_err(store_err)?;
            Ok(LicensingRows {
                organization,
                entitlements,
            })
        })
        .await
    }
}

fn query_organization(conn: &Connection, id: &str) -> TierguardResult<Option<OrganizationRow>> {
    let raw = conn
        .query_row(SELECT_ORGANIZATION, params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .optional()
        .map_err(store_err)?;

    let Some((id, name, license_tier, frameworks, trial_ends_at, billing_status)) = raw else {
        return Ok(None);
    };
    let licensed_frameworks = frameworks
        .map(|json| {
            serde_json::from_str::<Vec<String>>(&json).map_err(|e| {
                TierguardError::Store(format!("Invalid licensed_frameworks for {id}: {e}"))
            })
        })
        .transpose()?;

    Ok(Some(OrganizationRow {
        trial_ends_at: trial_ends_at.as_deref().map(parse_timestamp).transpose()?,
        id,
        name,
        license_tier,
        licensed_frameworks,
        billing_status,
    }))
}

/// Column values of one entitlement row, in `SELECT_ENTITLEMENTS` order.
type RawEntitlement = (
    String,
    String,
    String,
    bool,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn query_entitlements(
    conn: &Connection,
    organization_id: &str,
) -> TierguardResult<Vec<EntitlementRow>> {
    let mut stmt = conn.prepare(SELECT_ENTITLEMENTS).map_err(store_err)?;
    let raw_rows = stmt
        .query_map(params![organization_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })
        .map_err(store_err)?
        .collect::<Result<Vec<RawEntitlement>, _>>()
        .map_err(store_err)?;

    raw_rows.into_iter().map(entitlement_from_raw).collect()
}

fn entitlement_from_raw(raw: RawEntitlement) -> TierguardResult<EntitlementRow> {
    let (id, organization_id, framework, enabled, activated, expires, modules, created, updated) =
        raw;
    let modules_enabled = modules
        .map(|json| {
            serde_json::from_str::<BTreeMap<String, bool>>(&json).map_err(|e| {
                TierguardError::Store(format!("Invalid modules_enabled for {id}: {e}"))
            })
        })
        .transpose()?;
    Ok(EntitlementRow {
        activated_at: parse_timestamp(&activated)?,
        expires_at: expires.as_deref().map(parse_timestamp).transpose()?,
        created_at: parse_timestamp(&created)?,
        updated_at: parse_timestamp(&updated)?,
        id,
        organization_id,
        framework,
        enabled,
        modules_enabled,
    })
}

fn parse_timestamp(raw: &str) -> TierguardResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TierguardError::Store(format!("Invalid timestamp '{raw}': {e}")))
}

fn store_err(e: rusqlite::Error) -> TierguardError {
    TierguardError::Store(e.to_string())
}
