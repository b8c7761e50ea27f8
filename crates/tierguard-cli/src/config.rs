//! `tierguard.toml` configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tierguard_access::{LicensingService, TracingDecisionHook};
use tierguard_core::{TierguardError, TierguardResult};
use tierguard_policy::BaseModuleOverride;
use tierguard_store::{FallbackStrategy, FileLicensingStore, LicensingStore, SqliteLicensingStore};

/// Root of `tierguard.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct TierguardConfig {
    /// Where the licensing tables live.
    #[serde(default)]
    pub store: StoreConfig,
    /// Fallback and evaluator settings.
    #[serde(default)]
    pub licensing: LicensingConfig,
    /// Gateway settings for `serve`.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Backend holding the licensing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// JSON export file.
    #[default]
    File,
    /// SQLite database.
    Sqlite,
}

/// `[store]` section.
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Backend kind.
    #[serde(default)]
    pub kind: StoreKind,
    /// Store location, relative to the config file unless absolute.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            path: default_store_path(),
        }
    }
}

/// `[licensing]` section.
#[derive(Debug, Deserialize, Default)]
pub struct LicensingConfig {
    /// What to do when the store cannot answer.
    #[serde(default)]
    pub fallback: FallbackStrategy,
    /// How base-module overrides are treated.
    #[serde(default)]
    pub base_module_override: BaseModuleOverride,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accepted API keys. Empty disables auth.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_keys: vec![],
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/licensing.json")
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl TierguardConfig {
    /// Parse TOML config text.
    pub fn parse(content: &str) -> TierguardResult<Self> {
        toml::from_str(content).map_err(|e| TierguardError::Config(e.to_string()))
    }

    /// Read and parse the config file at `path`.
    pub async fn load(path: &Path) -> TierguardResult<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TierguardError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Store path, resolved against the config file's directory when relative.
    pub fn store_path(&self, config_dir: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            config_dir.join(&self.store.path)
        }
    }

    /// Open the configured store, migrating SQLite databases.
    pub fn open_store(&self, config_dir: &Path) -> TierguardResult<Arc<dyn LicensingStore>> {
        let path = self.store_path(config_dir);
        let store: Arc<dyn LicensingStore> = match self.store.kind {
            StoreKind::File => Arc::new(FileLicensingStore::new(path)),
            StoreKind::Sqlite => {
                let store = SqliteLicensingStore::open(&path)?;
                store.migrate()?;
                Arc::new(store)
            }
        };
        Ok(store)
    }

    /// Licensing service over `store` with the configured policy.
    pub fn service(&self, store: Arc<dyn LicensingStore>) -> LicensingService {
        LicensingService::new(store)
            .with_fallback(self.licensing.fallback)
            .with_base_module_override(self.licensing.base_module_override)
            .with_hook(Arc::new(TracingDecisionHook))
    }
}
