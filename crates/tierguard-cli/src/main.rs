mod config;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use config::{StoreKind, TierguardConfig};
use serde::Serialize;
use std::path::PathBuf;
use tierguard_core::{BillingStatus, FrameworkCode, FrameworkModule, LicenseTier};
use tierguard_gateway::{AuthConfig, GatewayServer};
use tierguard_store::{FileLicensingStore, OrganizationRow, SqliteLicensingStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tierguard", about = "Tierguard: framework licensing and entitlement checks")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "tierguard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check framework access, or module access when a module is given
    Check {
        org: String,
        framework: String,
        module: Option<String>,
    },
    /// List the modules an organization can open in a framework
    Modules { org: String, framework: String },
    /// List the frameworks an organization can open
    Frameworks { org: String },
    /// Show the upgrade prompt for a locked framework or module
    Prompt {
        org: String,
        framework: String,
        module: Option<String>,
    },
    /// Print the full licensing summary of an organization
    Summary { org: String },
    /// Start the read-only licensing API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write an organization's licensing columns into the configured store
    Seed {
        org: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "starter")]
        tier: String,
        /// Comma-separated framework codes
        #[arg(long, value_delimiter = ',')]
        frameworks: Vec<String>,
        #[arg(long, default_value = "active")]
        billing: String,
        /// Trial length in days, counted from now
        #[arg(long)]
        trial_days: Option<i64>,
    },
}

/// Validate seed arguments and build the organization row.
fn seed_row(
    org: &str,
    name: Option<String>,
    tier: &str,
    frameworks: &[String],
    billing: &str,
) -> anyhow::Result<OrganizationRow> {
    let tier: LicenseTier = tier.parse()?;
    let billing: BillingStatus = billing.parse()?;
    let codes = frameworks
        .iter()
        .map(|f| f.parse::<FrameworkCode>().map(|fw| fw.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut row = OrganizationRow::licensed(
        org,
        name.unwrap_or_else(|| org.to_string()),
        tier.as_str(),
        &codes,
    );
    row.billing_status = Some(billing.as_str().to_string());
    Ok(row)
}

/// End of a trial that starts now and lasts `days`.
fn trial_end(days: i64) -> anyhow::Result<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|length| Utc::now().checked_add_signed(length))
        .ok_or_else(|| anyhow::anyhow!("--trial-days {days} is out of range"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config = TierguardConfig::load(&cli.config).await?;

    // Relative store paths are resolved against the config file's directory
    let config_dir = cli
        .config
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .to_path_buf();

    let store = config.open_store(&config_dir)?;
    let service = config.service(store);

    match cli.command {
        Commands::Seed {
            org,
            name,
            tier,
            frameworks,
            billing,
            trial_days,
        } => {
            let mut row = seed_row(&org, name, &tier, &frameworks, &billing)?;
            row.trial_ends_at = trial_days.map(trial_end).transpose()?;

            let path = config.store_path(&config_dir);
            match config.store.kind {
                StoreKind::File => {
                    FileLicensingStore::new(&path)
                        .upsert_organization(row)
                        .await?
                }
                // The store was opened and migrated above
                StoreKind::Sqlite => {
                    SqliteLicensingStore::open(&path)?.insert_organization(&row)?
                }
            }
            info!(
                organization_id = %org,
                tier = %tier,
                path = %path.display(),
                "Organization seeded"
            );
        }
        Commands::Check {
            org,
            framework,
            module,
        } => {
            let framework: FrameworkCode = framework.parse()?;
            match module {
                Some(module) => {
                    let module: FrameworkModule = module.parse()?;
                    print_json(&service.check_module(&org, framework, module).await?)?;
                }
                None => print_json(&service.check_framework(&org, framework).await?)?,
            }
        }
        Commands::Modules { org, framework } => {
            let framework: FrameworkCode = framework.parse()?;
            print_json(&service.enabled_modules(&org, framework).await?)?;
        }
        Commands::Frameworks { org } => {
            print_json(&service.enabled_frameworks(&org).await?)?;
        }
        Commands::Prompt {
            org,
            framework,
            module,
        } => {
            let framework: FrameworkCode = framework.parse()?;
            match module {
                Some(module) => {
                    let module: FrameworkModule = module.parse()?;
                    match service.module_prompt(&org, framework, module).await? {
                        Some(prompt) => print_json(&prompt)?,
                        None => println!("{module} is already available to {org}."),
                    }
                }
                None => match service.framework_prompt(&org, framework).await? {
                    Some(prompt) => print_json(&prompt)?,
                    None => println!("{framework} is already available to {org}."),
                },
            }
        }
        Commands::Summary { org } => {
            print_json(&service.summary(&org).await?)?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let auth_config = AuthConfig::new(config.server.api_keys.clone());
            if auth_config.is_enabled() {
                info!(keys = auth_config.api_keys.len(), "API key auth enabled");
            }
            info!(
                store = ?config.store.kind,
                fallback = ?config.licensing.fallback,
                "Starting Tierguard gateway on {}:{}",
                host,
                port
            );

            let app = GatewayServer::build_with_auth(service, auth_config);
            GatewayServer::serve(app, &host, port).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_row_normalizes_codes() {
        let row = seed_row(
            "org-1",
            None,
            "professional",
            &["dora".to_string(), "nis2".to_string()],
            "past_due",
        )
        .unwrap();
        assert_eq!(row.name, "org-1");
        assert_eq!(row.license_tier.as_deref(), Some("professional"));
        assert_eq!(
            row.licensed_frameworks,
            Some(vec!["dora".to_string(), "nis2".to_string()])
        );
        assert_eq!(row.billing_status.as_deref(), Some("past_due"));
    }

    #[test]
    fn test_seed_row_rejects_unknown_codes() {
        assert!(seed_row("org-1", None, "gold", &[], "active").is_err());
        assert!(seed_row("org-1", None, "starter", &["sox".to_string()], "active").is_err());
        assert!(seed_row("org-1", None, "starter", &[], "frozen").is_err());
    }

    #[test]
    fn test_trial_end_is_in_the_future() {
        let before = Utc::now();
        let end = trial_end(14).unwrap();
        assert!(end > before + Duration::days(13));
        assert!(end <= Utc::now() + Duration::days(14));
    }

    #[test]
    fn test_trial_end_rejects_out_of_range_days() {
        let err = trial_end(1_000_000_000_000_000).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(trial_end(i64::MIN).is_err());
    }

    #[test]
    fn test_cli_parses_seed_frameworks_list() {
        let cli = Cli::try_parse_from([
            "tierguard",
            "-c",
            "/etc/tierguard.toml",
            "seed",
            "org-1",
            "--tier",
            "trial",
            "--frameworks",
            "nis2,dora",
            "--trial-days",
            "14",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/tierguard.toml"));
        match cli.command {
            Commands::Seed {
                frameworks,
                trial_days,
                ..
            } => {
                assert_eq!(frameworks, vec!["nis2", "dora"]);
                assert_eq!(trial_days, Some(14));
            }
            _ => panic!("expected seed"),
        }
    }

    #[test]
    fn test_cli_parses_module_check() {
        let cli = Cli::try_parse_from(["tierguard", "check", "org-1", "dora", "roi"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Check { module: Some(ref m), .. } if m == "roi"
        ));
    }
}
