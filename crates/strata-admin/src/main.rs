//! Strata operator CLI
//!
//! Provisions the OpenFGA store and model and runs the one-time legacy
//! administrator routines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

use config::Settings;
use strata_core::AdministratorRole;
use strata_db::PgLegacyMirror;
use strata_openfga::{authorization_model, bootstrap, AuthorizationClient, OpenFgaHttpClient};
use strata_sync::LegacyFlagSync;

#[derive(Parser, Debug)]
#[command(name = "strata-admin", version, about = "Strata authorization operator tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or reuse the store and make sure its model is current
    Bootstrap,
    /// Print the compiled authorization model as JSON
    PrintModel,
    /// Grant the full administrator role to every legacy flagged user
    MigrateAdministrators,
    /// Rewrite every legacy administrator flag from the tuple store
    ReconcileAdministrators,
    /// List users holding an administrator role
    ListAdministrators,
    /// Replace a user's administrator role
    SetAdministrator {
        /// User id
        user: String,
        /// One of base, users, spaces, settings, full or none
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    if let Command::PrintModel = cli.command {
        let model = serde_json::to_string_pretty(&authorization_model())?;
        println!("{}", model);
        return Ok(());
    }

    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Strata admin v{}", env!("CARGO_PKG_VERSION"));

    let client = connect(&settings).await?;

    match cli.command {
        Command::Bootstrap => {
            println!("store_id={}", client.store_id());
            println!("model_id={}", client.model_id());
        }
        Command::ListAdministrators => {
            for (user, role) in client.list_administrators().await? {
                println!("{}\t{}", user, role);
            }
        }
        Command::MigrateAdministrators => {
            let summary = legacy_sync(&settings, client)
                .await?
                .migrate_legacy_administrators()
                .await
                .context("Legacy administrator migration failed")?;
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::ReconcileAdministrators => {
            let summary = legacy_sync(&settings, client)
                .await?
                .reconcile_legacy_flags()
                .await
                .context("Legacy flag reconciliation failed")?;
            println!("{}", serde_json::to_string(&summary)?);
        }
        Command::SetAdministrator { user, role } => {
            let role = parse_administrator_role(&role)?;
            legacy_sync(&settings, client)
                .await?
                .assign_administrator(&user, role)
                .await
                .with_context(|| format!("Failed to update administrator role for {}", user))?;
            info!("Administrator role for {} set to {:?}", user, role);
        }
        Command::PrintModel => {}
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Bootstrap against OpenFGA. Any failure here is fatal.
async fn connect(settings: &Settings) -> Result<AuthorizationClient> {
    info!("Connecting to OpenFGA at {}...", settings.openfga.host);
    let http = OpenFgaHttpClient::new(&settings.openfga.connection())
        .context("Invalid OpenFGA configuration")?;

    match bootstrap(http, &settings.openfga.bootstrap()).await {
        Ok(client) => {
            info!("OpenFGA store and model ready");
            Ok(client)
        }
        Err(e) => {
            error!("Failed to bootstrap OpenFGA: {}", e);
            Err(e).context("OpenFGA bootstrap failed")
        }
    }
}

async fn legacy_sync(
    settings: &Settings,
    client: AuthorizationClient,
) -> Result<LegacyFlagSync<OpenFgaHttpClient, PgLegacyMirror>> {
    info!("Connecting to PostgreSQL...");
    let mirror = PgLegacyMirror::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("Failed to connect to PostgreSQL")?;

    Ok(LegacyFlagSync::new(
        client,
        Arc::new(mirror),
        settings.legacy.clone(),
    ))
}

fn parse_administrator_role(value: &str) -> Result<Option<AdministratorRole>> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    Ok(Some(value.parse::<AdministratorRole>()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_administrator_role() {
        assert_eq!(parse_administrator_role("none").unwrap(), None);
        assert_eq!(
            parse_administrator_role("full").unwrap(),
            Some(AdministratorRole::Full)
        );
        assert!(parse_administrator_role("root").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["strata-admin", "set-administrator", "bob", "spaces"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::SetAdministrator { ref user, ref role } if user == "bob" && role == "spaces"
        ));

        let cli = Cli::try_parse_from(["strata-admin", "migrate-administrators"]).unwrap();
        assert!(matches!(cli.command, Command::MigrateAdministrators));
    }
}
