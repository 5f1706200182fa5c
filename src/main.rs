mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "feedcast",
    version,
    about = "Scheduled news feed relay with per-tenant fan-out delivery",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (defaults to FEEDCAST_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler: poll on startup, then on every cadence slot
    Run,

    /// Run a single poll cycle and exit
    Poll,

    /// Show the polling cadence for the current local time
    Cadence,

    /// Manage tenant configuration
    Tenant {
        #[command(subcommand)]
        action: TenantAction,
    },
}

#[derive(Subcommand)]
enum TenantAction {
    /// Set the destination a tenant delivers to
    SetDestination {
        /// Tenant id
        tenant: String,

        /// Destination id (named destination or webhook URL)
        destination: String,
    },

    /// Set the tag prepended to deliveries (empty string clears it)
    SetTag {
        /// Tenant id
        tenant: String,

        /// Tag text, e.g. a role mention
        tag: String,
    },

    /// Toggle a feature flag
    ToggleFeature {
        /// Tenant id
        tenant: String,

        /// Feature name
        #[arg(default_value = feedcast::models::SECONDARY_STREAM_FLAG)]
        flag: String,
    },

    /// List configured tenants
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Run => {
            tracing::info!(feed = %config.feed.url, "Starting feed relay");
            commands::run(config).await?;
        }

        Commands::Poll => {
            tracing::info!(feed = %config.feed.url, "Running single poll cycle");
            commands::poll(config).await?;
        }

        Commands::Cadence => commands::cadence(&config)?,

        Commands::Tenant { action } => match action {
            TenantAction::SetDestination {
                tenant,
                destination,
            } => commands::set_destination(&config, &tenant, &destination).await?,
            TenantAction::SetTag { tenant, tag } => {
                commands::set_tag(&config, &tenant, &tag).await?
            }
            TenantAction::ToggleFeature { tenant, flag } => {
                commands::toggle_feature(&config, &tenant, &flag).await?
            }
            TenantAction::List => commands::list_tenants(&config).await?,
        },
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("feedcast=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("feedcast={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}
