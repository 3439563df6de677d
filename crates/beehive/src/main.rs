use anyhow::{Context, Result};
use beehive_core::db;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::import::{handle_import, handle_import_manifest, ImportArgs, ImportManifestArgs};
use commands::status::{handle_readings, handle_status, ReadingsArgs, StatusArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Beehive sensor data importer", long_about = None)]
struct Cli {
    /// Maximum number of pooled database connections
    #[arg(long, global = true, default_value_t = db::DEFAULT_MAX_CONNECTIONS)]
    max_connections: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run database migrations
    Migrate,
    /// Import one sensor CSV file for a hive
    Import(ImportArgs),
    /// Import every file listed in a TOML manifest
    ImportManifest(ImportManifestArgs),
    /// Show the latest reading of each kind for a hive
    Status(StatusArgs),
    /// List readings of one kind for a hive
    Readings(ReadingsArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();
    let pool = connect_pool(cli.max_connections).await?;

    match cli.command {
        Command::Migrate => {
            db::run_migrations(&pool).await?;
            info!("Database migrations applied");
            Ok(())
        }
        Command::Import(args) => handle_import(&pool, args, cancel_on_ctrl_c()).await,
        Command::ImportManifest(args) => {
            handle_import_manifest(&pool, args, cancel_on_ctrl_c()).await
        }
        Command::Status(args) => handle_status(&pool, args).await,
        Command::Readings(args) => handle_readings(&pool, args).await,
    }
}

async fn connect_pool(max_connections: u32) -> Result<db::DbPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("BEEHIVE_DATABASE_URL"))
        .context("DATABASE_URL (or BEEHIVE_DATABASE_URL) must be set")?;
    db::connect(&database_url, max_connections).await
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing current batch");
            trigger.cancel();
        }
    });
    cancel
}
