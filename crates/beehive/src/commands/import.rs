use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use beehive_core::config::{
    ImportConfig, DEFAULT_BATCH_SIZE, DEFAULT_SKIP_INTERVAL, DEFAULT_TIMESTAMP_COLUMN,
};
use beehive_core::db::{self, DbPool};
use beehive_core::importer::Importer;
use beehive_core::manifest::{run_manifest, Manifest};
use beehive_core::store::PgMeasurementStore;
use beehive_core::DataType;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Path to the CSV file
    pub path: PathBuf,
    /// Hive the readings belong to
    #[arg(long)]
    pub hive_id: i32,
    /// Measurement kind: flow, humidity, temperature or weight
    #[arg(long)]
    pub data_type: DataType,
    /// Records per bulk insert
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Only import every Nth row
    #[arg(long, default_value_t = DEFAULT_SKIP_INTERVAL)]
    pub skip_interval: usize,
    /// Name of the timestamp column
    #[arg(long, default_value = DEFAULT_TIMESTAMP_COLUMN)]
    pub timestamp_column: String,
    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
    /// Skip running migrations before importing
    #[arg(long)]
    pub skip_migrations: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportManifestArgs {
    /// Path to the TOML manifest
    pub manifest: PathBuf,
    /// Run the listed imports concurrently
    #[arg(long)]
    pub parallel: bool,
    /// Skip running migrations before importing
    #[arg(long)]
    pub skip_migrations: bool,
}

pub async fn handle_import(
    pool: &DbPool,
    args: ImportArgs,
    cancel: CancellationToken,
) -> Result<()> {
    if !args.delimiter.is_ascii() {
        bail!("delimiter '{}' must be a single ASCII character", args.delimiter);
    }
    prepare(pool, args.skip_migrations).await?;

    let config = ImportConfig::new(args.hive_id, args.data_type)
        .with_batch_size(args.batch_size)
        .with_skip_interval(args.skip_interval)
        .with_timestamp_column(args.timestamp_column)
        .with_delimiter(args.delimiter as u8);

    let importer = Importer::new(PgMeasurementStore::new(pool.clone()), config)?;
    let report = importer
        .import_file(&args.path, &cancel)
        .await
        .with_context(|| format!("Error importing data from {}", args.path.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(
        records_delivered = report.records_delivered,
        "Data successfully imported"
    );
    Ok(())
}

pub async fn handle_import_manifest(
    pool: &DbPool,
    args: ImportManifestArgs,
    cancel: CancellationToken,
) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)
        .with_context(|| format!("failed to load manifest {}", args.manifest.display()))?;
    prepare(pool, args.skip_migrations).await?;

    let store = PgMeasurementStore::new(pool.clone());
    let results = run_manifest(store, &manifest, args.parallel, &cancel).await;

    println!("{}", serde_json::to_string_pretty(&results)?);

    let failed = results.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        bail!("{failed} of {} imports failed", results.len());
    }
    Ok(())
}

async fn prepare(pool: &DbPool, skip_migrations: bool) -> Result<()> {
    if skip_migrations {
        warn!("Skipping migrations before import");
        Ok(())
    } else {
        db::run_migrations(pool).await
    }
}
