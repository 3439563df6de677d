use anyhow::{bail, Result};
use beehive_core::db::DbPool;
use beehive_core::status::{hive_status, readings};
use beehive_core::store::PgMeasurementStore;
use beehive_core::DataType;
use chrono::{DateTime, SecondsFormat, Utc};
use comfy_table::Table;

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    pub hive_id: i32,
}

#[derive(clap::Args, Debug)]
pub struct ReadingsArgs {
    pub hive_id: i32,
    #[arg(long)]
    pub data_type: DataType,
    /// Start of the timeframe (RFC 3339); requires --end
    #[arg(long, requires = "end")]
    pub start: Option<DateTime<Utc>>,
    /// End of the timeframe (RFC 3339); requires --start
    #[arg(long, requires = "start")]
    pub end: Option<DateTime<Utc>>,
}

pub async fn handle_status(pool: &DbPool, args: StatusArgs) -> Result<()> {
    let store = PgMeasurementStore::new(pool.clone());
    let status = hive_status(&store, args.hive_id).await?;

    let mut table = Table::new();
    table.set_header(vec!["Kind", "Value", "Recorded (UTC)"]);
    for kind in DataType::ALL {
        match status.get(kind) {
            Some(reading) => table.add_row(vec![
                kind.to_string(),
                reading.value().to_string(),
                reading.date().to_rfc3339_opts(SecondsFormat::Secs, true),
            ]),
            None => table.add_row(vec![kind.to_string(), "-".into(), "-".into()]),
        };
    }

    println!("Hive {}", status.hive_id);
    println!("{table}");
    Ok(())
}

pub async fn handle_readings(pool: &DbPool, args: ReadingsArgs) -> Result<()> {
    let range = match (args.start, args.end) {
        (Some(start), Some(end)) if start > end => {
            bail!("--start must not be later than --end");
        }
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };

    let store = PgMeasurementStore::new(pool.clone());
    let found = readings(&store, args.data_type, args.hive_id, range).await?;
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}
