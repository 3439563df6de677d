use async_trait::async_trait;
use beehive_parser::{DataType, Measurement};
use chrono::{DateTime, Utc};

use super::MeasurementStore;
use crate::db::DbPool;
use crate::error::StoreError;

/// Postgres-backed store. Each kind lives in its own table whose value
/// column is named after the kind; CHECK constraints carry the range rules.
#[derive(Debug, Clone)]
pub struct PgMeasurementStore {
    pool: DbPool,
}

impl PgMeasurementStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

type ReadingRow = (i32, DateTime<Utc>, f64);

fn into_measurement(kind: DataType, row: ReadingRow) -> Result<Measurement, StoreError> {
    let (hive_id, date, value) = row;
    Measurement::new(hive_id, date, kind, value).map_err(|rejection| StoreError::InvalidStored {
        kind: kind.as_str(),
        rejection,
    })
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn insert_many(
        &self,
        kind: DataType,
        records: &[Measurement],
    ) -> Result<u64, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let hive_ids: Vec<i32> = records.iter().map(Measurement::hive_id).collect();
        let dates: Vec<DateTime<Utc>> = records.iter().map(Measurement::date).collect();
        let values: Vec<f64> = records.iter().map(Measurement::value).collect();

        // Table and column names come from the closed DataType enum.
        let sql = format!(
            r#"
            INSERT INTO {table} (hive_id, date, {column})
            SELECT * FROM UNNEST($1::int4[], $2::timestamptz[], $3::float8[])
            "#,
            table = kind.table_name(),
            column = kind.as_str(),
        );

        let result = sqlx::query(&sql)
            .bind(hive_ids)
            .bind(dates)
            .bind(values)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn latest(
        &self,
        kind: DataType,
        hive_id: i32,
    ) -> Result<Option<Measurement>, StoreError> {
        let sql = format!(
            r#"
            SELECT hive_id, date, {column}
            FROM {table}
            WHERE hive_id = $1
            ORDER BY date DESC
            LIMIT 1
            "#,
            table = kind.table_name(),
            column = kind.as_str(),
        );

        let row: Option<ReadingRow> = sqlx::query_as(&sql)
            .bind(hive_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| into_measurement(kind, row)).transpose()
    }

    async fn within(
        &self,
        kind: DataType,
        hive_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError> {
        let sql = format!(
            r#"
            SELECT hive_id, date, {column}
            FROM {table}
            WHERE hive_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date ASC
            "#,
            table = kind.table_name(),
            column = kind.as_str(),
        );

        let rows: Vec<ReadingRow> = sqlx::query_as(&sql)
            .bind(hive_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| into_measurement(kind, row))
            .collect()
    }
}
