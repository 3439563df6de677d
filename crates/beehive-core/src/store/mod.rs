//! Persistence seam for measurement collections, one collection per kind.

mod memory;
mod postgres;

use async_trait::async_trait;
use beehive_parser::{DataType, Measurement};
use chrono::{DateTime, Utc};

use crate::error::StoreError;

pub use memory::{InMemoryStore, InsertCall};
pub use postgres::PgMeasurementStore;

#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Unordered bulk insert of `records` into the collection for `kind`.
    /// Returns the number of documents written. Any violation rejects the call.
    async fn insert_many(&self, kind: DataType, records: &[Measurement])
        -> Result<u64, StoreError>;

    /// Most recent reading of `kind` for the hive, by date.
    async fn latest(&self, kind: DataType, hive_id: i32)
        -> Result<Option<Measurement>, StoreError>;

    /// Readings of `kind` for the hive with `start <= date <= end`, oldest first.
    async fn within(
        &self,
        kind: DataType,
        hive_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError>;
}
