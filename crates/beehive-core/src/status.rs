use beehive_parser::{DataType, Measurement};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::MeasurementStore;

/// Latest reading of each kind for one hive. Kinds without data are `None`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveStatus {
    pub hive_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Measurement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Measurement>,
}

impl HiveStatus {
    pub fn get(&self, kind: DataType) -> Option<&Measurement> {
        match kind {
            DataType::Flow => self.flow.as_ref(),
            DataType::Humidity => self.humidity.as_ref(),
            DataType::Temperature => self.temperature.as_ref(),
            DataType::Weight => self.weight.as_ref(),
        }
    }
}

pub async fn hive_status<S>(store: &S, hive_id: i32) -> Result<HiveStatus, StoreError>
where
    S: MeasurementStore + ?Sized,
{
    Ok(HiveStatus {
        hive_id,
        flow: store.latest(DataType::Flow, hive_id).await?,
        humidity: store.latest(DataType::Humidity, hive_id).await?,
        temperature: store.latest(DataType::Temperature, hive_id).await?,
        weight: store.latest(DataType::Weight, hive_id).await?,
    })
}

/// Readings of one kind. With a range, every reading inside it (inclusive,
/// oldest first); without one, only the most recent reading.
pub async fn readings<S>(
    store: &S,
    kind: DataType,
    hive_id: i32,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<Vec<Measurement>, StoreError>
where
    S: MeasurementStore + ?Sized,
{
    match range {
        Some((start, end)) => store.within(kind, hive_id, start, end).await,
        None => Ok(store.latest(kind, hive_id).await?.into_iter().collect()),
    }
}
