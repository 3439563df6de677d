use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::{ParserError, Rejection};

/// The kind of reading a sensor file carries. The lowercase name doubles as
/// the CSV value column and the persisted value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Flow,
    Humidity,
    Temperature,
    Weight,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Flow,
        DataType::Humidity,
        DataType::Temperature,
        DataType::Weight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Flow => "flow",
            DataType::Humidity => "humidity",
            DataType::Temperature => "temperature",
            DataType::Weight => "weight",
        }
    }

    /// Name of the collection holding readings of this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            DataType::Flow => "hive_flow",
            DataType::Humidity => "hive_humidity",
            DataType::Temperature => "hive_temperature",
            DataType::Weight => "hive_weight",
        }
    }

    /// Range rule for a reading of this kind. Humidity is a percentage and
    /// weight cannot be negative; flow and temperature are unconstrained.
    pub fn validate(&self, value: f64) -> Result<(), Rejection> {
        if !value.is_finite() {
            return Err(Rejection::NotFinite);
        }
        let in_range = match self {
            DataType::Humidity => (0.0..=100.0).contains(&value),
            DataType::Weight => value >= 0.0,
            DataType::Flow | DataType::Temperature => true,
        };
        if in_range {
            Ok(())
        } else {
            Err(Rejection::OutOfRange)
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        DataType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParserError::UnknownDataType(trimmed.to_string()))
    }
}

/// One validated reading for one hive.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    hive_id: i32,
    date: DateTime<Utc>,
    kind: DataType,
    value: f64,
}

impl Measurement {
    pub fn new(
        hive_id: i32,
        date: DateTime<Utc>,
        kind: DataType,
        value: f64,
    ) -> Result<Self, Rejection> {
        kind.validate(value)?;
        Ok(Self {
            hive_id,
            date,
            kind,
            value,
        })
    }

    pub fn hive_id(&self) -> i32 {
        self.hive_id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn kind(&self) -> DataType {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

// Persisted documents are flat: the value lives under a key named after the kind.
impl Serialize for Measurement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("hiveId", &self.hive_id)?;
        map.serialize_entry(
            "date",
            &self.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        map.serialize_entry(self.kind.as_str(), &self.value)?;
        map.end()
    }
}
