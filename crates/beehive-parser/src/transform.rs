use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::errors::Rejection;
use crate::model::{DataType, Measurement};
use crate::reader::Row;

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(Measurement),
    /// Not selected by the skip interval; this is not a failure.
    Skipped,
    Rejected(Rejection),
}

/// Turns raw rows into measurements for one hive and one kind.
///
/// The transformer keeps a running 1-based row ordinal. With a skip interval
/// of `k > 1`, only rows whose ordinal is divisible by `k` are considered.
#[derive(Debug, Clone)]
pub struct RowTransformer {
    hive_id: i32,
    kind: DataType,
    skip_interval: usize,
    ordinal: usize,
}

impl RowTransformer {
    pub fn new(hive_id: i32, kind: DataType, skip_interval: usize) -> Self {
        Self {
            hive_id,
            kind,
            skip_interval: skip_interval.max(1),
            ordinal: 0,
        }
    }

    pub fn kind(&self) -> DataType {
        self.kind
    }

    /// Number of rows offered so far, skipped ones included.
    pub fn rows_seen(&self) -> usize {
        self.ordinal
    }

    pub fn transform(&mut self, row: &Row<'_>) -> RowOutcome {
        self.ordinal += 1;
        if self.skip_interval > 1 && self.ordinal % self.skip_interval != 0 {
            return RowOutcome::Skipped;
        }

        let (Some(raw_timestamp), Some(raw_value)) = (row.timestamp, row.value) else {
            return RowOutcome::Rejected(Rejection::MissingField);
        };
        let (Ok(raw_timestamp), Ok(raw_value)) =
            (std::str::from_utf8(raw_timestamp), std::str::from_utf8(raw_value))
        else {
            return RowOutcome::Rejected(Rejection::InvalidEncoding);
        };

        let Some(date) = parse_timestamp(raw_timestamp) else {
            return RowOutcome::Rejected(Rejection::InvalidTimestamp);
        };
        let Some(value) = parse_value(raw_value) else {
            return RowOutcome::Rejected(Rejection::InvalidNumber);
        };

        match Measurement::new(self.hive_id, date, self.kind, value) {
            Ok(measurement) => RowOutcome::Accepted(measurement),
            Err(rejection) => RowOutcome::Rejected(rejection),
        }
    }
}

/// Parses a sensor timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    static NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Parses a reading. Empty cells, `NaN` and text that is not a number yield
/// `None`. Infinities parse and are left to the range rule.
pub fn parse_value(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}
