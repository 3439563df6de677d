use std::fmt;

use thiserror::Error;

/// Why a single source row was dropped. Row-level defects are never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    MissingField,
    InvalidEncoding,
    InvalidTimestamp,
    InvalidNumber,
    NotFinite,
    OutOfRange,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::MissingField => "missing_field",
            Rejection::InvalidEncoding => "invalid_encoding",
            Rejection::InvalidTimestamp => "invalid_timestamp",
            Rejection::InvalidNumber => "invalid_number",
            Rejection::NotFinite => "not_finite",
            Rejection::OutOfRange => "out_of_range",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("unknown data type '{0}' (expected flow, humidity, temperature or weight)")]
    UnknownDataType(String),

    #[error("header row is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}
