use beehive_parser::{DataType, ReaderOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_SKIP_INTERVAL: usize = 1;
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";

/// Parameters of a single import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub hive_id: i32,
    pub data_type: DataType,
    pub batch_size: usize,
    pub skip_interval: usize,
    pub timestamp_column: String,
    pub delimiter: u8,
}

impl ImportConfig {
    pub fn new(hive_id: i32, data_type: DataType) -> Self {
        Self {
            hive_id,
            data_type,
            batch_size: DEFAULT_BATCH_SIZE,
            skip_interval: DEFAULT_SKIP_INTERVAL,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            delimiter: b',',
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_skip_interval(mut self, skip_interval: usize) -> Self {
        self.skip_interval = skip_interval;
        self
    }

    pub fn with_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.timestamp_column = column.into();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.skip_interval == 0 {
            return Err(ConfigError::ZeroSkipInterval);
        }
        Ok(())
    }

    pub(crate) fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            timestamp_column: self.timestamp_column.clone(),
            delimiter: self.delimiter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_importer_contract() {
        let config = ImportConfig::new(2, DataType::Weight);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.skip_interval, 1);
        assert_eq!(config.timestamp_column, "timestamp");
        assert_eq!(config.delimiter, b',');
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let config = ImportConfig::new(2, DataType::Weight).with_batch_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroBatchSize));

        let config = ImportConfig::new(2, DataType::Weight).with_skip_interval(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSkipInterval));
    }
}
