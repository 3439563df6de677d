// crates/beehive-core/src/error.rs

use std::path::PathBuf;

use beehive_parser::{ParserError, Rejection};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("{count} of {attempted} documents violate the {kind} schema")]
    Constraint {
        kind: &'static str,
        attempted: usize,
        count: usize,
    },

    #[error("stored {kind} reading failed validation: {rejection}")]
    InvalidStored {
        kind: &'static str,
        rejection: Rejection,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("skip interval must be at least 1")]
    ZeroSkipInterval,

    #[error("delimiter '{0}' must be a single ASCII character")]
    NonAsciiDelimiter(char),
}

/// Failures that abort an import run. Row and batch defects never end up here.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid import configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to open source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read source: {0}")]
    Parse(#[from] ParserError),

    #[error("source reader task failed: {0}")]
    Reader(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("manifest entry {index} ({path}) is invalid: {source}")]
    Entry {
        index: usize,
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error("manifest does not list any imports")]
    Empty,
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
