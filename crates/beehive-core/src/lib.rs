pub mod batch;
pub mod config;
pub mod db;
pub mod error;
pub mod importer;
pub mod manifest;
pub mod status;
pub mod store;
pub mod writer;

pub use beehive_parser::{DataType, Measurement, Rejection};
