pub mod errors;
pub mod model;
pub mod reader;
pub mod transform;

pub use errors::{ParserError, Rejection};
pub use model::{DataType, Measurement};
pub use reader::{MeasurementReader, ReaderOptions, Row};
pub use transform::{parse_timestamp, parse_value, RowOutcome, RowTransformer};

#[cfg(test)]
mod tests;
