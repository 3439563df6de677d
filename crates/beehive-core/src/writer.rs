use beehive_parser::{DataType, Measurement};
use serde::Serialize;
use tracing::{error, info};

use crate::store::MeasurementStore;

/// Result of one bulk write. A rejected batch is discarded as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Delivered { count: usize },
    Rejected { attempted: usize, reason: String },
}

impl BatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, BatchOutcome::Delivered { .. })
    }

    pub fn delivered(&self) -> usize {
        match self {
            BatchOutcome::Delivered { count } => *count,
            BatchOutcome::Rejected { .. } => 0,
        }
    }

    pub fn discarded(&self) -> usize {
        match self {
            BatchOutcome::Delivered { .. } => 0,
            BatchOutcome::Rejected { attempted, .. } => *attempted,
        }
    }
}

/// Submits a batch to the collection for `kind`. Store failures are logged
/// and folded into the outcome; there is no retry and no per-record replay.
pub async fn write_batch<S>(store: &S, kind: DataType, batch: &[Measurement]) -> BatchOutcome
where
    S: MeasurementStore + ?Sized,
{
    let attempted = batch.len();
    match store.insert_many(kind, batch).await {
        Ok(written) => {
            info!(
                data_type = kind.as_str(),
                attempted,
                written,
                "Inserted batch"
            );
            BatchOutcome::Delivered { count: attempted }
        }
        Err(err) => {
            error!(
                data_type = kind.as_str(),
                attempted,
                error = %err,
                "Error inserting batch, skipping batch"
            );
            BatchOutcome::Rejected {
                attempted,
                reason: err.to_string(),
            }
        }
    }
}
