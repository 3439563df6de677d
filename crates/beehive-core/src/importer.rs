use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use beehive_parser::{
    DataType, MeasurementReader, ParserError, ReaderOptions, Rejection, RowOutcome,
    RowTransformer,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::batch::BatchBuffer;
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::store::MeasurementStore;
use crate::writer::{write_batch, BatchOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportState {
    Reading,
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub hive_id: i32,
    pub data_type: DataType,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_rejected: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub rejections: BTreeMap<&'static str, usize>,
    pub batches: Vec<BatchOutcome>,
    pub records_delivered: usize,
    pub records_discarded: usize,
    pub cancelled: bool,
    pub final_state: ImportState,
}

impl ImportReport {
    fn new(config: &ImportConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            hive_id: config.hive_id,
            data_type: config.data_type,
            rows_read: 0,
            rows_skipped: 0,
            rows_rejected: 0,
            rejections: BTreeMap::new(),
            batches: Vec::new(),
            records_delivered: 0,
            records_discarded: 0,
            cancelled: false,
            final_state: ImportState::Reading,
        }
    }

    fn record_rejection(&mut self, rejection: Rejection) {
        self.rows_rejected += 1;
        *self.rejections.entry(rejection.as_str()).or_insert(0) += 1;
    }

    fn record_batch(&mut self, outcome: BatchOutcome) {
        self.records_delivered += outcome.delivered();
        self.records_discarded += outcome.discarded();
        self.batches.push(outcome);
    }

    pub fn batches_rejected(&self) -> usize {
        self.batches.iter().filter(|b| !b.is_delivered()).count()
    }
}

/// Loads one delimited sensor file into the collection for one kind.
///
/// A run is strictly sequential: a full batch is written, and the write
/// awaited, before the next row is pulled from the source. The source is
/// read on the blocking pool, one row per request. Only a failure of
/// the source itself aborts the run; bad rows are dropped and rejected
/// batches are discarded.
pub struct Importer<S> {
    store: S,
    config: ImportConfig,
}

impl<S: MeasurementStore> Importer<S> {
    pub fn new(store: S, config: ImportConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub async fn import_file(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<ImportReport> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::Source {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Opened import source");
        self.run(file, cancel).await
    }

    /// Runs one import over `source`. Rows are read on the blocking pool and
    /// handed over one at a time, so waiting for the next row yields to the
    /// runtime and cancellation is observed even while the source stalls.
    pub async fn run<R: Read + Send + 'static>(
        &self,
        source: R,
        cancel: &CancellationToken,
    ) -> Result<ImportReport> {
        let kind = self.config.data_type;
        let mut report = ImportReport::new(&self.config);
        info!(
            run_id = %report.run_id,
            hive_id = self.config.hive_id,
            data_type = kind.as_str(),
            batch_size = self.config.batch_size,
            skip_interval = self.config.skip_interval,
            "Starting import"
        );

        let (pull_tx, pull_rx) = mpsc::channel(1);
        let (row_tx, mut row_rx) = mpsc::channel(1);
        let options = self.config.reader_options();
        let transformer =
            RowTransformer::new(self.config.hive_id, kind, self.config.skip_interval);
        let producer = task::spawn_blocking(move || {
            read_rows(source, options, transformer, pull_rx, row_tx)
        });
        let mut buffer = BatchBuffer::new(self.config.batch_size);

        loop {
            let next = if cancel.is_cancelled() {
                None
            } else {
                // A send error means the reader already finished; recv reports it.
                let _ = pull_tx.send(()).await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => None,
                    next = row_rx.recv() => Some(next),
                }
            };
            let Some(next) = next else {
                warn!(
                    run_id = %report.run_id,
                    rows_read = report.rows_read,
                    "Import cancelled, skipping remaining rows"
                );
                report.cancelled = true;
                break;
            };

            let row = match next {
                Some(Ok(row)) => row,
                Some(Err(err)) => {
                    let dropped = buffer.discard();
                    debug!(run_id = %report.run_id, dropped, "Dropping unflushed records");
                    return Err(self.fail(&report, err.into()));
                }
                None => {
                    if let Err(err) = producer.await {
                        buffer.discard();
                        return Err(self.fail(&report, err.into()));
                    }
                    break;
                }
            };

            report.rows_read += 1;
            match row.outcome {
                RowOutcome::Accepted(measurement) => {
                    if let Some(batch) = buffer.push(measurement) {
                        let outcome = write_batch(&self.store, kind, &batch).await;
                        report.record_batch(outcome);
                    }
                }
                RowOutcome::Skipped => report.rows_skipped += 1,
                RowOutcome::Rejected(rejection) => {
                    debug!(line = row.line, reason = %rejection, "Dropping row");
                    report.record_rejection(rejection);
                }
            }
        }
        // Closing both channels stops the reader at its next handoff.
        drop(pull_tx);
        drop(row_rx);

        report.final_state = ImportState::Draining;
        debug!(run_id = %report.run_id, pending = buffer.len(), "Draining import");
        if let Some(batch) = buffer.take_remainder() {
            let outcome = write_batch(&self.store, kind, &batch).await;
            report.record_batch(outcome);
        }

        report.final_state = ImportState::Done;
        info!(
            run_id = %report.run_id,
            rows_read = report.rows_read,
            rows_skipped = report.rows_skipped,
            rows_rejected = report.rows_rejected,
            records_delivered = report.records_delivered,
            records_discarded = report.records_discarded,
            batches = report.batches.len(),
            cancelled = report.cancelled,
            "Import finished"
        );
        Ok(report)
    }

    fn fail(&self, report: &ImportReport, err: ImportError) -> ImportError {
        warn!(
            run_id = %report.run_id,
            from = ?report.final_state,
            to = ?ImportState::Failed,
            error = %err,
            "Import failed"
        );
        err
    }
}

/// A transformed row and the source line it came from.
#[derive(Debug)]
struct SourceRow {
    outcome: RowOutcome,
    line: u64,
}

/// Reads one row per pull request, so nothing is read ahead of the driver.
fn read_rows<R: Read>(
    source: R,
    options: ReaderOptions,
    mut transformer: RowTransformer,
    mut pull: mpsc::Receiver<()>,
    rows: mpsc::Sender<std::result::Result<SourceRow, ParserError>>,
) {
    if pull.blocking_recv().is_none() {
        return;
    }
    let mut reader = match MeasurementReader::new(source, transformer.kind(), &options) {
        Ok(reader) => reader,
        Err(err) => {
            let _ = rows.blocking_send(Err(err));
            return;
        }
    };

    loop {
        let outcome = match reader.next_row() {
            Ok(Some(row)) => Ok(transformer.transform(&row)),
            Ok(None) => return,
            Err(err) => Err(err),
        };
        let failed = outcome.is_err();
        let item = outcome.map(|outcome| SourceRow {
            outcome,
            line: reader.line(),
        });
        if rows.blocking_send(item).is_err() || failed || pull.blocking_recv().is_none() {
            return;
        }
    }
}
