//! TOML manifest describing several imports, e.g. every sensor file of a
//! season, run in one invocation.

use std::path::{Path, PathBuf};

use beehive_parser::DataType;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{
    ImportConfig, DEFAULT_BATCH_SIZE, DEFAULT_SKIP_INTERVAL, DEFAULT_TIMESTAMP_COLUMN,
};
use crate::error::{ConfigError, ManifestError};
use crate::importer::{ImportReport, Importer};
use crate::store::MeasurementStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestDefaults {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_skip_interval")]
    pub skip_interval: usize,
    #[serde(default = "default_timestamp_column")]
    pub timestamp_column: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for ManifestDefaults {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            skip_interval: DEFAULT_SKIP_INTERVAL,
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            delimiter: ',',
        }
    }
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_skip_interval() -> usize {
    DEFAULT_SKIP_INTERVAL
}

fn default_timestamp_column() -> String {
    DEFAULT_TIMESTAMP_COLUMN.to_string()
}

fn default_delimiter() -> char {
    ','
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub hive_id: i32,
    pub data_type: DataType,
    pub batch_size: Option<usize>,
    pub skip_interval: Option<usize>,
    pub timestamp_column: Option<String>,
    pub delimiter: Option<char>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    defaults: ManifestDefaults,
    #[serde(default, rename = "import")]
    imports: Vec<ManifestEntry>,
}

/// A fully resolved import: source path plus its run configuration.
#[derive(Debug, Clone)]
pub struct PlannedImport {
    pub path: PathBuf,
    pub config: ImportConfig,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub imports: Vec<PlannedImport>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&contents, base_dir)
    }

    /// Parses manifest text; relative entry paths are resolved against `base_dir`.
    pub fn parse(contents: &str, base_dir: &Path) -> Result<Self, ManifestError> {
        let file: ManifestFile = toml::from_str(contents)?;
        if file.imports.is_empty() {
            return Err(ManifestError::Empty);
        }

        let defaults = file.defaults;
        let mut imports = Vec::with_capacity(file.imports.len());
        for (index, entry) in file.imports.into_iter().enumerate() {
            let path = if entry.path.is_absolute() {
                entry.path.clone()
            } else {
                base_dir.join(&entry.path)
            };
            let invalid = |source| ManifestError::Entry {
                index,
                path: path.clone(),
                source,
            };
            let delimiter = entry.delimiter.unwrap_or(defaults.delimiter);
            if !delimiter.is_ascii() {
                return Err(invalid(ConfigError::NonAsciiDelimiter(delimiter)));
            }
            let config = ImportConfig::new(entry.hive_id, entry.data_type)
                .with_batch_size(entry.batch_size.unwrap_or(defaults.batch_size))
                .with_skip_interval(entry.skip_interval.unwrap_or(defaults.skip_interval))
                .with_timestamp_column(
                    entry
                        .timestamp_column
                        .unwrap_or_else(|| defaults.timestamp_column.clone()),
                )
                .with_delimiter(delimiter as u8);
            config.validate().map_err(invalid)?;
            imports.push(PlannedImport { path, config });
        }

        Ok(Self { imports })
    }
}

#[derive(Debug, Serialize)]
pub struct ManifestEntryResult {
    pub path: PathBuf,
    pub hive_id: i32,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ImportReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ManifestEntryResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs every planned import. A failing entry is reported and the rest still
/// run. With `parallel`, entries run concurrently, each with its own buffer.
pub async fn run_manifest<S>(
    store: S,
    manifest: &Manifest,
    parallel: bool,
    cancel: &CancellationToken,
) -> Vec<ManifestEntryResult>
where
    S: MeasurementStore + Clone + 'static,
{
    info!(entries = manifest.imports.len(), parallel, "Running import manifest");

    if !parallel {
        let mut results = Vec::with_capacity(manifest.imports.len());
        for planned in &manifest.imports {
            let result = run_planned(store.clone(), planned.clone(), cancel.clone()).await;
            results.push(result);
        }
        return results;
    }

    let mut set = JoinSet::new();
    for (index, planned) in manifest.imports.iter().cloned().enumerate() {
        let store = store.clone();
        let cancel = cancel.clone();
        set.spawn(async move { (index, run_planned(store, planned, cancel).await) });
    }

    let mut slots: Vec<Option<ManifestEntryResult>> =
        (0..manifest.imports.len()).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => error!(error = %err, "Import task panicked"),
        }
    }

    slots
        .into_iter()
        .zip(&manifest.imports)
        .map(|(slot, planned)| {
            slot.unwrap_or_else(|| ManifestEntryResult {
                path: planned.path.clone(),
                hive_id: planned.config.hive_id,
                data_type: planned.config.data_type,
                report: None,
                error: Some("import task did not complete".to_string()),
            })
        })
        .collect()
}

async fn run_planned<S: MeasurementStore>(
    store: S,
    planned: PlannedImport,
    cancel: CancellationToken,
) -> ManifestEntryResult {
    let PlannedImport { path, config } = planned;
    let hive_id = config.hive_id;
    let data_type = config.data_type;

    let outcome = match Importer::new(store, config) {
        Ok(importer) => importer.import_file(&path, &cancel).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(report) => ManifestEntryResult {
            path,
            hive_id,
            data_type,
            report: Some(report),
            error: None,
        },
        Err(err) => {
            error!(path = %path.display(), error = %err, "Error importing data");
            ManifestEntryResult {
                path,
                hive_id,
                data_type,
                report: None,
                error: Some(err.to_string()),
            }
        }
    }
}
