mod mapping;
mod parser;

pub use parser::RawRow;

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::domain::{Person, PredictionRow};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {source_name} source: {source}")]
    Io {
        source_name: &'static str,
        source: std::io::Error,
    },
    #[error("invalid {source_name} CSV data: {source}")]
    Csv {
        source_name: &'static str,
        source: csv::Error,
    },
}

/// Where the roster and the prediction table come from.
pub trait BulkSource: Send + Sync {
    fn roster(&self) -> Result<Vec<Person>, IngestError>;
    fn predictions(&self) -> Result<Vec<PredictionRow>, IngestError>;
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<Person>, IngestError> {
    let rows = parser::parse_table(reader).map_err(|source| IngestError::Csv {
        source_name: "roster",
        source,
    })?;
    Ok(mapping::people_from_rows(rows))
}

pub fn parse_predictions<R: Read>(reader: R) -> Result<Vec<PredictionRow>, IngestError> {
    let rows = parser::parse_table(reader).map_err(|source| IngestError::Csv {
        source_name: "predictions",
        source,
    })?;
    Ok(mapping::predictions_from_rows(rows))
}

/// CSV files on disk, re-read on every load so a reset picks up edits.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    roster_path: PathBuf,
    predictions_path: PathBuf,
}

impl CsvFileSource {
    pub fn new(roster_path: impl AsRef<Path>, predictions_path: impl AsRef<Path>) -> Self {
        Self {
            roster_path: roster_path.as_ref().to_path_buf(),
            predictions_path: predictions_path.as_ref().to_path_buf(),
        }
    }

    fn open(path: &Path, source_name: &'static str) -> Result<std::fs::File, IngestError> {
        std::fs::File::open(path).map_err(|source| IngestError::Io {
            source_name,
            source,
        })
    }
}

impl BulkSource for CsvFileSource {
    fn roster(&self) -> Result<Vec<Person>, IngestError> {
        parse_roster(Self::open(&self.roster_path, "roster")?)
    }

    fn predictions(&self) -> Result<Vec<PredictionRow>, IngestError> {
        parse_predictions(Self::open(&self.predictions_path, "predictions")?)
    }
}

/// CSV text held in memory, for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct InlineSource {
    pub roster_csv: String,
    pub predictions_csv: String,
}

impl BulkSource for InlineSource {
    fn roster(&self) -> Result<Vec<Person>, IngestError> {
        parse_roster(self.roster_csv.as_bytes())
    }

    fn predictions(&self) -> Result<Vec<PredictionRow>, IngestError> {
        parse_predictions(self.predictions_csv.as_bytes())
    }
}

/// Both datasets, with any failed source logged and replaced by an empty list.
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub people: Vec<Person>,
    pub predictions: Vec<PredictionRow>,
}

pub fn load_or_empty<S: BulkSource + ?Sized>(source: &S) -> LoadedData {
    let people = source.roster().unwrap_or_else(|err| {
        warn!(error = %err, "roster ingestion failed; continuing with an empty roster");
        Vec::new()
    });
    let predictions = source.predictions().unwrap_or_else(|err| {
        warn!(error = %err, "prediction ingestion failed; continuing without predictions");
        Vec::new()
    });

    info!(
        people = people.len(),
        predictors = predictions.len(),
        "bulk sources loaded"
    );

    LoadedData {
        people,
        predictions,
    }
}
