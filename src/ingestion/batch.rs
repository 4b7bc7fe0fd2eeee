//! Batch ingestion: many uploads, processed one after another.
//!
//! A failure in one file never stops the others. Each outcome is collected, and the report
//! can append the successful records to a caller-owned [`RecordTable`].

use std::fmt;
use std::path::Path;

use crate::error::IngestionError;
use crate::table::RecordTable;
use crate::types::{CollectionMetadata, NormalizedRecord, RawUpload};

use super::unified::{ingest, IngestionOptions};

/// One file of a batch, with its own metadata.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub upload: RawUpload,
    pub metadata: CollectionMetadata,
}

impl BatchEntry {
    pub fn new(upload: RawUpload, metadata: CollectionMetadata) -> Self {
        Self { upload, metadata }
    }
}

/// A file that could not be ingested.
#[derive(Debug)]
pub struct FileFailure {
    /// Upload file name.
    pub filename: String,
    pub error: IngestionError,
}

impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.filename, self.error)
    }
}

/// Outcome of one batch entry.
#[derive(Debug)]
pub enum FileOutcome {
    Ingested {
        filename: String,
        record: NormalizedRecord,
    },
    Failed(FileFailure),
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Ingested { filename, .. } => filename,
            FileOutcome::Failed(f) => &f.filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Ingested { .. })
    }
}

/// Per-file outcomes of a batch, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }

    /// Successfully ingested records, in submission order.
    pub fn records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Ingested { record, .. } => Some(record),
            FileOutcome::Failed(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileFailure> {
        self.outcomes.iter().filter_map(|o| match o {
            FileOutcome::Failed(f) => Some(f),
            FileOutcome::Ingested { .. } => None,
        })
    }

    /// `"<filename>: <message>"` for every failed file.
    pub fn error_messages(&self) -> Vec<String> {
        self.failures().map(ToString::to_string).collect()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        match (self.success_count(), self.failure_count()) {
            (ok, 0) => format!("{ok} file(s) added"),
            (0, failed) => format!("{failed} file(s) failed"),
            (ok, failed) => format!("{ok} file(s) added, {failed} file(s) failed"),
        }
    }

    /// Append every successful record to `table`. Returns how many were appended.
    pub fn append_to(&self, table: &mut RecordTable) -> usize {
        let before = table.len();
        table.extend(self.records().cloned());
        table.len() - before
    }
}

/// Ingest every entry independently and sequentially.
pub fn ingest_batch<I>(entries: I, options: &IngestionOptions) -> BatchReport
where
    I: IntoIterator<Item = BatchEntry>,
{
    let outcomes = entries
        .into_iter()
        .map(|entry| ingest_entry(&entry.upload, &entry.metadata, options))
        .collect();
    finish(outcomes)
}

/// Read every path from disk and ingest it with the shared `metadata`.
///
/// A path that cannot be read becomes a failed outcome carrying the I/O error, named by the
/// path as given; the remaining paths are still processed.
pub fn ingest_paths<I, P>(paths: I, metadata: &CollectionMetadata, options: &IngestionOptions) -> BatchReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let outcomes = paths
        .into_iter()
        .map(|path| {
            let path = path.as_ref();
            match RawUpload::from_path(path) {
                Ok(upload) => ingest_entry(&upload, metadata, options),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "could not read file");
                    FileOutcome::Failed(FileFailure {
                        filename: path.display().to_string(),
                        error,
                    })
                }
            }
        })
        .collect();
    finish(outcomes)
}

fn ingest_entry(upload: &RawUpload, metadata: &CollectionMetadata, options: &IngestionOptions) -> FileOutcome {
    let filename = upload.filename.clone();
    match ingest(upload, metadata, options) {
        Ok(record) => FileOutcome::Ingested { filename, record },
        Err(error) => FileOutcome::Failed(FileFailure { filename, error }),
    }
}

fn finish(outcomes: Vec<FileOutcome>) -> BatchReport {
    let report = BatchReport { outcomes };
    tracing::info!(
        succeeded = report.success_count(),
        failed = report.failure_count(),
        "batch finished"
    );
    report
}
