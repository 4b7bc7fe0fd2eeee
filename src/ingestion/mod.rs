//! Input normalization and ingestion entrypoints.
//!
//! Most callers should use [`ingest`] (from [`unified`]) for a single file, or
//! [`ingest_batch`] / [`ingest_paths`] for several files. They all:
//!
//! - auto-detect format by file extension (or you can override via [`IngestionOptions`])
//! - reduce each upload to one [`crate::types::NormalizedRecord`]
//! - optionally report success/failure/alerts to an [`IngestionObserver`]
//!
//! The normalizer stages are also available on their own:
//! - [`decode`]: text encoding fallback chain
//! - [`csv`]: delimiter/header detection
//! - [`excel`]: workbook reading (feature `excel`)
//! - [`mapping`]: column-to-field mapping

pub mod batch;
pub mod csv;
pub mod decode;
#[cfg(feature = "excel")]
pub mod excel;
pub mod mapping;
pub mod observability;
pub mod unified;

pub use batch::{ingest_batch, ingest_paths, BatchEntry, BatchReport, FileFailure, FileOutcome};
pub use decode::TextEncoding;
pub use mapping::ColumnMapping;
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use unified::{
    ingest, ingest_from_path, normalize, ExcelSheetSelection, IngestionFormat, IngestionOptions,
};
