//! `air-sample-ingest` turns uploaded environmental measurement files (temperature, humidity,
//! CO₂) into one averaged, site-tagged [`types::NormalizedRecord`] per file.
//!
//! The primary entrypoint is [`ingestion::ingest`], a pure function of one upload, its
//! metadata and [`ingestion::IngestionOptions`]. Several files are handled with
//! [`ingestion::ingest_batch`], where a failing file never aborts the others.
//!
//! ## What you can ingest
//!
//! **File formats (auto-detected by extension):**
//!
//! - **Delimited text**: `.csv`, with the delimiter (`,` `;` tab `|`), header presence and text
//!   encoding (UTF-8, Windows-1252, Latin-1) detected automatically
//! - **Excel/workbooks** (Cargo feature `excel`, on by default): `.xlsx`, `.xls`
//!
//! **Columns:**
//!
//! If the columns `temperatura`, `umidade` and `co2` (or `temperature`, `humidity`, `co₂`) are all
//! present, they are selected by name in any order. Otherwise the first three columns are taken
//! positionally as temperature, humidity and CO₂.
//!
//! **Rows:** a row with a blank or non-numeric value in any of the three columns is dropped
//! entirely; the means are computed over the remaining rows.
//!
//! ## Quick example: ingest a batch
//!
//! ```rust
//! use air_sample_ingest::ingestion::{ingest_batch, BatchEntry, IngestionOptions};
//! use air_sample_ingest::table::RecordTable;
//! use air_sample_ingest::types::{CollectionMetadata, Period, RawUpload};
//! use chrono::NaiveDate;
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let entries = vec![
//!     BatchEntry::new(
//!         RawUpload::new("manha.csv", "temperatura;umidade;co2\n21;55;410\n23;57;430\n"),
//!         CollectionMetadata::new(day, "Sala 1", Period::Morning),
//!     ),
//!     BatchEntry::new(
//!         RawUpload::new("tarde.pdf", "not a table"),
//!         CollectionMetadata::new(day, "Sala 1", Period::Afternoon),
//!     ),
//! ];
//!
//! let report = ingest_batch(entries, &IngestionOptions::default());
//! assert_eq!(report.success_count(), 1);
//! assert_eq!(report.failure_count(), 1);
//!
//! let mut table = RecordTable::new();
//! report.append_to(&mut table);
//! assert_eq!(table.for_site("Sala 1")[0].temperature(), 22.0);
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: input normalization, single-file and batch entrypoints, observers
//! - [`processing`]: numeric reduction, metadata attachment, summary statistics
//! - [`table`]: caller-owned accumulated record table and CSV export
//! - [`types`]: upload, table and record types
//! - [`error`]: error type shared by every stage

pub mod error;
pub mod ingestion;
pub mod processing;
pub mod table;
pub mod types;

pub use error::{IngestionError, IngestionResult};
