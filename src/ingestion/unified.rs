//! Unified single-file entry points.
//!
//! - [`normalize`] turns a [`RawUpload`] into a [`ParsedTable`] holding exactly the three
//!   semantic columns.
//! - [`ingest`] runs the whole pipeline (normalize, reduce, attach) and returns one
//!   [`NormalizedRecord`]. It is a pure function of its inputs: the caller owns any table the
//!   record is appended to.
//! - If an [`super::observability::IngestionObserver`] is configured, success/failure/alerts
//!   are reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::processing::{attach, coerce};
use crate::types::{CollectionMetadata, NormalizedRecord, ParsedTable, RawUpload};

use super::csv::{parse_delimited, DEFAULT_DELIMITERS};
use super::decode::{decode_text, TextEncoding, DEFAULT_ENCODINGS};
use super::mapping::project;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Delimited text (`.csv`); delimiter and header are detected.
    Delimited,
    /// Spreadsheet workbook (`.xlsx`, `.xls`; feature-gated behind `excel`).
    Excel,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Delimited),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }
}

impl fmt::Display for IngestionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionFormat::Delimited => f.write_str("csv"),
            IngestionFormat::Excel => f.write_str("excel"),
        }
    }
}

/// Which worksheet to read from a workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcelSheetSelection {
    /// The first sheet (default).
    #[default]
    First,
    /// A single named sheet.
    Sheet(String),
}

/// Options controlling ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct IngestionOptions {
    /// If `None`, infer the format from the file extension.
    pub format: Option<IngestionFormat>,
    /// Formats this deployment accepts. Anything else fails with `UnsupportedFormat`.
    pub accepted_formats: Vec<IngestionFormat>,
    /// Text encodings tried, in order, for delimited uploads.
    pub encodings: Vec<TextEncoding>,
    /// Candidate delimiters, in order.
    pub delimiters: Vec<u8>,
    /// Excel-specific options.
    pub excel_sheet_selection: ExcelSheetSelection,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("accepted_formats", &self.accepted_formats)
            .field("encodings", &self.encodings)
            .field("delimiters", &String::from_utf8_lossy(&self.delimiters))
            .field("excel_sheet_selection", &self.excel_sheet_selection)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            accepted_formats: vec![IngestionFormat::Delimited, IngestionFormat::Excel],
            encodings: DEFAULT_ENCODINGS.to_vec(),
            delimiters: DEFAULT_DELIMITERS.to_vec(),
            excel_sheet_selection: ExcelSheetSelection::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Normalize an upload into a table with exactly the columns `temperatura`, `umidade`, `co2`.
///
/// Fails with:
/// - `UnsupportedFormat` for an unrecognized or non-accepted extension, or delimited text
///   that no delimiter strategy could parse
/// - `Decode` when no configured encoding decodes the bytes
/// - `EmptyInput` when the upload has no data rows
/// - `InsufficientColumns` when fewer than three columns exist
///
/// # Examples
///
/// ```rust
/// use air_sample_ingest::ingestion::{normalize, IngestionOptions};
/// use air_sample_ingest::types::RawUpload;
///
/// # fn main() -> Result<(), air_sample_ingest::IngestionError> {
/// let upload = RawUpload::new("sala.csv", "co2;temperatura;umidade\n410;21.5;55\n");
/// let table = normalize(&upload, &IngestionOptions::default())?;
/// assert_eq!(table.columns, vec!["temperatura", "umidade", "co2"]);
/// assert_eq!(table.row_count(), 1);
/// # Ok(())
/// # }
/// ```
pub fn normalize(upload: &RawUpload, options: &IngestionOptions) -> IngestionResult<ParsedTable> {
    let fmt = resolve_format(upload, options)?;
    normalize_as(upload, fmt, options)
}

fn normalize_as(
    upload: &RawUpload,
    fmt: IngestionFormat,
    options: &IngestionOptions,
) -> IngestionResult<ParsedTable> {
    let mut table = match fmt {
        IngestionFormat::Delimited => {
            let (text, _) = decode_text(&upload.bytes, &options.encodings)?;
            parse_delimited(&text, &options.delimiters)?.0
        }
        IngestionFormat::Excel => read_excel_dispatch(&upload.bytes, &options.excel_sheet_selection)?,
    };

    if table.row_count() == 0 {
        return Err(IngestionError::EmptyInput);
    }

    table.normalize_labels();
    let (projected, _) = project(table)?;
    Ok(projected)
}

/// Run the full single-file pipeline: normalize, reduce to means, attach metadata.
///
/// # Examples
///
/// ```rust
/// use air_sample_ingest::ingestion::{ingest, IngestionOptions};
/// use air_sample_ingest::types::{CollectionMetadata, Period, RawUpload};
/// use chrono::NaiveDate;
///
/// # fn main() -> Result<(), air_sample_ingest::IngestionError> {
/// let upload = RawUpload::new("lab.csv", "temperatura,umidade,co2\n20,50,400\n22,60,bad\n");
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let meta = CollectionMetadata::new(date, " Lab 1 ", Period::Morning);
///
/// let record = ingest(&upload, &meta, &IngestionOptions::default())?;
/// assert_eq!(record.temperature(), 20.0);
/// assert_eq!(record.site(), "Lab 1");
/// # Ok(())
/// # }
/// ```
pub fn ingest(
    upload: &RawUpload,
    metadata: &CollectionMetadata,
    options: &IngestionOptions,
) -> IngestionResult<NormalizedRecord> {
    let mut ctx = IngestionContext {
        filename: upload.filename.clone(),
        format: None,
    };

    let result = run_pipeline(upload, metadata, options, &mut ctx);

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok((record, stats)) => obs.on_success(&ctx, *stats, record),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result.map(|(record, _)| record)
}

/// Read `path` from disk and [`ingest`] it.
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    metadata: &CollectionMetadata,
    options: &IngestionOptions,
) -> IngestionResult<NormalizedRecord> {
    let upload = RawUpload::from_path(path)?;
    ingest(&upload, metadata, options)
}

fn run_pipeline(
    upload: &RawUpload,
    metadata: &CollectionMetadata,
    options: &IngestionOptions,
    ctx: &mut IngestionContext,
) -> IngestionResult<(NormalizedRecord, IngestionStats)> {
    let fmt = resolve_format(upload, options)?;
    ctx.format = Some(fmt);

    let table = normalize_as(upload, fmt, options)?;
    let triple = coerce(&table)?;
    let stats = IngestionStats {
        rows_read: table.row_count(),
        rows_used: triple.len(),
    };
    let observation = triple.mean()?;
    let record = attach(observation, metadata.date, &metadata.site, metadata.period)?;
    Ok((record, stats))
}

fn resolve_format(upload: &RawUpload, options: &IngestionOptions) -> IngestionResult<IngestionFormat> {
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format(upload)?,
    };
    if !options.accepted_formats.contains(&fmt) {
        return Err(IngestionError::UnsupportedFormat {
            message: format!("{fmt} uploads are not accepted by this deployment"),
        });
    }
    Ok(fmt)
}

fn infer_format(upload: &RawUpload) -> IngestionResult<IngestionFormat> {
    let ext = upload
        .extension()
        .ok_or_else(|| IngestionError::UnsupportedFormat {
            message: format!("'{}' has no extension; use .xlsx, .xls or .csv", upload.filename),
        })?;

    IngestionFormat::from_extension(&ext).ok_or_else(|| IngestionError::UnsupportedFormat {
        message: format!(".{ext}; use .xlsx, .xls or .csv"),
    })
}

fn read_excel_dispatch(bytes: &[u8], sel: &ExcelSheetSelection) -> IngestionResult<ParsedTable> {
    // Avoid unused warnings when the feature is off.
    let _ = (bytes, sel);

    #[cfg(feature = "excel")]
    {
        super::excel::read_workbook(bytes, sel)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(IngestionError::UnsupportedFormat {
            message: "spreadsheet support not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
