use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// A single file's pipeline either succeeds with a [`crate::types::NormalizedRecord`] or fails
/// with exactly one of these variants. None of them is fatal to a batch: see
/// [`crate::ingestion::batch::ingest_batch`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// Spreadsheet decoding error (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// CSV reading/writing error outside of delimiter detection (e.g. table export).
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Unrecognized extension, disabled format, or a structure no parse strategy accepted.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// None of the configured text encodings could decode the upload.
    #[error("could not decode file as text (tried {tried})")]
    Decode { tried: String },

    /// The upload parsed, but contains no data rows.
    #[error("the file is empty")]
    EmptyInput,

    /// Fewer than three usable columns.
    #[error("expected 3 columns (temperatura, umidade, co2), found {}: {found:?}", found.len())]
    InsufficientColumns { found: Vec<String> },

    /// No row has numeric values in all three fields.
    #[error("no valid numeric rows: every row is missing temperatura, umidade or co2")]
    NoValidRows,

    /// The collection site name is empty or whitespace-only.
    #[error("collection site is required")]
    MissingSite,

    /// A period label that is neither morning nor afternoon.
    #[error("unknown period '{raw}' (expected Manhã or Tarde)")]
    InvalidPeriod { raw: String },
}
