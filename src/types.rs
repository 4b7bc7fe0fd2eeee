//! Core data model types.
//!
//! An upload ([`RawUpload`]) is parsed into a loosely-typed [`ParsedTable`], coerced into a
//! [`NumericTriple`], averaged into an [`AveragedObservation`], and finally tagged with
//! [`CollectionMetadata`] to become a [`NormalizedRecord`].

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};

/// One of the three measured variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    /// Air temperature, °C.
    Temperature,
    /// Relative humidity, %.
    Humidity,
    /// CO₂ concentration, ppm.
    Co2,
}

impl Variable {
    /// All variables in canonical (left-to-right positional) order.
    pub const ALL: [Variable; 3] = [Variable::Temperature, Variable::Humidity, Variable::Co2];

    /// Canonical column label.
    pub fn label(self) -> &'static str {
        match self {
            Variable::Temperature => "temperatura",
            Variable::Humidity => "umidade",
            Variable::Co2 => "co2",
        }
    }

    /// Human-readable name including the unit.
    pub fn display_name(self) -> &'static str {
        match self {
            Variable::Temperature => "Temperatura (°C)",
            Variable::Humidity => "Umidade (%)",
            Variable::Co2 => "CO₂ (ppm)",
        }
    }

    /// Whether a normalized (lowercase, trimmed) column label names this variable.
    pub fn matches_label(self, label: &str) -> bool {
        match self {
            Variable::Temperature => matches!(label, "temperatura" | "temperature"),
            Variable::Humidity => matches!(label, "umidade" | "humidity"),
            Variable::Co2 => matches!(label, "co2" | "co₂"),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw cell as read from the upload, before numeric coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    /// Blank cell.
    #[default]
    Empty,
    /// Numeric spreadsheet cell.
    Number(f64),
    /// Text (all delimited-text cells, and text spreadsheet cells).
    Text(String),
}

impl Cell {
    /// Build a text cell, mapping blank strings to [`Cell::Empty`].
    pub fn text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_owned())
        }
    }

    /// Coerce to a finite float. Blank, unparsable and non-finite cells yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Empty => return None,
            Cell::Number(v) => *v,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

/// Loosely-typed tabular data: labelled columns and row-major cells.
///
/// Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTable {
    /// Column labels, in file order.
    pub columns: Vec<String>,
    /// Row-major cell storage.
    pub rows: Vec<Vec<Cell>>,
}

impl ParsedTable {
    /// Create a table from labels and rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Lowercase and trim every column label.
    pub fn normalize_labels(&mut self) {
        for c in &mut self.columns {
            *c = normalize_label(c);
        }
    }

    /// Returns the index of a column by label (case-insensitive, whitespace-trimmed).
    pub fn index_of(&self, label: &str) -> Option<usize> {
        let wanted = normalize_label(label);
        self.columns.iter().position(|c| normalize_label(c) == wanted)
    }

    /// Returns the index of the column naming `variable`, if any.
    pub fn index_of_variable(&self, variable: Variable) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| variable.matches_label(&normalize_label(c)))
    }
}

pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// An uploaded file: name (carrying the extension hint) and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUpload {
    /// Original file name as supplied by the user.
    pub filename: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl RawUpload {
    /// Create an upload from a name and its contents.
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name as the upload name.
    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, bytes })
    }

    /// Lowercase file extension, if the name has one.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Parallel numeric columns; position `i` in each vector comes from the same input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericTriple {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub co2: Vec<f64>,
}

impl NumericTriple {
    /// Append one fully-valid row.
    pub fn push(&mut self, temperature: f64, humidity: f64, co2: f64) {
        self.temperature.push(temperature);
        self.humidity.push(humidity);
        self.co2.push(co2);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }

    /// Column values for one variable.
    pub fn values(&self, variable: Variable) -> &[f64] {
        match variable {
            Variable::Temperature => &self.temperature,
            Variable::Humidity => &self.humidity,
            Variable::Co2 => &self.co2,
        }
    }
}

/// Per-variable arithmetic means of one upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedObservation {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
}

impl AveragedObservation {
    pub fn get(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
            Variable::Co2 => self.co2,
        }
    }
}

/// Coarse time-of-day bucket. Morning sorts before Afternoon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "Manhã", alias = "manha", alias = "Manha", alias = "Morning")]
    Morning,
    #[serde(rename = "Tarde", alias = "tarde", alias = "Afternoon")]
    Afternoon,
}

impl Period {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Period::Morning => "Manhã",
            Period::Afternoon => "Tarde",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = IngestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manhã" | "manha" | "morning" => Ok(Period::Morning),
            "tarde" | "afternoon" => Ok(Period::Afternoon),
            _ => Err(IngestionError::InvalidPeriod { raw: s.to_owned() }),
        }
    }
}

/// User-supplied metadata for one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMetadata {
    pub date: NaiveDate,
    pub site: String,
    pub period: Period,
}

impl CollectionMetadata {
    pub fn new(date: NaiveDate, site: impl Into<String>, period: Period) -> Self {
        Self {
            date,
            site: site.into(),
            period,
        }
    }
}

/// An averaged observation tagged with date, site and period.
///
/// Only produced by [`crate::processing::attach`]; immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    temperature: f64,
    humidity: f64,
    co2: f64,
    date: NaiveDate,
    site: String,
    period: Period,
}

impl NormalizedRecord {
    /// `site` must already be trimmed and non-empty.
    pub(crate) fn from_parts(
        observation: AveragedObservation,
        date: NaiveDate,
        site: String,
        period: Period,
    ) -> Self {
        Self {
            temperature: observation.temperature,
            humidity: observation.humidity,
            co2: observation.co2,
            date,
            site,
            period,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn co2(&self) -> f64 {
        self.co2
    }

    /// Value of one variable.
    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
            Variable::Co2 => self.co2,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Chronological sort key: date, then Morning before Afternoon.
    pub fn chronological_key(&self) -> (NaiveDate, Period) {
        (self.date, self.period)
    }

    pub(crate) fn with_site(&self, site: String) -> Self {
        Self {
            site,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_coercion_rejects_text_blank_and_non_finite() {
        assert_eq!(Cell::Number(21.5).as_f64(), Some(21.5));
        assert_eq!(Cell::text(" 400 ").as_f64(), Some(400.0));
        assert_eq!(Cell::text("bad").as_f64(), None);
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::Empty.as_f64(), None);
        assert_eq!(Cell::text("NaN").as_f64(), None);
        assert_eq!(Cell::text("inf").as_f64(), None);
    }

    #[test]
    fn index_of_is_case_and_whitespace_insensitive() {
        let t = ParsedTable::new(
            vec![" CO2 ".to_string(), "Umidade".to_string(), "temperatura".to_string()],
            vec![],
        );
        assert_eq!(t.index_of("co2"), Some(0));
        assert_eq!(t.index_of("UMIDADE"), Some(1));
        assert_eq!(t.index_of_variable(Variable::Temperature), Some(2));
        assert_eq!(t.index_of("missing"), None);
    }

    #[test]
    fn period_parses_labels_and_orders_morning_first() {
        assert_eq!("Manhã".parse::<Period>().unwrap(), Period::Morning);
        assert_eq!(" manha ".parse::<Period>().unwrap(), Period::Morning);
        assert_eq!("TARDE".parse::<Period>().unwrap(), Period::Afternoon);
        assert_eq!("afternoon".parse::<Period>().unwrap(), Period::Afternoon);
        assert!(matches!(
            "noite".parse::<Period>(),
            Err(IngestionError::InvalidPeriod { .. })
        ));
        assert!(Period::Morning < Period::Afternoon);
    }

    #[test]
    fn upload_extension_is_lowercased() {
        assert_eq!(RawUpload::new("Dados.XLSX", Vec::<u8>::new()).extension().as_deref(), Some("xlsx"));
        assert_eq!(RawUpload::new("noext", Vec::<u8>::new()).extension(), None);
    }
}
