//! Delimited-text parsing with delimiter and header detection.
//!
//! Detection is an ordered list of [`DelimitedStrategy`] candidates, tried in sequence. The
//! first candidate whose parse yields at least 3 columns and at least 1 data row wins; there
//! is no scoring across candidates.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Cell, ParsedTable, Variable};

/// Default candidate delimiters, in priority order.
pub const DEFAULT_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Minimum column count a candidate parse must produce.
pub const MIN_COLUMNS: usize = 3;

/// Whether the first record is a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// First record supplies column labels.
    Header,
    /// No header; the first three columns get the semantic labels positionally.
    Headerless,
}

/// One delimiter/header combination to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedStrategy {
    pub delimiter: u8,
    pub header: HeaderMode,
}

/// Every delimiter in header mode, then every delimiter in headerless mode.
pub fn candidate_strategies(delimiters: &[u8]) -> Vec<DelimitedStrategy> {
    [HeaderMode::Header, HeaderMode::Headerless]
        .into_iter()
        .flat_map(|header| {
            delimiters
                .iter()
                .map(move |&delimiter| DelimitedStrategy { delimiter, header })
        })
        .collect()
}

/// Acceptance predicate shared by all strategies.
pub fn accepts(table: &ParsedTable) -> bool {
    table.column_count() >= MIN_COLUMNS && table.row_count() >= 1
}

/// Parse decoded text, returning the first accepted table and the strategy that produced it.
///
/// Fails with [`IngestionError::EmptyInput`] for blank text and
/// [`IngestionError::UnsupportedFormat`] when no candidate is accepted.
pub fn parse_delimited(
    text: &str,
    delimiters: &[u8],
) -> IngestionResult<(ParsedTable, DelimitedStrategy)> {
    if text.trim().is_empty() {
        return Err(IngestionError::EmptyInput);
    }

    for strategy in candidate_strategies(delimiters) {
        match parse_with_strategy(text, strategy) {
            Ok(table) if accepts(&table) => {
                tracing::debug!(
                    delimiter = %(strategy.delimiter as char).escape_default(),
                    header = ?strategy.header,
                    columns = table.column_count(),
                    rows = table.row_count(),
                    "delimiter strategy accepted"
                );
                return Ok((table, strategy));
            }
            Ok(table) => tracing::debug!(
                delimiter = %(strategy.delimiter as char).escape_default(),
                header = ?strategy.header,
                columns = table.column_count(),
                rows = table.row_count(),
                "delimiter strategy rejected"
            ),
            Err(e) => tracing::debug!(
                delimiter = %(strategy.delimiter as char).escape_default(),
                header = ?strategy.header,
                error = %e,
                "delimiter strategy failed"
            ),
        }
    }

    Err(IngestionError::UnsupportedFormat {
        message: "could not detect the CSV layout with any delimiter; try saving as .xlsx".to_string(),
    })
}

/// Parse `text` with one fixed strategy, without applying the acceptance predicate.
pub fn parse_with_strategy(text: &str, strategy: DelimitedStrategy) -> IngestionResult<ParsedTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(strategy.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in rdr.records() {
        records.push(result?);
    }

    match strategy.header {
        HeaderMode::Header => header_table(records),
        HeaderMode::Headerless => Ok(headerless_table(records)),
    }
}

fn header_table(records: Vec<csv::StringRecord>) -> IngestionResult<ParsedTable> {
    let mut iter = records.into_iter();
    let Some(header) = iter.next() else {
        return Ok(ParsedTable::new(Vec::new(), Vec::new()));
    };
    let columns: Vec<String> = header.iter().map(str::to_owned).collect();
    let width = columns.len();

    let mut rows = Vec::new();
    for (idx0, record) in iter.enumerate() {
        if record.len() > width {
            // 1-based, header is row 1.
            return Err(IngestionError::UnsupportedFormat {
                message: format!(
                    "row {} has {} fields but the header has {width}",
                    idx0 + 2,
                    record.len()
                ),
            });
        }
        rows.push(padded_row(&record, width));
    }

    Ok(ParsedTable::new(columns, rows))
}

fn headerless_table(records: Vec<csv::StringRecord>) -> ParsedTable {
    let width = records.iter().map(|r| r.len()).max().unwrap_or(0);
    let columns = (0..width)
        .map(|i| match Variable::ALL.get(i) {
            Some(v) => v.label().to_string(),
            None => format!("column_{}", i + 1),
        })
        .collect();
    let rows = records.iter().map(|r| padded_row(r, width)).collect();
    ParsedTable::new(columns, rows)
}

fn padded_row(record: &csv::StringRecord, width: usize) -> Vec<Cell> {
    (0..width)
        .map(|i| record.get(i).map(Cell::text).unwrap_or(Cell::Empty))
        .collect()
}
