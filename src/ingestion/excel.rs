#![cfg(feature = "excel")]

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{Cell, ParsedTable};

use super::unified::ExcelSheetSelection;

/// Read one sheet of an in-memory workbook (`.xlsx`, `.xls`) into a [`ParsedTable`].
///
/// Behavior:
/// - Picks the named sheet if requested; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row and keeps its labels
/// - Skips fully empty rows after the header
/// - Keeps numeric cells numeric and text cells as text
pub fn read_workbook(bytes: &[u8], selection: &ExcelSheetSelection) -> IngestionResult<ParsedTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let sheet = match selection {
        ExcelSheetSelection::First => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| IngestionError::UnsupportedFormat {
                message: "workbook has no sheets".to_string(),
            })?,
        ExcelSheetSelection::Sheet(name) => name.clone(),
    };

    let range = workbook.worksheet_range(&sheet)?;
    let table = sheet_to_table(&range)?;
    tracing::debug!(
        sheet = %sheet,
        columns = table.column_count(),
        rows = table.row_count(),
        "read worksheet"
    );
    Ok(table)
}

fn sheet_to_table(range: &calamine::Range<Data>) -> IngestionResult<ParsedTable> {
    let mut rows_iter = range
        .rows()
        .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)));

    let header = rows_iter.next().ok_or(IngestionError::EmptyInput)?;
    let columns: Vec<String> = header.iter().map(cell_to_header_string).collect();
    let width = columns.len();

    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| {
            (0..width)
                .map(|i| convert_cell(row.get(i).unwrap_or(&Data::Empty)))
                .collect()
        })
        .collect();

    if rows.is_empty() {
        return Err(IngestionError::EmptyInput);
    }
    Ok(ParsedTable::new(columns, rows))
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Cell {
    match c {
        Data::Empty => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::String(s) => Cell::text(s),
        // Booleans, dates and error cells are never valid measurements.
        other => Cell::Text(other.to_string()),
    }
}
