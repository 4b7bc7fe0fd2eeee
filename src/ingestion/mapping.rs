//! Column-to-field mapping.
//!
//! Name matching takes priority: if all three variables are found by label, those columns are
//! selected regardless of order. Otherwise the first three columns are taken positionally as
//! temperature, humidity and CO₂, and any trailing columns are discarded.

use crate::error::{IngestionError, IngestionResult};
use crate::types::{ParsedTable, Variable};

use super::csv::MIN_COLUMNS;

/// How the three semantic columns were located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMapping {
    /// Source column indexes for temperature, humidity and CO₂, found by label.
    ByName([usize; 3]),
    /// First three columns, left to right.
    Positional,
}

impl ColumnMapping {
    /// Source column indexes in variable order.
    pub fn indexes(self) -> [usize; 3] {
        match self {
            ColumnMapping::ByName(idx) => idx,
            ColumnMapping::Positional => [0, 1, 2],
        }
    }
}

/// Decide the mapping for a table whose labels are already normalized.
pub fn resolve_mapping(table: &ParsedTable) -> IngestionResult<ColumnMapping> {
    let found = Variable::ALL.map(|v| table.index_of_variable(v));
    if let [Some(t), Some(h), Some(c)] = found {
        return Ok(ColumnMapping::ByName([t, h, c]));
    }

    if table.column_count() >= MIN_COLUMNS {
        Ok(ColumnMapping::Positional)
    } else {
        Err(IngestionError::InsufficientColumns {
            found: table.columns.clone(),
        })
    }
}

/// Project `table` onto exactly the three semantic columns, relabelled canonically.
pub fn project(table: ParsedTable) -> IngestionResult<(ParsedTable, ColumnMapping)> {
    let mapping = resolve_mapping(&table)?;
    let idx = mapping.indexes();
    tracing::debug!(?mapping, columns = ?table.columns, "mapped columns");

    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            idx.iter()
                .map(|&i| row.get_mut(i).map(std::mem::take).unwrap_or_default())
                .collect()
        })
        .collect();

    let columns = Variable::ALL.iter().map(|v| v.label().to_string()).collect();
    Ok((ParsedTable::new(columns, rows), mapping))
}
