//! Numeric coercion and averaging of a normalized [`ParsedTable`].

use crate::error::{IngestionError, IngestionResult};
use crate::types::{AveragedObservation, NumericTriple, ParsedTable, Variable};

/// Coerce the three semantic columns to numbers, keeping only fully-valid rows.
///
/// A row with a blank or non-numeric value in any of the three columns is dropped entirely,
/// so every mean is computed over the same row set.
///
/// Fails with [`IngestionError::InsufficientColumns`] if a semantic column is absent.
pub fn coerce(table: &ParsedTable) -> IngestionResult<NumericTriple> {
    let mut idx = [0usize; 3];
    for (slot, v) in idx.iter_mut().zip(Variable::ALL) {
        *slot = table
            .index_of_variable(v)
            .ok_or_else(|| IngestionError::InsufficientColumns {
                found: table.columns.clone(),
            })?;
    }

    let mut triple = NumericTriple::default();
    for row in &table.rows {
        let value = |i: usize| row.get(i).and_then(|c| c.as_f64());
        if let (Some(t), Some(h), Some(c)) = (value(idx[0]), value(idx[1]), value(idx[2])) {
            triple.push(t, h, c);
        }
    }

    let dropped = table.row_count() - triple.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = triple.len(), "dropped rows with missing values");
    }
    Ok(triple)
}

/// Reduce a normalized table to per-variable means.
///
/// Fails with [`IngestionError::NoValidRows`] when no row survives coercion.
pub fn reduce(table: &ParsedTable) -> IngestionResult<AveragedObservation> {
    coerce(table)?.mean()
}

impl NumericTriple {
    /// Arithmetic mean of each column. Fails with `NoValidRows` when empty.
    pub fn mean(&self) -> IngestionResult<AveragedObservation> {
        if self.is_empty() {
            return Err(IngestionError::NoValidRows);
        }
        Ok(AveragedObservation {
            temperature: mean_of(&self.temperature),
            humidity: mean_of(&self.humidity),
            co2: mean_of(&self.co2),
        })
    }
}

/// Arithmetic mean of a non-empty slice. Finite inputs always give a finite mean: if the
/// plain sum overflows, each value is divided before summing.
pub(crate) fn mean_of(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}
