//! Metadata attachment: averaged observation + date/site/period -> record.

use chrono::NaiveDate;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{AveragedObservation, NormalizedRecord, Period};

/// Pair an observation with its collection metadata.
///
/// The site is trimmed; an empty or whitespace-only site fails with
/// [`IngestionError::MissingSite`]. No numeric transformation happens here.
pub fn attach(
    observation: AveragedObservation,
    date: NaiveDate,
    site: &str,
    period: Period,
) -> IngestionResult<NormalizedRecord> {
    let site = validate_site(site)?;
    Ok(NormalizedRecord::from_parts(observation, date, site, period))
}

/// Trimmed, non-empty site name.
pub(crate) fn validate_site(site: &str) -> IngestionResult<String> {
    let trimmed = site.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::MissingSite);
    }
    Ok(trimmed.to_owned())
}
