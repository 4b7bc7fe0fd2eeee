//! Caller-owned accumulated table of [`NormalizedRecord`]s.
//!
//! The ingestion pipeline never holds on to a table: callers append records from
//! [`crate::ingestion::ingest`] or [`crate::ingestion::BatchReport::append_to`] and own the
//! table's lifecycle (delete, rename, clear, export).

use std::collections::BTreeSet;
use std::io::{Read, Write};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::processing::attach;
use crate::processing::attach::validate_site;
use crate::types::{AveragedObservation, NormalizedRecord, Period};

/// Column order of the CSV export.
pub const EXPORT_HEADER: [&str; 6] = ["temperatura", "umidade", "co2", "data", "local", "periodo"];

/// In-memory accumulated records, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    records: Vec<NormalizedRecord>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: NormalizedRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order; a record's position is its id.
    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Remove the records at the given positions. Unknown ids are ignored; the remaining
    /// records are renumbered. Returns the number removed.
    pub fn delete_ids(&mut self, ids: &[usize]) -> usize {
        let ids: BTreeSet<usize> = ids.iter().copied().collect();
        let before = self.records.len();
        let mut pos = 0;
        self.records.retain(|_| {
            let keep = !ids.contains(&pos);
            pos += 1;
            keep
        });
        before - self.records.len()
    }

    /// Remove every record of `site`. Returns the number removed.
    pub fn delete_site(&mut self, site: &str) -> usize {
        self.remove_where(|r| r.site() == site)
    }

    /// Remove every record collected on `date`. Returns the number removed.
    pub fn delete_date(&mut self, date: NaiveDate) -> usize {
        self.remove_where(|r| r.date() == date)
    }

    fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&NormalizedRecord) -> bool,
    {
        let before = self.records.len();
        self.records.retain(|r| !predicate(r));
        before - self.records.len()
    }

    /// Rename a site across all its records. Returns the number renamed.
    ///
    /// The new name is trimmed; an empty name fails with [`IngestionError::MissingSite`].
    pub fn rename_site(&mut self, old: &str, new: &str) -> IngestionResult<usize> {
        let new = validate_site(new)?;
        let mut renamed = 0;
        for r in &mut self.records {
            if r.site() == old {
                *r = r.with_site(new.clone());
                renamed += 1;
            }
        }
        Ok(renamed)
    }

    /// Distinct site names, sorted.
    pub fn sites(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.site()).collect();
        set.into_iter().map(str::to_owned).collect()
    }

    /// Distinct collection dates, sorted.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let set: BTreeSet<NaiveDate> = self.records.iter().map(|r| r.date()).collect();
        set.into_iter().collect()
    }

    /// Records of one site in chronological order: by date, Morning before Afternoon.
    pub fn for_site(&self, site: &str) -> Vec<&NormalizedRecord> {
        let mut out: Vec<&NormalizedRecord> =
            self.records.iter().filter(|r| r.site() == site).collect();
        out.sort_by_key(|r| r.chronological_key());
        out
    }

    /// Write the table as CSV with header [`EXPORT_HEADER`] and ISO (`YYYY-MM-DD`) dates.
    pub fn write_csv<W: Write>(&self, writer: W) -> IngestionResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.records.is_empty() {
            wtr.write_record(EXPORT_HEADER)?;
        }
        for r in &self.records {
            wtr.serialize(ExportRow::from(r))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> IngestionResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| IngestionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
    }

    /// Load a table previously written by [`Self::write_csv`].
    pub fn read_csv<R: Read>(reader: R) -> IngestionResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut table = Self::new();
        for row in rdr.deserialize::<ExportRow>() {
            let row = row?;
            let observation = AveragedObservation {
                temperature: row.temperatura,
                humidity: row.umidade,
                co2: row.co2,
            };
            table.push(attach(observation, row.data, &row.local, row.periodo)?);
        }
        Ok(table)
    }
}

impl Extend<NormalizedRecord> for RecordTable {
    fn extend<T: IntoIterator<Item = NormalizedRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

impl<'a> IntoIterator for &'a RecordTable {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    temperatura: f64,
    umidade: f64,
    co2: f64,
    data: NaiveDate,
    local: String,
    periodo: Period,
}

impl From<&NormalizedRecord> for ExportRow {
    fn from(r: &NormalizedRecord) -> Self {
        Self {
            temperatura: r.temperature(),
            umidade: r.humidity(),
            co2: r.co2(),
            data: r.date(),
            local: r.site().to_owned(),
            periodo: r.period(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(site: &str, day: u32, period: Period, t: f64) -> NormalizedRecord {
        attach(
            AveragedObservation {
                temperature: t,
                humidity: 50.0,
                co2: 400.0,
            },
            NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            site,
            period,
        )
        .unwrap()
    }

    fn sample() -> RecordTable {
        let mut t = RecordTable::new();
        t.extend([
            rec("Sala", 2, Period::Morning, 1.0),
            rec("Sala", 1, Period::Afternoon, 2.0),
            rec("Pátio", 1, Period::Morning, 3.0),
            rec("Sala", 1, Period::Morning, 4.0),
        ]);
        t
    }

    #[test]
    fn for_site_is_chronological_with_morning_first() {
        let t = sample();
        let temps: Vec<f64> = t.for_site("Sala").iter().map(|r| r.temperature()).collect();
        assert_eq!(temps, vec![4.0, 2.0, 1.0]);
        assert!(t.for_site("nowhere").is_empty());
    }

    #[test]
    fn delete_by_ids_site_and_date() {
        let mut t = sample();
        assert_eq!(t.delete_ids(&[0, 2, 2, 99]), 2);
        assert_eq!(t.len(), 2);
        assert_eq!(t.records()[0].temperature(), 2.0);

        let mut t = sample();
        assert_eq!(t.delete_site("Sala"), 3);
        assert_eq!(t.sites(), vec!["Pátio".to_string()]);

        let mut t = sample();
        assert_eq!(t.delete_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()), 3);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn rename_site_trims_and_rejects_blank() {
        let mut t = sample();
        assert_eq!(t.rename_site("Sala", "  Sala 101 ").unwrap(), 3);
        assert_eq!(t.sites(), vec!["Pátio".to_string(), "Sala 101".to_string()]);
        assert!(matches!(t.rename_site("Pátio", " "), Err(IngestionError::MissingSite)));
    }

    #[test]
    fn csv_export_has_fixed_columns_and_round_trips() {
        let mut t = RecordTable::new();
        t.push(rec("Pátio", 3, Period::Afternoon, 21.5));
        let csv = t.to_csv_string().unwrap();
        assert_eq!(
            csv,
            "temperatura,umidade,co2,data,local,periodo\n21.5,50.0,400.0,2024-06-03,Pátio,Tarde\n"
        );

        let back = RecordTable::read_csv(csv.as_bytes()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn empty_export_still_has_header() {
        let csv = RecordTable::new().to_csv_string().unwrap();
        assert_eq!(csv, "temperatura,umidade,co2,data,local,periodo\n");
    }

    #[test]
    fn dates_are_sorted_and_unique() {
        let t = sample();
        assert_eq!(
            t.dates(),
            vec![
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
            ]
        );
    }

    #[test]
    fn clear_empties_table() {
        let mut t = sample();
        t.clear();
        assert!(t.is_empty());
        assert!(t.sites().is_empty());
    }
}
