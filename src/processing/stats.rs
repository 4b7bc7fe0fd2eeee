//! Summary statistics and chart series over accumulated records.
//!
//! Every function accepts any iterator of record references, so the same code serves the
//! whole table and a single site (see [`crate::table::RecordTable::for_site`]).

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{AveragedObservation, NormalizedRecord, Period, Variable};

use super::reduce::mean_of;

/// Statistics of one variable across records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariableSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` with fewer than two records.
    pub std_dev: Option<f64>,
}

impl VariableSummary {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = mean_of(values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let std_dev = (values.len() > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            if ss.is_finite() {
                return (ss / (n - 1.0)).sqrt();
            }
            // Rescale by the largest magnitude so the squares cannot overflow.
            let scale = min.abs().max(max.abs());
            let ss: f64 = values.iter().map(|v| (v / scale - mean / scale).powi(2)).sum();
            scale * (ss / (n - 1.0)).sqrt()
        });
        Some(Self {
            mean,
            min,
            max,
            std_dev,
        })
    }
}

/// Per-variable statistics for a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableSummary {
    pub count: usize,
    pub temperature: VariableSummary,
    pub humidity: VariableSummary,
    pub co2: VariableSummary,
}

impl TableSummary {
    pub fn get(&self, variable: Variable) -> &VariableSummary {
        match variable {
            Variable::Temperature => &self.temperature,
            Variable::Humidity => &self.humidity,
            Variable::Co2 => &self.co2,
        }
    }
}

/// Mean/min/max/std of each variable. `None` for an empty record set.
pub fn summarize<'a, I>(records: I) -> Option<TableSummary>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let records: Vec<&NormalizedRecord> = records.into_iter().collect();
    let column = |v: Variable| -> Vec<f64> { records.iter().map(|r| r.value(v)).collect() };

    Some(TableSummary {
        count: records.len(),
        temperature: VariableSummary::from_values(&column(Variable::Temperature))?,
        humidity: VariableSummary::from_values(&column(Variable::Humidity))?,
        co2: VariableSummary::from_values(&column(Variable::Co2))?,
    })
}

/// Record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOverview {
    pub total: usize,
    pub distinct_sites: usize,
    pub distinct_dates: usize,
    /// Counts per period, Morning first.
    pub per_period: Vec<(Period, usize)>,
    /// Counts per site, most records first (ties by name).
    pub per_site: Vec<(String, usize)>,
}

pub fn overview<'a, I>(records: I) -> TableOverview
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut total = 0;
    let mut dates = BTreeSet::new();
    let mut periods: BTreeMap<Period, usize> = BTreeMap::new();
    let mut sites: BTreeMap<&str, usize> = BTreeMap::new();

    for r in records {
        total += 1;
        dates.insert(r.date());
        *periods.entry(r.period()).or_default() += 1;
        *sites.entry(r.site()).or_default() += 1;
    }

    let mut per_site: Vec<(String, usize)> =
        sites.into_iter().map(|(s, n)| (s.to_string(), n)).collect();
    per_site.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    TableOverview {
        total,
        distinct_sites: per_site.len(),
        distinct_dates: dates.len(),
        per_period: periods.into_iter().collect(),
        per_site,
    }
}

/// Smallest and largest value seen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    fn widen(self, v: f64) -> Self {
        Self {
            min: self.min.min(v),
            max: self.max.max(v),
        }
    }
}

/// Min/max of every variable within one site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteRanges {
    pub temperature: ValueRange,
    pub humidity: ValueRange,
    pub co2: ValueRange,
}

impl SiteRanges {
    fn from_record(r: &NormalizedRecord) -> Self {
        let point = |v| ValueRange {
            min: r.value(v),
            max: r.value(v),
        };
        Self {
            temperature: point(Variable::Temperature),
            humidity: point(Variable::Humidity),
            co2: point(Variable::Co2),
        }
    }

    fn widen(self, r: &NormalizedRecord) -> Self {
        Self {
            temperature: self.temperature.widen(r.temperature()),
            humidity: self.humidity.widen(r.humidity()),
            co2: self.co2.widen(r.co2()),
        }
    }

    pub fn get(&self, variable: Variable) -> ValueRange {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Humidity => self.humidity,
            Variable::Co2 => self.co2,
        }
    }
}

/// Per-site min/max of each variable, keyed by site name.
pub fn site_ranges<'a, I>(records: I) -> BTreeMap<String, SiteRanges>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut out: BTreeMap<String, SiteRanges> = BTreeMap::new();
    for r in records {
        out.entry(r.site().to_string())
            .and_modify(|ranges| *ranges = ranges.widen(r))
            .or_insert_with(|| SiteRanges::from_record(r));
    }
    out
}

/// Mean of each variable per date, in chronological order.
pub fn daily_means<'a, I>(records: I) -> Vec<(NaiveDate, AveragedObservation)>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, [Vec<f64>; 3]> = BTreeMap::new();
    for r in records {
        let columns = by_date.entry(r.date()).or_default();
        for (column, v) in columns.iter_mut().zip(Variable::ALL) {
            column.push(r.value(v));
        }
    }

    by_date
        .into_iter()
        .map(|(date, [t, h, c])| {
            (
                date,
                AveragedObservation {
                    temperature: mean_of(&t),
                    humidity: mean_of(&h),
                    co2: mean_of(&c),
                },
            )
        })
        .collect()
}

/// Mean of one variable per site, highest first.
pub fn compare_sites<'a, I>(records: I, variable: Variable) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut acc: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in records {
        acc.entry(r.site()).or_default().push(r.value(variable));
    }

    let mut out: Vec<(String, f64)> = acc
        .into_iter()
        .map(|(site, values)| (site.to_string(), mean_of(&values)))
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::attach;

    fn rec(site: &str, day: u32, period: Period, t: f64, h: f64, c: f64) -> NormalizedRecord {
        attach(
            AveragedObservation {
                temperature: t,
                humidity: h,
                co2: c,
            },
            NaiveDate::from_ymd_opt(2024, 4, day).unwrap(),
            site,
            period,
        )
        .unwrap()
    }

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            rec("A", 2, Period::Afternoon, 24.0, 50.0, 500.0),
            rec("A", 1, Period::Morning, 20.0, 60.0, 400.0),
            rec("B", 1, Period::Morning, 22.0, 70.0, 450.0),
        ]
    }

    #[test]
    fn summarize_uses_sample_std() {
        let s = summarize(&sample()).unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.temperature.mean, 22.0);
        assert_eq!(s.temperature.min, 20.0);
        assert_eq!(s.temperature.max, 24.0);
        assert_eq!(s.temperature.std_dev, Some(2.0));
        assert_eq!(s.get(Variable::Co2).max, 500.0);
    }

    #[test]
    fn summarize_single_and_empty() {
        let one = vec![rec("A", 1, Period::Morning, 20.0, 60.0, 400.0)];
        assert_eq!(summarize(&one).unwrap().humidity.std_dev, None);
        assert!(summarize(&Vec::<NormalizedRecord>::new()).is_none());
    }

    #[test]
    fn overview_counts() {
        let o = overview(&sample());
        assert_eq!(o.total, 3);
        assert_eq!(o.distinct_sites, 2);
        assert_eq!(o.distinct_dates, 2);
        assert_eq!(o.per_period, vec![(Period::Morning, 2), (Period::Afternoon, 1)]);
        assert_eq!(o.per_site, vec![("A".to_string(), 2), ("B".to_string(), 1)]);
    }

    #[test]
    fn ranges_daily_means_and_comparison() {
        let records = sample();
        let ranges = site_ranges(&records);
        assert_eq!(ranges["A"].temperature, ValueRange { min: 20.0, max: 24.0 });
        assert_eq!(ranges["B"].get(Variable::Co2), ValueRange { min: 450.0, max: 450.0 });

        let daily = daily_means(&records);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].0, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(daily[0].1.temperature, 21.0);
        assert_eq!(daily[1].1.co2, 500.0);

        let cmp = compare_sites(&records, Variable::Humidity);
        assert_eq!(cmp, vec![("B".to_string(), 70.0), ("A".to_string(), 55.0)]);
    }

    #[test]
    fn aggregates_near_f64_max_stay_finite() {
        let records = vec![
            rec("A", 1, Period::Morning, 1e308, 50.0, 400.0),
            rec("A", 1, Period::Afternoon, 1e308, 50.0, 400.0),
            rec("B", 2, Period::Morning, -1e308, 50.0, 400.0),
        ];

        let s = summarize(&records).unwrap();
        assert!(s.temperature.mean.is_finite());
        assert!(s.temperature.std_dev.unwrap().is_finite());

        let daily = daily_means(&records);
        assert_eq!(daily[0].1.temperature, 1e308);

        let cmp = compare_sites(&records, Variable::Temperature);
        assert_eq!(cmp[0], ("A".to_string(), 1e308));
    }
}
