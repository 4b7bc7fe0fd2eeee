//! Record validation, reduction, metadata attachment and statistics.
//!
//! - [`coerce()`] / [`reduce()`]: numeric coercion with whole-row dropping, then per-variable
//!   means
//! - [`attach()`]: pairs an [`crate::types::AveragedObservation`] with date/site/period
//! - [`stats`]: summaries and chart series over accumulated records
//!
//! ## Example: reduce → attach
//!
//! ```rust
//! use air_sample_ingest::processing::{attach, reduce};
//! use air_sample_ingest::types::{Cell, ParsedTable, Period};
//! use chrono::NaiveDate;
//!
//! let table = ParsedTable::new(
//!     vec!["temperatura".into(), "umidade".into(), "co2".into()],
//!     vec![
//!         vec![Cell::Number(20.0), Cell::Number(50.0), Cell::Number(400.0)],
//!         vec![Cell::Number(22.0), Cell::Number(60.0), Cell::text("bad")],
//!     ],
//! );
//!
//! // Row 2 has a bad CO2 value, so it is excluded from all three means.
//! let obs = reduce(&table).unwrap();
//! assert_eq!(obs.humidity, 50.0);
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let record = attach(obs, date, "Biblioteca", Period::Afternoon).unwrap();
//! assert_eq!(record.co2(), 400.0);
//! ```

pub mod attach;
pub mod reduce;
pub mod stats;

pub use attach::attach;
pub use reduce::{coerce, reduce};
pub use stats::{
    compare_sites, daily_means, overview, site_ranges, summarize, SiteRanges, TableOverview,
    TableSummary, ValueRange, VariableSummary,
};
