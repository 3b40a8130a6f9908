//! Measurement handling for the rainfall dashboard.
//!
//! Parses uploaded station time series, joins them to a resolved region by
//! normalized label, and shapes the result for charts and tables.

pub mod dashboard;
pub mod date_range;
pub mod matcher;
pub mod measurement;
pub mod statistics;

pub use date_range::DateRange;
pub use matcher::{match_region, match_region_in_range, MatchOutcome, StationMatch};
pub use measurement::{
    ColumnMapping, LoadError, MeasurementLoader, MeasurementRecord, MeasurementSet,
};
pub use statistics::{GovernorateProfile, IndicatorStat, IndicatorTable};
