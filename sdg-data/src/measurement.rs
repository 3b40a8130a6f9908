//! Parsing of uploaded rainfall files.
//!
//! A file is a delimited table with a header row and one reading per
//! station per day:
//!
//! ```text
//! Date,station,Pluvio_du_jour,Cumul_du_mois,Cumul_periode
//! 2024-01-01,جومين,5.0,5.0,5.0
//! ```
//!
//! Loading is all-or-nothing: one bad date or number rejects the file, so a
//! chart is never drawn from a silently truncated series.

use crate::date_range::DateRange;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use sdg_utils::dates::parse_observation_date;
use sdg_utils::error::DateError;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashSet, fs, io::Read, path::Path};
use thiserror::Error;

/// Errors that reject a measurement file.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read measurement file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Measurement file is empty")]
    EmptyFile,

    #[error("Missing required column `{column}` (accepted headers: {})", .accepted.join(", "))]
    MissingColumn {
        column: &'static str,
        accepted: Vec<String>,
    },

    #[error("Line {line}: {source}")]
    InvalidDate {
        line: u64,
        #[source]
        source: DateError,
    },

    #[error("Line {line}: column `{column}` has non-numeric value `{value}`")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("Line {line}: empty station label")]
    MissingStation { line: u64 },

    #[error("Line {line}: empty governorate label")]
    MissingGovernorate { line: u64 },

    #[error("Line {line}: indicator `{column}` has non-numeric value `{value}`")]
    InvalidIndicator {
        line: u64,
        column: String,
        value: String,
    },
}

/// One station reading for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub date: NaiveDate,
    /// Station name as written in the file, trimmed but not normalized
    pub station_label: String,
    /// Rainfall for the day (mm)
    pub daily_value: Option<f64>,
    /// Month-to-date cumulative rainfall (mm)
    pub month_cumulative: Option<f64>,
    /// Season-to-date cumulative rainfall (mm)
    pub period_cumulative: Option<f64>,
}

/// Accepted header names for each required column, compared ASCII
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub date: Vec<String>,
    pub station: Vec<String>,
    pub daily_value: Vec<String>,
    pub month_cumulative: Vec<String>,
    pub period_cumulative: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        ColumnMapping {
            date: names(&["Date"]),
            station: names(&["station", "station_label"]),
            daily_value: names(&["Pluvio_du_jour", "daily_value"]),
            month_cumulative: names(&["Cumul_du_mois", "month_cumulative"]),
            period_cumulative: names(&["Cumul_periode", "period_cumulative"]),
        }
    }
}

struct ColumnIndex {
    date: usize,
    station: usize,
    daily_value: usize,
    month_cumulative: usize,
    period_cumulative: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, mapping: &ColumnMapping) -> Result<Self, LoadError> {
        Ok(ColumnIndex {
            date: find_column(headers, &mapping.date, "date")?,
            station: find_column(headers, &mapping.station, "station")?,
            daily_value: find_column(headers, &mapping.daily_value, "daily_value")?,
            month_cumulative: find_column(headers, &mapping.month_cumulative, "month_cumulative")?,
            period_cumulative: find_column(
                headers,
                &mapping.period_cumulative,
                "period_cumulative",
            )?,
        })
    }
}

pub(crate) fn find_column(
    headers: &StringRecord,
    accepted: &[String],
    column: &'static str,
) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|header| {
            let header = header.trim().trim_start_matches('\u{feff}');
            accepted.iter().any(|name| name.eq_ignore_ascii_case(header))
        })
        .ok_or_else(|| LoadError::MissingColumn {
            column,
            accepted: accepted.to_vec(),
        })
}

/// Pick `,`, `;` or tab from whichever appears most in the header line.
pub(crate) fn sniff_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let count = |delimiter: u8| header.iter().filter(|b| **b == delimiter).count();
    let mut best = b',';
    for candidate in [b';', b'\t'] {
        if count(candidate) > count(best) {
            best = candidate;
        }
    }
    best
}

/// Empty, `NaN` and `NA` cells are missing readings. A decimal comma is
/// accepted when the cell has no dot.
pub(crate) fn parse_reading(raw: &str, line: u64, column: &'static str) -> Result<Option<f64>, LoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") || trimmed.eq_ignore_ascii_case("na")
    {
        return Ok(None);
    }
    let candidate = if trimmed.contains(',') && !trimmed.contains('.') {
        Cow::Owned(trimmed.replace(',', "."))
    } else {
        Cow::Borrowed(trimmed)
    };
    candidate
        .parse::<f64>()
        .map(Some)
        .map_err(|_| LoadError::InvalidNumber {
            line,
            column,
            value: trimmed.to_string(),
        })
}

/// Parses measurement uploads.
#[derive(Debug, Clone, Default)]
pub struct MeasurementLoader {
    columns: ColumnMapping,
    delimiter: Option<u8>,
}

impl MeasurementLoader {
    pub fn new() -> Self {
        MeasurementLoader::default()
    }

    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    /// Force a delimiter instead of sniffing it from the header line.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn load_path(&self, path: &Path) -> Result<MeasurementSet, LoadError> {
        let data = fs::read(path)?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        self.load_bytes(&data)
    }

    pub fn load_reader<R: Read>(&self, mut reader: R) -> Result<MeasurementSet, LoadError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.load_bytes(&data)
    }

    pub fn load_str(&self, data: &str) -> Result<MeasurementSet, LoadError> {
        self.load_bytes(data.as_bytes())
    }

    /// Parse a whole upload. Rows are returned in file order; no date
    /// filtering happens here.
    pub fn load_bytes(&self, data: &[u8]) -> Result<MeasurementSet, LoadError> {
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(LoadError::EmptyFile);
        }
        let delimiter = self.delimiter.unwrap_or_else(|| sniff_delimiter(data));
        debug!("Using delimiter {:?}", delimiter as char);

        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(data);
        let headers = rdr.headers()?.clone();
        let idx = ColumnIndex::resolve(&headers, &self.columns)?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            let date = parse_observation_date(row.get(idx.date).unwrap_or(""))
                .map_err(|source| LoadError::InvalidDate { line, source })?;
            let station_label = row.get(idx.station).unwrap_or("").trim().to_string();
            if station_label.is_empty() {
                return Err(LoadError::MissingStation { line });
            }
            records.push(MeasurementRecord {
                date,
                station_label,
                daily_value: parse_reading(row.get(idx.daily_value).unwrap_or(""), line, "daily_value")?,
                month_cumulative: parse_reading(
                    row.get(idx.month_cumulative).unwrap_or(""),
                    line,
                    "month_cumulative",
                )?,
                period_cumulative: parse_reading(
                    row.get(idx.period_cumulative).unwrap_or(""),
                    line,
                    "period_cumulative",
                )?,
            });
        }
        info!("Loaded {} measurement records", records.len());
        Ok(MeasurementSet::new(records))
    }
}

/// All rows of one upload, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementSet {
    records: Vec<MeasurementRecord>,
}

impl MeasurementSet {
    pub fn new(records: Vec<MeasurementRecord>) -> Self {
        MeasurementSet { records }
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MeasurementRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeasurementRecord> {
        self.records.iter()
    }

    /// Rows whose date falls inside the inclusive range.
    pub fn filter_range(&self, range: &DateRange) -> MeasurementSet {
        self.records
            .iter()
            .filter(|r| range.contains(&r.date))
            .cloned()
            .collect()
    }

    /// Distinct raw station labels in first-seen order.
    pub fn station_labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.station_label.as_str())
            .filter(|label| seen.insert(*label))
            .collect()
    }

    /// Earliest and latest dates present.
    pub fn period(&self) -> Option<DateRange> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some(DateRange(first, last))
    }
}

impl FromIterator<MeasurementRecord> for MeasurementSet {
    fn from_iter<I: IntoIterator<Item = MeasurementRecord>>(iter: I) -> Self {
        MeasurementSet::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MeasurementSet {
    type Item = &'a MeasurementRecord;
    type IntoIter = std::slice::Iter<'a, MeasurementRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static RAINFALL_SAMPLE: &str = include_str!("../../fixtures/rainfall-sample.csv");

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_sample_file() {
        let set = MeasurementLoader::new().load_str(RAINFALL_SAMPLE).unwrap();
        assert_eq!(set.len(), 7);

        let first = &set.records()[0];
        assert_eq!(first.date, ymd(2024, 1, 1));
        assert_eq!(first.station_label, "جومين");
        assert_eq!(first.daily_value, Some(5.0));

        // trimmed but still in presentation forms
        assert_eq!(
            set.records()[1].station_label,
            "\u{FE9F}\u{FEEE}\u{FEE3}\u{FEF4}\u{FEE6}"
        );
        assert_eq!(set.records()[4].daily_value, None);
        assert_eq!(set.records()[4].month_cumulative, Some(2.5));
        assert_eq!(set.records()[5].station_label, "بنزرت الشمالية");
    }

    #[test]
    fn test_date_filter_scenario() {
        let csv = "Date,station,Pluvio_du_jour,Cumul_du_mois,Cumul_periode\n\
                   2024-01-01,Djoumine,5.0,5.0,5.0\n\
                   2024-01-02,Djoumine,3.0,8.0,8.0\n";
        let set = MeasurementLoader::new().load_str(csv).unwrap();
        assert_eq!(set.len(), 2, "the loader itself does not filter");

        let day = ymd(2024, 1, 1);
        let filtered = set.filter_range(&DateRange(day, day));
        assert_eq!(filtered.len(), 1);
        assert_eq!(
            filtered.records()[0],
            MeasurementRecord {
                date: day,
                station_label: "Djoumine".to_string(),
                daily_value: Some(5.0),
                month_cumulative: Some(5.0),
                period_cumulative: Some(5.0),
            }
        );
    }

    #[test]
    fn test_bad_date_fails_whole_load() {
        let csv = "Date,station,Pluvio_du_jour,Cumul_du_mois,Cumul_periode\n\
                   2024-01-01,Mateur,1,1,1\n\
                   2024-01-02,Mateur,1,2,2\n\
                   yesterday,Mateur,1,3,3\n";
        match MeasurementLoader::new().load_str(csv) {
            Err(LoadError::InvalidDate { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_column_is_reported() {
        let csv = "Date,station,Pluvio_du_jour,Cumul_periode\n2024-01-01,Mateur,1,1\n";
        match MeasurementLoader::new().load_str(csv) {
            Err(LoadError::MissingColumn { column, accepted }) => {
                assert_eq!(column, "month_cumulative");
                assert!(accepted.contains(&"Cumul_du_mois".to_string()));
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_reading_fails() {
        let csv = "Date,station,Pluvio_du_jour,Cumul_du_mois,Cumul_periode\n\
                   2024-01-01,Mateur,trace,1,1\n";
        let err = MeasurementLoader::new().load_str(csv).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidNumber { line: 2, column: "daily_value", .. }
        ));
    }

    #[test]
    fn test_empty_station_fails() {
        let csv = "Date,station,Pluvio_du_jour,Cumul_du_mois,Cumul_periode\n\
                   2024-01-01,  ,1,1,1\n";
        let err = MeasurementLoader::new().load_str(csv).unwrap_err();
        assert!(matches!(err, LoadError::MissingStation { line: 2 }));
    }

    #[test]
    fn test_semicolon_file_with_decimal_commas() {
        let csv = "date;Station;daily_value;month_cumulative;period_cumulative\n\
                   2024-03-05;Beja Nord;12,5;20,0;310\n";
        let set = MeasurementLoader::new().load_str(csv).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.records()[0].daily_value, Some(12.5));
        assert_eq!(set.records()[0].period_cumulative, Some(310.0));
    }

    #[test]
    fn test_custom_columns_and_forced_delimiter() {
        let columns = ColumnMapping {
            date: vec!["jour".to_string()],
            station: vec!["poste".to_string()],
            daily_value: vec!["pluie".to_string()],
            month_cumulative: vec!["mois".to_string()],
            period_cumulative: vec!["saison".to_string()],
        };
        let csv = "poste|jour|pluie|mois|saison\nMateur|2024-02-01|4|4|44\n";
        let set = MeasurementLoader::new()
            .with_columns(columns)
            .with_delimiter(b'|')
            .load_str(csv)
            .unwrap();
        assert_eq!(set.records()[0].station_label, "Mateur");
        assert_eq!(set.records()[0].date, ymd(2024, 2, 1));
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            MeasurementLoader::new().load_str(""),
            Err(LoadError::EmptyFile)
        ));
        assert!(MeasurementLoader::new().load_str(" \n").is_err());
    }

    #[test]
    fn test_station_labels_and_period() {
        let set = MeasurementLoader::new().load_str(RAINFALL_SAMPLE).unwrap();
        let labels = set.station_labels();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[0], "جومين");
        assert_eq!(labels[4], "Djoumine");
        assert_eq!(set.period(), Some(DateRange(ymd(2023, 12, 31), ymd(2024, 1, 3))));
        assert_eq!(MeasurementSet::default().period(), None);
    }
}
