//! Per-governorate indicator tables and how one governorate compares with
//! the whole country.
//!
//! A table has one row per governorate and one numeric column per
//! indicator (olive trees, date palms, forest area, ...):
//!
//! ```text
//! GOUVERNORAT;OLIVIER;PALMIER_DATTIER;foret
//! Bizerte;1500000;0;55000
//! ```
//!
//! Rows are joined to a clicked governorate by normalized, case-folded
//! label, since indicator sheets are often typed in capitals.

use crate::measurement::{find_column, parse_reading, sniff_delimiter, LoadError};
use csv::ReaderBuilder;
use log::{debug, info};
use sdg_geo::Region;
use sdg_utils::text::normalize;
use serde::Serialize;
use std::{fs, path::Path};

/// Accepted headers for the governorate label column.
pub const GOVERNORATE_COLUMNS: [&str; 4] = ["GOUVERNORAT", "governorate", "gouv_fr", "gouv_ar"];

fn folded(label: &str) -> String {
    normalize(label).to_lowercase()
}

/// One governorate's row of an indicator table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorateRow {
    pub label: String,
    /// One value per indicator, in column order
    pub values: Vec<Option<f64>>,
}

/// A governorate's value for one indicator next to the national figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStat {
    pub indicator: String,
    pub value: Option<f64>,
    pub national_total: f64,
    /// Percentage of the national total, when both are known and the
    /// total is positive
    pub share_percent: Option<f64>,
    /// 1 for the largest value; ties share the best rank
    pub rank: Option<usize>,
    /// Number of governorates with a value for this indicator
    pub ranked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorateProfile {
    pub governorate: String,
    pub stats: Vec<IndicatorStat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorTable {
    indicators: Vec<String>,
    rows: Vec<GovernorateRow>,
}

impl IndicatorTable {
    pub fn load_path(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read(path)?;
        debug!("Read {} bytes from {}", data.len(), path.display());
        Self::load_bytes(&data)
    }

    pub fn load_str(data: &str) -> Result<Self, LoadError> {
        Self::load_bytes(data.as_bytes())
    }

    /// Parse a whole table. Every column other than the governorate label
    /// is an indicator; one bad number rejects the file.
    pub fn load_bytes(data: &[u8]) -> Result<Self, LoadError> {
        if data.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(LoadError::EmptyFile);
        }
        let mut rdr = ReaderBuilder::new()
            .delimiter(sniff_delimiter(data))
            .has_headers(true)
            .flexible(true)
            .from_reader(data);
        let headers = rdr.headers()?.clone();
        let accepted: Vec<String> = GOVERNORATE_COLUMNS.iter().map(|s| s.to_string()).collect();
        let label_idx = find_column(&headers, &accepted, "governorate")?;

        let columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .map(|(i, h)| (i, h.trim().trim_start_matches('\u{feff}').to_string()))
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let label = record.get(label_idx).unwrap_or("").trim().to_string();
            if label.is_empty() {
                return Err(LoadError::MissingGovernorate { line });
            }
            let values = columns
                .iter()
                .map(|(i, name)| {
                    let raw = record.get(*i).unwrap_or("");
                    parse_reading(raw, line, "indicator").map_err(|_| LoadError::InvalidIndicator {
                        line,
                        column: name.clone(),
                        value: raw.trim().to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(GovernorateRow { label, values });
        }
        info!(
            "Loaded {} indicators for {} governorates",
            columns.len(),
            rows.len()
        );
        Ok(IndicatorTable {
            indicators: columns.into_iter().map(|(_, name)| name).collect(),
            rows,
        })
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn rows(&self) -> &[GovernorateRow] {
        &self.rows
    }

    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.indicators
            .iter()
            .position(|i| i.eq_ignore_ascii_case(name.trim()))
    }

    /// Sum of the known values of one indicator.
    pub fn total(&self, indicator: usize) -> f64 {
        self.column(indicator).map(|(_, v)| v).sum()
    }

    /// The `n` largest values of one indicator, largest first. Equal values
    /// keep table order.
    pub fn top(&self, indicator: usize, n: usize) -> Vec<(&str, f64)> {
        let mut values: Vec<(&str, f64)> = self.column(indicator).collect();
        values.sort_by(|a, b| b.1.total_cmp(&a.1));
        values.truncate(n);
        values
    }

    /// Row whose label matches, ignoring case and Arabic presentation.
    pub fn find(&self, label: &str) -> Option<&GovernorateRow> {
        let wanted = folded(label);
        self.rows.iter().find(|row| folded(&row.label) == wanted)
    }

    /// Row for a governorate region, by its local label and then its alt label.
    pub fn find_region(&self, region: &Region) -> Option<&GovernorateRow> {
        self.find(&region.name_local)
            .or_else(|| region.name_alt.as_deref().and_then(|alt| self.find(alt)))
    }

    /// Every indicator of `row` against the national figures.
    pub fn profile(&self, row: &GovernorateRow) -> GovernorateProfile {
        let stats = self
            .indicators
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = row.values.get(i).copied().flatten();
                let national_total = self.total(i);
                IndicatorStat {
                    indicator: name.clone(),
                    value,
                    national_total,
                    share_percent: value
                        .filter(|_| national_total > 0.0)
                        .map(|v| v / national_total * 100.0),
                    rank: value.map(|v| 1 + self.column(i).filter(|(_, other)| *other > v).count()),
                    ranked: self.column(i).count(),
                }
            })
            .collect();
        GovernorateProfile {
            governorate: row.label.clone(),
            stats,
        }
    }

    fn column(&self, indicator: usize) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rows.iter().filter_map(move |row| {
            row.values
                .get(indicator)
                .copied()
                .flatten()
                .map(|v| (row.label.as_str(), v))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};
    use sdg_geo::Tier;

    static INDICATORS_SAMPLE: &str = include_str!("../../fixtures/governorate-indicators-sample.csv");

    fn sample() -> IndicatorTable {
        IndicatorTable::load_str(INDICATORS_SAMPLE).unwrap()
    }

    fn stat<'a>(profile: &'a GovernorateProfile, indicator: &str) -> &'a IndicatorStat {
        profile
            .stats
            .iter()
            .find(|s| s.indicator == indicator)
            .unwrap()
    }

    #[test]
    fn test_load_sample() {
        let table = sample();
        assert_eq!(
            table.indicators(),
            ["OLIVIER", "PALMIER_DATTIER", "arboriculture", "foret"]
        );
        assert_eq!(table.rows().len(), 6);
        assert_eq!(table.rows()[2].values[3], None);
        assert_eq!(table.indicator_index("olivier"), Some(0));
    }

    #[test]
    fn test_national_share_and_rank() {
        let table = sample();
        let bizerte = table.profile(table.find("Bizerte").unwrap());
        assert_eq!(bizerte.governorate, "BIZERTE");

        let olives = stat(&bizerte, "OLIVIER");
        assert_eq!(olives.national_total, 17_300_000.0);
        assert!((olives.share_percent.unwrap() - 8.670).abs() < 0.001);
        assert_eq!(olives.rank, Some(4));
        assert_eq!(olives.ranked, 6);
    }

    #[test]
    fn test_ties_share_the_best_rank() {
        let table = sample();
        let palms = |name: &str| stat(&table.profile(table.find(name).unwrap()), "PALMIER_DATTIER").rank;
        assert_eq!(palms("Kebili"), Some(1));
        assert_eq!(palms("Medenine"), Some(3));
        assert_eq!(palms("Bizerte"), Some(4));
        assert_eq!(palms("Sfax"), Some(4));
    }

    #[test]
    fn test_missing_value_has_no_share_or_rank() {
        let table = sample();
        let medenine = table.profile(table.find("Medenine").unwrap());
        let forest = stat(&medenine, "foret");
        assert_eq!(forest.value, None);
        assert_eq!(forest.share_percent, None);
        assert_eq!(forest.rank, None);
        assert_eq!(forest.national_total, 118_000.0);
        assert_eq!(forest.ranked, 5);
    }

    #[test]
    fn test_top_three() {
        let table = sample();
        let top = table.top(0, 3);
        assert_eq!(
            top,
            vec![("Sfax", 9_500_000.0), ("Medenine", 4_200_000.0), ("Beja", 2_100_000.0)]
        );
    }

    #[test]
    fn test_find_region_by_either_label() {
        let square = MultiPolygon::new(vec![polygon![
            (x: 9.0, y: 37.0),
            (x: 10.0, y: 37.0),
            (x: 10.0, y: 37.4),
            (x: 9.0, y: 37.0),
        ]]);
        let table = IndicatorTable::load_str("gouv_ar,OLIVIER\nبنزرت,1500000\n").unwrap();
        let region = Region::new(Tier::Governorate, "Bizerte", square).with_alt("بنزرت");
        assert_eq!(table.find_region(&region).unwrap().values, vec![Some(1_500_000.0)]);
        assert!(sample().find_region(&region).is_some());
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(matches!(
            IndicatorTable::load_str("Region,OLIVIER\nBizerte,1\n"),
            Err(LoadError::MissingColumn { .. })
        ));
        assert!(matches!(
            IndicatorTable::load_str("GOUVERNORAT,OLIVIER\n,1\n"),
            Err(LoadError::MissingGovernorate { line: 2 })
        ));
        match IndicatorTable::load_str("GOUVERNORAT,OLIVIER\nBizerte,beaucoup\n") {
            Err(LoadError::InvalidIndicator { line, column, value }) => {
                assert_eq!(line, 2);
                assert_eq!(column, "OLIVIER");
                assert_eq!(value, "beaucoup");
            }
            other => panic!("expected an invalid indicator, got {:?}", other),
        }
        assert!(matches!(IndicatorTable::load_str(" \n"), Err(LoadError::EmptyFile)));
    }
}
