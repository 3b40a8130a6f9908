//! Join a resolved region to measurement rows by normalized label.
//!
//! There is no shared key between the boundary files and the uploaded
//! measurements. A row belongs to a region when its station label and the
//! region's alt-script label are equal after [`normalize`]. Nothing fuzzier
//! than that is attempted.

use crate::date_range::DateRange;
use crate::measurement::{MeasurementRecord, MeasurementSet};
use log::debug;
use sdg_geo::Region;
use sdg_utils::text::normalize;
use serde::Serialize;
use std::collections::HashMap;

/// Rows joined to one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMatch {
    /// Normalized label the rows were matched on
    pub label: String,
    /// Raw station labels that normalized to `label`, first-seen order
    pub stations: Vec<String>,
    /// Matching rows, newest first; rows sharing a date keep file order
    pub records: Vec<MeasurementRecord>,
}

impl StationMatch {
    /// Most recent reading.
    pub fn latest(&self) -> Option<&MeasurementRecord> {
        self.records.first()
    }
}

/// Result of joining a region to the loaded measurements.
///
/// Each miss has its own variant so the caller can say why there is
/// nothing to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// No file uploaded, or the upload had no rows.
    NoMeasurements,
    /// The region has no alt-script label to match on.
    NoAltLabel,
    /// No station label normalizes to the region's label.
    NoMatchingStation { label: String },
    /// Stations matched, but none of their rows fall in the date range.
    NoDataInRange { label: String, stations: Vec<String> },
    Matched(StationMatch),
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, MatchOutcome::Matched(_))
    }

    pub fn matched(&self) -> Option<&StationMatch> {
        match self {
            MatchOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Rows of `measurements` whose station is `region`'s alt label.
pub fn match_region(region: &Region, measurements: Option<&MeasurementSet>) -> MatchOutcome {
    let measurements = match measurements {
        Some(set) if !set.is_empty() => set,
        _ => return MatchOutcome::NoMeasurements,
    };
    let label = match region.name_alt.as_deref().map(normalize) {
        Some(label) if !label.is_empty() => label,
        _ => return MatchOutcome::NoAltLabel,
    };

    // station labels repeat on every row; normalize each distinct one once
    let mut normalized: HashMap<&str, String> = HashMap::new();
    let mut stations: Vec<String> = Vec::new();
    let mut records: Vec<MeasurementRecord> = Vec::new();
    for record in measurements {
        let key = normalized
            .entry(record.station_label.as_str())
            .or_insert_with(|| normalize(&record.station_label));
        if *key != label {
            continue;
        }
        if !stations.contains(&record.station_label) {
            stations.push(record.station_label.clone());
        }
        records.push(record.clone());
    }

    if records.is_empty() {
        debug!(
            "No station matches `{}` among {} labels",
            label,
            normalized.len()
        );
        return MatchOutcome::NoMatchingStation { label };
    }
    if stations.len() > 1 {
        debug!("Merging stations {:?} under `{}`", stations, label);
    }

    records.sort_by(|a, b| b.date.cmp(&a.date));
    MatchOutcome::Matched(StationMatch {
        label,
        stations,
        records,
    })
}

/// [`match_region`] restricted to an inclusive date range.
///
/// A station that matches but has no rows in the range yields
/// [`MatchOutcome::NoDataInRange`] rather than a plain miss.
pub fn match_region_in_range(
    region: &Region,
    measurements: Option<&MeasurementSet>,
    range: &DateRange,
) -> MatchOutcome {
    match match_region(region, measurements) {
        MatchOutcome::Matched(mut station_match) => {
            station_match.records.retain(|r| range.contains(&r.date));
            if station_match.records.is_empty() {
                MatchOutcome::NoDataInRange {
                    label: station_match.label,
                    stations: station_match.stations,
                }
            } else {
                MatchOutcome::Matched(station_match)
            }
        }
        other => other,
    }
}
