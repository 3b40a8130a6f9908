//! Data behind the dashboard panel shown for a matched delegation.

use crate::matcher::StationMatch;
use crate::measurement::MeasurementRecord;
use chrono::NaiveDate;
use sdg_geo::Region;
use sdg_utils::dates::format_date_display;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" | "courbe" => Ok(ChartKind::Line),
            "bar" | "bars" | "barres" => Ok(ChartKind::Bar),
            other => Err(format!("unknown chart kind `{}` (expected line or bar)", other)),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateValue {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Daily readings, oldest first
    pub points: Vec<DateValue>,
}

impl ChartSpec {
    fn daily_rainfall(kind: ChartKind, place: &str, records: &[MeasurementRecord]) -> Self {
        let title = match kind {
            ChartKind::Line => format!("Rainfall trend at {}", place),
            ChartKind::Bar => format!("Daily rainfall at {}", place),
        };
        let mut points: Vec<DateValue> = records
            .iter()
            .filter_map(|r| {
                r.daily_value.map(|value| DateValue {
                    date: r.date,
                    value,
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        ChartSpec {
            kind,
            title,
            x_label: "Date".to_string(),
            y_label: "Rainfall (mm)".to_string(),
            points,
        }
    }
}

/// One line of the raw data table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    /// dd/mm/yyyy
    pub date: String,
    pub station: String,
    pub daily_value: Option<f64>,
    pub month_cumulative: Option<f64>,
    pub period_cumulative: Option<f64>,
}

impl From<&MeasurementRecord> for TableRow {
    fn from(record: &MeasurementRecord) -> Self {
        TableRow {
            date: format_date_display(&record.date),
            station: record.station_label.clone(),
            daily_value: record.daily_value,
            month_cumulative: record.month_cumulative,
            period_cumulative: record.period_cumulative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub region: String,
    pub region_alt: Option<String>,
    pub governorate: Option<String>,
    pub stations: Vec<String>,
    /// Top row of the table: the newest reading
    pub latest: Option<MeasurementRecord>,
    pub chart: ChartSpec,
    /// Newest first
    pub rows: Vec<TableRow>,
}

impl Dashboard {
    pub fn build(region: &Region, station_match: &StationMatch, kind: ChartKind) -> Self {
        Dashboard {
            region: region.name_local.clone(),
            region_alt: region.name_alt.clone(),
            governorate: region.parent_label.clone(),
            stations: station_match.stations.clone(),
            latest: station_match.latest().cloned(),
            chart: ChartSpec::daily_rainfall(kind, &region.name_local, &station_match.records),
            rows: station_match.records.iter().map(TableRow::from).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
