//! Command implementations for the SDG CLI.
//!
//! Each subcommand drives one part of the dashboard from the terminal:
//! listing boundaries, resolving a map click, rendering the panel for a
//! clicked delegation, checking an upload, comparing a governorate's
//! indicators with the country, and listing remote zone layers.

use anyhow::bail;
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use sdg_data::dashboard::ChartKind;
use sdg_data::DateRange;
use sdg_geo::store::{DEFAULT_DELEGATIONS_PATH, DEFAULT_GOVERNORATES_PATH};
use sdg_geo::{ClickEvent, GeometrySource, ResolvePolicy, Tier};
use sdg_utils::dates::{parse_date, start_of_year};
use sdg_utils::text::display_form;
use stats::StatsTarget;
use std::path::PathBuf;

pub mod dashboard;
pub mod regions;
pub mod session;
pub mod stats;
pub mod zones;

/// Where to read the boundary layers from.
#[derive(Args, Debug, Clone)]
pub struct GeometryArgs {
    /// Governorate boundaries (GeoJSON FeatureCollection)
    #[arg(long, env = "SDG_GOVERNORATES", default_value = DEFAULT_GOVERNORATES_PATH)]
    pub governorates: PathBuf,

    /// Delegation boundaries (GeoJSON FeatureCollection)
    #[arg(long, env = "SDG_DELEGATIONS", default_value = DEFAULT_DELEGATIONS_PATH)]
    pub delegations: PathBuf,

    /// Use the embedded sample boundaries; overrides both paths
    #[arg(long)]
    pub sample: bool,
}

impl GeometryArgs {
    pub fn source(&self) -> GeometrySource {
        if self.sample {
            GeometrySource::Sample
        } else {
            GeometrySource::files(&self.governorates, &self.delegations)
        }
    }
}

/// A map click given on the command line.
#[derive(Args, Debug, Clone, Copy)]
pub struct PointArgs {
    /// Longitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Latitude in decimal degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,
}

impl PointArgs {
    pub fn click(&self) -> ClickEvent {
        ClickEvent::new(self.lat, self.lon)
    }
}

/// Inclusive date filter applied to measurements.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD); defaults to January 1 of the current year
    #[arg(long)]
    pub start: Option<String>,

    /// Last day (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<String>,
}

impl RangeArgs {
    pub fn range(&self) -> anyhow::Result<DateRange> {
        self.range_from(Local::now().date_naive())
    }

    fn range_from(&self, today: NaiveDate) -> anyhow::Result<DateRange> {
        let end = match &self.end {
            Some(s) => parse_date(s)?,
            None => today,
        };
        let start = match &self.start {
            Some(s) => parse_date(s)?,
            None => start_of_year(&end),
        };
        if start > end {
            bail!("Start date {} is after end date {}", start, end);
        }
        Ok(DateRange(start, end))
    }
}

/// How results are printed.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputArgs {
    /// Print Arabic labels in visual order, for terminals without bidi support
    #[arg(long)]
    pub visual: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

impl OutputArgs {
    /// Label as it should be printed.
    pub fn label(&self, text: &str) -> String {
        if self.visual {
            display_form(text)
        } else {
            text.to_string()
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierArg {
    Governorate,
    Delegation,
}

impl From<TierArg> for Tier {
    fn from(arg: TierArg) -> Self {
        match arg {
            TierArg::Governorate => Tier::Governorate,
            TierArg::Delegation => Tier::Delegation,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// List the regions of one boundary tier
    Regions {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Tier to list
        #[arg(short, long, value_enum, default_value_t = TierArg::Delegation)]
        tier: TierArg,

        /// Only list delegations of this governorate (either label)
        #[arg(short, long)]
        governorate: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Find the delegation and governorate containing a point
    Resolve {
        #[command(flatten)]
        geometry: GeometryArgs,

        #[command(flatten)]
        point: PointArgs,

        /// Tie-break for overlapping boundaries: first-match or smallest-area
        #[arg(long, default_value = "first-match")]
        tie_break: ResolvePolicy,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the rainfall panel for the delegation containing a point
    Dashboard {
        #[command(flatten)]
        geometry: GeometryArgs,

        #[command(flatten)]
        point: PointArgs,

        /// Rainfall CSV (Date, station, Pluvio_du_jour, Cumul_du_mois, Cumul_periode)
        #[arg(short, long)]
        measurements: Option<PathBuf>,

        #[command(flatten)]
        range: RangeArgs,

        /// Chart style: line or bar
        #[arg(short, long, default_value = "line")]
        chart: ChartKind,

        /// Tie-break for overlapping boundaries: first-match or smallest-area
        #[arg(long, default_value = "first-match")]
        tie_break: ResolvePolicy,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check a rainfall CSV and summarize it over a date range
    Inspect {
        /// Rainfall CSV to check
        #[arg(short, long)]
        measurements: PathBuf,

        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Compare one governorate's indicators with the national figures
    Stats {
        #[command(flatten)]
        geometry: GeometryArgs,

        /// Indicator CSV: a GOUVERNORAT column, then one numeric column per indicator
        #[arg(short, long)]
        indicators: PathBuf,

        /// Governorate label in either script
        #[arg(short, long, conflicts_with_all = ["lon", "lat"])]
        governorate: Option<String>,

        /// Longitude of a map click inside the governorate
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Latitude of a map click inside the governorate
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Leaders listed per indicator
        #[arg(long, default_value_t = 3)]
        top: usize,

        /// Tie-break for overlapping boundaries: first-match or smallest-area
        #[arg(long, default_value = "first-match")]
        tie_break: ResolvePolicy,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List the zones of a GeoJSON layer from a URL or local file
    Zones {
        /// http(s) URL or path of the FeatureCollection
        source: String,

        /// Property holding the zone name
        #[arg(long, default_value = "Name")]
        name_key: String,

        /// Property holding the zone description
        #[arg(long, default_value = "description")]
        description_key: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Regions {
            geometry,
            tier,
            governorate,
            output,
        } => regions::run_regions(&geometry, tier.into(), governorate.as_deref(), output),
        Command::Resolve {
            geometry,
            point,
            tie_break,
            output,
        } => regions::run_resolve(&geometry, point.click(), tie_break, output),
        Command::Dashboard {
            geometry,
            point,
            measurements,
            range,
            chart,
            tie_break,
            output,
        } => dashboard::run_dashboard(
            &geometry,
            point.click(),
            measurements.as_deref(),
            range.range()?,
            chart,
            tie_break,
            output,
        ),
        Command::Inspect {
            measurements,
            range,
            output,
        } => dashboard::run_inspect(&measurements, range.range()?, output),
        Command::Stats {
            geometry,
            indicators,
            governorate,
            lon,
            lat,
            top,
            tie_break,
            output,
        } => {
            let target = match (governorate, lon, lat) {
                (Some(label), _, _) => StatsTarget::Label(label),
                (None, Some(lon), Some(lat)) => StatsTarget::Click(ClickEvent::new(lat, lon)),
                _ => bail!("Give either --governorate or --lon and --lat"),
            };
            stats::run_stats(&geometry, &indicators, target, top, tie_break, output)
        }
        Command::Zones {
            source,
            name_key,
            description_key,
            output,
        } => zones::run_zones(&source, &name_key, &description_key, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_is_year_to_date() {
        let today = ymd(2024, 8, 19);
        let range = RangeArgs::default().range_from(today).unwrap();
        assert_eq!(range, DateRange(ymd(2024, 1, 1), today));
    }

    #[test]
    fn test_explicit_range() {
        let args = RangeArgs {
            start: Some("2023-10-01".to_string()),
            end: Some("2024-01-31".to_string()),
        };
        let range = args.range_from(ymd(2024, 8, 19)).unwrap();
        assert_eq!(range, DateRange(ymd(2023, 10, 1), ymd(2024, 1, 31)));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let args = RangeArgs {
            start: Some("2024-02-01".to_string()),
            end: Some("2024-01-01".to_string()),
        };
        assert!(args.range_from(ymd(2024, 8, 19)).is_err());
    }

    #[test]
    fn test_point_args_are_lon_lat() {
        let point = PointArgs { lon: 9.5, lat: 37.0 };
        let click = point.click();
        assert_eq!(click.lng, 9.5);
        assert_eq!(click.lat, 37.0);
        assert_eq!(click.to_point().x(), 9.5);
    }

    #[test]
    fn test_sample_flag_overrides_paths() {
        let args = GeometryArgs {
            governorates: PathBuf::from("a.geojson"),
            delegations: PathBuf::from("b.geojson"),
            sample: true,
        };
        assert_eq!(args.source(), GeometrySource::Sample);
        let files = GeometryArgs { sample: false, ..args };
        assert_eq!(files.source(), GeometrySource::files("a.geojson", "b.geojson"));
    }

    #[test]
    fn test_output_label() {
        let plain = OutputArgs::default();
        let visual = OutputArgs {
            visual: true,
            json: false,
        };
        assert_eq!(plain.label("ماطر"), "ماطر");
        assert_eq!(visual.label("ماطر"), "رطام");
        assert_eq!(visual.label("Mateur"), "Mateur");
    }
}
