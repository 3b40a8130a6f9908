//! The rainfall panel for a clicked delegation, and upload checks.

use crate::session::{ClickOutcome, Session};
use crate::{GeometryArgs, OutputArgs};
use anyhow::Context;
use log::info;
use sdg_data::dashboard::{ChartKind, Dashboard};
use sdg_data::{DateRange, MatchOutcome, MeasurementLoader};
use sdg_geo::{ClickEvent, GeometrySource, ResolvePolicy};
use sdg_utils::dates::format_date_display;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

fn mm(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

/// Session over `geometry`, with `measurements` uploaded when given.
///
/// A rejected or unreadable measurement file is reported as a warning and
/// the session is returned without data, as the map stays usable.
fn open_session(
    source: GeometrySource,
    policy: ResolvePolicy,
    range: DateRange,
    measurements: Option<&Path>,
) -> anyhow::Result<Session> {
    let mut session = Session::new(source).with_policy(policy).with_range(range);
    session.atlas().context("Failed to load boundaries")?;

    if let Some(path) = measurements {
        if let Err(e) = session.upload_path(path, &MeasurementLoader::new()) {
            eprintln!("Warning: {}: {}", path.display(), e);
        }
    }
    Ok(session)
}

/// JSON body for a click that did not produce a panel.
fn status_json(outcome: &ClickOutcome) -> serde_json::Result<Value> {
    let status = match outcome {
        ClickOutcome::Delegation { outcome, .. } => serde_json::to_value(outcome)?,
        ClickOutcome::Governorate(_) => json!({ "status": "governorate_only" }),
        ClickOutcome::Outside => json!({ "status": "outside" }),
    };
    Ok(json!({ "match": status, "message": outcome.message() }))
}

/// Resolve a click and print the panel for the delegation under it.
pub fn run_dashboard(
    geometry: &GeometryArgs,
    click: ClickEvent,
    measurements: Option<&Path>,
    range: DateRange,
    chart: ChartKind,
    policy: ResolvePolicy,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let mut session = open_session(geometry.source(), policy, range, measurements)?;

    let outcome = session.click(click)?;
    if let ClickOutcome::Delegation {
        delegation,
        outcome: MatchOutcome::Matched(station_match),
    } = &outcome
    {
        let dashboard = Dashboard::build(delegation, station_match, chart);
        if output.json {
            println!("{}", dashboard.to_json()?);
        } else {
            print_dashboard(&dashboard, &output);
        }
        return Ok(());
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&status_json(&outcome)?)?);
    } else {
        println!("{}", outcome.message());
    }
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard, output: &OutputArgs) {
    let alt = dashboard
        .region_alt
        .as_deref()
        .map(|alt| format!(" ({})", output.label(alt)))
        .unwrap_or_default();
    match &dashboard.governorate {
        Some(governorate) => println!("{}{}, {}", dashboard.region, alt, governorate),
        None => println!("{}{}", dashboard.region, alt),
    }
    let stations: Vec<String> = dashboard.stations.iter().map(|s| output.label(s)).collect();
    println!("Stations: {}", stations.join(", "));

    if let Some(latest) = &dashboard.latest {
        println!();
        println!("Latest reading ({})", format_date_display(&latest.date));
        println!("  Daily rainfall    {:>8} mm", mm(latest.daily_value));
        println!("  Month cumulative  {:>8} mm", mm(latest.month_cumulative));
        println!("  Period cumulative {:>8} mm", mm(latest.period_cumulative));
    }

    let chart = &dashboard.chart;
    println!();
    println!("{} [{}]", chart.title, chart.kind);
    println!("  {:<10}  {}", chart.x_label, chart.y_label);
    for point in &chart.points {
        println!("  {:<10}  {:>6.1}", point.date.to_string(), point.value);
    }

    println!();
    println!(
        "{:<10}  {:>9}  {:>10}  {:>11}  Station",
        "Date", "Rain (mm)", "Month (mm)", "Period (mm)"
    );
    for row in &dashboard.rows {
        println!(
            "{:<10}  {:>9}  {:>10}  {:>11}  {}",
            row.date,
            mm(row.daily_value),
            mm(row.month_cumulative),
            mm(row.period_cumulative),
            output.label(&row.station)
        );
    }
}

/// Upload status: how much of the file falls in the selected period.
#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub records: usize,
    pub in_range: usize,
    pub range: (String, String),
    pub days: i64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub stations: Vec<String>,
}

impl UploadSummary {
    fn new(loaded: &sdg_data::MeasurementSet, range: &DateRange) -> Self {
        let filtered = loaded.filter_range(range);
        let period = filtered.period();
        UploadSummary {
            records: loaded.len(),
            in_range: filtered.len(),
            range: (range.start().to_string(), range.end().to_string()),
            days: range.num_days(),
            first_date: period.map(|p| p.start().to_string()),
            last_date: period.map(|p| p.end().to_string()),
            stations: filtered
                .station_labels()
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

pub fn run_inspect(measurements: &Path, range: DateRange, output: OutputArgs) -> anyhow::Result<()> {
    let loaded = MeasurementLoader::new()
        .load_path(measurements)
        .with_context(|| format!("Failed to load {}", measurements.display()))?;
    let summary = UploadSummary::new(&loaded, &range);
    info!(
        "{} of {} records fall in {}",
        summary.in_range, summary.records, range
    );

    if output.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    println!("File: {}", measurements.display());
    println!(
        "Records: {} ({} in {}, {} days)",
        summary.records, summary.in_range, range, summary.days
    );
    if let (Some(first), Some(last)) = (&summary.first_date, &summary.last_date) {
        println!("Covered: {} to {}", first, last);
    }
    println!("Stations ({}):", summary.stations.len());
    for station in &summary.stations {
        println!("  {}", output.label(station));
    }
    Ok(())
}
