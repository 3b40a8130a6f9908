//! Governorate indicators compared with the national figures.

use crate::regions::governorate_at;
use crate::{GeometryArgs, OutputArgs};
use anyhow::{anyhow, Context};
use log::info;
use sdg_data::statistics::GovernorateRow;
use sdg_data::{GovernorateProfile, IndicatorTable};
use sdg_geo::{Atlas, ClickEvent, GeometryStore, ResolvePolicy};
use serde::Serialize;
use std::path::Path;

/// Which governorate to report on.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsTarget {
    /// A governorate label in either script
    Label(String),
    Click(ClickEvent),
}

#[derive(Debug, Serialize)]
pub struct Leader {
    pub governorate: String,
    pub value: f64,
    pub share_percent: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct Leaderboard {
    pub indicator: String,
    pub national_total: f64,
    pub leaders: Vec<Leader>,
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub profile: GovernorateProfile,
    pub leaderboards: Vec<Leaderboard>,
}

impl StatsReport {
    pub fn new(table: &IndicatorTable, row: &GovernorateRow, top: usize) -> Self {
        let leaderboards = table
            .indicators()
            .iter()
            .enumerate()
            .map(|(i, indicator)| {
                let national_total = table.total(i);
                Leaderboard {
                    indicator: indicator.clone(),
                    national_total,
                    leaders: table
                        .top(i, top)
                        .into_iter()
                        .map(|(governorate, value)| Leader {
                            governorate: governorate.to_string(),
                            value,
                            share_percent: (national_total > 0.0)
                                .then(|| value / national_total * 100.0),
                        })
                        .collect(),
                }
            })
            .collect();
        StatsReport {
            profile: table.profile(row),
            leaderboards,
        }
    }
}

/// Row of `table` for the chosen governorate.
///
/// A label is looked up in the boundary layer first so either script
/// reaches the row, then directly in the table.
fn select_row<'a>(
    table: &'a IndicatorTable,
    atlas: &Atlas,
    target: &StatsTarget,
    policy: ResolvePolicy,
) -> anyhow::Result<&'a GovernorateRow> {
    match target {
        StatsTarget::Label(label) => atlas
            .governorates
            .find(label)
            .and_then(|region| table.find_region(region))
            .or_else(|| table.find(label))
            .ok_or_else(|| anyhow!("No indicators for governorate `{}`", label)),
        StatsTarget::Click(click) => {
            let region = governorate_at(atlas, *click, policy)
                .ok_or_else(|| anyhow!("No governorate at ({}, {})", click.lng, click.lat))?;
            table
                .find_region(region)
                .ok_or_else(|| anyhow!("No indicators for governorate `{}`", region.name_local))
        }
    }
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.0}", v))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}%", v))
}

pub fn run_stats(
    geometry: &GeometryArgs,
    indicators: &Path,
    target: StatsTarget,
    top: usize,
    policy: ResolvePolicy,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let table = IndicatorTable::load_path(indicators)
        .with_context(|| format!("Failed to load {}", indicators.display()))?;
    let mut store = GeometryStore::new(geometry.source());
    let atlas = store.load().context("Failed to load boundaries")?;

    let row = select_row(&table, &atlas, &target, policy)?;
    info!("Reporting {} indicators for {}", table.indicators().len(), row.label);
    let report = StatsReport::new(&table, row, top);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{}", output.label(&report.profile.governorate));
    println!(
        "  {:<20}  {:>12}  {:>8}  {:>7}",
        "Indicator", "Value", "National", "Rank"
    );
    for stat in &report.profile.stats {
        let rank = stat
            .rank
            .map(|r| format!("#{}/{}", r, stat.ranked))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<20}  {:>12}  {:>8}  {:>7}",
            stat.indicator,
            number(stat.value),
            percent(stat.share_percent),
            rank
        );
    }
    for board in &report.leaderboards {
        println!();
        println!("Top {} {}", board.leaders.len(), board.indicator);
        for leader in &board.leaders {
            println!(
                "  {:<20}  {:>12}  {:>8}",
                output.label(&leader.governorate),
                number(Some(leader.value)),
                percent(leader.share_percent)
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    static INDICATORS_SAMPLE: &str =
        include_str!("../../fixtures/governorate-indicators-sample.csv");

    fn table() -> IndicatorTable {
        IndicatorTable::load_str(INDICATORS_SAMPLE).unwrap()
    }

    #[test]
    fn test_select_by_click_and_label() {
        let table = table();
        let atlas = Atlas::sample().unwrap();
        let policy = ResolvePolicy::default();

        let joumine = StatsTarget::Click(ClickEvent::new(37.0, 9.5));
        assert_eq!(select_row(&table, &atlas, &joumine, policy).unwrap().label, "BIZERTE");

        let arabic = StatsTarget::Label("باجة".to_string());
        assert_eq!(select_row(&table, &atlas, &arabic, policy).unwrap().label, "Beja");

        // not in the sample boundaries, only in the table
        let sfax = StatsTarget::Label("sfax".to_string());
        assert_eq!(select_row(&table, &atlas, &sfax, policy).unwrap().label, "Sfax");
    }

    #[test]
    fn test_select_misses() {
        let table = table();
        let atlas = Atlas::sample().unwrap();
        let policy = ResolvePolicy::default();
        let sea = StatsTarget::Click(ClickEvent::new(37.6, 10.6));
        assert!(select_row(&table, &atlas, &sea, policy).is_err());
        let unknown = StatsTarget::Label("Tunis".to_string());
        assert!(select_row(&table, &atlas, &unknown, policy).is_err());
    }

    #[test]
    fn test_report_leaderboards() {
        let table = table();
        let row = table.find("Kebili").unwrap();
        let report = StatsReport::new(&table, row, 2);
        assert_eq!(report.profile.governorate, "Kebili");
        assert_eq!(report.leaderboards.len(), 4);

        let palms = &report.leaderboards[1];
        assert_eq!(palms.indicator, "PALMIER_DATTIER");
        let names: Vec<&str> = palms.leaders.iter().map(|l| l.governorate.as_str()).collect();
        assert_eq!(names, ["Kebili", "Tozeur"]);
        assert_eq!(palms.national_total, 4_550_000.0);
        assert!((palms.leaders[0].share_percent.unwrap() - 50.549).abs() < 0.001);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(number(Some(1_500_000.0)), "1500000");
        assert_eq!(number(None), "-");
        assert_eq!(percent(Some(8.6705)), "8.7%");
        assert_eq!(percent(None), "-");
    }
}
