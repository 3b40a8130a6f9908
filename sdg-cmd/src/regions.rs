//! Boundary listing and point lookup.

use crate::{GeometryArgs, OutputArgs};
use anyhow::{anyhow, bail, Context};
use log::info;
use sdg_geo::{Atlas, ClickEvent, GeometryStore, Region, ResolvePolicy, Tier};
use serde::Serialize;

/// A region without its geometry, for printing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub tier: Tier,
    pub name: String,
    pub name_alt: Option<String>,
    pub code: Option<String>,
    pub governorate: Option<String>,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        RegionSummary {
            tier: region.tier,
            name: region.name_local.clone(),
            name_alt: region.name_alt.clone(),
            code: region.code.clone(),
            governorate: region.parent_label.clone(),
        }
    }
}

impl RegionSummary {
    fn line(&self, output: &OutputArgs) -> String {
        format!(
            "{:<6} {:<24} {:<24} {}",
            self.code.as_deref().unwrap_or("-"),
            self.name,
            self.name_alt
                .as_deref()
                .map(|alt| output.label(alt))
                .unwrap_or_else(|| "-".to_string()),
            self.governorate.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Serialize)]
struct Resolution {
    lat: f64,
    lng: f64,
    delegation: Option<RegionSummary>,
    governorate: Option<RegionSummary>,
}

/// Governorate under a click. When the point misses every governorate
/// boundary but lands in a delegation, the delegation's parent is used.
pub(crate) fn governorate_at(atlas: &Atlas, click: ClickEvent, policy: ResolvePolicy) -> Option<&Region> {
    let point = click.to_point();
    atlas.governorates.resolve_with(point, policy).or_else(|| {
        atlas
            .delegations
            .resolve_with(point, policy)
            .and_then(|d| atlas.parent_of(d))
    })
}

impl Resolution {
    fn new(atlas: &Atlas, click: ClickEvent, policy: ResolvePolicy) -> Self {
        Resolution {
            lat: click.lat,
            lng: click.lng,
            delegation: atlas
                .delegations
                .resolve_with(click.to_point(), policy)
                .map(RegionSummary::from),
            governorate: governorate_at(atlas, click, policy).map(RegionSummary::from),
        }
    }
}

/// List one tier, optionally only the delegations of one governorate.
pub fn run_regions(
    geometry: &GeometryArgs,
    tier: Tier,
    governorate: Option<&str>,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let mut store = GeometryStore::new(geometry.source());
    let atlas = store.load().context("Failed to load boundaries")?;

    let summaries: Vec<RegionSummary> = match governorate {
        Some(name) => {
            if tier == Tier::Governorate {
                bail!("--governorate only filters delegations");
            }
            let parent = atlas
                .governorates
                .find(name)
                .ok_or_else(|| anyhow!("Unknown governorate `{}`", name))?;
            atlas
                .delegations
                .children_of(parent)
                .map(RegionSummary::from)
                .collect()
        }
        None => atlas.tier(tier).iter().map(RegionSummary::from).collect(),
    };
    info!("Listing {} {} regions", summaries.len(), tier);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            println!("{}", summary.line(&output));
        }
    }
    Ok(())
}

/// Find the delegation and governorate under a click.
pub fn run_resolve(
    geometry: &GeometryArgs,
    click: ClickEvent,
    policy: ResolvePolicy,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let mut store = GeometryStore::new(geometry.source());
    let atlas = store.load().context("Failed to load boundaries")?;
    let resolution = Resolution::new(&atlas, click, policy);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }
    match (&resolution.delegation, &resolution.governorate) {
        (None, None) => println!("No region at ({}, {})", click.lng, click.lat),
        (delegation, governorate) => {
            if let Some(d) = delegation {
                println!("Delegation:  {}", d.line(&output));
            }
            if let Some(g) = governorate {
                println!("Governorate: {}", g.line(&output));
            }
        }
    }
    Ok(())
}
