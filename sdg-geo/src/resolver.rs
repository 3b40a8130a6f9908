//! Point-in-region resolution.
//!
//! Coordinates are longitude first, matching GeoJSON. Map widgets report
//! clicks as `{lat, lng}`; go through [`ClickEvent`] rather than building
//! a point by hand so the order cannot be swapped.

use crate::region::Region;
use geo::Point;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A click on the map, in the shape map widgets emit it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub lat: f64,
    pub lng: f64,
}

impl ClickEvent {
    pub fn new(lat: f64, lng: f64) -> Self {
        ClickEvent { lat, lng }
    }

    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<ClickEvent> for Point<f64> {
    fn from(click: ClickEvent) -> Self {
        click.to_point()
    }
}

/// How to choose between several regions containing the same point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolvePolicy {
    /// First region in stored order wins. Overlapping inputs therefore
    /// resolve differently depending on file order.
    #[default]
    FirstMatch,
    /// Containing region with the smallest planar area wins; ties keep
    /// stored order. Deterministic across orderings.
    SmallestArea,
}

impl FromStr for ResolvePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" | "first-match" => Ok(ResolvePolicy::FirstMatch),
            "smallest" | "smallest-area" => Ok(ResolvePolicy::SmallestArea),
            other => Err(format!(
                "unknown tie-break `{}` (expected first-match or smallest-area)",
                other
            )),
        }
    }
}

/// Return the first region (in slice order) whose boundary contains the point.
pub fn resolve(point: Point<f64>, regions: &[Region]) -> Option<&Region> {
    regions.iter().find(|region| region.contains(&point))
}

/// Resolve with an explicit tie-break policy.
pub fn resolve_with(point: Point<f64>, regions: &[Region], policy: ResolvePolicy) -> Option<&Region> {
    match policy {
        ResolvePolicy::FirstMatch => resolve(point, regions),
        ResolvePolicy::SmallestArea => regions
            .iter()
            .filter(|region| region.contains(&point))
            .min_by(|a, b| a.area().total_cmp(&b.area())),
    }
}
