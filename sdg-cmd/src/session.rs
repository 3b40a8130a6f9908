//! One user's dashboard session: boundaries, the current upload and the
//! selected period.

use chrono::Local;
use log::{info, warn};
use sdg_data::{match_region_in_range, DateRange, LoadError, MatchOutcome, MeasurementLoader, MeasurementSet};
use sdg_geo::{Atlas, ClickEvent, GeometryError, GeometrySource, GeometryStore, Region, ResolvePolicy};
use std::path::Path;
use std::rc::Rc;

/// What a click landed on.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Outside every boundary, e.g. at sea.
    Outside,
    /// Inside a governorate but no delegation boundary.
    Governorate(Region),
    Delegation {
        delegation: Region,
        outcome: MatchOutcome,
    },
}

impl ClickOutcome {
    /// Status line shown under the map.
    pub fn message(&self) -> String {
        match self {
            ClickOutcome::Outside => "No region at this location".to_string(),
            ClickOutcome::Governorate(governorate) => format!(
                "Governorate {}: no delegation boundary at this point",
                governorate.name_local
            ),
            ClickOutcome::Delegation {
                delegation,
                outcome,
            } => match outcome {
                MatchOutcome::NoMeasurements => format!(
                    "No measurements loaded; upload a rainfall file to see data for {}",
                    delegation.name_local
                ),
                MatchOutcome::NoAltLabel => format!(
                    "Delegation {} has no Arabic name to match stations against",
                    delegation.name_local
                ),
                MatchOutcome::NoMatchingStation { label } => {
                    format!("No station matches {} ({})", delegation.name_local, label)
                }
                MatchOutcome::NoDataInRange { .. } => format!(
                    "No rainfall data for {} in the selected period",
                    delegation.name_local
                ),
                MatchOutcome::Matched(m) => format!(
                    "{} readings for {} from {} station(s)",
                    m.records.len(),
                    delegation.name_local,
                    m.stations.len()
                ),
            },
        }
    }
}

/// Holds the cached boundaries, the latest upload and the date range.
///
/// Every click is resolved against the same atlas; uploads replace the
/// measurement set wholesale.
#[derive(Debug)]
pub struct Session {
    store: GeometryStore,
    measurements: Option<MeasurementSet>,
    range: DateRange,
    policy: ResolvePolicy,
}

impl Session {
    /// New session covering January 1 of this year to today.
    pub fn new(source: GeometrySource) -> Self {
        Session {
            store: GeometryStore::new(source),
            measurements: None,
            range: DateRange::year_to_date(Local::now().date_naive()),
            policy: ResolvePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResolvePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = range;
        self
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn set_source(&mut self, source: GeometrySource) {
        self.store.set_source(source);
    }

    pub fn atlas(&mut self) -> Result<Rc<Atlas>, GeometryError> {
        self.store.load()
    }

    pub fn measurements(&self) -> Option<&MeasurementSet> {
        self.measurements.as_ref()
    }

    /// Replace the measurement set with a new upload.
    ///
    /// A rejected file leaves the session with no measurements at all, so
    /// stale data from an earlier upload is never shown.
    pub fn upload(&mut self, data: &[u8], loader: &MeasurementLoader) -> Result<usize, LoadError> {
        self.measurements = None;
        match loader.load_bytes(data) {
            Ok(set) => {
                let count = set.len();
                info!("Upload accepted: {} records", count);
                self.measurements = Some(set);
                Ok(count)
            }
            Err(e) => {
                warn!("Upload rejected: {}", e);
                Err(e)
            }
        }
    }

    /// [`upload`](Self::upload) from a file. An unreadable file is a
    /// rejected upload like any other.
    pub fn upload_path(&mut self, path: &Path, loader: &MeasurementLoader) -> Result<usize, LoadError> {
        self.measurements = None;
        match loader.load_path(path) {
            Ok(set) => {
                let count = set.len();
                info!("Upload accepted from {}: {} records", path.display(), count);
                self.measurements = Some(set);
                Ok(count)
            }
            Err(e) => {
                warn!("Upload rejected from {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Run one resolution cycle for a click.
    pub fn click(&mut self, click: ClickEvent) -> Result<ClickOutcome, GeometryError> {
        let atlas = self.atlas()?;
        let point = click.to_point();

        if let Some(delegation) = atlas.delegations.resolve_with(point, self.policy) {
            let outcome =
                match_region_in_range(delegation, self.measurements.as_ref(), &self.range);
            return Ok(ClickOutcome::Delegation {
                delegation: delegation.clone(),
                outcome,
            });
        }
        Ok(match atlas.governorates.resolve_with(point, self.policy) {
            Some(governorate) => ClickOutcome::Governorate(governorate.clone()),
            None => ClickOutcome::Outside,
        })
    }
}
