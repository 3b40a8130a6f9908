//! Session-scoped cache of the two boundary tiers.

use crate::error::Result;
use crate::region::{PropertyKeys, Region, RegionSet, Tier};
use log::info;
use std::path::PathBuf;
use std::rc::Rc;

/// Embedded sample governorate layer (three simplified governorates).
pub static SAMPLE_GOVERNORATES: &str =
    include_str!("../../fixtures/tn-governorates-sample.geojson");

/// Embedded sample delegation layer matching [`SAMPLE_GOVERNORATES`].
pub static SAMPLE_DELEGATIONS: &str = include_str!("../../fixtures/tn-delegations-sample.geojson");

/// Default location of the national governorate layer.
pub const DEFAULT_GOVERNORATES_PATH: &str = "data/TN-gouvernorats.geojson";

/// Default location of the national delegation layer.
pub const DEFAULT_DELEGATIONS_PATH: &str = "data/TN-delegations_raw.geojson";

/// Both boundary tiers, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    pub governorates: RegionSet,
    pub delegations: RegionSet,
}

impl Atlas {
    pub fn from_geojson_strs(
        governorates: &str,
        delegations: &str,
        governorate_keys: &PropertyKeys,
        delegation_keys: &PropertyKeys,
    ) -> Result<Self> {
        Ok(Atlas {
            governorates: RegionSet::from_geojson_str(
                governorates,
                Tier::Governorate,
                governorate_keys,
            )?,
            delegations: RegionSet::from_geojson_str(delegations, Tier::Delegation, delegation_keys)?,
        })
    }

    /// The embedded sample atlas.
    pub fn sample() -> Result<Self> {
        Atlas::from_geojson_strs(
            SAMPLE_GOVERNORATES,
            SAMPLE_DELEGATIONS,
            &PropertyKeys::governorates(),
            &PropertyKeys::delegations(),
        )
    }

    pub fn tier(&self, tier: Tier) -> &RegionSet {
        match tier {
            Tier::Governorate => &self.governorates,
            Tier::Delegation => &self.delegations,
        }
    }

    /// Governorate a delegation belongs to, by code or by label.
    pub fn parent_of(&self, delegation: &Region) -> Option<&Region> {
        if let Some(code) = delegation.parent_code.as_deref() {
            if let Some(parent) = self
                .governorates
                .iter()
                .find(|g| g.code.as_deref() == Some(code))
            {
                return Some(parent);
            }
        }
        delegation
            .parent_label
            .as_deref()
            .and_then(|label| self.governorates.find(label))
    }
}

/// Where the atlas comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    Files {
        governorates: PathBuf,
        delegations: PathBuf,
        governorate_keys: PropertyKeys,
        delegation_keys: PropertyKeys,
    },
    Sample,
}

impl GeometrySource {
    /// File source with the national layers' property keys.
    pub fn files(governorates: impl Into<PathBuf>, delegations: impl Into<PathBuf>) -> Self {
        GeometrySource::Files {
            governorates: governorates.into(),
            delegations: delegations.into(),
            governorate_keys: PropertyKeys::governorates(),
            delegation_keys: PropertyKeys::delegations(),
        }
    }

    fn load(&self) -> Result<Atlas> {
        match self {
            GeometrySource::Files {
                governorates,
                delegations,
                governorate_keys,
                delegation_keys,
            } => {
                info!(
                    "Loading boundaries from {} and {}",
                    governorates.display(),
                    delegations.display()
                );
                Ok(Atlas {
                    governorates: RegionSet::from_path(
                        governorates,
                        Tier::Governorate,
                        governorate_keys,
                    )?,
                    delegations: RegionSet::from_path(
                        delegations,
                        Tier::Delegation,
                        delegation_keys,
                    )?,
                })
            }
            GeometrySource::Sample => {
                info!("Loading embedded sample boundaries");
                Atlas::sample()
            }
        }
    }
}

impl Default for GeometrySource {
    fn default() -> Self {
        GeometrySource::files(DEFAULT_GOVERNORATES_PATH, DEFAULT_DELEGATIONS_PATH)
    }
}

/// Loads the atlas once and hands out shared references until the
/// source changes.
///
/// Boundaries are static reference data, so the store never re-reads
/// files on its own. Changing the source (or calling
/// [`invalidate`](Self::invalidate)) drops the cached atlas.
#[derive(Debug, Default)]
pub struct GeometryStore {
    source: GeometrySource,
    cached: Option<Rc<Atlas>>,
}

impl GeometryStore {
    pub fn new(source: GeometrySource) -> Self {
        GeometryStore {
            source,
            cached: None,
        }
    }

    pub fn source(&self) -> &GeometrySource {
        &self.source
    }

    /// Return the cached atlas, loading it on first use.
    ///
    /// Any load failure is fatal for the caller; nothing is cached.
    pub fn load(&mut self) -> Result<Rc<Atlas>> {
        if let Some(atlas) = &self.cached {
            return Ok(Rc::clone(atlas));
        }
        let atlas = Rc::new(self.source.load()?);
        self.cached = Some(Rc::clone(&atlas));
        Ok(atlas)
    }

    /// Point the store at another source; the cache is dropped only if the
    /// source actually changed.
    pub fn set_source(&mut self, source: GeometrySource) {
        if source != self.source {
            self.cached = None;
            self.source = source;
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cached.is_some()
    }
}
