//! Administrative boundaries for the dashboard map.
//!
//! Loads the governorate and delegation tiers from GeoJSON, caches them
//! for the session, and resolves a clicked point to the region containing it.

pub mod error;
pub mod region;
pub mod resolver;
pub mod store;
pub mod zone;

#[cfg(feature = "api")]
pub mod remote;

pub use error::GeometryError;
pub use region::{PropertyKeys, Region, RegionSet, Tier};
pub use resolver::{resolve, ClickEvent, ResolvePolicy};
pub use store::{Atlas, GeometrySource, GeometryStore};
