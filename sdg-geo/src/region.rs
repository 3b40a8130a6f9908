use crate::error::{GeometryError, Result};
use crate::resolver::{resolve_with, ResolvePolicy};
use geo::{Area, BoundingRect, Contains, MultiPolygon, Point, Polygon, Rect};
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, Value as GeoValue};
use log::{debug, info, warn};
use sdg_utils::text::normalize;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt, fs, path::Path};

/// Administrative level of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Governorate,
    Delegation,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Governorate => write!(f, "governorate"),
            Tier::Delegation => write!(f, "delegation"),
        }
    }
}

/// Names of the GeoJSON properties that carry a tier's labels.
///
/// Only `name_local` is required for every tier. Delegations additionally
/// require `parent_label` when a key is configured for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyKeys {
    pub name_local: String,
    pub name_alt: Option<String>,
    pub code: Option<String>,
    pub parent_label: Option<String>,
    pub parent_code: Option<String>,
}

impl PropertyKeys {
    /// Keys used by the national governorate layer (`TN-gouvernorats.geojson`).
    pub fn governorates() -> Self {
        PropertyKeys {
            name_local: "gouv_fr".to_string(),
            name_alt: Some("gouv_ar".to_string()),
            code: Some("gouv_id".to_string()),
            parent_label: None,
            parent_code: None,
        }
    }

    /// Keys used by the national delegation layer (`TN-delegations_raw.geojson`).
    pub fn delegations() -> Self {
        PropertyKeys {
            name_local: "del_fr".to_string(),
            name_alt: Some("del_ar".to_string()),
            code: Some("del_id".to_string()),
            parent_label: Some("gouv_fr".to_string()),
            parent_code: Some("gouv_id".to_string()),
        }
    }

    /// Default keys for a tier.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::Governorate => PropertyKeys::governorates(),
            Tier::Delegation => PropertyKeys::delegations(),
        }
    }
}

/// A named administrative area with its boundary.
///
/// Polygon boundaries are stored as a one-part MultiPolygon so containment
/// is always the union of the parts.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub tier: Tier,
    /// Primary label (French in the national layers)
    pub name_local: String,
    /// Secondary-script label (Arabic), used to join measurement stations
    pub name_alt: Option<String>,
    pub code: Option<String>,
    /// Label of the governorate a delegation belongs to
    pub parent_label: Option<String>,
    pub parent_code: Option<String>,
    pub boundary: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl Region {
    pub fn new(tier: Tier, name_local: impl Into<String>, boundary: MultiPolygon<f64>) -> Self {
        let bounds = boundary.bounding_rect();
        Region {
            tier,
            name_local: name_local.into(),
            name_alt: None,
            code: None,
            parent_label: None,
            parent_code: None,
            boundary,
            bounds,
        }
    }

    pub fn with_alt(mut self, name_alt: impl Into<String>) -> Self {
        self.name_alt = Some(name_alt.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_parent(mut self, label: impl Into<String>, code: Option<String>) -> Self {
        self.parent_label = Some(label.into());
        self.parent_code = code;
        self
    }

    /// Build a region from one GeoJSON feature.
    ///
    /// `index` is the feature's position in its collection and only feeds
    /// error messages.
    pub fn from_feature(
        index: usize,
        feature: Feature,
        tier: Tier,
        keys: &PropertyKeys,
    ) -> Result<Self> {
        let props = feature.properties.as_ref();
        let name_local = property_string(props, &keys.name_local).ok_or_else(|| {
            GeometryError::MissingProperty {
                index,
                key: keys.name_local.clone(),
            }
        })?;
        let name_alt = keys.name_alt.as_deref().and_then(|k| property_string(props, k));
        let code = keys.code.as_deref().and_then(|k| property_string(props, k));
        let parent_label = match (tier, keys.parent_label.as_deref()) {
            (Tier::Delegation, Some(key)) => Some(property_string(props, key).ok_or_else(|| {
                GeometryError::MissingProperty {
                    index,
                    key: key.to_string(),
                }
            })?),
            (_, key) => key.and_then(|k| property_string(props, k)),
        };
        let parent_code = keys
            .parent_code
            .as_deref()
            .and_then(|k| property_string(props, k));

        let geometry = feature
            .geometry
            .ok_or(GeometryError::MissingGeometry { index })?;
        let boundary = match geometry.value {
            v @ GeoValue::Polygon(_) => MultiPolygon::new(vec![Polygon::<f64>::try_from(v)?]),
            v @ GeoValue::MultiPolygon(_) => MultiPolygon::<f64>::try_from(v)?,
            other => {
                return Err(GeometryError::UnsupportedGeometry {
                    index,
                    kind: geometry_kind(&other),
                })
            }
        };

        let mut region = Region::new(tier, name_local, boundary);
        region.name_alt = name_alt;
        region.code = code;
        region.parent_label = parent_label;
        region.parent_code = parent_code;
        Ok(region)
    }

    /// True if the point lies strictly inside any part of the boundary.
    ///
    /// Points exactly on an edge are implementation-defined.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self.bounds {
            Some(rect) => {
                let (min, max) = (rect.min(), rect.max());
                point.x() >= min.x
                    && point.x() <= max.x
                    && point.y() >= min.y
                    && point.y() <= max.y
                    && self.boundary.contains(point)
            }
            None => false,
        }
    }

    /// Planar area in squared degrees; only meaningful for comparisons.
    pub fn area(&self) -> f64 {
        self.boundary.unsigned_area()
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// True if `label` names this region in either script.
    pub fn is_named(&self, label: &str) -> bool {
        let wanted = normalize(label);
        normalize(&self.name_local) == wanted
            || self
                .name_alt
                .as_deref()
                .is_some_and(|alt| normalize(alt) == wanted)
    }
}

/// One tier of regions, kept in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet {
    tier: Tier,
    regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(tier: Tier, regions: Vec<Region>) -> Self {
        RegionSet { tier, regions }
    }

    pub fn from_feature_collection(
        collection: FeatureCollection,
        tier: Tier,
        keys: &PropertyKeys,
    ) -> Result<Self> {
        let regions = collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| Region::from_feature(index, feature, tier, keys))
            .collect::<Result<Vec<Region>>>()?;
        let missing_alt = regions.iter().filter(|r| r.name_alt.is_none()).count();
        if missing_alt > 0 {
            warn!(
                "{} of {} {} regions have no alternate-script label",
                missing_alt,
                regions.len(),
                tier
            );
        }
        info!("Loaded {} {} regions", regions.len(), tier);
        Ok(RegionSet { tier, regions })
    }

    pub fn from_geojson_str(geojson: &str, tier: Tier, keys: &PropertyKeys) -> Result<Self> {
        let collection = parse_feature_collection(geojson)?;
        RegionSet::from_feature_collection(collection, tier, keys)
    }

    pub fn from_path(path: &Path, tier: Tier, keys: &PropertyKeys) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| GeometryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", contents.len(), path.display());
        RegionSet::from_geojson_str(&contents, tier, keys)
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// First region (in file order) containing the point.
    pub fn resolve(&self, point: Point<f64>) -> Option<&Region> {
        self.resolve_with(point, ResolvePolicy::FirstMatch)
    }

    pub fn resolve_with(&self, point: Point<f64>, policy: ResolvePolicy) -> Option<&Region> {
        let hit = resolve_with(point, &self.regions, policy);
        match hit {
            Some(region) => debug!(
                "({}, {}) resolved to {} {}",
                point.x(),
                point.y(),
                self.tier,
                region.name_local
            ),
            None => debug!("({}, {}) is outside every {}", point.x(), point.y(), self.tier),
        }
        hit
    }

    /// Look a region up by either label.
    pub fn find(&self, label: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.is_named(label))
    }

    /// Regions whose parent is `parent`, matched by code when both sides
    /// carry one and by normalized label otherwise.
    pub fn children_of<'a>(&'a self, parent: &'a Region) -> impl Iterator<Item = &'a Region> + 'a {
        self.regions.iter().filter(move |child| {
            match (child.parent_code.as_deref(), parent.code.as_deref()) {
                (Some(child_code), Some(parent_code)) => child_code == parent_code,
                _ => child
                    .parent_label
                    .as_deref()
                    .is_some_and(|label| parent.is_named(label)),
            }
        })
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

/// Parse a GeoJSON document that must be a FeatureCollection.
pub fn parse_feature_collection(geojson: &str) -> Result<FeatureCollection> {
    match geojson.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(GeometryError::NotFeatureCollection("Feature")),
        GeoJson::Geometry(_) => Err(GeometryError::NotFeatureCollection("Geometry")),
    }
}

/// Read a label-like property: trimmed non-empty strings, or numbers
/// rendered as text. Anything else counts as absent.
pub(crate) fn property_string(props: Option<&JsonObject>, key: &str) -> Option<String> {
    match props?.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn geometry_kind(value: &GeoValue) -> &'static str {
    match value {
        GeoValue::Point(_) => "Point",
        GeoValue::MultiPoint(_) => "MultiPoint",
        GeoValue::LineString(_) => "LineString",
        GeoValue::MultiLineString(_) => "MultiLineString",
        GeoValue::Polygon(_) => "Polygon",
        GeoValue::MultiPolygon(_) => "MultiPolygon",
        GeoValue::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{SAMPLE_DELEGATIONS, SAMPLE_GOVERNORATES};

    fn delegations() -> RegionSet {
        RegionSet::from_geojson_str(SAMPLE_DELEGATIONS, Tier::Delegation, &PropertyKeys::delegations())
            .unwrap()
    }

    #[test]
    fn test_parse_sample_delegations() {
        let set = delegations();
        assert_eq!(set.len(), 6);
        assert_eq!(set.tier(), Tier::Delegation);

        let joumine = &set.regions()[0];
        assert_eq!(joumine.name_local, "Joumine");
        assert_eq!(joumine.name_alt.as_deref(), Some("جومين"));
        assert_eq!(joumine.code.as_deref(), Some("1711"));
        assert_eq!(joumine.parent_label.as_deref(), Some("Bizerte"));
        assert_eq!(joumine.parent_code.as_deref(), Some("TN17"));
        assert_eq!(joumine.boundary.0.len(), 1);
    }

    #[test]
    fn test_null_alt_label_is_tolerated() {
        let set = delegations();
        let sidi = set.find("Sidi Makhlouf").unwrap();
        assert_eq!(sidi.name_alt, None);
    }

    #[test]
    fn test_multipolygon_keeps_every_part() {
        let set = RegionSet::from_geojson_str(
            SAMPLE_GOVERNORATES,
            Tier::Governorate,
            &PropertyKeys::governorates(),
        )
        .unwrap();
        let medenine = set.find("مدنين").unwrap();
        assert_eq!(medenine.name_local, "Medenine");
        assert_eq!(medenine.boundary.0.len(), 2);
        assert!(medenine.parent_label.is_none());
    }

    #[test]
    fn test_missing_local_label_is_fatal() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"gouv_ar":"بنزرت"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}]}"#;
        let err = RegionSet::from_geojson_str(doc, Tier::Governorate, &PropertyKeys::governorates())
            .unwrap_err();
        match err {
            GeometryError::MissingProperty { index, key } => {
                assert_eq!(index, 0);
                assert_eq!(key, "gouv_fr");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_delegation_without_parent_is_fatal() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"del_fr":"Joumine","del_ar":"جومين"},
             "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}]}"#;
        let err = RegionSet::from_geojson_str(doc, Tier::Delegation, &PropertyKeys::delegations())
            .unwrap_err();
        assert!(matches!(err, GeometryError::MissingProperty { ref key, .. } if key == "gouv_fr"));
    }

    #[test]
    fn test_point_geometry_is_rejected() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"gouv_fr":"Tunis"},
             "geometry":{"type":"Point","coordinates":[10.18,36.8]}}]}"#;
        let err = RegionSet::from_geojson_str(doc, Tier::Governorate, &PropertyKeys::governorates())
            .unwrap_err();
        assert!(matches!(
            err,
            GeometryError::UnsupportedGeometry { index: 0, kind: "Point" }
        ));
    }

    #[test]
    fn test_missing_geometry_is_rejected() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"gouv_fr":"Tunis"},"geometry":null}]}"#;
        let err = RegionSet::from_geojson_str(doc, Tier::Governorate, &PropertyKeys::governorates())
            .unwrap_err();
        assert!(matches!(err, GeometryError::MissingGeometry { index: 0 }));
    }

    #[test]
    fn test_bare_feature_is_not_a_collection() {
        let doc = r#"{"type":"Feature","properties":{"gouv_fr":"Tunis"},
            "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}}"#;
        let err = parse_feature_collection(doc).unwrap_err();
        assert!(matches!(err, GeometryError::NotFeatureCollection("Feature")));
        assert!(matches!(
            parse_feature_collection("{not json").unwrap_err(),
            GeometryError::Parse(_)
        ));
    }

    #[test]
    fn test_children_of_governorate() {
        let governorates = RegionSet::from_geojson_str(
            SAMPLE_GOVERNORATES,
            Tier::Governorate,
            &PropertyKeys::governorates(),
        )
        .unwrap();
        let delegations = delegations();
        let bizerte = governorates.find("Bizerte").unwrap();
        let names: Vec<&str> = delegations
            .children_of(bizerte)
            .map(|r| r.name_local.as_str())
            .collect();
        assert_eq!(names, vec!["Joumine", "Mateur", "Bizerte Nord"]);
    }
}
