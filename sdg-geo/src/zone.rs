//! Thematic zone layers (e.g. intervention areas) published as GeoJSON.
//!
//! Unlike the boundary tiers these layers are only listed, never resolved
//! against, so features without geometry are kept.

use crate::region::property_string;
use geojson::FeatureCollection;
use serde::Serialize;

/// Name and description of one zone feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub name: String,
    /// Raw description, often an HTML fragment
    pub description: Option<String>,
}

impl Zone {
    /// Description with markup tags removed and whitespace collapsed.
    pub fn plain_description(&self) -> Option<String> {
        self.description.as_deref().map(strip_markup)
    }
}

/// List the zones of a collection.
///
/// Features with no name under `name_key` are listed as `Zone <n>` where
/// `n` is their 1-based position.
pub fn zones_from_collection(
    collection: &FeatureCollection,
    name_key: &str,
    description_key: &str,
) -> Vec<Zone> {
    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let props = feature.properties.as_ref();
            Zone {
                name: property_string(props, name_key)
                    .unwrap_or_else(|| format!("Zone {}", index + 1)),
                description: property_string(props, description_key),
            }
        })
        .collect()
}

fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::parse_feature_collection;

    const ZONES: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"Name":"Zone Nord-Ouest","description":"<b>Siliana</b><br>Bassin&nbsp;versant"},
         "geometry":{"type":"Polygon","coordinates":[[[9.0,36.0],[9.5,36.0],[9.5,36.5],[9.0,36.0]]]}},
        {"type":"Feature","properties":{"description":null},"geometry":null}
    ]}"#;

    #[test]
    fn test_zones_from_collection() {
        let collection = parse_feature_collection(ZONES).unwrap();
        let zones = zones_from_collection(&collection, "Name", "description");
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].name, "Zone Nord-Ouest");
        assert_eq!(
            zones[0].plain_description().as_deref(),
            Some("Siliana Bassin versant")
        );
        assert_eq!(zones[1].name, "Zone 2");
        assert_eq!(zones[1].description, None);
    }
}
