//! Listing of thematic zone layers.

use crate::OutputArgs;
use anyhow::Context;
use geojson::FeatureCollection;
use log::info;
use sdg_geo::region::parse_feature_collection;
use sdg_geo::remote::fetch_feature_collection;
use sdg_geo::zone::zones_from_collection;
use std::fs;
use std::time::Duration;

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

async fn load_collection(source: &str) -> anyhow::Result<FeatureCollection> {
    if is_remote(source) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(fetch_feature_collection(&client, source).await?)
    } else {
        let text = fs::read_to_string(source)
            .with_context(|| format!("Failed to read zone layer {}", source))?;
        Ok(parse_feature_collection(&text)?)
    }
}

/// Print the name and description of every zone in a layer.
pub async fn run_zones(
    source: &str,
    name_key: &str,
    description_key: &str,
    output: OutputArgs,
) -> anyhow::Result<()> {
    let collection = load_collection(source).await?;
    let zones = zones_from_collection(&collection, name_key, description_key);
    info!("{} zones in {}", zones.len(), source);

    if output.json {
        println!("{}", serde_json::to_string_pretty(&zones)?);
        return Ok(());
    }
    for zone in &zones {
        match zone.plain_description() {
            Some(description) if !description.is_empty() => {
                println!("{}: {}", output.label(&zone.name), output.label(&description))
            }
            _ => println!("{}", output.label(&zone.name)),
        }
    }
    Ok(())
}
