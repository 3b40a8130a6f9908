//! Download of GeoJSON layers published over HTTP.

use crate::error::{GeometryError, Result};
use crate::region::parse_feature_collection;
use geojson::FeatureCollection;
use log::{info, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;

const MAX_TRIES: u32 = 3;

/// Fetch a FeatureCollection, retrying transport failures and bad
/// statuses with exponential backoff. A body that is not a valid
/// FeatureCollection fails immediately.
pub async fn fetch_feature_collection(client: &Client, url: &str) -> Result<FeatureCollection> {
    let mut sleep_millis: u64 = 1000;

    for attempt in 1..=MAX_TRIES {
        match client.get(url).send().await {
            Ok(response) => {
                if response.status() != StatusCode::OK {
                    warn!(
                        "Attempt {}/{}: Bad response status for {}: {}",
                        attempt,
                        MAX_TRIES,
                        url,
                        response.status()
                    );
                } else {
                    match response.text().await {
                        Ok(body) => {
                            info!("Downloaded {} bytes from {}", body.len(), url);
                            return parse_feature_collection(&body);
                        }
                        Err(e) => {
                            warn!(
                                "Attempt {}/{}: Failed to read response body for {}: {}",
                                attempt, MAX_TRIES, url, e
                            );
                        }
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{}: Request failed for {}: {}",
                    attempt, MAX_TRIES, url, e
                );
            }
        }

        if attempt < MAX_TRIES {
            info!("Sleeping for {} milliseconds before retry", sleep_millis);
            tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
            sleep_millis *= 2;
        }
    }

    Err(GeometryError::FetchFailed {
        url: url.to_string(),
        attempts: MAX_TRIES,
    })
}
