//! Overpass API amenity search.

use std::collections::BTreeMap;

use floodguard_core::{Coordinate, PoiFeature, PoiSource, ProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::http::{build_client, read_body, request_error};

const SERVICE: &str = "overpass";

/// Amenity values requested from Overpass.
pub const AMENITY_FILTER: &str = "hospital|police|fire_station|shelter|community_centre|school";

/// Elements returned per query.
pub const RESULT_LIMIT: usize = 50;

/// Overpass QL for nodes, ways and relations around `center`.
pub fn build_query(center: Coordinate, radius_m: f64) -> String {
    let around = format!("around:{:.0},{},{}", radius_m.max(0.0), center.lat, center.lon);
    let filter = format!("[\"amenity\"~\"{AMENITY_FILTER}\"]");
    format!(
        concat!(
            "[out:json][timeout:25];\n",
            "(\n",
            "  node({around}){filter};\n",
            "  way({around}){filter};\n",
            "  relation({around}){filter};\n",
            ");\n",
            "out center {limit};\n",
        ),
        around = around,
        filter = filter,
        limit = RESULT_LIMIT,
    )
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    #[serde(default)]
    tags: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

/// Convert an Overpass JSON response to features. Nodes use their own
/// position; ways and relations use their `center` and are dropped without one.
pub fn parse_overpass_response(body: &str) -> Result<Vec<PoiFeature>, ProviderError> {
    let payload: OverpassResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::malformed(SERVICE, err))?;

    let features = payload
        .elements
        .into_iter()
        .filter_map(|element| {
            let (lat, lon) = if element.kind == "node" {
                (element.lat?, element.lon?)
            } else {
                let center = element.center?;
                (center.lat, center.lon)
            };
            let coord = Coordinate::checked(lat, lon).ok()?;
            let tags = element
                .tags
                .into_iter()
                .map(|(key, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (key, value)
                })
                .collect();
            Some(PoiFeature { coord, tags })
        })
        .collect();
    Ok(features)
}

pub struct OverpassPois {
    client: Client,
    url: String,
}

impl OverpassPois {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeouts.overpass)?,
            url: config.overpass_url.trim().to_string(),
        })
    }
}

impl PoiSource for OverpassPois {
    fn pois_near(
        &self,
        center: Coordinate,
        radius_m: f64,
    ) -> Result<Vec<PoiFeature>, ProviderError> {
        let response = self
            .client
            .post(&self.url)
            .body(build_query(center, radius_m))
            .send()
            .map_err(|err| request_error(SERVICE, err))?;
        let body = read_body(SERVICE, response)?;
        let features = parse_overpass_response(&body)?;
        tracing::debug!(count = features.len(), radius_m, "overpass returned features");
        Ok(features)
    }
}
