//! OpenTopoData batch elevation lookups with a shared response cache.

use std::time::Instant;

use floodguard_core::{Coordinate, ElevationSource, ProviderError};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::cache::{CacheEntry, ResponseCache};
use crate::config::ServiceConfig;
use crate::http::{build_client, read_body, request_error};

const SERVICE: &str = "opentopodata";

/// Cache key: coordinates rounded to 1e-5 degrees (about a metre).
type CoordKey = (i64, i64);

fn coord_key(coord: Coordinate) -> CoordKey {
    (
        (coord.lat * 1e5).round() as i64,
        (coord.lon * 1e5).round() as i64,
    )
}

#[derive(Debug, Clone)]
struct CachedElevation {
    fetched_at: Instant,
    elevation_m: Option<f64>,
}

impl CacheEntry for CachedElevation {
    fn fetched_at(&self) -> Instant {
        self.fetched_at
    }
}

#[derive(Debug, Deserialize)]
struct OpenTopoResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<OpenTopoResult>,
}

#[derive(Debug, Deserialize)]
struct OpenTopoResult {
    elevation: Option<f64>,
}

/// Parse an OpenTopoData response into exactly `expected` values.
pub fn parse_elevation_response(
    body: &str,
    expected: usize,
) -> Result<Vec<Option<f64>>, ProviderError> {
    let payload: OpenTopoResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::malformed(SERVICE, err))?;

    if let Some(status) = payload.status.as_deref() {
        if status != "OK" {
            let detail = payload.error.unwrap_or_else(|| status.to_string());
            return Err(ProviderError::malformed(SERVICE, detail));
        }
    }

    let mut values: Vec<Option<f64>> = payload
        .results
        .into_iter()
        .map(|r| r.elevation.filter(|v| v.is_finite()))
        .collect();
    values.resize(expected, None);
    Ok(values)
}

/// `lat,lon|lat,lon|...` as expected by the `locations` parameter.
pub fn locations_param(coords: &[Coordinate]) -> String {
    coords
        .iter()
        .map(|c| format!("{},{}", c.lat, c.lon))
        .collect::<Vec<_>>()
        .join("|")
}

pub struct OpenTopoData {
    client: Client,
    url: String,
    chunk_size: usize,
    cache: ResponseCache<CoordKey, CachedElevation>,
}

impl OpenTopoData {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeouts.elevation)?,
            url: config.elevation_url.trim().to_string(),
            chunk_size: config.elevation_chunk_size.max(1),
            cache: ResponseCache::new(
                config.elevation_cache_ttl,
                config.elevation_cache_max_entries,
            ),
        })
    }

    fn fetch_chunk(&self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("locations", locations_param(coords))])
            .send()
            .map_err(|err| request_error(SERVICE, err))?;
        let body = read_body(SERVICE, response)?;
        parse_elevation_response(&body, coords.len())
    }
}

impl ElevationSource for OpenTopoData {
    fn elevations(&self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>, ProviderError> {
        if self.url.is_empty() {
            return Err(ProviderError::NotConfigured {
                service: SERVICE,
                message: "elevation URL is empty".into(),
            });
        }

        let mut out: Vec<Option<f64>> = vec![None; coords.len()];
        let mut misses: Vec<usize> = Vec::new();
        for (index, coord) in coords.iter().enumerate() {
            match self.cache.fresh(&coord_key(*coord)) {
                Some(hit) => out[index] = hit.elevation_m,
                None => misses.push(index),
            }
        }
        if misses.is_empty() {
            return Ok(out);
        }

        let mut failed_chunks = 0usize;
        let mut last_error = None;
        let chunks: Vec<&[usize]> = misses.chunks(self.chunk_size).collect();

        for chunk in &chunks {
            let chunk_coords: Vec<Coordinate> = chunk.iter().map(|&i| coords[i]).collect();
            match self.fetch_chunk(&chunk_coords) {
                Ok(values) => {
                    let now = Instant::now();
                    for (&index, value) in chunk.iter().zip(values) {
                        out[index] = value;
                        self.cache.insert(
                            coord_key(coords[index]),
                            CachedElevation {
                                fetched_at: now,
                                elevation_m: value,
                            },
                        );
                    }
                }
                Err(err) => {
                    failed_chunks += 1;
                    let mut stale_hits = 0usize;
                    for &index in chunk.iter() {
                        if let Some(stale) = self.cache.stale(&coord_key(coords[index])) {
                            out[index] = stale.elevation_m;
                            stale_hits += 1;
                        }
                    }
                    tracing::warn!(
                        points = chunk.len(),
                        stale_hits,
                        error = %err,
                        "elevation chunk failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        // Only surface an error when nothing at all could be answered.
        if failed_chunks == chunks.len() && out.iter().all(Option::is_none) {
            if let Some(err) = last_error {
                return Err(err);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_and_nulls() {
        let body = r#"{
            "results": [
                {"dataset": "srtm90m", "elevation": 45.2, "location": {"lat": 26.1, "lng": 91.7}},
                {"dataset": "srtm90m", "elevation": null, "location": {"lat": 0.0, "lng": 0.0}}
            ],
            "status": "OK"
        }"#;
        assert_eq!(parse_elevation_response(body, 2).unwrap(), vec![Some(45.2), None]);
        assert_eq!(
            parse_elevation_response(body, 3).unwrap(),
            vec![Some(45.2), None, None]
        );
        assert_eq!(parse_elevation_response(body, 1).unwrap(), vec![Some(45.2)]);
    }

    #[test]
    fn rejects_error_status() {
        let body = r#"{"error": "Too many locations provided (101), the limit is 100.", "status": "INVALID_REQUEST"}"#;
        let err = parse_elevation_response(body, 101).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
        assert!(err.to_string().contains("limit is 100"));
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_elevation_response("<html>busy</html>", 1).is_err());
    }

    #[test]
    fn builds_locations_param() {
        let coords = [Coordinate::new(26.1, 91.7), Coordinate::new(-1.5, 30.25)];
        assert_eq!(locations_param(&coords), "26.1,91.7|-1.5,30.25");
    }

    #[test]
    fn nearby_coordinates_share_cache_key() {
        assert_eq!(
            coord_key(Coordinate::new(26.144_501, 91.736_2)),
            coord_key(Coordinate::new(26.144_504, 91.736_2))
        );
        assert_ne!(
            coord_key(Coordinate::new(26.1445, 91.7362)),
            coord_key(Coordinate::new(26.1446, 91.7362))
        );
    }

    #[test]
    fn empty_url_is_not_configured() {
        let config = ServiceConfig {
            elevation_url: "  ".into(),
            ..ServiceConfig::default()
        };
        let source = OpenTopoData::new(&config).unwrap();
        let err = source.elevations(&[Coordinate::new(0.0, 0.0)]).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured { .. }));
    }

    #[test]
    #[ignore]
    fn live_lookup_returns_elevation() {
        let mut config = ServiceConfig::from_env();
        if let Ok(url) = std::env::var("FLOODGUARD_TEST_ELEVATION_URL") {
            config.elevation_url = url;
        }
        let source = OpenTopoData::new(&config).unwrap();
        let values = source
            .elevations(&[Coordinate::new(26.1445, 91.7362)])
            .unwrap();
        assert_eq!(values.len(), 1);
        assert!(values[0].is_some());
    }
}
