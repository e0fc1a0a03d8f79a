//! OSRM driving routes.

use floodguard_core::{Coordinate, ProviderError, RouteResult, RouteSource};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::http::{build_client, read_body, request_error, trim_base};

const SERVICE: &str = "osrm";

pub fn route_url(base: &str, from: Coordinate, to: Coordinate) -> String {
    format!(
        "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
        trim_base(base),
        from.lon,
        from.lat,
        to.lon,
        to.lat
    )
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON positions, lon first
    coordinates: Vec<[f64; 2]>,
}

/// First route of an OSRM response. `Ok(None)` when OSRM reports anything
/// other than `Ok` or returns no routes.
pub fn parse_route_response(body: &str) -> Result<Option<RouteResult>, ProviderError> {
    let payload: OsrmResponse =
        serde_json::from_str(body).map_err(|err| ProviderError::malformed(SERVICE, err))?;
    if payload.code != "Ok" {
        tracing::debug!(code = %payload.code, "osrm returned no route");
        return Ok(None);
    }
    let Some(route) = payload.routes.into_iter().next() else {
        return Ok(None);
    };
    let path = route
        .geometry
        .coordinates
        .into_iter()
        .map(|[lon, lat]| Coordinate::new(lat, lon))
        .collect();
    Ok(Some(RouteResult {
        path,
        distance_m: route.distance,
        duration_s: route.duration,
    }))
}

pub struct OsrmRouter {
    client: Client,
    base_url: String,
}

impl OsrmRouter {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeouts.osrm)?,
            base_url: config.osrm_url.clone(),
        })
    }
}

impl RouteSource for OsrmRouter {
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Option<RouteResult>, ProviderError> {
        let response = self
            .client
            .get(route_url(&self.base_url, from, to))
            .send()
            .map_err(|err| request_error(SERVICE, err))?;
        let body = read_body(SERVICE, response)?;
        parse_route_response(&body)
    }
}
