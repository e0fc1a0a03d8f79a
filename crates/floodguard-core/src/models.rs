//! Core data models for the flood-risk engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        let coord = Self::new(lat, lon);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(CoordinateError::OutOfRange { lat, lon })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// One elevation lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationSample {
    pub coord: Coordinate,
    pub elevation_m: Option<f64>,
}

/// Raw point feature as returned by a POI collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiFeature {
    pub coord: Coordinate,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A point of interest annotated with its distance from the search origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub coord: Coordinate,
    pub distance_m: f64,
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Poi {
    /// Build a POI from a raw feature. The category is the first non-empty
    /// of the `amenity`, `emergency` and `building` tags.
    pub fn from_feature(feature: PoiFeature, origin: Coordinate) -> Self {
        let distance_m = crate::spatial::distance_m(origin, feature.coord);
        let name = feature.tags.get("name").cloned();
        let category = ["amenity", "emergency", "building"]
            .iter()
            .filter_map(|key| feature.tags.get(*key))
            .find(|value| !value.is_empty())
            .cloned();
        Self {
            coord: feature.coord,
            distance_m,
            name,
            category,
            tags: feature.tags,
        }
    }
}

/// A POI selected as an evacuation shelter, with its category priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelterCandidate {
    #[serde(flatten)]
    pub poi: Poi,
    pub priority: u8,
}

/// A routed path returned by a routing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// Where a planned route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    /// Path produced by the routing service
    Routed,
    /// Straight segment used when routing was unavailable
    Direct,
}

/// A route that can always be drawn: either routed or a straight line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub kind: RouteKind,
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: Option<f64>,
}

/// Three-level flood risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
        }
    }
}

/// Verdict of the risk classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub level: RiskLevel,
    pub reasons: Vec<String>,
    pub rainfall_mm: f64,
}

/// Current conditions from the weather collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    #[serde(default)]
    pub rain_1h_mm: Option<f64>,
    #[serde(default)]
    pub rain_3h_mm: Option<f64>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One step of a weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub rain_3h_mm: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub entries: Vec<ForecastEntry>,
}

impl Forecast {
    /// Largest 3-hour rainfall in the forecast window, if any entry reports rain.
    pub fn peak_rain_3h_mm(&self) -> Option<f64> {
        self.entries
            .iter()
            .filter_map(|entry| entry.rain_3h_mm)
            .filter(|value| value.is_finite())
            .fold(None, |peak: Option<f64>, value| {
                Some(peak.map_or(value, |p| p.max(value)))
            })
    }
}

/// A sampled point that sits at or below the local flood reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowArea {
    pub coord: Coordinate,
    pub elevation_m: f64,
    pub bfe_m: Option<f64>,
    pub radius_m: f64,
    pub bearing_deg: f64,
}

/// Nearest sampled point that clears the high-ground target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighGround {
    pub coord: Coordinate,
    pub elevation_m: f64,
    pub distance_m: f64,
}

/// A feed headline and the link to its detailed alert document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
}

impl Headline {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Fields extracted from a CAP alert document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapAlert {
    pub event: String,
    pub headline: String,
    pub area_desc: String,
    pub polygon: Option<String>,
    pub sent: Option<String>,
}

/// A disaster alert ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub title: String,
    pub link: String,
    pub event: String,
    pub timestamp: String,
    pub areas: String,
    #[serde(default)]
    pub first_coord: Option<Coordinate>,
}

impl AlertRecord {
    pub fn from_cap(link: impl Into<String>, cap: CapAlert) -> Self {
        let first_coord = cap
            .polygon
            .as_deref()
            .and_then(crate::alerts::extract_first_coordinate);
        Self {
            title: cap.headline,
            link: link.into(),
            event: cap.event,
            timestamp: cap.sent.unwrap_or_default(),
            areas: cap.area_desc,
            first_coord,
        }
    }

    /// Parsed `sent` timestamp, when it is valid RFC 3339.
    pub fn sent_at(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        chrono::DateTime::parse_from_rfc3339(self.timestamp.trim()).ok()
    }
}
