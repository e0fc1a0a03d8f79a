//! End-to-end site assessment with in-memory collaborators.

use std::collections::BTreeMap;
use std::sync::Mutex;

use floodguard_core::spatial::distance_m;
use floodguard_core::{
    Collaborators, Coordinate, CurrentWeather, ElevationSource, EvacuationPlanner, FloodIndex,
    Forecast, ForecastEntry, PoiFeature, PoiSource, ProviderError, RiskLevel, RouteKind,
    RouteResult, RouteSource, WeatherSource,
};

const SITE: Coordinate = Coordinate::new(26.1445, 91.7362);

/// 3 m at the site, rising 4.5 m per km of distance.
struct SlopedTerrain;

impl ElevationSource for SlopedTerrain {
    fn elevations(&self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>, ProviderError> {
        Ok(coords
            .iter()
            .map(|c| Some(3.0 + distance_m(SITE, *c) / 1000.0 * 4.5))
            .collect())
    }
}

struct Rain {
    one_hour_mm: f64,
}

impl WeatherSource for Rain {
    fn current(&self, _at: Coordinate) -> Result<CurrentWeather, ProviderError> {
        Ok(CurrentWeather {
            rain_1h_mm: Some(self.one_hour_mm),
            rain_3h_mm: None,
            temperature_c: Some(27.0),
            description: Some("heavy intensity rain".into()),
        })
    }

    fn forecast(&self, _at: Coordinate) -> Result<Forecast, ProviderError> {
        let now = chrono::Utc::now();
        Ok(Forecast {
            entries: vec![
                ForecastEntry { timestamp: now, rain_3h_mm: Some(8.0), description: None },
                ForecastEntry { timestamp: now, rain_3h_mm: Some(21.5), description: None },
            ],
        })
    }
}

fn poi_north(meters: f64, amenity: &str, name: &str) -> PoiFeature {
    let mut tags = BTreeMap::new();
    tags.insert("amenity".to_string(), amenity.to_string());
    tags.insert("name".to_string(), name.to_string());
    PoiFeature {
        coord: Coordinate::new(SITE.lat + meters / 111_195.0, SITE.lon),
        tags,
    }
}

struct Amenities;

impl PoiSource for Amenities {
    fn pois_near(
        &self,
        _center: Coordinate,
        _radius_m: f64,
    ) -> Result<Vec<PoiFeature>, ProviderError> {
        Ok(vec![
            poi_north(300.0, "school", "Govt High School"),
            poi_north(500.0, "shelter", "Flood Relief Shelter"),
            poi_north(1200.0, "hospital", "Civil Hospital"),
        ])
    }
}

/// Routes only to targets within 1 km; records every request.
#[derive(Default)]
struct ShortRangeRouter {
    requests: Mutex<Vec<Coordinate>>,
}

impl RouteSource for ShortRangeRouter {
    fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
    ) -> Result<Option<RouteResult>, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(to);
        }
        if distance_m(from, to) > 1000.0 {
            return Err(ProviderError::unavailable("osrm", "timed out"));
        }
        Ok(Some(RouteResult {
            path: vec![from, to],
            distance_m: 640.0,
            duration_s: 75.0,
        }))
    }
}

struct Offline;

impl ElevationSource for Offline {
    fn elevations(&self, _coords: &[Coordinate]) -> Result<Vec<Option<f64>>, ProviderError> {
        Err(ProviderError::unavailable("opentopodata", "dns failure"))
    }
}

impl PoiSource for Offline {
    fn pois_near(
        &self,
        _center: Coordinate,
        _radius_m: f64,
    ) -> Result<Vec<PoiFeature>, ProviderError> {
        Err(ProviderError::Status { service: "overpass", status: 429 })
    }
}

impl RouteSource for Offline {
    fn route(
        &self,
        _from: Coordinate,
        _to: Coordinate,
    ) -> Result<Option<RouteResult>, ProviderError> {
        Err(ProviderError::unavailable("osrm", "refused"))
    }
}

impl WeatherSource for Offline {
    fn current(&self, _at: Coordinate) -> Result<CurrentWeather, ProviderError> {
        Err(ProviderError::NotConfigured {
            service: "openweathermap",
            message: "missing API key".into(),
        })
    }

    fn forecast(&self, _at: Coordinate) -> Result<Forecast, ProviderError> {
        Err(ProviderError::NotConfigured {
            service: "openweathermap",
            message: "missing API key".into(),
        })
    }
}

fn flood_zone(bfe: f64) -> FloodIndex {
    let (lat, lon) = (SITE.lat, SITE.lon);
    let raw = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "BFE": bfe },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lon - 0.1, lat - 0.1],
                    [lon + 0.1, lat - 0.1],
                    [lon + 0.1, lat + 0.1],
                    [lon - 0.1, lat + 0.1],
                    [lon - 0.1, lat - 0.1]
                ]]
            }
        }]
    })
    .to_string();
    let index = FloodIndex::new();
    index.load_geojson_str(&raw).unwrap();
    index
}

#[test]
fn high_risk_site_gets_evacuation_plan() {
    let floods = flood_zone(10.0);
    let router = ShortRangeRouter::default();
    let services = Collaborators {
        elevation: &SlopedTerrain,
        pois: &Amenities,
        routes: &router,
        weather: &Rain { one_hour_mm: 12.0 },
    };

    let assessment = EvacuationPlanner::new(services, &floods).assess(SITE);

    assert_eq!(assessment.level(), RiskLevel::High);
    assert_eq!(assessment.verdict.reasons, ["heavy rain + low elevation"]);
    assert_eq!(assessment.elevation_m, Some(3.0));
    assert_eq!(assessment.bfe_m, Some(10.0));
    assert_eq!(assessment.forecast_peak_rain_3h_mm, Some(21.5));
    assert_eq!(assessment.display_radius_m, 8600);
    assert!(assessment.flood_data_loaded);

    // POIs nearest first.
    let names: Vec<_> = assessment.pois.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, ["Govt High School", "Flood Relief Shelter", "Civil Hospital"]);

    // Rings at 500, 1000 and 1500 m stay at or below the 10 m flood elevation.
    assert_eq!(assessment.low_areas.len(), 36);
    assert!(assessment.low_areas.iter().all(|a| a.bfe_m == Some(10.0)));
    assert!(assessment.low_areas.iter().all(|a| a.radius_m <= 1500.0));

    let plan = assessment.evacuation.expect("high risk has a plan");
    let shelter = plan.shelter.expect("shelter found");
    assert_eq!(shelter.poi.name.as_deref(), Some("Flood Relief Shelter"));

    // Target max(3 + 8, 16) = 16 m is first reached on the 3 km ring.
    let high = plan.high_ground.expect("high ground found");
    assert!(high.elevation_m >= 16.0);
    assert!((high.distance_m - 3000.0).abs() < 20.0);

    let to_shelter = plan.route_to_shelter.expect("route to shelter");
    assert_eq!(to_shelter.kind, RouteKind::Routed);
    assert_eq!(to_shelter.duration_s, Some(75.0));

    let to_high = plan.route_to_high_ground.expect("route to high ground");
    assert_eq!(to_high.kind, RouteKind::Direct);
    assert_eq!(to_high.path.len(), 2);

    assert_eq!(router.requests.lock().unwrap().len(), 2);
}

#[test]
fn light_rain_skips_evacuation_targets() {
    let floods = FloodIndex::new();
    let router = ShortRangeRouter::default();
    let services = Collaborators {
        elevation: &SlopedTerrain,
        pois: &Amenities,
        routes: &router,
        weather: &Rain { one_hour_mm: 2.0 },
    };

    let assessment = EvacuationPlanner::new(services, &floods).assess(SITE);

    assert_eq!(assessment.level(), RiskLevel::Low);
    assert!(assessment.verdict.reasons.is_empty());
    assert!(assessment.evacuation.is_none());
    assert!(assessment.bfe_m.is_none());
    assert!(!assessment.flood_data_loaded);
    // Without flood data every sampled point is under the 135 m threshold.
    assert_eq!(assessment.low_areas.len(), 72);
    assert_eq!(assessment.pois.len(), 3);
    assert!(router.requests.lock().unwrap().is_empty());
}

#[test]
fn offline_collaborators_degrade_to_unknowns() {
    let floods = FloodIndex::new();
    let services = Collaborators {
        elevation: &Offline,
        pois: &Offline,
        routes: &Offline,
        weather: &Offline,
    };

    let assessment = EvacuationPlanner::new(services, &floods).assess(SITE);

    assert_eq!(assessment.level(), RiskLevel::Low);
    assert_eq!(assessment.verdict.rainfall_mm, 0.0);
    assert_eq!(assessment.display_radius_m, 1000);
    assert!(assessment.elevation_m.is_none());
    assert!(assessment.weather.is_none());
    assert!(assessment.forecast_peak_rain_3h_mm.is_none());
    assert!(assessment.pois.is_empty());
    assert!(assessment.low_areas.is_empty());
}

#[test]
fn assessment_serializes_flat_verdict() {
    let floods = FloodIndex::new();
    let services = Collaborators {
        elevation: &SlopedTerrain,
        pois: &Amenities,
        routes: &Offline,
        weather: &Rain { one_hour_mm: 12.0 },
    };

    let assessment = EvacuationPlanner::new(services, &floods).assess(SITE);
    let value = serde_json::to_value(&assessment).unwrap();

    assert_eq!(value["level"], "high");
    assert_eq!(value["rainfall_mm"], 12.0);
    assert_eq!(value["evacuation"]["route_to_shelter"]["kind"], "direct");
}
