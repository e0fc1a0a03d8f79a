//! Site assessment: ties weather, elevation, flood data and amenities into a
//! risk verdict and, for high risk, evacuation targets with routes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::flood_index::FloodIndex;
use crate::models::{
    Coordinate, CurrentWeather, Forecast, HighGround, LowArea, PlannedRoute, Poi, RiskLevel,
    RiskVerdict, ShelterCandidate,
};
use crate::providers::{ElevationSource, PoiSource, RouteSource, WeatherSource};
use crate::risk::RiskClassifier;
use crate::routing::RouteSynthesizer;
use crate::rules::{PlannerRules, RiskRules, SamplingRules, ShelterRules};
use crate::sampling::{round2, ElevationSampler};
use crate::shelter::PoiRanker;

/// External services used during an assessment.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub elevation: &'a dyn ElevationSource,
    pub pois: &'a dyn PoiSource,
    pub routes: &'a dyn RouteSource,
    pub weather: &'a dyn WeatherSource,
}

/// Evacuation targets, only computed for high risk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvacuationPlan {
    pub shelter: Option<ShelterCandidate>,
    pub high_ground: Option<HighGround>,
    pub route_to_shelter: Option<PlannedRoute>,
    pub route_to_high_ground: Option<PlannedRoute>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteAssessment {
    pub location: Coordinate,
    pub assessed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub verdict: RiskVerdict,
    pub display_radius_m: u32,
    pub elevation_m: Option<f64>,
    /// Flood elevation at the site, informational
    pub bfe_m: Option<f64>,
    pub forecast_peak_rain_3h_mm: Option<f64>,
    pub weather: Option<CurrentWeather>,
    pub pois: Vec<Poi>,
    pub low_areas: Vec<LowArea>,
    pub low_area_display_radius_m: f64,
    pub flood_data_loaded: bool,
    pub evacuation: Option<EvacuationPlan>,
}

impl SiteAssessment {
    pub fn level(&self) -> RiskLevel {
        self.verdict.level
    }
}

pub struct EvacuationPlanner<'a> {
    services: Collaborators<'a>,
    floods: &'a FloodIndex,
    planner_rules: PlannerRules,
    sampling_rules: SamplingRules,
    shelter_rules: ShelterRules,
    classifier: RiskClassifier,
}

impl<'a> EvacuationPlanner<'a> {
    pub fn new(services: Collaborators<'a>, floods: &'a FloodIndex) -> Self {
        Self {
            services,
            floods,
            planner_rules: PlannerRules::default(),
            sampling_rules: SamplingRules::default(),
            shelter_rules: ShelterRules::default(),
            classifier: RiskClassifier::default(),
        }
    }

    pub fn with_planner_rules(mut self, rules: PlannerRules) -> Self {
        self.planner_rules = rules;
        self
    }

    pub fn with_sampling_rules(mut self, rules: SamplingRules) -> Self {
        self.sampling_rules = rules;
        self
    }

    pub fn with_shelter_rules(mut self, rules: ShelterRules) -> Self {
        self.shelter_rules = rules;
        self
    }

    pub fn with_risk_rules(mut self, rules: RiskRules) -> Self {
        self.classifier = RiskClassifier::new(rules);
        self
    }

    pub fn planner_rules(&self) -> &PlannerRules {
        &self.planner_rules
    }

    fn sampler(&self) -> ElevationSampler<'a> {
        ElevationSampler::with_rules(self.services.elevation, self.sampling_rules.clone())
    }

    fn ranker(&self) -> PoiRanker<'a> {
        PoiRanker::with_rules(self.services.pois, self.shelter_rules.clone())
    }

    fn current_weather(&self, at: Coordinate) -> Option<CurrentWeather> {
        self.services
            .weather
            .current(at)
            .map_err(|err| tracing::warn!(error = %err, "current weather unavailable"))
            .ok()
    }

    fn forecast(&self, at: Coordinate) -> Option<Forecast> {
        self.services
            .weather
            .forecast(at)
            .map_err(|err| tracing::warn!(error = %err, "forecast unavailable"))
            .ok()
    }

    /// Full assessment of one coordinate.
    pub fn assess(&self, at: Coordinate) -> SiteAssessment {
        let current = self.current_weather(at);
        let forecast = self.forecast(at);

        let sampler = self.sampler();
        let elevation_m = sampler.elevation_at(at);

        let verdict = self
            .classifier
            .assess(current.as_ref(), forecast.as_ref(), elevation_m);
        let display_radius_m = self.classifier.radius_from_rain(verdict.rainfall_mm);

        let floods = self.floods.snapshot();
        let bfe_m = floods.query(at).map(round2);

        let pois = self
            .ranker()
            .find_nearby(at, self.planner_rules.poi_search_radius_m);
        let low_areas = sampler.sample_low_areas(at, &floods);

        let evacuation =
            (verdict.level == RiskLevel::High).then(|| self.plan_evacuation(at, elevation_m));

        tracing::info!(
            lat = at.lat,
            lon = at.lon,
            level = verdict.level.as_str(),
            rainfall_mm = verdict.rainfall_mm,
            elevation_m,
            pois = pois.len(),
            low_areas = low_areas.len(),
            "assessed site"
        );

        SiteAssessment {
            location: at,
            assessed_at: Utc::now(),
            verdict,
            display_radius_m,
            elevation_m,
            bfe_m,
            forecast_peak_rain_3h_mm: forecast.as_ref().and_then(Forecast::peak_rain_3h_mm),
            weather: current,
            pois,
            low_areas,
            low_area_display_radius_m: self.sampling_rules.low_area_display_radius_m,
            flood_data_loaded: !floods.is_empty(),
            evacuation,
        }
    }

    /// Shelter, high ground and a route to each.
    pub fn plan_evacuation(&self, at: Coordinate, site_elevation_m: Option<f64>) -> EvacuationPlan {
        let shelter = self.nearest_shelter(at, self.planner_rules.shelter_search_radius_m);
        let high_ground = self.high_ground(at, site_elevation_m);

        let synth = RouteSynthesizer::new(self.services.routes);
        let route_to_shelter = shelter
            .as_ref()
            .map(|candidate| synth.route_or_direct(at, candidate.poi.coord));
        let route_to_high_ground = high_ground
            .as_ref()
            .map(|target| synth.route_or_direct(at, target.coord));

        EvacuationPlan {
            shelter,
            high_ground,
            route_to_shelter,
            route_to_high_ground,
        }
    }

    pub fn low_areas(&self, at: Coordinate) -> Vec<LowArea> {
        self.sampler().sample_low_areas(at, &self.floods.snapshot())
    }

    pub fn nearest_shelter(&self, at: Coordinate, radius_m: f64) -> Option<ShelterCandidate> {
        self.ranker().find_nearest_shelter(at, radius_m)
    }

    pub fn high_ground(&self, at: Coordinate, baseline_m: Option<f64>) -> Option<HighGround> {
        self.sampler().find_high_ground(at, baseline_m)
    }
}
