//! Nearby amenity lookup and shelter ranking.

use crate::models::{Coordinate, Poi, PoiFeature, ShelterCandidate};
use crate::providers::PoiSource;
use crate::rules::ShelterRules;

pub struct PoiRanker<'a> {
    source: &'a dyn PoiSource,
    rules: ShelterRules,
}

impl<'a> PoiRanker<'a> {
    pub fn new(source: &'a dyn PoiSource) -> Self {
        Self::with_rules(source, ShelterRules::default())
    }

    pub fn with_rules(source: &'a dyn PoiSource, rules: ShelterRules) -> Self {
        Self { source, rules }
    }

    /// POIs within `radius_m`, nearest first, capped at the configured count.
    /// A failed lookup yields no POIs.
    pub fn find_nearby(&self, center: Coordinate, radius_m: f64) -> Vec<Poi> {
        let features = match self.source.pois_near(center, radius_m) {
            Ok(features) => features,
            Err(err) => {
                tracing::warn!(radius_m, error = %err, "POI lookup failed");
                return Vec::new();
            }
        };
        rank_by_distance(features, center, self.rules.max_results)
    }

    /// Best shelter-like POI within `radius_m`.
    pub fn find_nearest_shelter(
        &self,
        center: Coordinate,
        radius_m: f64,
    ) -> Option<ShelterCandidate> {
        let pois = self.find_nearby(center, radius_m);
        rank_shelters(pois, &self.rules).into_iter().next()
    }
}

/// Convert raw features to POIs sorted by distance from `center`.
pub fn rank_by_distance(features: Vec<PoiFeature>, center: Coordinate, limit: usize) -> Vec<Poi> {
    let mut pois: Vec<Poi> = features
        .into_iter()
        .filter(|feature| feature.coord.is_valid())
        .map(|feature| Poi::from_feature(feature, center))
        .collect();
    pois.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    pois.truncate(limit);
    pois
}

/// Shelter priority for a POI category; lower is better.
pub fn category_priority(category: Option<&str>, rules: &ShelterRules) -> u8 {
    let Some(category) = category else {
        return rules.default_priority;
    };
    rules
        .priorities
        .iter()
        .find(|entry| entry.category.eq_ignore_ascii_case(category))
        .map_or(rules.default_priority, |entry| entry.priority)
}

/// Order POIs as shelter candidates: priority, then distance. The sort is
/// stable so earlier POIs win exact ties.
pub fn rank_shelters(pois: Vec<Poi>, rules: &ShelterRules) -> Vec<ShelterCandidate> {
    let mut candidates: Vec<ShelterCandidate> = pois
        .into_iter()
        .map(|poi| {
            let priority = category_priority(poi.category.as_deref(), rules);
            ShelterCandidate { poi, priority }
        })
        .collect();
    candidates.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| a.poi.distance_m.total_cmp(&b.poi.distance_m))
    });
    candidates
}
