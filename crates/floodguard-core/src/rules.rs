//! Tunable thresholds for sampling, classification and evacuation planning.

use serde::{Deserialize, Serialize};

use crate::models::RiskLevel;

/// Configuration for concentric-ring elevation sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingRules {
    /// Ring radii for the low-area overlay, in meters
    pub low_area_radii_m: Vec<f64>,
    /// Number of evenly spaced bearings per ring
    pub bearings_per_ring: usize,
    /// Fallback "low" threshold when no flood elevation is known
    pub low_elevation_threshold_m: f64,
    /// Added to the flood elevation before comparing
    pub bfe_safety_margin_m: f64,
    /// Ring spacing for the high-ground search
    pub high_ground_step_m: f64,
    /// Largest ring searched for high ground
    pub high_ground_max_radius_m: f64,
    /// Required rise above the baseline elevation
    pub high_ground_rise_m: f64,
    /// Absolute floor for the high-ground target
    pub high_ground_min_elevation_m: f64,
    /// Suggested overlay circle radius around each low area
    pub low_area_display_radius_m: f64,
}

impl Default for SamplingRules {
    fn default() -> Self {
        Self {
            low_area_radii_m: vec![500.0, 1000.0, 1500.0, 2000.0, 2500.0, 3000.0],
            bearings_per_ring: 12,
            low_elevation_threshold_m: 135.0,
            bfe_safety_margin_m: 0.0,
            high_ground_step_m: 1000.0,
            high_ground_max_radius_m: 15_000.0,
            high_ground_rise_m: 8.0,
            high_ground_min_elevation_m: 16.0,
            low_area_display_radius_m: 300.0,
        }
    }
}

impl SamplingRules {
    /// Elevation a point must reach to count as high ground.
    pub fn high_ground_target(&self, baseline_m: Option<f64>) -> f64 {
        let baseline = baseline_m.filter(|b| b.is_finite()).unwrap_or(0.0);
        (baseline + self.high_ground_rise_m).max(self.high_ground_min_elevation_m)
    }

    /// Radii for the high-ground search, smallest first.
    pub fn high_ground_radii(&self) -> Vec<f64> {
        let mut radii = Vec::new();
        if self.high_ground_step_m.is_nan() || self.high_ground_step_m <= 0.0 {
            return radii;
        }
        let mut radius = self.high_ground_step_m;
        while radius <= self.high_ground_max_radius_m {
            radii.push(radius);
            radius += self.high_ground_step_m;
        }
        radii
    }
}

/// One row of the risk table. A rule matches when rainfall reaches
/// `min_rain_mm` and, if `max_elevation_m` is set, the elevation is known and
/// at or below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRule {
    pub min_rain_mm: f64,
    pub max_elevation_m: Option<f64>,
    pub level: RiskLevel,
    pub reason: String,
}

impl RiskRule {
    pub fn matches(&self, rain_mm: f64, elevation_m: Option<f64>) -> bool {
        if rain_mm < self.min_rain_mm {
            return false;
        }
        match self.max_elevation_m {
            None => true,
            Some(limit) => matches!(elevation_m, Some(elev) if elev <= limit),
        }
    }
}

/// Ordered risk table plus display radius scaling. First matching rule wins;
/// no match means low risk with no reasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    pub rules: Vec<RiskRule>,
    pub min_radius_m: u32,
    pub max_radius_m: u32,
    /// Rainfall at which the display radius saturates
    pub radius_rain_cap_mm: f64,
}

impl Default for RiskRules {
    fn default() -> Self {
        Self {
            rules: vec![
                RiskRule {
                    min_rain_mm: 10.0,
                    max_elevation_m: Some(5.0),
                    level: RiskLevel::High,
                    reason: "heavy rain + low elevation".into(),
                },
                RiskRule {
                    min_rain_mm: 5.0,
                    max_elevation_m: Some(15.0),
                    level: RiskLevel::Moderate,
                    reason: "moderate rain + low elevation".into(),
                },
                RiskRule {
                    min_rain_mm: 10.0,
                    max_elevation_m: None,
                    level: RiskLevel::Moderate,
                    reason: "heavy rain but elevation not very low".into(),
                },
            ],
            min_radius_m: 1000,
            max_radius_m: 20_000,
            radius_rain_cap_mm: 30.0,
        }
    }
}

/// Shelter preference: lower priority is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPriority {
    pub category: String,
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelterRules {
    pub priorities: Vec<CategoryPriority>,
    /// Priority for categories not listed above
    pub default_priority: u8,
    /// Maximum POIs kept from a nearby search
    pub max_results: usize,
}

impl Default for ShelterRules {
    fn default() -> Self {
        let priorities = [
            "shelter",
            "community_centre",
            "school",
            "place_of_worship",
            "hospital",
            "police",
            "fire_station",
        ]
        .iter()
        .enumerate()
        .map(|(priority, category)| CategoryPriority {
            category: (*category).to_string(),
            priority: priority as u8,
        })
        .collect();

        Self {
            priorities,
            default_priority: 99,
            max_results: 30,
        }
    }
}

/// Search radii used by the evacuation planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRules {
    pub poi_search_radius_m: f64,
    pub shelter_search_radius_m: f64,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            poi_search_radius_m: 8000.0,
            shelter_search_radius_m: 10_000.0,
        }
    }
}
