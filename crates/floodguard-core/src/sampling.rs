//! Elevation sampling around a site: batched lookups, the low-area overlay
//! and the expanding high-ground search.

use crate::flood_index::FloodSnapshot;
use crate::models::{Coordinate, ElevationSample, HighGround, LowArea};
use crate::providers::ElevationSource;
use crate::report::{IngestReport, SkipReason};
use crate::rules::SamplingRules;
use crate::spatial::{distance_m, ring_points, RingPoint};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ElevationSampler<'a> {
    source: &'a dyn ElevationSource,
    rules: SamplingRules,
}

impl<'a> ElevationSampler<'a> {
    pub fn new(source: &'a dyn ElevationSource) -> Self {
        Self::with_rules(source, SamplingRules::default())
    }

    pub fn with_rules(source: &'a dyn ElevationSource, rules: SamplingRules) -> Self {
        Self { source, rules }
    }

    pub fn rules(&self) -> &SamplingRules {
        &self.rules
    }

    /// Elevations for `coords`, same length and order. Anything the source
    /// cannot answer comes back as `None`.
    pub fn batch_elevation(&self, coords: &[Coordinate]) -> Vec<Option<f64>> {
        if coords.is_empty() {
            return Vec::new();
        }

        let mut values = match self.source.elevations(coords) {
            Ok(values) => values,
            Err(err) => {
                tracing::warn!(points = coords.len(), error = %err, "elevation lookup failed");
                return vec![None; coords.len()];
            }
        };

        if values.len() != coords.len() {
            tracing::debug!(
                requested = coords.len(),
                returned = values.len(),
                "elevation response length mismatch"
            );
        }
        values.resize(coords.len(), None);
        values
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect()
    }

    /// [`Self::batch_elevation`] plus a report listing unknown entries.
    pub fn batch_elevation_report(
        &self,
        coords: &[Coordinate],
    ) -> (Vec<Option<f64>>, IngestReport) {
        let values = self.batch_elevation(coords);
        let mut report = IngestReport::new();
        for (index, value) in values.iter().enumerate() {
            match value {
                Some(_) => report.accept(),
                None => report.skip(index, None, SkipReason::UnknownElevation),
            }
        }
        (values, report)
    }

    /// Single point elevation.
    pub fn elevation_at(&self, coord: Coordinate) -> Option<f64> {
        self.batch_elevation(&[coord]).into_iter().next().flatten()
    }

    /// Elevations paired with their coordinates.
    pub fn samples(&self, coords: &[Coordinate]) -> Vec<ElevationSample> {
        coords
            .iter()
            .zip(self.batch_elevation(coords))
            .map(|(coord, elevation_m)| ElevationSample {
                coord: *coord,
                elevation_m,
            })
            .collect()
    }

    /// Sample every configured ring in one batch and keep the points at or
    /// below the local flood elevation (or the fixed threshold where no flood
    /// data exists).
    pub fn sample_low_areas(&self, center: Coordinate, floods: &FloodSnapshot) -> Vec<LowArea> {
        let points: Vec<RingPoint> = self
            .rules
            .low_area_radii_m
            .iter()
            .flat_map(|radius| ring_points(center, *radius, self.rules.bearings_per_ring))
            .collect();
        if points.is_empty() {
            return Vec::new();
        }

        let coords: Vec<Coordinate> = points.iter().map(|p| p.coord).collect();
        let elevations = self.batch_elevation(&coords);

        let low: Vec<LowArea> = points
            .iter()
            .zip(elevations)
            .filter_map(|(point, elevation)| {
                let elevation = elevation?;
                let bfe = floods.query_with(point.coord, true);
                let is_low = match bfe {
                    Some(bfe) => elevation <= bfe + self.rules.bfe_safety_margin_m,
                    None => elevation <= self.rules.low_elevation_threshold_m,
                };
                is_low.then(|| LowArea {
                    coord: point.coord,
                    elevation_m: round2(elevation),
                    bfe_m: bfe.map(round2),
                    radius_m: point.radius_m,
                    bearing_deg: point.bearing_deg,
                })
            })
            .collect();

        tracing::debug!(
            sampled = points.len(),
            low = low.len(),
            with_flood_data = !floods.is_empty(),
            "sampled low areas"
        );
        low
    }

    /// Walk outward ring by ring and return the first point, in bearing
    /// order, that reaches the high-ground target for `baseline_m`.
    pub fn find_high_ground(
        &self,
        center: Coordinate,
        baseline_m: Option<f64>,
    ) -> Option<HighGround> {
        let target = self.rules.high_ground_target(baseline_m);

        for radius in self.rules.high_ground_radii() {
            let ring = ring_points(center, radius, self.rules.bearings_per_ring);
            let coords: Vec<Coordinate> = ring.iter().map(|p| p.coord).collect();
            let elevations = self.batch_elevation(&coords);

            let found = ring
                .iter()
                .zip(elevations)
                .find_map(|(point, elevation)| match elevation {
                    Some(e) if e >= target => Some((point.coord, e)),
                    _ => None,
                });

            if let Some((coord, elevation)) = found {
                tracing::debug!(radius, target, elevation, "found high ground");
                return Some(HighGround {
                    coord,
                    elevation_m: round2(elevation),
                    distance_m: distance_m(center, coord),
                });
            }
        }

        tracing::debug!(target, "no high ground found within search radius");
        None
    }
}
