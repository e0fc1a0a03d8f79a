//! Route synthesis toward an evacuation target.

use crate::models::{Coordinate, PlannedRoute, RouteKind, RouteResult};
use crate::providers::RouteSource;
use crate::spatial::distance_m;

pub struct RouteSynthesizer<'a> {
    source: &'a dyn RouteSource,
}

impl<'a> RouteSynthesizer<'a> {
    pub fn new(source: &'a dyn RouteSource) -> Self {
        Self { source }
    }

    /// Routed path, or `None` if the router fails or finds nothing.
    pub fn route(&self, from: Coordinate, to: Coordinate) -> Option<RouteResult> {
        match self.source.route(from, to) {
            Ok(Some(route)) if !route.path.is_empty() => Some(route),
            Ok(_) => {
                tracing::debug!(?from, ?to, "router returned no route");
                None
            }
            Err(err) => {
                tracing::warn!(?from, ?to, error = %err, "route lookup failed");
                None
            }
        }
    }

    /// Routed path when available, otherwise a straight segment.
    pub fn route_or_direct(&self, from: Coordinate, to: Coordinate) -> PlannedRoute {
        match self.route(from, to) {
            Some(route) => PlannedRoute {
                kind: RouteKind::Routed,
                path: route.path,
                distance_m: route.distance_m,
                duration_s: Some(route.duration_s),
            },
            None => straight_line(from, to),
        }
    }
}

/// Two-point path with great-circle length and unknown duration.
pub fn straight_line(from: Coordinate, to: Coordinate) -> PlannedRoute {
    PlannedRoute {
        kind: RouteKind::Direct,
        path: vec![from, to],
        distance_m: distance_m(from, to),
        duration_s: None,
    }
}
