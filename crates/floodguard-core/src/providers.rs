//! Collaborator seams. Implementations live outside the core so the engine can
//! be driven by live services or by in-memory fakes.

use crate::error::ProviderError;
use crate::models::{
    CapAlert, Coordinate, CurrentWeather, Forecast, Headline, PoiFeature, RouteResult,
};

/// Batch elevation lookup. The result should line up with `coords`, but
/// callers tolerate short or long responses.
pub trait ElevationSource: Send + Sync {
    fn elevations(&self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>, ProviderError>;
}

/// Amenity lookup around a point.
pub trait PoiSource: Send + Sync {
    fn pois_near(&self, center: Coordinate, radius_m: f64)
        -> Result<Vec<PoiFeature>, ProviderError>;
}

/// Road routing between two points. `Ok(None)` means no route exists.
pub trait RouteSource: Send + Sync {
    fn route(&self, from: Coordinate, to: Coordinate)
        -> Result<Option<RouteResult>, ProviderError>;
}

pub trait WeatherSource: Send + Sync {
    fn current(&self, at: Coordinate) -> Result<CurrentWeather, ProviderError>;
    fn forecast(&self, at: Coordinate) -> Result<Forecast, ProviderError>;
}

/// Disaster alert feed: a headline list plus one CAP document per headline.
pub trait AlertFeed: Send + Sync {
    fn headlines(&self) -> Result<Vec<Headline>, ProviderError>;

    /// `Ok(None)` when the document has no `info` block.
    fn cap_alert(&self, link: &str) -> Result<Option<CapAlert>, ProviderError>;
}
