pub mod alerts;
pub mod error;
pub mod evacuation;
pub mod flood_index;
pub mod models;
pub mod providers;
pub mod report;
pub mod risk;
pub mod routing;
pub mod rules;
pub mod sampling;
pub mod shelter;
pub mod similarity;
pub mod spatial;

pub use alerts::{
    dedupe, dedupe_with_report, nearby_alerts, sort_by_proximity, AlertBatch, AlertCollector,
    PublicAlert,
};
pub use error::{CoordinateError, DatasetError, ProviderError};
pub use evacuation::{Collaborators, EvacuationPlan, EvacuationPlanner, SiteAssessment};
pub use flood_index::{FloodFeature, FloodIndex, FloodSnapshot};
pub use models::{
    AlertRecord, CapAlert, Coordinate, CurrentWeather, ElevationSample, Forecast, ForecastEntry,
    Headline, HighGround, LowArea, PlannedRoute, Poi, PoiFeature, RiskLevel, RiskVerdict,
    RouteKind, RouteResult, ShelterCandidate,
};
pub use providers::{AlertFeed, ElevationSource, PoiSource, RouteSource, WeatherSource};
pub use report::{IngestReport, ItemOutcome, LoadReport, SkipReason, SkippedItem};
pub use risk::{radius_from_rain, RiskClassifier};
pub use routing::RouteSynthesizer;
pub use rules::{PlannerRules, RiskRules, SamplingRules, ShelterRules};
pub use sampling::ElevationSampler;
pub use shelter::PoiRanker;
pub use spatial::haversine_distance;
