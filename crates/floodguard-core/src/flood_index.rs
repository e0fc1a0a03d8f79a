//! Flood-elevation index: GeoJSON polygons carrying a base flood elevation
//! (BFE), an R-tree over their bounding boxes, and point lookups with a
//! nearest-centroid fallback.

use std::path::Path;
use std::sync::{Arc, RwLock};

use geo::{BoundingRect, Centroid, Coord, Intersects, LineString, MultiPolygon, Point, Polygon};
use rstar::{RTree, RTreeObject, AABB};
use serde_json::{Map, Value};

use crate::error::DatasetError;
use crate::models::Coordinate;
use crate::report::{LoadReport, SkipReason};
use crate::spatial::distance_m;

/// Property keys that hint at a flood elevation value.
const BFE_KEY_HINTS: [&str; 4] = ["bfe", "base", "flood", "elev"];

/// A polygon with its base flood elevation.
#[derive(Debug, Clone)]
pub struct FloodFeature {
    /// Geometry in lon/lat axis order
    pub geometry: MultiPolygon<f64>,
    pub bfe_m: f64,
    pub centroid: Coordinate,
    /// Position of the feature in the source collection
    pub source_index: usize,
}

impl FloodFeature {
    pub fn new(geometry: MultiPolygon<f64>, bfe_m: f64, source_index: usize) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let centroid = geometry
            .centroid()
            .map(|p| Coordinate::new(p.y(), p.x()))
            .unwrap_or_else(|| {
                let c = rect.center();
                Coordinate::new(c.y, c.x)
            });
        Some(Self {
            geometry,
            bfe_m,
            centroid,
            source_index,
        })
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.geometry.intersects(&Point::new(coord.lon, coord.lat))
    }
}

/// Bounding box of one feature, stored in the R-tree.
#[derive(Debug, Clone, Copy)]
struct IndexedEnvelope {
    position: usize,
    min: [f64; 2],
    max: [f64; 2],
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// Immutable feature set plus optional spatial index.
#[derive(Debug, Default)]
pub struct FloodSnapshot {
    features: Vec<FloodFeature>,
    tree: Option<RTree<IndexedEnvelope>>,
}

impl FloodSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot. With `use_index` false every query scans all
    /// features; results are identical either way.
    pub fn build(features: Vec<FloodFeature>, use_index: bool) -> Self {
        let tree = use_index.then(|| {
            let entries = features
                .iter()
                .enumerate()
                .filter_map(|(position, feature)| {
                    let rect = feature.geometry.bounding_rect()?;
                    Some(IndexedEnvelope {
                        position,
                        min: [rect.min().x, rect.min().y],
                        max: [rect.max().x, rect.max().y],
                    })
                })
                .collect();
            RTree::bulk_load(entries)
        });
        Self { features, tree }
    }

    pub fn features(&self) -> &[FloodFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn is_indexed(&self) -> bool {
        self.tree.is_some()
    }

    /// BFE at `coord`, falling back to the nearest centroid.
    pub fn query(&self, coord: Coordinate) -> Option<f64> {
        self.query_with(coord, true)
    }

    pub fn query_with(&self, coord: Coordinate, nearest_fallback: bool) -> Option<f64> {
        if self.features.is_empty() || !coord.lat.is_finite() || !coord.lon.is_finite() {
            return None;
        }

        if let Some(feature) = self.containing_feature(coord) {
            return Some(feature.bfe_m);
        }

        if !nearest_fallback {
            return None;
        }

        let mut best: Option<(f64, &FloodFeature)> = None;
        for feature in &self.features {
            let d = distance_m(coord, feature.centroid);
            if best.map_or(true, |(best_d, _)| d < best_d) {
                best = Some((d, feature));
            }
        }
        best.map(|(_, feature)| feature.bfe_m)
    }

    /// First feature in load order whose polygon contains `coord`.
    pub fn containing_feature(&self, coord: Coordinate) -> Option<&FloodFeature> {
        match &self.tree {
            Some(tree) => {
                let mut candidates: Vec<usize> = tree
                    .locate_in_envelope_intersecting(&AABB::from_point([coord.lon, coord.lat]))
                    .map(|entry| entry.position)
                    .collect();
                candidates.sort_unstable();
                candidates
                    .into_iter()
                    .map(|position| &self.features[position])
                    .find(|feature| feature.contains(coord))
            }
            None => self.features.iter().find(|feature| feature.contains(coord)),
        }
    }
}

/// Owning handle for the active flood dataset. Readers take a cheap snapshot;
/// reloads swap in a freshly built one.
#[derive(Debug)]
pub struct FloodIndex {
    active: RwLock<Arc<FloodSnapshot>>,
    use_index: bool,
}

impl Default for FloodIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl FloodIndex {
    pub fn new() -> Self {
        Self::with_indexing(true)
    }

    pub fn with_indexing(use_index: bool) -> Self {
        Self {
            active: RwLock::new(Arc::new(FloodSnapshot::empty())),
            use_index,
        }
    }

    pub fn snapshot(&self) -> Arc<FloodSnapshot> {
        match self.active.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the active dataset with `features`.
    pub fn load(&self, features: Vec<FloodFeature>) {
        let snapshot = Arc::new(FloodSnapshot::build(features, self.use_index));
        match self.active.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    pub fn clear(&self) {
        self.load(Vec::new());
    }

    /// Parse a GeoJSON FeatureCollection and publish the valid features.
    /// On a parse error the active dataset becomes empty.
    pub fn load_geojson_str(&self, raw: &str) -> Result<LoadReport, DatasetError> {
        match parse_feature_collection(raw) {
            Ok((features, report)) => {
                tracing::info!(
                    accepted = report.accepted,
                    skipped = report.skipped.len(),
                    indexed = self.use_index,
                    "loaded flood features"
                );
                self.load(features);
                Ok(report)
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Load a GeoJSON file. A missing file publishes an empty dataset and
    /// reports zero features.
    pub fn load_geojson_file(&self, path: impl AsRef<Path>) -> Result<LoadReport, DatasetError> {
        let path = path.as_ref();
        if !path.is_file() {
            tracing::info!(path = %path.display(), "no flood dataset found, skipping load");
            self.clear();
            return Ok(LoadReport::new());
        }

        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) => {
                self.clear();
                return Err(DatasetError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        self.load_geojson_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn query(&self, coord: Coordinate) -> Option<f64> {
        self.snapshot().query(coord)
    }

    pub fn query_with(&self, coord: Coordinate, nearest_fallback: bool) -> Option<f64> {
        self.snapshot().query_with(coord, nearest_fallback)
    }
}

/// Parse a FeatureCollection into flood features, skipping unusable entries.
pub fn parse_feature_collection(
    raw: &str,
) -> Result<(Vec<FloodFeature>, LoadReport), DatasetError> {
    let root: Value = serde_json::from_str(raw)?;
    let Some(items) = root.get("features").and_then(Value::as_array) else {
        return Err(DatasetError::NotFeatureCollection);
    };

    let mut features = Vec::new();
    let mut report = LoadReport::new();

    for (index, item) in items.iter().enumerate() {
        let label = item
            .get("id")
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        match parse_feature(item, index) {
            Ok(feature) => {
                report.accept();
                features.push(feature);
            }
            Err(reason) => report.skip(index, label.as_deref(), reason),
        }
    }

    Ok((features, report))
}

fn parse_feature(item: &Value, index: usize) -> Result<FloodFeature, SkipReason> {
    let empty = Map::new();
    let properties = item
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let bfe_m = extract_bfe(properties).ok_or(SkipReason::MissingBfe)?;

    let geometry = match item.get("geometry") {
        None | Some(Value::Null) => return Err(SkipReason::MissingGeometry),
        Some(geometry) => parse_geometry(geometry)?,
    };

    FloodFeature::new(geometry, bfe_m, index)
        .ok_or_else(|| SkipReason::InvalidGeometry("empty geometry".into()))
}

/// Read the BFE from feature properties: exact `BFE`, then `bfe`, then the
/// first numeric property whose key mentions a flood elevation hint.
pub fn extract_bfe(properties: &Map<String, Value>) -> Option<f64> {
    for key in ["BFE", "bfe"] {
        if let Some(value) = properties.get(key) {
            return numeric_value(value);
        }
    }

    properties.iter().find_map(|(key, value)| {
        let number = value.as_f64().filter(|v| v.is_finite())?;
        let key = key.to_lowercase();
        BFE_KEY_HINTS
            .iter()
            .any(|hint| key.contains(hint))
            .then_some(number)
    })
}

fn numeric_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>, SkipReason> {
    let kind = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| SkipReason::InvalidGeometry("missing type".into()))?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| SkipReason::InvalidGeometry("missing coordinates".into()))?;

    let polygons = match kind {
        "Polygon" => vec![parse_polygon(coordinates)?],
        "MultiPolygon" => coordinates
            .as_array()
            .ok_or_else(|| SkipReason::InvalidGeometry("coordinates must be an array".into()))?
            .iter()
            .map(parse_polygon)
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(SkipReason::UnsupportedGeometry(other.to_string())),
    };

    let polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .filter(|polygon| polygon.exterior().0.len() >= 4)
        .collect();
    if polygons.is_empty() {
        return Err(SkipReason::InvalidGeometry("empty geometry".into()));
    }
    Ok(MultiPolygon::new(polygons))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, SkipReason> {
    let rings = value
        .as_array()
        .ok_or_else(|| SkipReason::InvalidGeometry("polygon must be an array of rings".into()))?;
    let mut rings = rings.iter().map(parse_ring);
    let exterior = match rings.next() {
        Some(ring) => ring?,
        None => LineString::new(Vec::new()),
    };
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, SkipReason> {
    let positions = value
        .as_array()
        .ok_or_else(|| SkipReason::InvalidGeometry("ring must be an array".into()))?;
    positions
        .iter()
        .map(|position| {
            let pair = position.as_array().filter(|p| p.len() >= 2);
            let x = pair.and_then(|p| p[0].as_f64());
            let y = pair.and_then(|p| p[1].as_f64());
            match (x, y) {
                (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Ok(Coord { x, y }),
                _ => Err(SkipReason::InvalidGeometry("bad position".into())),
            }
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}
