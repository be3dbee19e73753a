//! Boundary resolution types.
//!
//! Provider geometry keeps the GeoJSON `[longitude, latitude]` order. Everything
//! handed to a map renderer (`RenderableBoundary`, `LatLon`, `Bounds`) is in
//! `[latitude, longitude]` order.

use serde::{Deserialize, Serialize};

use super::AdminLevel;

/// A single `[longitude, latitude]` position as delivered by the provider.
pub type Position = [f64; 2];

/// A geographic point in renderer order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Raw best match from a geocode lookup, before validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeocodeMatch {
    pub name: Option<String>,
    /// `None` when the provider value was absent or not a number
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// Best-match center point for a geocoded query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Provider's canonical name, or the query when the provider gave none
    pub display_name: String,
    pub location: LatLon,
}

/// Polygonal geometry of a boundary candidate, in provider order.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryGeometry {
    /// Rings of one polygon; the first ring is the outer ring
    Polygon(Vec<Vec<Position>>),
    /// Polygons, each a list of rings
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

/// An administrative boundary candidate returned by the provider
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryFeature {
    pub name: Option<String>,
    /// Raw OSM admin_level number
    pub admin_level: Option<u8>,
    /// `None` when the provider sent no geometry or a non-polygonal one
    pub geometry: Option<BoundaryGeometry>,
}

impl BoundaryFeature {
    /// Semantic admin level, if the raw tag is a known OSM level
    pub fn level(&self) -> Option<AdminLevel> {
        self.admin_level.and_then(AdminLevel::from_osm_level)
    }
}

/// A closed ring of `[lat, lon]` pairs.
pub type Ring = Vec<[f64; 2]>;

/// Outer rings of the selected boundary in renderer order, one per polygon.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderableBoundary(pub Vec<Ring>);

impl RenderableBoundary {
    pub fn rings(&self) -> &[Ring] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|ring| ring.is_empty())
    }

    /// Total number of points across all rings
    pub fn point_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }
}

/// Axis-aligned bounds of a boundary, used to fit the map view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// South-west corner
    pub min: LatLon,
    /// North-east corner
    pub max: LatLon,
}

impl Bounds {
    /// Midpoint of the box on each axis
    pub fn center(&self) -> LatLon {
        LatLon::new(
            (self.min.lat + self.max.lat) / 2.0,
            (self.min.lon + self.max.lon) / 2.0,
        )
    }

    pub fn contains(&self, point: LatLon) -> bool {
        point.lat >= self.min.lat
            && point.lat <= self.max.lat
            && point.lon >= self.min.lon
            && point.lon <= self.max.lon
    }
}

/// Output of one successful resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub display_name: String,
    /// Bounding-box center of the boundary, not an area centroid
    pub centroid: LatLon,
    pub bounds: Bounds,
    pub boundary: RenderableBoundary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_level: Option<AdminLevel>,
}
