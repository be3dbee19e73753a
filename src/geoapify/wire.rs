//! Response shapes of the Geoapify endpoints.
//!
//! Fields are read leniently: a property with an unexpected type becomes
//! `None` instead of failing the whole response.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::{BoundaryFeature, BoundaryGeometry, GeocodeMatch, Position};

#[derive(Debug, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

#[derive(Debug, Deserialize)]
pub struct Feature<P> {
    pub properties: Option<P>,
    #[serde(default)]
    pub geometry: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeProperties {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lon: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoundaryProperties {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub admin_level: Option<Value>,
}

/// GeoJSON polygonal geometry. Positions may carry extra values such as
/// altitude, so they are read as plain number lists.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum WireGeometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

/// First two values of a position; `None` if it has fewer
fn to_position(raw: &[f64]) -> Option<Position> {
    match raw {
        [lon, lat, ..] => Some([*lon, *lat]),
        _ => None,
    }
}

fn to_rings(rings: &[Vec<Vec<f64>>]) -> Option<Vec<Vec<Position>>> {
    rings
        .iter()
        .map(|ring| ring.iter().map(|raw| to_position(raw)).collect::<Option<Vec<_>>>())
        .collect()
}

impl WireGeometry {
    /// Domain geometry, or `None` when any position is too short
    pub fn into_geometry(self) -> Option<BoundaryGeometry> {
        match self {
            WireGeometry::Polygon(rings) => to_rings(&rings).map(BoundaryGeometry::Polygon),
            WireGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .map(|rings| to_rings(rings))
                .collect::<Option<Vec<_>>>()
                .map(BoundaryGeometry::MultiPolygon),
        }
    }
}

/// Integral admin level; `4.0` counts as `4`
fn as_level(value: &Value) -> Option<u8> {
    let level = match value.as_u64() {
        Some(level) => level,
        None => {
            let float = value.as_f64()?;
            if float.fract() != 0.0 || float < 0.0 {
                return None;
            }
            float as u64
        }
    };
    u8::try_from(level).ok()
}

fn as_string(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

impl From<Feature<GeocodeProperties>> for GeocodeMatch {
    fn from(feature: Feature<GeocodeProperties>) -> Self {
        let props = feature.properties.unwrap_or_default();
        Self {
            name: as_string(props.name),
            lat: props.lat.as_ref().and_then(Value::as_f64),
            lon: props.lon.as_ref().and_then(Value::as_f64),
        }
    }
}

impl From<Feature<BoundaryProperties>> for BoundaryFeature {
    fn from(feature: Feature<BoundaryProperties>) -> Self {
        let props = feature.properties.unwrap_or_default();

        // admin_level must be numeric; "4" as a string is not a state match
        let admin_level = props
            .admin_level
            .as_ref()
            .and_then(as_level);

        let geometry = feature.geometry.and_then(|value| {
            match serde_json::from_value::<WireGeometry>(value) {
                Ok(wire) => {
                    let geometry = wire.into_geometry();
                    if geometry.is_none() {
                        debug!("Ignoring boundary geometry with short positions");
                    }
                    geometry
                }
                Err(e) => {
                    debug!("Ignoring unsupported boundary geometry: {}", e);
                    None
                }
            }
        });

        Self {
            name: as_string(props.name),
            admin_level,
            geometry,
        }
    }
}
