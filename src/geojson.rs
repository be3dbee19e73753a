//! GeoJSON rendering of a resolution.
//!
//! GeoJSON positions are `[lon, lat]`, so the renderable rings are swapped
//! back on the way out.

use serde_json::{json, Value};

use crate::models::{Resolution, Ring};

fn to_positions(ring: &Ring) -> Vec<[f64; 2]> {
    ring.iter().map(|&[lat, lon]| [lon, lat]).collect()
}

/// FeatureCollection with the boundary outline and its centroid marker
pub fn feature_collection(resolution: &Resolution) -> Value {
    let rings = resolution.boundary.rings();
    let geometry = if rings.len() == 1 {
        json!({
            "type": "Polygon",
            "coordinates": [to_positions(&rings[0])],
        })
    } else {
        let polygons: Vec<Vec<Vec<[f64; 2]>>> =
            rings.iter().map(|ring| vec![to_positions(ring)]).collect();
        json!({
            "type": "MultiPolygon",
            "coordinates": polygons,
        })
    };

    let bounds = resolution.bounds;
    let admin_level = resolution.admin_level.map(|level| level.to_osm_level());

    json!({
        "type": "FeatureCollection",
        "bbox": [bounds.min.lon, bounds.min.lat, bounds.max.lon, bounds.max.lat],
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "name": resolution.display_name,
                    "role": "boundary",
                    "admin_level": admin_level,
                },
                "geometry": geometry,
            },
            {
                "type": "Feature",
                "properties": {
                    "name": resolution.display_name,
                    "role": "centroid",
                },
                "geometry": {
                    "type": "Point",
                    "coordinates": [resolution.centroid.lon, resolution.centroid.lat],
                },
            },
        ],
    })
}
