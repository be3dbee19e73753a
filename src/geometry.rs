//! Conversion of provider geometry into renderer form.

use geo::{BoundingRect, MultiPoint};

use crate::models::{BoundaryGeometry, Bounds, LatLon, Position, RenderableBoundary, Ring};

/// Swap a provider ring from `[lon, lat]` to `[lat, lon]`
pub fn swap_ring(ring: &[Position]) -> Ring {
    ring.iter().map(|&[lon, lat]| [lat, lon]).collect()
}

/// Convert polygon or multipolygon geometry into renderable rings.
///
/// Only the outer ring of each polygon is kept; holes are dropped.
pub fn to_renderable(geometry: &BoundaryGeometry) -> RenderableBoundary {
    let rings = match geometry {
        BoundaryGeometry::Polygon(rings) => rings
            .iter()
            .take(1)
            .map(|outer| swap_ring(outer))
            .collect(),
        BoundaryGeometry::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first())
            .map(|outer| swap_ring(outer))
            .collect(),
    };

    RenderableBoundary(rings)
}

/// Bounding box over every point of the boundary
pub fn bounds(boundary: &RenderableBoundary) -> Option<Bounds> {
    // geo works in x = lon, y = lat
    let points: MultiPoint<f64> = boundary
        .rings()
        .iter()
        .flatten()
        .map(|&[lat, lon]| (lon, lat))
        .collect::<Vec<_>>()
        .into();

    points.bounding_rect().map(|rect| Bounds {
        min: LatLon::new(rect.min().y, rect.min().x),
        max: LatLon::new(rect.max().y, rect.max().x),
    })
}

/// Bounding-box center of the boundary. `None` when it has no points.
pub fn centroid(boundary: &RenderableBoundary) -> Option<LatLon> {
    bounds(boundary).map(|b| b.center())
}
