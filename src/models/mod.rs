//! Data models for boundary resolution.

pub mod admin;
pub mod boundary;

pub use admin::AdminLevel;
pub use boundary::{
    BoundaryFeature, BoundaryGeometry, Bounds, GeocodeMatch, GeocodeResult, LatLon, Position,
    RenderableBoundary, Resolution, Ring,
};
