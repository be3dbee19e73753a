//! Sima - Indian state boundary lookup
//!
//! Resolves a state name to its administrative outline and a marker position
//! via the Geoapify geocoding and boundaries APIs. Shared by the `server` and
//! `resolve` binaries.

pub mod autocomplete;
pub mod config;
pub mod geoapify;
pub mod geojson;
pub mod geometry;
pub mod models;
pub mod resolver;
pub mod session;

pub use models::{AdminLevel, LatLon, RenderableBoundary, Resolution};
pub use resolver::{BoundaryProvider, BoundaryResolver, ResolutionError};
