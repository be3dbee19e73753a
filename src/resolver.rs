//! Boundary resolution workflow.
//!
//! A query is geocoded to a center point, the administrative boundaries
//! containing that point are fetched, the state-level one is selected and
//! converted into renderer form. Each step depends on the previous one, so the
//! two provider calls are strictly sequential and any failure ends the call.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, info};

use crate::geometry;
use crate::models::{
    AdminLevel, BoundaryFeature, GeocodeMatch, GeocodeResult, LatLon, Resolution,
};

/// Why a resolution produced no result
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("query is empty")]
    EmptyQuery,

    #[error("no place found for '{0}'")]
    NotFound(String),

    #[error("match for '{0}' has no usable coordinates")]
    CoordinatesMissing(String),

    #[error("no boundaries returned around ({lat}, {lon})")]
    NoBoundaries { lat: f64, lon: f64 },

    #[error("no state boundary found for '{0}'")]
    BoundaryNotFound(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Remote geocoding and boundary lookups.
pub trait BoundaryProvider {
    /// Best single state-level match for a free-text query
    fn geocode(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Option<GeocodeMatch>, ResolutionError>> + Send;

    /// Administrative boundaries containing a point, in provider order
    fn boundaries_around(
        &self,
        point: LatLon,
    ) -> impl Future<Output = Result<Vec<BoundaryFeature>, ResolutionError>> + Send;
}

/// Pick the first feature named like the query (case-insensitive) or tagged
/// with `level`.
///
/// Provider order decides ties: a district listed before its state would not
/// match, but a country boundary named like the query would.
pub fn select_boundary<'a>(
    features: &'a [BoundaryFeature],
    query: &str,
    level: AdminLevel,
) -> Option<&'a BoundaryFeature> {
    let wanted = query.to_lowercase();
    let wanted_level = level.to_osm_level();

    features.iter().find(|feature| {
        let name_matches = feature
            .name
            .as_deref()
            .is_some_and(|name| name.to_lowercase() == wanted);
        name_matches || feature.admin_level == Some(wanted_level)
    })
}

/// Validate a raw geocode match, falling back to the query for the name
fn validate_match(query: &str, found: GeocodeMatch) -> Result<GeocodeResult, ResolutionError> {
    let (lat, lon) = match (found.lat, found.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => return Err(ResolutionError::CoordinatesMissing(query.to_string())),
    };

    let display_name = found
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| query.to_string());

    Ok(GeocodeResult {
        display_name,
        location: LatLon::new(lat, lon),
    })
}

/// Resolves place names to renderable state boundaries
pub struct BoundaryResolver<P> {
    provider: P,
    level: AdminLevel,
}

impl<P: BoundaryProvider> BoundaryResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            level: AdminLevel::STATE,
        }
    }

    /// Match boundaries at a different admin level
    pub fn with_level(mut self, level: AdminLevel) -> Self {
        self.level = level;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Geocode a query to its best-match center point
    pub async fn geocode(&self, query: &str) -> Result<GeocodeResult, ResolutionError> {
        let found = self
            .provider
            .geocode(query)
            .await?
            .ok_or_else(|| ResolutionError::NotFound(query.to_string()))?;

        validate_match(query, found)
    }

    /// Resolve a query to a display name, boundary and marker position.
    ///
    /// Nothing is cached: every call issues both provider requests.
    pub async fn resolve(&self, query: &str) -> Result<Resolution, ResolutionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ResolutionError::EmptyQuery);
        }

        let geocoded = self.geocode(query).await?;
        debug!(
            "Geocoded '{}' to '{}' at ({}, {})",
            query, geocoded.display_name, geocoded.location.lat, geocoded.location.lon
        );

        let features = self.provider.boundaries_around(geocoded.location).await?;
        if features.is_empty() {
            return Err(ResolutionError::NoBoundaries {
                lat: geocoded.location.lat,
                lon: geocoded.location.lon,
            });
        }
        debug!("Received {} boundary candidates", features.len());

        let selected = select_boundary(&features, query, self.level)
            .ok_or_else(|| ResolutionError::BoundaryNotFound(query.to_string()))?;
        let shape = selected
            .geometry
            .as_ref()
            .ok_or_else(|| ResolutionError::BoundaryNotFound(query.to_string()))?;

        let boundary = geometry::to_renderable(shape);
        let bounds = geometry::bounds(&boundary)
            .ok_or_else(|| ResolutionError::BoundaryNotFound(query.to_string()))?;
        let centroid = bounds.center();

        let admin_level = selected.level();
        info!(
            "Resolved '{}' to {} '{}' ({} rings, {} points)",
            query,
            admin_level.map_or("boundary", |level| level.label()),
            geocoded.display_name,
            boundary.rings().len(),
            boundary.point_count()
        );

        Ok(Resolution {
            display_name: geocoded.display_name,
            centroid,
            bounds,
            boundary,
            admin_level,
        })
    }
}
