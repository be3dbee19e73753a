//! HTTP client for the geocode search and boundaries part-of endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::wire::{BoundaryProperties, FeatureCollection, GeocodeProperties};
use crate::config::ProviderConfig;
use crate::models::{BoundaryFeature, GeocodeMatch, LatLon};
use crate::resolver::{BoundaryProvider, ResolutionError};

const GEOCODE_PATH: &str = "v1/geocode/search";
const BOUNDARIES_PATH: &str = "v1/boundaries/part-of";

/// Delay before the first retry, doubled on each further attempt
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Geoapify API client
#[derive(Clone)]
pub struct GeoapifyClient {
    client: Client,
    config: ProviderConfig,
    geocode_url: Url,
    boundaries_url: Url,
}

impl GeoapifyClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid provider URL '{}'", config.base_url))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("sima/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            geocode_url: base.join(GEOCODE_PATH)?,
            boundaries_url: base.join(BOUNDARIES_PATH)?,
            config,
        })
    }

    /// Search for the best state-level match within the configured country
    pub async fn search_state(&self, query: &str) -> Result<Option<GeocodeMatch>, ResolutionError> {
        let params = vec![
            ("text", format!("{}, {}", query, self.config.country_name)),
            ("filter", format!("countrycode:{}", self.config.country_code)),
            ("type", "state".to_string()),
            ("limit", "1".to_string()),
        ];

        let response: FeatureCollection<GeocodeProperties> =
            self.get_json(&self.geocode_url, params).await?;

        Ok(response.features.into_iter().next().map(GeocodeMatch::from))
    }

    /// Administrative boundaries that contain a point
    pub async fn boundaries_part_of(
        &self,
        point: LatLon,
    ) -> Result<Vec<BoundaryFeature>, ResolutionError> {
        let params = vec![
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
            ("boundary", "administrative".to_string()),
            ("geometry", self.config.geometry.clone()),
        ];

        let response: FeatureCollection<BoundaryProperties> =
            self.get_json(&self.boundaries_url, params).await?;

        Ok(response
            .features
            .into_iter()
            .map(BoundaryFeature::from)
            .collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<T, ResolutionError> {
        if let Some(key) = &self.config.api_key {
            params.push(("apiKey", key.clone()));
        }

        let max_attempts = self.config.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            attempts += 1;

            let failure = match self.client.get(url.clone()).query(&params).send().await {
                Ok(response) if response.status().is_success() => {
                    return response.json::<T>().await.map_err(|e| {
                        ResolutionError::Network(format!(
                            "invalid response from {}: {}",
                            url.path(),
                            e.without_url()
                        ))
                    });
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let message = format!("{} returned {}: {}", url.path(), status, body);
                    if !is_retryable(status) {
                        return Err(ResolutionError::Network(message));
                    }
                    message
                }
                // Errors carry the request URL, which includes the API key
                Err(e) => format!("request to {} failed: {}", url.path(), e.without_url()),
            };

            if attempts >= max_attempts {
                return Err(ResolutionError::Network(failure));
            }

            let delay = retry_delay(attempts);
            warn!(
                "Provider request failed (attempt {}/{}), retrying in {:?}: {}",
                attempts, max_attempts, delay, failure
            );
            tokio::time::sleep(delay).await;
            debug!("Retrying {}", url.path());
        }
    }
}

/// Backoff before the retry that follows attempt `attempt` (1-based)
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY
        .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
        .min(RETRY_MAX_DELAY)
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

impl BoundaryProvider for GeoapifyClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>, ResolutionError> {
        self.search_state(query).await
    }

    async fn boundaries_around(
        &self,
        point: LatLon,
    ) -> Result<Vec<BoundaryFeature>, ResolutionError> {
        self.boundaries_part_of(point).await
    }
}
