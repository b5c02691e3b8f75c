//! Domain service for weather, forecast, alerts and reverse geocoding.
//!
//! Reads go through the cache first; a miss fetches from the provider,
//! normalizes, stores the serialized response with a TTL and returns it.

use thiserror::Error;

use crate::clients::ClientError;
use crate::models::{AdvisoryReport, CacheDataType, Coordinates, WeatherAlertsReport};
use crate::services::aggregator::AggregateError;

/// Errors specific to weather operations.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    Provider(#[from] ClientError),

    #[error("Weather provider returned unusable data: {0}")]
    UpstreamShape(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AggregateError> for WeatherError {
    fn from(err: AggregateError) -> Self {
        Self::UpstreamShape(err.to_string())
    }
}

impl From<anyhow::Error> for WeatherError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A serialized response body. On a cache hit `body` is the stored text,
/// byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    pub body: String,
    pub data_type: CacheDataType,
    pub cache_hit: bool,
}

/// Domain service trait for weather data.
#[async_trait::async_trait]
pub trait WeatherService: Send + Sync {
    /// Current conditions, cached for `cache.current_ttl_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Configuration`] when no provider key is set,
    /// [`WeatherError::Provider`] when the provider call fails.
    async fn current(&self, at: Coordinates) -> Result<CachedPayload, WeatherError>;

    /// Five-day daily forecast, cached for `cache.forecast_ttl_seconds`.
    async fn forecast(&self, at: Coordinates) -> Result<CachedPayload, WeatherError>;

    /// Fetches fresh data, records triggered alerts and returns the active
    /// alert list together with farming tips. Never served from cache.
    async fn alerts(&self, at: Coordinates) -> Result<WeatherAlertsReport, WeatherError>;

    /// 24-hour farming advisory. Never served from cache.
    async fn advisory(&self, at: Coordinates) -> Result<AdvisoryReport, WeatherError>;

    /// Reverse geocoding, cached for `cache.location_ttl_seconds` under a
    /// four-decimal location key.
    async fn geocode(&self, at: Coordinates) -> Result<CachedPayload, WeatherError>;
}
