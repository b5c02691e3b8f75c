//! `SeaORM` implementation of the [`WeatherService`] trait.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::clients::openweather::WeatherProvider;
use crate::config::CacheConfig;
use crate::db::{NewWeatherAlert, Store, format_timestamp};
use crate::models::{
    AdvisoryReport, AlertView, CacheDataType, Coordinates, CurrentReport, ForecastReport,
    LocationDetails, LocationKey, WeatherAlertsReport, round_half_up,
};
use crate::models::weather::{AdvisoryCurrent, AdvisoryForecast, AdvisoryLocation};
use crate::services::Clock;
use crate::services::advisory::{
    Conditions, derive_advisory, derive_alerts, next_sample_rain_percent, rain_fraction_24h,
};
use crate::services::aggregator::aggregate_daily;
use crate::services::weather_service::{CachedPayload, WeatherError, WeatherService};

/// TTLs per cached data type plus the alert lifetime.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    pub current: Duration,
    pub forecast: Duration,
    pub location: Duration,
    pub alert: Duration,
}

impl CacheTtls {
    #[must_use]
    pub const fn for_type(&self, data_type: CacheDataType) -> Duration {
        match data_type {
            CacheDataType::Current => self.current,
            CacheDataType::Forecast => self.forecast,
            CacheDataType::Location => self.location,
        }
    }
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            current: Duration::from_secs(config.current_ttl_seconds),
            forecast: Duration::from_secs(config.forecast_ttl_seconds),
            location: Duration::from_secs(config.location_ttl_seconds),
            alert: Duration::from_secs(config.alert_ttl_seconds),
        }
    }
}

pub struct SeaOrmWeatherService {
    store: Store,
    provider: Option<Arc<dyn WeatherProvider>>,
    ttls: CacheTtls,
    clock: Clock,
}

impl SeaOrmWeatherService {
    #[must_use]
    pub fn new(
        store: Store,
        provider: Option<Arc<dyn WeatherProvider>>,
        ttls: CacheTtls,
        clock: Clock,
    ) -> Self {
        Self {
            store,
            provider,
            ttls,
            clock,
        }
    }

    fn provider(&self) -> Result<&dyn WeatherProvider, WeatherError> {
        self.provider.as_deref().ok_or_else(|| {
            WeatherError::Configuration("OpenWeather API key not configured".to_string())
        })
    }

    /// Serves `key`/`data_type` from the cache or runs `fetch` and stores
    /// its output.
    async fn read_through<F, Fut>(
        &self,
        key: &LocationKey,
        data_type: CacheDataType,
        fetch: F,
    ) -> Result<CachedPayload, WeatherError>
    where
        F: FnOnce(String) -> Fut + Send,
        Fut: Future<Output = Result<String, WeatherError>> + Send,
    {
        let now = (self.clock)();

        if let Some(body) = self.store.get_cached_payload(key, data_type, now).await? {
            metrics::counter!(
                "weather_cache_requests_total",
                "data_type" => data_type.as_str(),
                "outcome" => "hit"
            )
            .increment(1);
            debug!(location_key = %key, data_type = %data_type, "Cache hit");
            return Ok(CachedPayload {
                body,
                data_type,
                cache_hit: true,
            });
        }

        metrics::counter!(
            "weather_cache_requests_total",
            "data_type" => data_type.as_str(),
            "outcome" => "miss"
        )
        .increment(1);
        debug!(location_key = %key, data_type = %data_type, "Cache miss");

        let body = fetch(format_timestamp(now)).await?;

        if let Err(e) = self
            .store
            .put_cached_payload(key, data_type, &body, self.ttls.for_type(data_type), now)
            .await
        {
            warn!(
                location_key = %key,
                data_type = %data_type,
                error = %e,
                "Failed to write cache entry"
            );
        }

        Ok(CachedPayload {
            body,
            data_type,
            cache_hit: false,
        })
    }
}

#[async_trait::async_trait]
impl WeatherService for SeaOrmWeatherService {
    async fn current(&self, at: Coordinates) -> Result<CachedPayload, WeatherError> {
        let provider = self.provider()?;
        let key = LocationKey::raw(at.lat, at.lon);

        self.read_through(&key, CacheDataType::Current, |timestamp| async move {
            let weather = provider.current(at).await?;
            let report = CurrentReport::from_weather(&weather, timestamp);
            Ok(serde_json::to_string(&report)?)
        })
        .await
    }

    async fn forecast(&self, at: Coordinates) -> Result<CachedPayload, WeatherError> {
        let provider = self.provider()?;
        let key = LocationKey::raw(at.lat, at.lon);

        self.read_through(&key, CacheDataType::Forecast, |timestamp| async move {
            let forecast = provider.forecast(at).await?;
            let days = aggregate_daily(&forecast.samples)?;
            let report = ForecastReport {
                location: forecast.place,
                forecast: days,
                timestamp,
            };
            Ok(serde_json::to_string(&report)?)
        })
        .await
    }

    async fn alerts(&self, at: Coordinates) -> Result<WeatherAlertsReport, WeatherError> {
        let provider = self.provider()?;
        let key = LocationKey::raw(at.lat, at.lon);

        let (weather, forecast) = futures::try_join!(provider.current(at), provider.forecast(at))?;
        let now = (self.clock)();

        let rain_probability = next_sample_rain_percent(&forecast.samples);
        let (triggered, farming_tips) = derive_alerts(&Conditions::from(&weather), rain_probability);

        for alert in &triggered {
            let record = NewWeatherAlert {
                location_key: &key,
                alert_type: alert.kind.as_str(),
                title: alert.title,
                message: &alert.message,
                severity: alert.severity.as_str(),
            };
            self.store
                .upsert_weather_alert(&record, self.ttls.alert, now)
                .await?;
        }

        let alerts = self
            .store
            .list_active_alerts(&key, now)
            .await?
            .into_iter()
            .map(|stored| AlertView {
                id: stored.id,
                alert_type: stored.alert_type,
                title: stored.title,
                message: stored.message,
                severity: stored.severity,
                timestamp: stored.created_at,
            })
            .collect();

        Ok(WeatherAlertsReport {
            location: weather.place,
            alerts,
            farming_tips,
            timestamp: format_timestamp(now),
        })
    }

    async fn advisory(&self, at: Coordinates) -> Result<AdvisoryReport, WeatherError> {
        let provider = self.provider()?;

        let (weather, forecast) = futures::try_join!(provider.current(at), provider.forecast(at))?;

        let rain_fraction = rain_fraction_24h(&forecast.samples);
        let advisory = derive_advisory(&Conditions::from(&weather), rain_fraction);

        Ok(AdvisoryReport {
            location: AdvisoryLocation {
                city: weather.place.name.clone(),
                lat: at.lat,
                lon: at.lon,
            },
            current: AdvisoryCurrent {
                temperature: round_half_up(weather.temperature),
                description: weather.description.clone(),
                humidity: round_half_up(weather.humidity),
                wind_speed: round_half_up(weather.wind_speed * 3.6),
            },
            forecast: AdvisoryForecast {
                rain_probability: round_half_up(rain_fraction * 100.0),
                advisory: advisory.text,
                alerts: advisory
                    .tags
                    .iter()
                    .map(|tag| tag.as_str().to_string())
                    .collect(),
            },
        })
    }

    async fn geocode(&self, at: Coordinates) -> Result<CachedPayload, WeatherError> {
        let provider = self.provider()?;
        let key = LocationKey::quantized(at.lat, at.lon);

        self.read_through(&key, CacheDataType::Location, |_| async move {
            let places = provider.reverse_geocode(at).await?;
            let place = places.first().ok_or_else(|| {
                WeatherError::UpstreamShape(
                    "No location data found for the provided coordinates".to_string(),
                )
            })?;
            Ok(serde_json::to_string(&LocationDetails::from(place))?)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ClientError;
    use crate::models::{CurrentWeather, Forecast, ForecastSample, GeocodedPlace, Place};
    use chrono::{DateTime, Utc};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeProvider {
        current_calls: AtomicUsize,
        forecast_calls: AtomicUsize,
        geocode_calls: AtomicUsize,
        temperature: Mutex<f64>,
        humidity: Mutex<f64>,
        places: Vec<GeocodedPlace>,
    }

    fn place() -> Place {
        Place {
            name: "Ludhiana".to_string(),
            lat: 30.9,
            lon: 75.85,
        }
    }

    #[async_trait::async_trait]
    impl WeatherProvider for FakeProvider {
        async fn current(&self, _at: Coordinates) -> Result<CurrentWeather, ClientError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CurrentWeather {
                place: place(),
                temperature: *self.temperature.lock().unwrap(),
                feels_like: 30.0,
                humidity: *self.humidity.lock().unwrap(),
                pressure: 1008.0,
                wind_speed: 2.0,
                visibility: Some(8000.0),
                condition: "Clear".to_string(),
                description: "clear sky".to_string(),
                icon: "01d".to_string(),
            })
        }

        async fn forecast(&self, _at: Coordinates) -> Result<Forecast, ClientError> {
            self.forecast_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Forecast {
                place: place(),
                samples: vec![ForecastSample {
                    timestamp: 1_772_323_200,
                    temperature: 22.0,
                    condition: "Clear".to_string(),
                    description: "clear sky".to_string(),
                    icon: "01d".to_string(),
                    pop: 0.1,
                }],
            })
        }

        async fn reverse_geocode(&self, _at: Coordinates) -> Result<Vec<GeocodedPlace>, ClientError> {
            self.geocode_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.places.clone())
        }
    }

    fn fixed_clock() -> Clock {
        let at: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        Arc::new(move || at)
    }

    fn ttls(seconds: u64) -> CacheTtls {
        let ttl = Duration::from_secs(seconds);
        CacheTtls {
            current: ttl,
            forecast: ttl,
            location: ttl,
            alert: Duration::from_secs(3600),
        }
    }

    async fn service(provider: Arc<FakeProvider>, ttl_seconds: u64) -> (SeaOrmWeatherService, Store) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let service = SeaOrmWeatherService::new(
            store.clone(),
            Some(provider),
            ttls(ttl_seconds),
            fixed_clock(),
        );
        (service, store)
    }

    const AT: Coordinates = Coordinates {
        lat: 30.9,
        lon: 75.85,
    };

    #[tokio::test]
    async fn test_current_is_served_from_cache_within_ttl() {
        let provider = Arc::new(FakeProvider::default());
        *provider.temperature.lock().unwrap() = 25.0;
        let (service, _) = service(provider.clone(), 600).await;

        let first = service.current(AT).await.unwrap();
        let second = service.current(AT).await.unwrap();

        assert!(!first.cache_hit);
        assert!(second.cache_hit);
        assert_eq!(first.body, second.body);
        assert_eq!(provider.current_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let provider = Arc::new(FakeProvider::default());
        let (service, _) = service(provider.clone(), 0).await;

        service.forecast(AT).await.unwrap();
        let second = service.forecast(AT).await.unwrap();

        assert!(!second.cache_hit);
        assert_eq!(provider.forecast_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_provider_is_configuration_error() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let service = SeaOrmWeatherService::new(store, None, ttls(600), fixed_clock());

        let err = service.current(AT).await.unwrap_err();
        assert!(matches!(err, WeatherError::Configuration(ref m) if m == "OpenWeather API key not configured"));
    }

    #[tokio::test]
    async fn test_alerts_upsert_keeps_one_row_per_title() {
        let provider = Arc::new(FakeProvider::default());
        *provider.temperature.lock().unwrap() = 38.0;
        *provider.humidity.lock().unwrap() = 50.0;
        let (service, store) = service(provider, 600).await;

        let first = service.alerts(AT).await.unwrap();
        let second = service.alerts(AT).await.unwrap();

        assert_eq!(first.alerts.len(), 1);
        assert_eq!(second.alerts.len(), 1);
        assert_eq!(first.alerts[0].title, "High Temperature Alert");
        assert_eq!(first.alerts[0].id, second.alerts[0].id);

        let key = LocationKey::raw(AT.lat, AT.lon);
        let now = fixed_clock()();
        assert_eq!(store.list_active_alerts(&key, now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_geocode_without_results_is_upstream_shape_error() {
        let provider = Arc::new(FakeProvider::default());
        let (service, _) = service(provider, 600).await;

        let err = service.geocode(AT).await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamShape(_)));
    }

    #[tokio::test]
    async fn test_geocode_uses_quantized_key() {
        let provider = Arc::new(FakeProvider {
            places: vec![GeocodedPlace {
                name: "Ludhiana".to_string(),
                country: Some("IN".to_string()),
                state: Some("Punjab".to_string()),
                local_name_en: None,
            }],
            ..FakeProvider::default()
        });
        let (service, store) = service(provider.clone(), 600).await;

        service.geocode(AT).await.unwrap();
        let nearby = Coordinates {
            lat: 30.900_01,
            lon: 75.850_04,
        };
        let hit = service.geocode(nearby).await.unwrap();

        assert!(hit.cache_hit);
        assert_eq!(provider.geocode_calls.load(Ordering::SeqCst), 1);
        let key = LocationKey::quantized(AT.lat, AT.lon);
        assert!(
            store
                .get_cache_entry(&key, CacheDataType::Location)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_advisory_reports_rain_over_eight_slots() {
        let provider = Arc::new(FakeProvider::default());
        *provider.temperature.lock().unwrap() = 25.0;
        *provider.humidity.lock().unwrap() = 60.0;
        let (service, _) = service(provider, 600).await;

        let report = service.advisory(AT).await.unwrap();
        // One sample at 0.1 over eight slots.
        assert_eq!(report.forecast.rain_probability, 1);
        assert_eq!(report.location.city, "Ludhiana");
        assert_eq!(report.current.wind_speed, 7);
    }
}
