use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use super::{ClientError, read_json, send};
use crate::config::WeatherConfig;
use crate::models::{Coordinates, CurrentWeather, Forecast, ForecastSample, GeocodedPlace, Place};

const PROVIDER: &str = "OpenWeatherMap";

/// Source of weather observations and reverse geocoding.
///
/// Implementations hand back normalized types; provider field names never
/// leave the implementing module.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, at: Coordinates) -> Result<CurrentWeather, ClientError>;

    /// 3-hourly samples in time order.
    async fn forecast(&self, at: Coordinates) -> Result<Forecast, ClientError>;

    async fn reverse_geocode(&self, at: Coordinates) -> Result<Vec<GeocodedPlace>, ClientError>;
}

// ============================================================================
// Provider wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
    #[serde(default)]
    feels_like: f64,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Default, Deserialize)]
struct RawWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    #[serde(default)]
    name: String,
    coord: RawCoord,
    main: RawMain,
    #[serde(default)]
    wind: RawWind,
    visibility: Option<f64>,
    #[serde(default)]
    weather: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawSampleMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    dt: i64,
    main: RawSampleMain,
    #[serde(default)]
    weather: Vec<RawCondition>,
    pop: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    #[serde(default)]
    name: String,
    coord: RawCoord,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    list: Vec<RawSample>,
    city: RawCity,
}

#[derive(Debug, Deserialize)]
struct RawGeocode {
    #[serde(default)]
    name: String,
    country: Option<String>,
    state: Option<String>,
    local_names: Option<HashMap<String, String>>,
}

// ============================================================================
// Mapping into internal types
// ============================================================================

fn map_current(raw: RawCurrent) -> Result<CurrentWeather, ClientError> {
    let condition = raw
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::shape(PROVIDER, "current weather has no condition"))?;

    Ok(CurrentWeather {
        place: Place {
            name: raw.name,
            lat: raw.coord.lat,
            lon: raw.coord.lon,
        },
        temperature: raw.main.temp,
        feels_like: raw.main.feels_like,
        humidity: raw.main.humidity,
        pressure: raw.main.pressure,
        wind_speed: raw.wind.speed,
        visibility: raw.visibility,
        condition: condition.main,
        description: condition.description,
        icon: condition.icon,
    })
}

fn map_forecast(raw: RawForecast) -> Result<Forecast, ClientError> {
    let samples = raw
        .list
        .into_iter()
        .map(|sample| {
            let condition = sample.weather.into_iter().next().ok_or_else(|| {
                ClientError::shape(PROVIDER, format!("forecast sample {} has no condition", sample.dt))
            })?;
            Ok(ForecastSample {
                timestamp: sample.dt,
                temperature: sample.main.temp,
                condition: condition.main,
                description: condition.description,
                icon: condition.icon,
                pop: sample.pop.unwrap_or(0.0),
            })
        })
        .collect::<Result<Vec<_>, ClientError>>()?;

    Ok(Forecast {
        place: Place {
            name: raw.city.name,
            lat: raw.city.coord.lat,
            lon: raw.city.coord.lon,
        },
        samples,
    })
}

fn map_place(raw: RawGeocode) -> GeocodedPlace {
    GeocodedPlace {
        name: raw.name,
        country: raw.country,
        state: raw.state,
        local_name_en: raw.local_names.and_then(|mut names| names.remove("en")),
    }
}

// ============================================================================
// Client
// ============================================================================

#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    geo_base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    #[must_use]
    pub fn new(client: Client, config: &WeatherConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
            api_key,
            units: config.units.clone(),
        }
    }

    fn weather_url(&self, endpoint: &str, at: Coordinates) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}/{endpoint}", self.base_url))
            .map_err(|source| ClientError::Url { provider: PROVIDER, source })?;

        url.query_pairs_mut()
            .append_pair("lat", &at.lat.to_string())
            .append_pair("lon", &at.lon.to_string())
            .append_pair("appid", &self.api_key)
            .append_pair("units", &self.units);

        Ok(url)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, at: Coordinates) -> Result<CurrentWeather, ClientError> {
        let url = self.weather_url("weather", at)?;
        debug!(lat = at.lat, lon = at.lon, "Fetching current weather");

        let response = send(PROVIDER, self.client.get(url)).await?;
        let raw: RawCurrent = read_json(PROVIDER, response).await?;
        map_current(raw)
    }

    async fn forecast(&self, at: Coordinates) -> Result<Forecast, ClientError> {
        let url = self.weather_url("forecast", at)?;
        debug!(lat = at.lat, lon = at.lon, "Fetching forecast");

        let response = send(PROVIDER, self.client.get(url)).await?;
        let raw: RawForecast = read_json(PROVIDER, response).await?;
        map_forecast(raw)
    }

    async fn reverse_geocode(&self, at: Coordinates) -> Result<Vec<GeocodedPlace>, ClientError> {
        let mut url = Url::parse(&format!("{}/reverse", self.geo_base_url))
            .map_err(|source| ClientError::Url { provider: PROVIDER, source })?;

        url.query_pairs_mut()
            .append_pair("lat", &at.lat.to_string())
            .append_pair("lon", &at.lon.to_string())
            .append_pair("limit", "1")
            .append_pair("appid", &self.api_key);

        debug!(lat = at.lat, lon = at.lon, "Reverse geocoding");

        let response = send(PROVIDER, self.client.get(url)).await?;
        let raw: Vec<RawGeocode> = read_json(PROVIDER, response).await?;
        Ok(raw.into_iter().map(map_place).collect())
    }
}
