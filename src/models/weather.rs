use serde::{Deserialize, Serialize};

/// Rounds half away from negative infinity, matching the rounding the
/// frontend applies to every displayed figure.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Current observation, normalized from the provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentWeather {
    pub place: Place,
    /// Degrees Celsius
    pub temperature: f64,
    pub feels_like: f64,
    /// Percent
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// Metres per second
    pub wind_speed: f64,
    /// Metres, absent when the provider omits it
    pub visibility: Option<f64>,
    pub condition: String,
    pub description: String,
    pub icon: String,
}

/// One 3-hourly forecast point.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSample {
    /// Unix seconds
    pub timestamp: i64,
    pub temperature: f64,
    pub condition: String,
    pub description: String,
    pub icon: String,
    /// Probability of precipitation in [0, 1]
    pub pop: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub place: Place,
    pub samples: Vec<ForecastSample>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    pub name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub local_name_en: Option<String>,
}

// ============================================================================
// Response payloads (these are what gets cached)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub temperature: i64,
    pub condition: String,
    pub icon: String,
    pub humidity: i64,
    /// km/h
    pub wind_speed: i64,
    /// km
    pub visibility: i64,
    pub feels_like: i64,
    pub pressure: i64,
    pub uv_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentReport {
    pub location: Place,
    pub current: CurrentConditions,
    pub timestamp: String,
}

impl CurrentReport {
    #[must_use]
    pub fn from_weather(weather: &CurrentWeather, timestamp: String) -> Self {
        Self {
            location: weather.place.clone(),
            current: CurrentConditions {
                temperature: round_half_up(weather.temperature),
                condition: weather.condition.clone(),
                icon: weather.icon.clone(),
                humidity: round_half_up(weather.humidity),
                wind_speed: round_half_up(weather.wind_speed * 3.6),
                visibility: round_half_up(weather.visibility.unwrap_or(0.0) / 1000.0),
                feels_like: round_half_up(weather.feels_like),
                pressure: round_half_up(weather.pressure),
                // Not part of the current-weather endpoint.
                uv_index: 0,
            },
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// `YYYY-MM-DD`, UTC
    pub date: String,
    pub high: i64,
    pub low: i64,
    pub condition: String,
    pub icon: String,
    pub rain_chance: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub location: Place,
    pub forecast: Vec<DailyForecast>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertView {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub title: String,
    pub message: String,
    pub severity: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmingTips {
    pub irrigation: String,
    pub spray_conditions: String,
    pub field_work: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlertsReport {
    pub location: Place,
    pub alerts: Vec<AlertView>,
    pub farming_tips: FarmingTips,
    pub timestamp: String,
}

/// Reverse-geocoding result in the shape the location picker expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDetails {
    pub country: String,
    pub state: String,
    pub district: String,
    pub city: String,
    pub locality: String,
    pub village: String,
    pub formatted_name: String,
}

impl From<&GeocodedPlace> for LocationDetails {
    fn from(place: &GeocodedPlace) -> Self {
        let country = place.country.clone().unwrap_or_default();
        let state = place.state.clone().unwrap_or_default();
        // The provider has no district level; state stands in for it.
        let district = state.clone();
        let city = place.name.clone();
        let locality = place
            .local_name_en
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| place.name.clone());

        let formatted_name = [
            Some(city.as_str()),
            (district != city).then_some(district.as_str()),
            Some(state.as_str()),
            Some(country.as_str()),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            country,
            state,
            district,
            city,
            locality,
            village: String::new(),
            formatted_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryLocation {
    pub city: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryCurrent {
    pub temperature: i64,
    pub description: String,
    pub humidity: i64,
    /// km/h
    pub wind_speed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryForecast {
    pub rain_probability: i64,
    pub advisory: String,
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryReport {
    pub location: AdvisoryLocation,
    pub current: AdvisoryCurrent,
    pub forecast: AdvisoryForecast,
}
