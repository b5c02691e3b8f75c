//! Threshold rules that turn a weather sample into farmer-facing alerts.
//!
//! Every rule looks only at the current observation plus a single rain
//! probability figure. Alert rules fire independently; each tip category
//! takes the first rule that matches in a fixed order.

use serde::Serialize;

use crate::models::{CurrentWeather, FarmingTips, ForecastSample, round_half_up};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Weather,
    Farming,
}

impl AlertKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Farming => "farming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub title: &'static str,
    pub message: String,
    pub severity: Severity,
}

pub const HEAVY_RAIN: &str = "Heavy Rain Expected";
pub const HIGH_TEMPERATURE: &str = "High Temperature Alert";
pub const LOW_HUMIDITY: &str = "Low Humidity Warning";
pub const WINDY: &str = "Windy Conditions";
pub const FROST: &str = "Frost Warning";

/// The observation fields the rules read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent
    pub humidity: f64,
    /// Metres per second
    pub wind_speed: f64,
}

impl From<&CurrentWeather> for Conditions {
    fn from(weather: &CurrentWeather) -> Self {
        Self {
            temperature: weather.temperature,
            humidity: weather.humidity,
            wind_speed: weather.wind_speed,
        }
    }
}

/// Rain probability (percent) used by the alert rules: the nearest sample's pop.
#[must_use]
pub fn next_sample_rain_percent(samples: &[ForecastSample]) -> i64 {
    samples
        .first()
        .map_or(0, |s| round_half_up(s.pop * 100.0))
}

/// Mean pop over the next 24 hours (eight 3-hour samples), as a fraction.
/// Missing samples count as zero.
#[must_use]
pub fn rain_fraction_24h(samples: &[ForecastSample]) -> f64 {
    samples.iter().take(8).map(|s| s.pop).sum::<f64>() / 8.0
}

/// Derives the alert set and farming tips for one observation.
#[must_use]
pub fn derive_alerts(conditions: &Conditions, rain_probability: i64) -> (Vec<Alert>, FarmingTips) {
    (
        alert_rules(conditions, rain_probability),
        farming_tips(conditions, rain_probability),
    )
}

fn alert_rules(c: &Conditions, rain_probability: i64) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if rain_probability > 70 {
        alerts.push(Alert {
            kind: AlertKind::Weather,
            title: HEAVY_RAIN,
            message: format!(
                "High probability of rain ({rain_probability}%). Postpone spraying and field work."
            ),
            severity: Severity::High,
        });
    }

    if c.temperature > 35.0 {
        alerts.push(Alert {
            kind: AlertKind::Weather,
            title: HIGH_TEMPERATURE,
            message: format!(
                "Temperature {}°C. Increase irrigation frequency and avoid midday field work.",
                round_half_up(c.temperature)
            ),
            severity: Severity::Medium,
        });
    }

    if c.humidity < 30.0 {
        alerts.push(Alert {
            kind: AlertKind::Farming,
            title: LOW_HUMIDITY,
            message: format!(
                "Humidity at {}%. Monitor crops for water stress and consider additional irrigation.",
                c.humidity
            ),
            severity: Severity::Medium,
        });
    }

    if c.wind_speed > 10.0 {
        alerts.push(Alert {
            kind: AlertKind::Farming,
            title: WINDY,
            message: format!(
                "Wind speed {} km/h. Avoid pesticide spraying to prevent drift.",
                round_half_up(c.wind_speed * 3.6)
            ),
            severity: Severity::Medium,
        });
    }

    if c.temperature < 2.0 {
        alerts.push(Alert {
            kind: AlertKind::Weather,
            title: FROST,
            message: format!(
                "Temperature dropping to {}°C. Protect sensitive crops from frost damage.",
                round_half_up(c.temperature)
            ),
            severity: Severity::High,
        });
    }

    alerts
}

fn farming_tips(c: &Conditions, rain_probability: i64) -> FarmingTips {
    let irrigation = if c.temperature > 30.0 && c.humidity < 50.0 {
        "Increase irrigation frequency due to high temperature and low humidity"
    } else if rain_probability > 50 {
        "Reduce irrigation as rain is expected"
    } else if c.temperature < 10.0 {
        "Reduce irrigation frequency in cool weather"
    } else {
        "Normal irrigation schedule"
    };

    let spray_conditions = if c.wind_speed > 7.0 {
        "Avoid spraying - wind speed too high, risk of drift"
    } else if rain_probability > 30 {
        "Avoid spraying - rain expected within 6 hours"
    } else if c.temperature > 35.0 {
        "Spray early morning or evening - temperature too high"
    } else if c.wind_speed < 3.0 && c.temperature < 25.0 {
        "Excellent conditions for spraying"
    } else {
        "Good conditions for spraying"
    };

    let field_work = if rain_probability > 60 {
        "Postpone heavy machinery work - rain expected"
    } else if c.temperature > 40.0 {
        "Work during early morning or late evening to avoid heat stress"
    } else if c.wind_speed > 15.0 {
        "Avoid operations with loose materials due to high winds"
    } else if c.temperature > 15.0 && c.temperature < 30.0 && c.wind_speed < 10.0 {
        "Ideal conditions for all field activities"
    } else {
        "Suitable for field activities"
    };

    FarmingTips {
        irrigation: irrigation.to_string(),
        spray_conditions: spray_conditions.to_string(),
        field_work: field_work.to_string(),
    }
}

// ============================================================================
// 24-hour advisory
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryTag {
    HeatWave,
    FrostWarning,
    HeavyRain,
    DroughtRisk,
    StrongWind,
}

impl AdvisoryTag {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HeatWave => "HEAT_WAVE",
            Self::FrostWarning => "FROST_WARNING",
            Self::HeavyRain => "HEAVY_RAIN",
            Self::DroughtRisk => "DROUGHT_RISK",
            Self::StrongWind => "STRONG_WIND",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub text: String,
    pub tags: Vec<AdvisoryTag>,
}

const FAVORABLE: &str = "Weather conditions are favorable for normal farming activities. Monitor crops regularly and maintain irrigation schedules.";

/// One paragraph of advice for the coming day. `rain_fraction` is in [0, 1].
#[must_use]
pub fn derive_advisory(c: &Conditions, rain_fraction: f64) -> Advisory {
    let mut sentences: Vec<&str> = Vec::new();
    let mut tags = Vec::new();

    if c.temperature > 35.0 {
        sentences.push("High temperature detected. Increase irrigation frequency and provide shade for sensitive crops.");
        tags.push(AdvisoryTag::HeatWave);
    } else if c.temperature < 10.0 {
        sentences.push("Low temperature alert. Protect crops from frost and consider covering young plants.");
        tags.push(AdvisoryTag::FrostWarning);
    }

    if rain_fraction > 0.7 {
        sentences.push("Heavy rain expected. Ensure proper drainage and postpone pesticide application.");
        tags.push(AdvisoryTag::HeavyRain);
    } else if rain_fraction < 0.1 && c.humidity < 30.0 {
        sentences.push("Dry conditions expected. Increase irrigation and monitor soil moisture levels.");
        tags.push(AdvisoryTag::DroughtRisk);
    }

    if c.wind_speed > 10.0 {
        sentences.push("Strong winds forecasted. Secure greenhouse structures and avoid aerial spraying.");
        tags.push(AdvisoryTag::StrongWind);
    }

    let text = if sentences.is_empty() {
        FAVORABLE.to_string()
    } else {
        sentences.join(" ")
    };

    Advisory { text, tags }
}
