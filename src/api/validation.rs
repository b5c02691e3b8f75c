use serde_json::Value;

use super::ApiError;
use crate::models::Coordinates;

const LAT_RANGE: (f64, f64) = (-90.0, 90.0);
const LON_RANGE: (f64, f64) = (-180.0, 180.0);

fn check_range(name: &str, value: f64, (min, max): (f64, f64)) -> Result<f64, ApiError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ApiError::validation(format!(
            "Invalid {name}: {value}. Must be between {min} and {max}"
        )));
    }
    Ok(value)
}

fn parse_text(name: &str, raw: &str, range: (f64, f64)) -> Result<f64, ApiError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid {name}: {raw}")))?;
    check_range(name, value, range)
}

fn parse_json(name: &str, raw: &Value, range: (f64, f64)) -> Result<f64, ApiError> {
    match raw {
        Value::Number(n) => {
            let value = n
                .as_f64()
                .ok_or_else(|| ApiError::validation(format!("Invalid {name}: {n}")))?;
            check_range(name, value, range)
        }
        Value::String(s) => parse_text(name, s, range),
        other => Err(ApiError::validation(format!("Invalid {name}: {other}"))),
    }
}

fn missing() -> ApiError {
    ApiError::validation("Latitude and longitude are required")
}

pub fn coordinates_from_query(lat: Option<&str>, lon: Option<&str>) -> Result<Coordinates, ApiError> {
    let (Some(lat), Some(lon)) = (
        lat.filter(|s| !s.trim().is_empty()),
        lon.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(missing());
    };

    Ok(Coordinates {
        lat: parse_text("latitude", lat, LAT_RANGE)?,
        lon: parse_text("longitude", lon, LON_RANGE)?,
    })
}

pub fn coordinates_from_json(lat: Option<&Value>, lon: Option<&Value>) -> Result<Coordinates, ApiError> {
    let (Some(lat), Some(lon)) = (
        lat.filter(|v| !v.is_null()),
        lon.filter(|v| !v.is_null()),
    ) else {
        return Err(missing());
    };

    Ok(Coordinates {
        lat: parse_json("latitude", lat, LAT_RANGE)?,
        lon: parse_json("longitude", lon, LON_RANGE)?,
    })
}

pub fn validate_crop(crop: Option<&str>) -> Result<&str, ApiError> {
    crop.map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::validation("Crop parameter is required"))
}
