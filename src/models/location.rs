use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of payload stored in the weather cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDataType {
    Current,
    Forecast,
    Location,
}

impl CacheDataType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Forecast => "forecast",
            Self::Location => "location",
        }
    }
}

impl fmt::Display for CacheDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheDataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(Self::Current),
            "forecast" => Ok(Self::Forecast),
            "location" => Ok(Self::Location),
            other => Err(format!("Unknown cache data type: {other}")),
        }
    }
}

/// Coarse spatial bucket used to partition cached payloads.
///
/// Weather payloads use the coordinates exactly as the client sent them,
/// geocoded places are bucketed to four decimal places (~11 m).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey(String);

impl LocationKey {
    #[must_use]
    pub fn raw(lat: f64, lon: f64) -> Self {
        let (lat, lon) = (unsigned_zero(lat), unsigned_zero(lon));
        Self(format!("{lat}_{lon}"))
    }

    #[must_use]
    pub fn quantized(lat: f64, lon: f64) -> Self {
        let (lat, lon) = (unsigned_zero(lat), unsigned_zero(lon));
        Self(format!("{lat:.4}_{lon:.4}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `-0.0 + 0.0` is `+0.0`, so `lat=-0` and `lat=0` share a bucket.
fn unsigned_zero(value: f64) -> f64 {
    value + 0.0
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
