use serde::{Deserialize, Serialize};

use crate::services::{Language, Topic};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// `?lat=..&lon=..`; kept as text so bad input can be reported as a 400.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinatesQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// `{"lat": .., "lon": ..}`; numbers or numeric strings.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinatesBody {
    pub lat: Option<serde_json::Value>,
    pub lon: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct MarketQuery {
    pub crop: Option<String>,
    pub state: Option<String>,
    pub market: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// `en`, `hi`, `mr`, `pa` or `auto`
    pub language: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub language: Language,
    pub topic: Topic,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub cache_entries: u64,
    pub weather_configured: bool,
    pub ocr_configured: bool,
    pub llm_configured: bool,
    pub sms_configured: bool,
}
