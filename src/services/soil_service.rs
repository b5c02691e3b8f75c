//! Soil test report analysis: OCR, then LLM interpretation, with a fixed
//! fallback analysis when the LLM is unavailable or answers badly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clients::ClientError;

pub const DEFAULT_REPORT_LANGUAGE: &str = "English";

#[derive(Debug, Error)]
pub enum SoilError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilStatus {
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilParameters {
    #[serde(rename = "pH")]
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub organic_carbon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilAnalysis {
    pub status: SoilStatus,
    pub parameters: SoilParameters,
    pub issues: Vec<String>,
    pub advice: Vec<String>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilReport {
    pub ocr_text: String,
    pub analysis: SoilAnalysis,
}

#[async_trait::async_trait]
pub trait SoilService: Send + Sync {
    /// Analyzes a photographed soil test report. `language` is the
    /// language name the advice should be written in.
    async fn analyze(&self, image: &[u8], language: &str) -> Result<SoilReport, SoilError>;
}
