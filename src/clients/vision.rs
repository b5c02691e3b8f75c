use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{ClientError, read_json, send};
use crate::config::OcrConfig;

const PROVIDER: &str = "Google Vision";

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateResult>,
}

#[derive(Debug, Deserialize)]
struct AnnotateResult {
    #[serde(default, rename = "textAnnotations")]
    text_annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

/// OCR over the `images:annotate` endpoint.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl VisionClient {
    #[must_use]
    pub fn new(client: Client, config: &OcrConfig, api_key: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Returns the full text block of the first annotation, `None` when the
    /// image contains no recognizable text.
    pub async fn detect_text(&self, image: &[u8]) -> Result<Option<String>, ClientError> {
        let mut url = Url::parse(&format!("{}/images:annotate", self.base_url))
            .map_err(|source| ClientError::Url { provider: PROVIDER, source })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "TEXT_DETECTION" }]
            }]
        });

        tracing::debug!(bytes = image.len(), "Requesting OCR text detection");

        let response = send(PROVIDER, self.client.post(url).json(&body)).await?;
        let parsed: AnnotateResponse = read_json(PROVIDER, response).await?;

        Ok(parsed
            .responses
            .into_iter()
            .next()
            .and_then(|r| r.text_annotations.into_iter().next())
            .map(|a| a.description)
            .filter(|text| !text.is_empty()))
    }
}
