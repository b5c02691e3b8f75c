pub mod openai;
pub mod openweather;
pub mod twilio;
pub mod vision;

use thiserror::Error;

/// Failure talking to a third-party API. No call is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{provider} API error: {status}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unexpected response: {message}")]
    Shape {
        provider: &'static str,
        message: String,
    },

    #[error("Invalid {provider} URL: {source}")]
    Url {
        provider: &'static str,
        #[source]
        source: url::ParseError,
    },
}

impl ClientError {
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        match self {
            Self::Status { provider, .. }
            | Self::Transport { provider, .. }
            | Self::Shape { provider, .. }
            | Self::Url { provider, .. } => provider,
        }
    }

    pub(crate) fn shape(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Shape {
            provider,
            message: message.into(),
        }
    }
}

pub(crate) fn record_vendor_call(provider: &'static str, outcome: &'static str) {
    metrics::counter!(
        "vendor_requests_total",
        "provider" => provider,
        "outcome" => outcome
    )
    .increment(1);
}

/// Sends a prepared request, turning transport failures and non-2xx
/// statuses into [`ClientError`]s and counting the outcome.
pub(crate) async fn send(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ClientError> {
    let response = match request.send().await {
        Ok(response) => response,
        Err(source) => {
            record_vendor_call(provider, "transport_error");
            return Err(ClientError::Transport { provider, source });
        }
    };

    let status = response.status();
    if !status.is_success() {
        record_vendor_call(provider, "http_error");
        let message = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = status.as_u16(), "Vendor API returned an error");
        return Err(ClientError::Status {
            provider,
            status: status.as_u16(),
            message,
        });
    }

    record_vendor_call(provider, "success");
    Ok(response)
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::Transport { provider, source })?;

    serde_json::from_str(&body).map_err(|e| ClientError::shape(provider, e.to_string()))
}
