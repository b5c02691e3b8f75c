use reqwest::Client;
use serde::Deserialize;

use super::{ClientError, send};
use crate::config::SmsConfig;

const PROVIDER: &str = "Twilio";

#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub to: String,
    pub from: String,
    pub body: String,
    pub status_callback: Option<String>,
    /// Seconds the provider keeps retrying delivery
    pub validity_period: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageReceipt {
    pub sid: String,
    #[serde(default)]
    pub status: String,
    /// Decimal string, negative for charges; absent until billed
    pub price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    #[must_use]
    pub fn new(client: Client, config: &SmsConfig, account_sid: String, auth_token: String) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid,
            auth_token,
        }
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageReceipt, ClientError> {
        let url = format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid);

        let mut form: Vec<(&str, String)> = vec![
            ("To", message.to.clone()),
            ("From", message.from.clone()),
            ("Body", message.body.clone()),
        ];
        if let Some(callback) = &message.status_callback {
            form.push(("StatusCallback", callback.clone()));
        }
        if let Some(validity) = message.validity_period {
            form.push(("ValidityPeriod", validity.to_string()));
        }

        let request = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form);

        let response = send(PROVIDER, request).await.map_err(|err| match err {
            // Surface the provider's own explanation instead of the raw body.
            ClientError::Status { provider, status, message } => {
                let message = serde_json::from_str::<TwilioErrorBody>(&message)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| status.to_string());
                ClientError::Status { provider, status, message }
            }
            other => other,
        })?;

        super::read_json(PROVIDER, response).await
    }
}
