use tracing::info;

use crate::clients::twilio::{OutgoingMessage, TwilioClient};
use crate::config::SmsConfig;
use crate::services::notification_service::{
    AlertReceipt, AlertRequest, Channel, NotificationError, NotificationService, Priority,
};

/// Seconds a high-priority message stays deliverable.
pub const HIGH_PRIORITY_VALIDITY: u32 = 4 * 60 * 60;

pub const STATUS_CALLBACK_PATH: &str = "/api/alerts/status";

pub struct TwilioNotificationService {
    client: Option<TwilioClient>,
    sms_from: String,
    whatsapp_from: String,
    default_country_code: String,
    public_base_url: Option<String>,
}

impl TwilioNotificationService {
    #[must_use]
    pub fn new(client: Option<TwilioClient>, config: &SmsConfig, public_base_url: Option<String>) -> Self {
        Self {
            client,
            sms_from: config.sms_from.clone(),
            whatsapp_from: config.whatsapp_from.clone(),
            default_country_code: config.default_country_code.clone(),
            public_base_url,
        }
    }

    fn normalize_phone(&self, phone: &str) -> String {
        if phone.starts_with('+') {
            phone.to_string()
        } else {
            format!("{}{phone}", self.default_country_code)
        }
    }

    /// Addressing and body decoration for one request.
    #[must_use]
    pub fn compose(&self, request: &AlertRequest) -> OutgoingMessage {
        let phone = self.normalize_phone(&request.phone);

        let (to, from, body) = match request.channel {
            Channel::Whatsapp => (
                format!("whatsapp:{phone}"),
                self.whatsapp_from.clone(),
                format!(
                    "🌾 *KrishiMarg Alert*\n\n{}\n\n_Sent via KrishiMarg farming advisory system_",
                    request.message
                ),
            ),
            Channel::Sms => (
                phone,
                self.sms_from.clone(),
                format!("KrishiMarg Alert: {}", request.message),
            ),
        };

        let high = request.priority == Priority::High;
        OutgoingMessage {
            to,
            from,
            body,
            status_callback: self
                .public_base_url
                .as_deref()
                .filter(|_| high)
                .map(|base| format!("{}{STATUS_CALLBACK_PATH}", base.trim_end_matches('/'))),
            validity_period: high.then_some(HIGH_PRIORITY_VALIDITY),
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for TwilioNotificationService {
    async fn send_alert(&self, request: &AlertRequest) -> Result<AlertReceipt, NotificationError> {
        let client = self.client.as_ref().ok_or_else(|| {
            NotificationError::Configuration("Twilio credentials not configured".to_string())
        })?;

        if request.phone.trim().is_empty() || request.message.trim().is_empty() {
            return Err(NotificationError::Validation(
                "Phone number and message are required".to_string(),
            ));
        }

        let outgoing = self.compose(request);
        let receipt = client.send_message(&outgoing).await?;

        info!(
            channel = ?request.channel,
            priority = ?request.priority,
            message_id = %receipt.sid,
            status = %receipt.status,
            "Alert sent"
        );

        Ok(AlertReceipt {
            success: true,
            cost: receipt
                .price
                .as_deref()
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(0.0),
            message_id: receipt.sid,
            delivery_status: receipt.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(public_base_url: Option<&str>) -> TwilioNotificationService {
        TwilioNotificationService::new(
            None,
            &SmsConfig::default(),
            public_base_url.map(ToString::to_string),
        )
    }

    fn request(channel: Channel, priority: Priority) -> AlertRequest {
        AlertRequest {
            phone: "9876543210".to_string(),
            message: "Heavy rain tonight".to_string(),
            channel,
            priority,
        }
    }

    #[test]
    fn test_sms_gets_country_code_and_prefix() {
        let msg = service(None).compose(&request(Channel::Sms, Priority::Medium));
        assert_eq!(msg.to, "+919876543210");
        assert_eq!(msg.from, "+1234567890");
        assert_eq!(msg.body, "KrishiMarg Alert: Heavy rain tonight");
        assert_eq!(msg.validity_period, None);
        assert_eq!(msg.status_callback, None);
    }

    #[test]
    fn test_whatsapp_addressing() {
        let mut req = request(Channel::Whatsapp, Priority::Low);
        req.phone = "+447700900123".to_string();

        let msg = service(None).compose(&req);
        assert_eq!(msg.to, "whatsapp:+447700900123");
        assert_eq!(msg.from, "whatsapp:+14155238886");
        assert!(msg.body.starts_with("🌾 *KrishiMarg Alert*\n\nHeavy rain tonight"));
    }

    #[test]
    fn test_high_priority_adds_validity_and_callback() {
        let msg = service(Some("https://farm.example/")).compose(&request(Channel::Sms, Priority::High));
        assert_eq!(msg.validity_period, Some(14_400));
        assert_eq!(
            msg.status_callback.as_deref(),
            Some("https://farm.example/api/alerts/status")
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let err = service(None)
            .send_alert(&request(Channel::Sms, Priority::Medium))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::Configuration(_)));
    }

    #[test]
    fn test_request_defaults() {
        let req: AlertRequest =
            serde_json::from_str(r#"{"phone": "1", "message": "m"}"#).unwrap();
        assert_eq!(req.channel, Channel::Sms);
        assert_eq!(req.priority, Priority::Medium);
    }
}
