//! Twilio REST messaging adapter (SMS and WhatsApp).

use std::time::Duration;

use async_trait::async_trait;

use crate::AdapterError;

const TWILIO_TIMEOUT_SECS: u64 = 30;

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageMode {
    Sms,
    Whatsapp,
}

impl MessageMode {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "sms" => Self::Sms,
            _ => Self::Whatsapp,
        }
    }

    /// Upper-case tag used in result strings (`SMS` / `WHATSAPP`).
    pub fn tag(self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Whatsapp => "WHATSAPP",
        }
    }
}

/// Account credentials for one send.
#[derive(Debug, Clone, Default)]
pub struct TwilioCredentialSet {
    pub sid: String,
    pub token: String,
    pub phone: String,
}

/// Message delivery through Twilio.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `body` to `to`, returning the provider message id.
    async fn send(
        &self,
        mode: MessageMode,
        to: &str,
        body: &str,
        credentials: &TwilioCredentialSet,
    ) -> Result<String, AdapterError>;
}

/// Production REST implementation.
pub struct TwilioRestSender {
    http: reqwest::Client,
}

impl TwilioRestSender {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(TWILIO_TIMEOUT_SECS))
                .build()
                .expect("reqwest client"),
        }
    }
}

impl Default for TwilioRestSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSender for TwilioRestSender {
    async fn send(
        &self,
        mode: MessageMode,
        to: &str,
        body: &str,
        credentials: &TwilioCredentialSet,
    ) -> Result<String, AdapterError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            credentials.sid
        );

        // WhatsApp numbers are prefixed on the wire.
        let (from, to) = match mode {
            MessageMode::Whatsapp => (
                format!("whatsapp:{}", credentials.phone),
                format!("whatsapp:{to}"),
            ),
            MessageMode::Sms => (credentials.phone.clone(), to.to_owned()),
        };

        let params = [("From", from.as_str()), ("To", to.as_str()), ("Body", body)];

        let response = self
            .http
            .post(&url)
            .basic_auth(&credentials.sid, Some(&credentials.token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await.unwrap_or_default();
        if !status.is_success() {
            let message = payload["message"].as_str().unwrap_or("request rejected").to_owned();
            return Err(AdapterError::Api { status: status.as_u16(), message });
        }

        Ok(payload["sid"].as_str().unwrap_or_default().to_owned())
    }
}
