//! Outbound SMS used to tell volunteers they were accepted.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use service_core::observability::TracedClientExt;
use std::sync::Mutex;
use thiserror::Error;

use crate::config::TwilioConfig;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Delivery id assigned by the provider.
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError>;
    fn name(&self) -> &'static str;
}

pub struct TwilioProvider {
    config: TwilioConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
}

impl TwilioProvider {
    pub fn new(config: TwilioConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            TWILIO_API_BASE, self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsProvider for TwilioProvider {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "Twilio SMS provider is not enabled".to_string(),
            ));
        }
        if sms.to.trim().is_empty() {
            return Err(ProviderError::InvalidRecipient(
                "Phone number is empty".to_string(),
            ));
        }

        let form = [
            ("To", sms.to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", sms.body.as_str()),
        ];

        let response = self
            .client
            .traced_post(&self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret().as_str()),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(format!("Failed to connect to Twilio: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "Twilio API returned error status {}: {}",
                status, body
            )));
        }

        let message: TwilioMessage = response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse Twilio response: {}", e))
        })?;

        tracing::info!(to = %sms.to, sid = %message.sid, "SMS sent via Twilio");

        Ok(ProviderResponse {
            provider_id: Some(message.sid),
        })
    }

    fn name(&self) -> &'static str {
        "twilio"
    }
}

/// Records messages instead of sending them. Can be told to fail.
#[derive(Default)]
pub struct MockSmsProvider {
    fail: bool,
    sent: Mutex<Vec<SmsMessage>>,
}

impl MockSmsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<SmsMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsProvider for MockSmsProvider {
    async fn send(&self, sms: &SmsMessage) -> Result<ProviderResponse, ProviderError> {
        if self.fail {
            return Err(ProviderError::SendFailed(
                "Mock SMS provider configured to fail".to_string(),
            ));
        }

        let count = {
            let mut sent = self
                .sent
                .lock()
                .map_err(|e| ProviderError::SendFailed(format!("Mock SMS mutex poisoned: {}", e)))?;
            sent.push(sms.clone());
            sent.len()
        };

        tracing::info!(
            to = %sms.to,
            body_length = %sms.body.len(),
            "[MOCK] SMS would be sent"
        );

        Ok(ProviderResponse {
            provider_id: Some(format!("mock-sms-{}", count)),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
