use std::collections::HashMap;

pub mod models;

use reqwest::Client;
use thiserror::Error;

use crate::models::{ApiErrorBody, MessageResponse};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// SMS bodies longer than this are split by carriers into many segments.
pub const MAX_BODY_CHARS: usize = 1600;

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("Invalid recipient format: {0}")]
    InvalidRecipient(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Twilio API error (status {status}, code {code:?}): {message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TwilioError {
    fn from(err: reqwest::Error) -> Self {
        TwilioError::Network(err.to_string())
    }
}

/// Check if a string is a valid phone number (E.164 format)
fn is_phone_number(identifier: &str) -> bool {
    identifier.starts_with('+')
        && identifier.len() >= 10
        && identifier[1..].chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self {
            options,
            client: Client::new(),
        }
    }

    /// Send one SMS. Bodies over `MAX_BODY_CHARS` are truncated.
    pub async fn send_sms(
        &self,
        recipient: &str,
        body: &str,
    ) -> Result<MessageResponse, TwilioError> {
        if !is_phone_number(recipient) {
            return Err(TwilioError::InvalidRecipient(recipient.to_string()));
        }

        let body: String = body.chars().take(MAX_BODY_CHARS).collect();
        let url = format!(
            "{API_BASE}/Accounts/{sid}/Messages.json",
            sid = self.options.account_sid
        );

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("To", recipient);
        form_body.insert("From", &self.options.from_number);
        form_body.insert("Body", &body);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let parsed: Option<ApiErrorBody> = serde_json::from_str(&text).ok();
            tracing::warn!(status = status.as_u16(), recipient, "Twilio rejected message");
            return Err(TwilioError::Api {
                status: status.as_u16(),
                code: parsed.as_ref().and_then(|p| p.code),
                message: parsed.and_then(|p| p.message).unwrap_or(text),
            });
        }

        serde_json::from_str::<MessageResponse>(&text)
            .map_err(|e| TwilioError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_phone_number() {
        assert!(is_phone_number("+60123456789"));
        assert!(is_phone_number("+15551234567"));

        assert!(!is_phone_number("60123456789")); // Missing +
        assert!(!is_phone_number("+123")); // Too short
        assert!(!is_phone_number("+6012-345-6789")); // Separators
        assert!(!is_phone_number("user@example.com"));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_network() {
        let service = TwilioService::new(TwilioOptions {
            account_sid: "AC123".into(),
            auth_token: "token".into(),
            from_number: "+15550000000".into(),
        });
        let err = service.send_sms("not-a-number", "hello").await.unwrap_err();
        assert!(matches!(err, TwilioError::InvalidRecipient(_)));
    }
}
