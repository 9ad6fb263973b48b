//! Brevo (ex-Sendinblue) transactional email client
//!
//! API Documentation: https://developers.brevo.com/reference/sendtransacemail

use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::Mailbox;

use crate::services::notification::{Mailer, MessageId, OutgoingEmail, SendError};

/// Brevo API client
#[derive(Clone)]
pub struct BrevoMailer {
    client: Client,
    api_key: String,
    base_url: String,
    sender_name: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct BrevoContact {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmail {
    sender: BrevoContact,
    to: Vec<BrevoContact>,
    subject: String,
    html_content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmailResponse {
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrevoErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

impl BrevoMailer {
    /// Create a new BrevoMailer against `base_url`, e.g. `https://api.brevo.com/v3`
    pub fn with_base_url(api_key: String, sender_name: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            sender_name,
        }
    }

    fn build_payload(&self, email: &OutgoingEmail) -> SendSmtpEmail {
        let sender = BrevoContact {
            email: email.from.email.clone(),
            name: Some(
                email
                    .from
                    .name
                    .clone()
                    .unwrap_or_else(|| self.sender_name.clone()),
            ),
        };

        SendSmtpEmail {
            sender,
            to: email.to.iter().map(contact).collect(),
            subject: email.subject.clone(),
            html_content: email.html_body.clone(),
        }
    }
}

fn contact(mailbox: &Mailbox) -> BrevoContact {
    BrevoContact {
        email: mailbox.email.clone(),
        name: mailbox.name.clone(),
    }
}

#[axum::async_trait]
impl Mailer for BrevoMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<MessageId, SendError> {
        if email.to.is_empty() {
            return Err(SendError::NoRecipient);
        }

        let response = self
            .client
            .post(format!("{}/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&self.build_payload(email))
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error: BrevoErrorResponse = response
                .json()
                .await
                .unwrap_or(BrevoErrorResponse { message: None });
            return Err(SendError::Rejected {
                status: status.as_u16(),
                message: error.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let body: SendSmtpEmailResponse = response
            .json()
            .await
            .map_err(|e| SendError::Transport(format!("Failed to parse Brevo response: {}", e)))?;

        Ok(MessageId(body.message_id.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mailer() -> BrevoMailer {
        BrevoMailer::with_base_url(
            "xkeysib-test".to_string(),
            "AgriTech-Bénin".to_string(),
            "http://localhost:9/v3/".to_string(),
        )
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(mailer().base_url, "http://localhost:9/v3");
    }

    #[test]
    fn test_payload_uses_default_sender_name() {
        let email = OutgoingEmail {
            to: vec![Mailbox::parse("Koffi Adjo <koffi@agritech.bj>").unwrap()],
            from: Mailbox::new("noreply@agritech.bj"),
            subject: "Bienvenue".to_string(),
            html_body: "<p>Bonjour</p>".to_string(),
        };

        let payload = serde_json::to_value(mailer().build_payload(&email)).unwrap();
        assert_eq!(payload["sender"]["name"], "AgriTech-Bénin");
        assert_eq!(payload["sender"]["email"], "noreply@agritech.bj");
        assert_eq!(payload["to"][0]["name"], "Koffi Adjo");
        assert_eq!(payload["htmlContent"], "<p>Bonjour</p>");
    }

    #[test]
    fn test_payload_omits_missing_recipient_name() {
        let email = OutgoingEmail {
            to: vec![Mailbox::new("contact@agritech.bj")],
            from: Mailbox::parse("Support <support@agritech.bj>").unwrap(),
            subject: "Test".to_string(),
            html_body: String::new(),
        };

        let payload = serde_json::to_value(mailer().build_payload(&email)).unwrap();
        assert_eq!(payload["sender"]["name"], "Support");
        assert!(payload["to"][0].get("name").is_none());
    }
}
