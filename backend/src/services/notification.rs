//! Outbound email notifications
//!
//! Mail goes through the [`Mailer`] trait so the transactional provider can be
//! swapped. Delivery is attempted once per message; there are no retries.

use std::sync::Arc;

use serde::Serialize;
use shared::Mailbox;
use thiserror::Error;

/// Failure reported by a mail provider
#[derive(Debug, Error)]
pub enum SendError {
    #[error("no recipient given")]
    NoRecipient,

    #[error("mail provider rejected the message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("mail provider unreachable: {0}")]
    Transport(String),
}

/// Identifier the provider assigned to an accepted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageId(pub String);

/// A message ready to be handed to a provider
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: Vec<Mailbox>,
    pub from: Mailbox,
    pub subject: String,
    pub html_body: String,
}

/// Transactional email provider
#[axum::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<MessageId, SendError>;
}

/// Mailer used when no provider is configured: logs and accepts everything
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[axum::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<MessageId, SendError> {
        if email.to.is_empty() {
            return Err(SendError::NoRecipient);
        }
        let recipients: Vec<String> = email.to.iter().map(ToString::to_string).collect();
        tracing::info!(
            "Email not sent (no provider configured): from={} to={} subject={:?}",
            email.from,
            recipients.join(", "),
            email.subject
        );
        Ok(MessageId(format!("<logged.{}@localhost>", uuid::Uuid::new_v4())))
    }
}

/// Notification service for sending transactional email
#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    default_from: Mailbox,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(mailer: Arc<dyn Mailer>, default_from: Mailbox) -> Self {
        Self {
            mailer,
            default_from,
        }
    }

    /// Send each message once and return how many the provider accepted.
    ///
    /// A failure is logged. With `fail_silently` it counts as zero sent and the
    /// remaining messages are still attempted; without it the error is returned
    /// immediately.
    pub async fn send_messages(
        &self,
        messages: &[OutgoingEmail],
        fail_silently: bool,
    ) -> Result<usize, SendError> {
        let mut sent = 0;

        for message in messages {
            match self.mailer.send(message).await {
                Ok(message_id) => {
                    tracing::info!(
                        "Email {:?} accepted by provider: {}",
                        message.subject,
                        message_id.0
                    );
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!("Email {:?} not delivered: {}", message.subject, e);
                    if !fail_silently {
                        return Err(e);
                    }
                }
            }
        }

        Ok(sent)
    }

    /// Build a message from the default sender
    pub fn compose(&self, to: Vec<Mailbox>, subject: &str, html_body: String) -> OutgoingEmail {
        OutgoingEmail {
            to,
            from: self.default_from.clone(),
            subject: subject.to_string(),
            html_body,
        }
    }

    /// Welcome message sent after a producer signs up
    pub fn welcome_email(&self, to: Mailbox, first_name: &str, app_name: &str) -> OutgoingEmail {
        let body = format!(
            "<p>Bonjour {},</p>\
             <p>Votre compte producteur a été créé avec succès sur {}.</p>\
             <p>Vous pouvez dès maintenant enregistrer vos parcelles et vos récoltes.</p>",
            escape_html(first_name),
            escape_html(app_name)
        );
        self.compose(vec![to], &format!("Bienvenue sur {}", app_name), body)
    }

    /// Staff notification for a new contact form submission
    pub fn contact_notification(
        &self,
        staff_inbox: Mailbox,
        contact: &shared::Contact,
    ) -> OutgoingEmail {
        let body = format!(
            "<p>Nouveau message de contact reçu.</p>\
             <ul><li>Nom : {}</li><li>Email : {}</li><li>Téléphone : {}</li></ul>\
             <p><strong>{}</strong></p><p>{}</p>",
            escape_html(&contact.name),
            escape_html(&contact.email),
            escape_html(&contact.phone),
            escape_html(&contact.subject),
            escape_html(&contact.message).replace('\n', "<br>")
        );
        self.compose(
            vec![staff_inbox],
            &format!("[Contact] {}", contact.subject),
            body,
        )
    }
}

/// Escape text for inclusion in an HTML body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Accepts messages whose subject does not start with "fail"
    struct ScriptedMailer {
        attempts: AtomicUsize,
    }

    #[axum::async_trait]
    impl Mailer for ScriptedMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<MessageId, SendError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if email.subject.starts_with("fail") {
                Err(SendError::Rejected {
                    status: 400,
                    message: "invalid sender".to_string(),
                })
            } else {
                Ok(MessageId("<1@brevo>".to_string()))
            }
        }
    }

    fn service() -> (NotificationService, Arc<ScriptedMailer>) {
        let mailer = Arc::new(ScriptedMailer {
            attempts: AtomicUsize::new(0),
        });
        let service = NotificationService::new(
            mailer.clone(),
            Mailbox::parse("AgriTech-Bénin <noreply@agritech.bj>").unwrap(),
        );
        (service, mailer)
    }

    fn message(service: &NotificationService, subject: &str) -> OutgoingEmail {
        service.compose(
            vec![Mailbox::new("a@agritech.bj")],
            subject,
            "<p>test</p>".to_string(),
        )
    }

    #[test]
    fn test_silent_failures_count_as_zero() {
        let (service, mailer) = service();
        let messages = vec![
            message(&service, "ok 1"),
            message(&service, "fail"),
            message(&service, "ok 2"),
        ];

        let sent = tokio_test::block_on(service.send_messages(&messages, true)).unwrap();
        assert_eq!(sent, 2);
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_loud_failure_is_returned() {
        let (service, mailer) = service();
        let messages = vec![message(&service, "fail"), message(&service, "ok")];

        let result = tokio_test::block_on(service.send_messages(&messages, false));
        assert!(matches!(result, Err(SendError::Rejected { status: 400, .. })));
        assert_eq!(mailer.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_batch_sends_nothing() {
        let (service, _) = service();
        assert_eq!(tokio_test::block_on(service.send_messages(&[], false)).unwrap(), 0);
    }

    #[test]
    fn test_log_mailer_requires_recipient() {
        let email = OutgoingEmail {
            to: vec![],
            from: Mailbox::new("noreply@agritech.bj"),
            subject: "x".to_string(),
            html_body: String::new(),
        };
        assert!(matches!(
            tokio_test::block_on(LogMailer.send(&email)),
            Err(SendError::NoRecipient)
        ));
    }

    #[test]
    fn test_contact_notification_escapes_input() {
        let (service, _) = service();
        let contact = shared::Contact {
            id: uuid::Uuid::nil(),
            name: "<script>".to_string(),
            email: "a@agritech.bj".to_string(),
            phone: String::new(),
            subject: "Prix du maïs".to_string(),
            message: "Bonjour\nMerci".to_string(),
            submitted_at: chrono::Utc::now(),
            processed: false,
        };
        let email = service.contact_notification(Mailbox::new("staff@agritech.bj"), &contact);
        assert_eq!(email.subject, "[Contact] Prix du maïs");
        assert!(email.html_body.contains("&lt;script&gt;"));
        assert!(email.html_body.contains("Bonjour<br>Merci"));
    }
}
