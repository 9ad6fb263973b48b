//! Contact form intake

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Contact, Flash, Mailbox, Session};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::notification::NotificationService;
use crate::services::require_superuser;

#[derive(Clone)]
pub struct ContactService {
    db: PgPool,
    notifier: NotificationService,
    staff_inbox: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContactInput {
    #[serde(default)]
    #[validate(custom = "shared::required_rule")]
    pub name: String,
    #[serde(default)]
    #[validate(custom = "shared::required_rule")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(custom = "shared::required_rule")]
    pub subject: String,
    #[serde(default)]
    #[validate(custom = "shared::required_rule")]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactReceived {
    pub flash: Flash,
    pub contact: Contact,
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    subject: String,
    message: String,
    submitted_at: DateTime<Utc>,
    processed: bool,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            subject: row.subject,
            message: row.message,
            submitted_at: row.submitted_at,
            processed: row.processed,
        }
    }
}

const CONTACT_COLUMNS: &str = "id, name, email, phone, subject, message, submitted_at, processed";

impl ContactService {
    pub fn new(db: PgPool, config: &Config, notifier: NotificationService) -> Self {
        Self {
            db,
            notifier,
            staff_inbox: config.email.staff_inbox.clone(),
        }
    }

    /// Store a message from the public form and notify the staff inbox
    pub async fn submit(&self, input: ContactInput) -> AppResult<ContactReceived> {
        if input.validate().is_err() {
            return Err(AppError::validation(
                "form",
                "Please fill in all required fields",
                "Veuillez remplir tous les champs obligatoires.",
            ));
        }

        let row = sqlx::query_as::<_, ContactRow>(&format!(
            r#"
            INSERT INTO contacts (name, email, phone, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            CONTACT_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(input.email.trim())
        .bind(input.phone.as_deref().map(str::trim).unwrap_or_default())
        .bind(input.subject.trim())
        .bind(input.message.trim())
        .fetch_one(&self.db)
        .await?;

        let contact = Contact::from(row);
        tracing::info!("Contact message received: {}", contact);

        match Mailbox::parse(&self.staff_inbox) {
            Ok(inbox) => {
                let email = self.notifier.contact_notification(inbox, &contact);
                let _ = self.notifier.send_messages(&[email], true).await;
            }
            Err(e) => tracing::warn!("Staff inbox {:?} is not a valid address: {}", self.staff_inbox, e),
        }

        Ok(ContactReceived {
            flash: Flash::success(
                "Votre message a été envoyé avec succès ! Nous vous répondrons dans les plus brefs délais.",
            ),
            contact,
        })
    }

    pub async fn list(&self, session: &Session) -> AppResult<Vec<Contact>> {
        require_superuser(session)?;

        let rows = sqlx::query_as::<_, ContactRow>(&format!(
            "SELECT {} FROM contacts ORDER BY submitted_at DESC",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }

    /// Flag a message as handled, the only change a message accepts
    pub async fn mark_processed(&self, session: &Session, id: Uuid) -> AppResult<Contact> {
        require_superuser(session)?;

        let row = sqlx::query_as::<_, ContactRow>(&format!(
            "UPDATE contacts SET processed = true WHERE id = $1 RETURNING {}",
            CONTACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Contact".to_string()))?;

        Ok(row.into())
    }
}
