//! Email address header parsing
//!
//! Splits `Display Name <user@example.com>` into its parts so the address
//! and the name can be sent separately to a transactional mail API.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("empty address")]
    Empty,

    #[error("malformed address header: {0}")]
    Malformed(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// An address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

impl Mailbox {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Parse either `addr` or `Name <addr>`
    pub fn parse(header: &str) -> Result<Self, MailboxError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(MailboxError::Empty);
        }

        let (name, email) = match header.rfind('<') {
            Some(open) => {
                let rest = &header[open + 1..];
                let close = rest
                    .find('>')
                    .ok_or_else(|| MailboxError::Malformed(header.to_string()))?;
                if !rest[close + 1..].trim().is_empty() {
                    return Err(MailboxError::Malformed(header.to_string()));
                }
                let name = header[..open].trim().trim_matches('"').trim();
                let name = (!name.is_empty()).then(|| name.to_string());
                (name, rest[..close].trim())
            }
            None if header.contains('>') => {
                return Err(MailboxError::Malformed(header.to_string()));
            }
            None => (None, header),
        };

        crate::validation::validate_email(email)
            .map_err(|_| MailboxError::InvalidAddress(email.to_string()))?;

        Ok(Self {
            name,
            email: email.to_string(),
        })
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.email),
            None => f.write_str(&self.email),
        }
    }
}

impl std::str::FromStr for Mailbox {
    type Err = MailboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mailbox::parse(s)
    }
}
