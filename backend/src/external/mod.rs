//! External API integrations

pub mod brevo;

pub use brevo::BrevoMailer;
