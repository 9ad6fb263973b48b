//! Configuration management for the AgriTech-Benin platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides such as `AGRI__DATABASE__URL`

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Application identity
    pub app: AppConfig,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Transactional email configuration
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Name reported by the liveness endpoint and used in emails
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens and hashing refresh tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// Brevo API key; mail is only logged when absent
    pub brevo_api_key: Option<String>,

    /// Brevo REST API base URL
    pub brevo_base_url: String,

    /// Default sender, either `addr` or `Name <addr>`
    pub default_from: String,

    /// Display name used when the sender header carries none
    pub sender_name: String,

    /// Inbox notified of new contact form submissions
    pub staff_inbox: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("app.name", "AgriTech-Benin")?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 1_209_600)?
            .set_default("email.brevo_base_url", "https://api.brevo.com/v3")?
            .set_default("email.default_from", "AgriTech-Bénin <noreply@agritech.bj>")?
            .set_default("email.sender_name", "AgriTech-Bénin")?
            .set_default("email.staff_inbox", "contact@agritech.bj")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI__SECTION__KEY)
            .add_source(
                Environment::with_prefix("AGRI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        std::env::set_var("AGRI__DATABASE__URL", "postgres://localhost/agritech_test");
        std::env::set_var("AGRI__JWT__SECRET", "test-secret");

        let config = Config::load().unwrap();
        assert_eq!(config.app.name, "AgriTech-Benin");
        assert_eq!(config.database.url, "postgres://localhost/agritech_test");
        assert_eq!(config.email.brevo_base_url, "https://api.brevo.com/v3");
        assert!(config.email.brevo_api_key.is_none());
        assert_eq!(config.server.port, 8000);
        assert!(config.is_development());
    }
}
