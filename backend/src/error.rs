//! Error handling for the AgriTech-Benin platform
//!
//! Provides consistent error responses in English and French. Access denials
//! and refused stock exits are not errors for the user: they become a
//! `303 See Other` carrying a flash message, the way the web pages behave.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{Flash, StockError};
use thiserror::Error;
use validator::ValidationErrors;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        message_fr: String,
    },

    // Authorization failures answered with a redirect
    #[error("Access denied: {message}")]
    AccessDenied {
        message: String,
        redirect_to: String,
    },

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_fr: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_fr: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: {source}")]
    InsufficientStock {
        source: StockError,
        redirect_to: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Access denial redirecting to `redirect_to` with a French flash message
    pub fn access_denied(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        AppError::AccessDenied {
            message: message.into(),
            redirect_to: redirect_to.into(),
        }
    }

    pub fn validation(
        field: impl Into<String>,
        message: impl Into<String>,
        message_fr: impl Into<String>,
    ) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
            message_fr: message_fr.into(),
        }
    }

    /// Status, and the redirect target when the error is answered with one
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied { .. } | AppError::InsufficientStock { .. } => {
                StatusCode::SEE_OTHER
            }
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::DuplicateEntry(_) | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_)
            | AppError::DatabaseError(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by_key(|(field, _)| *field);

        match fields.first() {
            Some((field, errs)) => {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                AppError::Validation {
                    field: field.to_string(),
                    message_fr: format!("Champ invalide : {}", field),
                    message,
                }
            }
            None => AppError::validation("form", "Invalid form", "Formulaire invalide"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_fr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Body sent with a redirect
#[derive(Serialize)]
pub struct RedirectResponse {
    pub flash: Flash,
    pub redirect_to: String,
}

fn detail(code: &str, message_en: impl Into<String>, message_fr: impl Into<String>) -> ErrorDetail {
    ErrorDetail {
        code: code.to_string(),
        message_en: message_en.into(),
        message_fr: message_fr.into(),
        field: None,
    }
}

/// Build a `303 See Other` with a flash message
pub fn redirect_with_flash(location: &str, flash: Flash) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.to_string())],
        Json(RedirectResponse {
            flash,
            redirect_to: location.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error_detail = match &self {
            AppError::AccessDenied {
                message,
                redirect_to,
            } => {
                tracing::warn!("Access denied, redirecting to {}: {}", redirect_to, message);
                return redirect_with_flash(redirect_to, Flash::error(message.clone()));
            }
            AppError::InsufficientStock { source, redirect_to } => {
                tracing::warn!("Stock movement refused: {}", source);
                return redirect_with_flash(
                    redirect_to,
                    Flash::error("Quantité insuffisante en stock!"),
                );
            }
            AppError::InvalidCredentials => detail(
                "INVALID_CREDENTIALS",
                "Invalid username or password",
                "Nom d'utilisateur ou mot de passe incorrect",
            ),
            AppError::TokenExpired => {
                detail("TOKEN_EXPIRED", "Token has expired", "Le jeton a expiré")
            }
            AppError::InvalidToken => detail("INVALID_TOKEN", "Invalid token", "Jeton invalide"),
            AppError::Unauthorized {
                message,
                message_fr,
            } => detail("UNAUTHORIZED", message.clone(), message_fr.clone()),
            AppError::Validation {
                field,
                message,
                message_fr,
            } => ErrorDetail {
                field: Some(field.clone()),
                ..detail("VALIDATION_ERROR", message.clone(), message_fr.clone())
            },
            AppError::DuplicateEntry(field) => ErrorDetail {
                field: Some(field.clone()),
                ..detail(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                    format!("Ce {} est déjà utilisé", field),
                )
            },
            AppError::Conflict {
                resource,
                message,
                message_fr,
            } => ErrorDetail {
                field: Some(resource.clone()),
                ..detail("CONFLICT", message.clone(), message_fr.clone())
            },
            AppError::NotFound(resource) => detail(
                "NOT_FOUND",
                format!("{} not found", resource),
                format!("{} introuvable", resource),
            ),
            AppError::Configuration(msg) => detail(
                "CONFIGURATION_ERROR",
                format!("Configuration error: {}", msg),
                "Erreur de configuration",
            ),
            AppError::DatabaseError(_) => detail(
                "DATABASE_ERROR",
                "A database error occurred",
                "Une erreur de base de données est survenue",
            ),
            AppError::Internal(msg) => detail(
                "INTERNAL_ERROR",
                msg.clone(),
                "Erreur interne du serveur",
            ),
            AppError::InternalError(_) => detail(
                "INTERNAL_ERROR",
                "An internal server error occurred",
                "Erreur interne du serveur",
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use validator::Validate;

    #[test]
    fn test_access_denied_is_a_redirect() {
        let response = AppError::access_denied("Vous n'avez pas accès à cet entrepôt.", "/warehouses")
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/warehouses"
        );
    }

    #[test]
    fn test_insufficient_stock_is_a_redirect() {
        let error = AppError::InsufficientStock {
            source: StockError::Insufficient {
                available: Decimal::from(10),
                requested: Decimal::from(20),
            },
            redirect_to: "/warehouses/1".to_string(),
        };
        assert_eq!(error.into_response().status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("Stock".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::DuplicateEntry("email".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::validation("quantity_kg", "bad", "mauvais").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_validation_errors_keep_field() {
        let errors = Form {
            name: String::new(),
        }
        .validate()
        .unwrap_err();

        match AppError::from(errors) {
            AppError::Validation { field, message, .. } => {
                assert_eq!(field, "name");
                assert_eq!(message, "Name is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
