//! Authentication service for producer signup, login, and token management

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use shared::{Flash, Group, Mailbox};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use crate::services::notification::NotificationService;

type HmacSha256 = Hmac<Sha256>;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    notifier: NotificationService,
    app_name: String,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Producer signup form
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProducerInput {
    #[validate(custom = "shared::username_rule")]
    pub username: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(custom = "shared::password_rule")]
    pub password: String,
    pub password_confirm: String,
    #[validate(custom = "shared::required_rule")]
    pub first_name: String,
    #[validate(custom = "shared::required_rule")]
    pub last_name: String,
    #[validate(custom = "shared::phone_rule")]
    pub phone: String,
    #[validate(required(message = "Arrondissement is required"))]
    pub arrondissement_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Response after a successful signup; the new producer is logged in
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub flash: Flash,
    pub user_id: Uuid,
    pub producer_id: Uuid,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Account as listed for super-admins
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub groups: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    is_superuser: bool,
    is_active: bool,
}

impl UserRow {
    fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config, notifier: NotificationService) -> Self {
        Self {
            db,
            notifier,
            app_name: config.app.name.clone(),
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Create the account, its producer profile and group membership, then log in
    pub async fn register_producer(
        &self,
        input: RegisterProducerInput,
    ) -> AppResult<RegisterResponse> {
        input.validate()?;

        if input.password != input.password_confirm {
            return Err(AppError::validation(
                "password_confirm",
                "The two password fields didn't match",
                "Les deux mots de passe ne correspondent pas",
            ));
        }

        let username_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(&input.username)
        .fetch_one(&self.db)
        .await?;

        if username_taken {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }

        let email_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
        )
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if email_taken {
            return Err(AppError::DuplicateEntry("email".to_string()));
        }

        if let Some(arrondissement_id) = input.arrondissement_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM arrondissements WHERE id = $1)",
            )
            .bind(arrondissement_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::validation(
                    "arrondissement_id",
                    "Unknown arrondissement",
                    "Arrondissement inconnu",
                ));
            }
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let mut tx = self.db.begin().await?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&input.username)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .fetch_one(&mut *tx)
        .await?;

        let producer_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO producers (user_id, last_name, first_name, phone, email, arrondissement_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(input.last_name.trim())
        .bind(input.first_name.trim())
        .bind(input.phone.trim())
        .bind(&input.email)
        .bind(input.arrondissement_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_groups (user_id, group_name) VALUES ($1, $2)")
            .bind(user_id)
            .bind(Group::Producers.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Producer {} registered (user {})", producer_id, user_id);

        let full_name = format!("{} {}", input.first_name.trim(), input.last_name.trim());
        let tokens = self.issue_tokens(user_id, &input.username, &full_name, false).await?;

        let welcome = self.notifier.welcome_email(
            Mailbox::new(input.email.clone()).with_name(full_name.clone()),
            input.first_name.trim(),
            &self.app_name,
        );
        // Signup succeeds even when the provider is down
        let _ = self.notifier.send_messages(&[welcome], true).await;

        Ok(RegisterResponse {
            flash: Flash::success(format!(
                "Bienvenue {} ! Votre compte a été créé avec succès.",
                input.first_name.trim()
            )),
            user_id,
            producer_id,
            tokens,
        })
    }

    /// Authenticate with username and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, first_name, last_name, is_superuser, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(input.username.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_fr: "Ce compte est désactivé".to_string(),
            });
        }

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        self.issue_tokens(user.id, &user.username, &user.full_name(), user.is_superuser)
            .await
    }

    /// Exchange a refresh token for a new pair; the old one is revoked
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = self.hash_token(refresh_token)?;

        let mut tx = self.db.begin().await?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.password_hash, u.first_name, u.last_name,
                   u.is_superuser, u.is_active
            FROM refresh_tokens rt
            JOIN users u ON u.id = rt.user_id
            WHERE rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            FOR UPDATE OF rt
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_fr: "Jeton de rafraîchissement invalide ou expiré".to_string(),
        })?;

        sqlx::query("UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.issue_tokens(user.id, &user.username, &user.full_name(), user.is_superuser)
            .await
    }

    /// Revoke a refresh token. Unknown tokens are ignored.
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let token_hash = self.hash_token(refresh_token)?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE token_hash = $1 AND revoked_at IS NULL",
        )
        .bind(&token_hash)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Put a user in a role group; adding an existing membership is a no-op
    pub async fn add_to_group(&self, user_id: Uuid, group: Group) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("User".to_string()));
        }

        sqlx::query(
            "INSERT INTO user_groups (user_id, group_name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(group.as_str())
        .execute(&self.db)
        .await?;

        tracing::info!("User {} added to group {}", user_id, group.as_str());
        Ok(())
    }

    pub async fn list_users(&self) -> AppResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name,
                   u.is_superuser, u.is_active,
                   COALESCE(ARRAY_AGG(g.group_name ORDER BY g.group_name)
                            FILTER (WHERE g.group_name IS NOT NULL), '{}')::TEXT[] AS groups,
                   u.created_at
            FROM users u
            LEFT JOIN user_groups g ON g.user_id = u.id
            GROUP BY u.id
            ORDER BY u.username
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    /// Sign an access token and store a fresh refresh token
    async fn issue_tokens(
        &self,
        user_id: Uuid,
        username: &str,
        full_name: &str,
        is_superuser: bool,
    ) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let access_claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            is_superuser,
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        let refresh_token = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        );
        let expires_at = now + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(self.hash_token(&refresh_token)?)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Keyed hash of a refresh token, the only form stored
    fn hash_token(&self, token: &str) -> AppResult<String> {
        hash_refresh_token(&self.jwt_secret, token)
    }
}

fn hash_refresh_token(secret: &str, token: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Configuration(format!("Invalid JWT secret: {}", e)))?;
    mac.update(token.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup() -> RegisterProducerInput {
        RegisterProducerInput {
            username: "kadjo".to_string(),
            email: "koffi@agritech.bj".to_string(),
            password: "mais-2024".to_string(),
            password_confirm: "mais-2024".to_string(),
            first_name: "Koffi".to_string(),
            last_name: "Adjo".to_string(),
            phone: "+229 97 12 34 56".to_string(),
            arrondissement_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn test_refresh_token_hash_is_keyed() {
        let a = hash_refresh_token("secret-a", "token").unwrap();
        let b = hash_refresh_token("secret-b", "token").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, hash_refresh_token("secret-a", "token").unwrap());
        assert!(!a.contains('='));
    }

    #[test]
    fn test_signup_form_accepts_valid_input() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn test_signup_form_rejects_bad_phone_and_email() {
        let mut input = signup();
        input.phone = "12".to_string();
        input.email = "not-an-email".to_string();

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("email"));
    }

    #[test]
    fn test_signup_form_requires_arrondissement() {
        let mut input = signup();
        input.arrondissement_id = None;

        match AppError::from(input.validate().unwrap_err()) {
            AppError::Validation { field, message, .. } => {
                assert_eq!(field, "arrondissement_id");
                assert_eq!(message, "Arrondissement is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_signup_form_requires_names() {
        let mut input = signup();
        input.last_name = "   ".to_string();

        match AppError::from(input.validate().unwrap_err()) {
            AppError::Validation { field, .. } => assert_eq!(field, "last_name"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
