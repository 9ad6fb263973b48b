//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use shared::Flash;

use crate::error::AppResult;
use crate::services::auth::{AuthTokens, LoginInput, RegisterProducerInput, RegisterResponse};
use crate::services::AuthService;
use crate::AppState;

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.db.clone(), &state.config, state.notifier.clone())
}

/// Producer signup; the new account is logged in immediately
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterProducerInput>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let response = auth_service(&state).register_producer(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<AuthTokens>> {
    Ok(Json(auth_service(&state).login(body).await?))
}

/// Refresh token endpoint handler
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    Ok(Json(auth_service(&state).refresh_token(&body.refresh_token).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<Flash>> {
    auth_service(&state).logout(&body.refresh_token).await?;
    Ok(Json(Flash::success("Vous avez été déconnecté avec succès.")))
}
