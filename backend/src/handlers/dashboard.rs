//! Dashboard and public statistics handlers

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::dashboard::{Dashboard, PublicStats};
use crate::services::DashboardService;
use crate::AppState;

/// Role-dependent dashboard; the `view` field tells which variant was built
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Dashboard>> {
    let service = DashboardService::new(state.db.clone());
    Ok(Json(service.dashboard(&session).await?))
}

pub async fn public_stats(State(state): State<AppState>) -> AppResult<Json<PublicStats>> {
    let service = DashboardService::new(state.db.clone());
    Ok(Json(service.public_stats().await?))
}
