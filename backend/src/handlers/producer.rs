//! Profile and parcel handlers

use axum::{extract::State, http::StatusCode, Json};
use shared::Parcel;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::producer::{CreateParcelInput, ProfileView};
use crate::services::ProducerService;
use crate::AppState;

pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<ProfileView>> {
    let service = ProducerService::new(state.db.clone());
    Ok(Json(service.profile(&session).await?))
}

pub async fn list_parcels(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Vec<Parcel>>> {
    let service = ProducerService::new(state.db.clone());
    Ok(Json(service.list_parcels(&session).await?))
}

pub async fn create_parcel(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<CreateParcelInput>,
) -> AppResult<(StatusCode, Json<Parcel>)> {
    let service = ProducerService::new(state.db.clone());
    let parcel = service.create_parcel(&session, input).await?;
    Ok((StatusCode::CREATED, Json(parcel)))
}
