//! Harvest HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentSession;
use crate::services::harvest::{HarvestList, HarvestQuery, HarvestView, RecordHarvestInput};
use crate::services::HarvestService;
use crate::AppState;

/// List harvests, with optional `search` and `crop_type` filters
pub async fn list_harvests(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<HarvestQuery>,
) -> AppResult<Json<HarvestList>> {
    let service = HarvestService::new(state.db.clone());
    Ok(Json(service.list(&session, query).await?))
}

/// Record a new harvest
pub async fn record_harvest(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<RecordHarvestInput>,
) -> AppResult<(StatusCode, Json<HarvestView>)> {
    let service = HarvestService::new(state.db.clone());
    let harvest = service.record(&session, input).await?;
    Ok((StatusCode::CREATED, Json(harvest)))
}

pub async fn get_harvest(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(harvest_id): Path<Uuid>,
) -> AppResult<Json<HarvestView>> {
    let service = HarvestService::new(state.db.clone());
    Ok(Json(service.detail(&session, harvest_id).await?))
}

/// All harvests as a CSV download
pub async fn export_harvests(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<impl IntoResponse> {
    let service = HarvestService::new(state.db.clone());
    let csv = service.export_csv(&session).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"harvests.csv\"",
            ),
        ],
        csv,
    ))
}
