//! Administration handlers, all restricted to super-admins

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use shared::{Arrondissement, Commune, Contact, Flash, Group};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentSession;
use crate::services::auth::UserSummary;
use crate::services::geography::{CreateArrondissementInput, CreateCommuneInput};
use crate::services::stock::{
    AssignManagerInput, CreateStockInput, CreateWarehouseInput, StockView, WarehouseSummary,
};
use crate::services::{
    require_superuser, AuthService, ContactService, ExportService, GeographyService, StockService,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddGroupRequest {
    pub group: Group,
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Vec<UserSummary>>> {
    require_superuser(&session)?;
    let service = AuthService::new(state.db.clone(), &state.config, state.notifier.clone());
    Ok(Json(service.list_users().await?))
}

pub async fn add_user_to_group(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AddGroupRequest>,
) -> AppResult<Json<Flash>> {
    require_superuser(&session)?;
    let service = AuthService::new(state.db.clone(), &state.config, state.notifier.clone());
    service.add_to_group(user_id, body.group).await?;
    Ok(Json(Flash::success(format!(
        "Utilisateur ajouté au groupe {}.",
        body.group.as_str()
    ))))
}

pub async fn create_commune(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<CreateCommuneInput>,
) -> AppResult<(StatusCode, Json<Commune>)> {
    require_superuser(&session)?;
    let service = GeographyService::new(state.db.clone());
    Ok((StatusCode::CREATED, Json(service.create_commune(input).await?)))
}

pub async fn create_arrondissement(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<CreateArrondissementInput>,
) -> AppResult<(StatusCode, Json<Arrondissement>)> {
    require_superuser(&session)?;
    let service = GeographyService::new(state.db.clone());
    Ok((
        StatusCode::CREATED,
        Json(service.create_arrondissement(input).await?),
    ))
}

pub async fn create_warehouse(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(input): Json<CreateWarehouseInput>,
) -> AppResult<(StatusCode, Json<WarehouseSummary>)> {
    let service = StockService::new(state.db.clone());
    let warehouse = service.create_warehouse(&session, input).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn assign_manager(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(warehouse_id): Path<Uuid>,
    Json(input): Json<AssignManagerInput>,
) -> AppResult<Json<WarehouseSummary>> {
    let service = StockService::new(state.db.clone());
    Ok(Json(
        service.assign_manager(&session, warehouse_id, input).await?,
    ))
}

pub async fn create_stock(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(warehouse_id): Path<Uuid>,
    Json(input): Json<CreateStockInput>,
) -> AppResult<(StatusCode, Json<StockView>)> {
    let service = StockService::new(state.db.clone());
    let stock = service.create_stock(&session, warehouse_id, input).await?;
    Ok((StatusCode::CREATED, Json(stock)))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Vec<Contact>>> {
    let service = ContactService::new(state.db.clone(), &state.config, state.notifier.clone());
    Ok(Json(service.list(&session).await?))
}

pub async fn mark_contact_processed(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(contact_id): Path<Uuid>,
) -> AppResult<Json<Contact>> {
    let service = ContactService::new(state.db.clone(), &state.config, state.notifier.clone());
    Ok(Json(service.mark_processed(&session, contact_id).await?))
}

/// Whole database as a JSON attachment
pub async fn export_data(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<impl IntoResponse> {
    let service = ExportService::new(state.db.clone());
    let document = service.export_all(&session).await?;
    let bytes = document
        .to_bytes()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let filename = format!(
        "attachment; filename=\"agritech-export-{}.json\"",
        document.exported_at.format("%Y%m%d-%H%M%S")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        bytes,
    ))
}
