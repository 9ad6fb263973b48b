//! Geography handlers

use axum::{extract::State, Json};
use shared::{Arrondissement, CommuneWithArrondissements, CropTypeInfo};

use crate::error::AppResult;
use crate::services::{GeographyService, HarvestService};
use crate::AppState;

/// Communes with their arrondissements, used by the signup form
pub async fn list_communes(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CommuneWithArrondissements>>> {
    let service = GeographyService::new(state.db.clone());
    Ok(Json(service.list_communes().await?))
}

pub async fn list_arrondissements(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Arrondissement>>> {
    let service = GeographyService::new(state.db.clone());
    Ok(Json(service.list_arrondissements().await?))
}

pub async fn list_crop_types(State(state): State<AppState>) -> AppResult<Json<Vec<CropTypeInfo>>> {
    let service = HarvestService::new(state.db.clone());
    Ok(Json(service.crop_types().await?))
}
