//! Warehouse, stock and movement handlers

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::error::{redirect_with_flash, AppResult};
use crate::middleware::CurrentSession;
use crate::services::stock::{
    MovementHistory, RecordMovementInput, StockList, StockQuery, WarehouseDetail, WarehouseList,
    WarehouseQuery,
};
use crate::services::StockService;
use crate::AppState;

pub async fn list_warehouses(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<WarehouseQuery>,
) -> AppResult<Json<WarehouseList>> {
    let service = StockService::new(state.db.clone());
    Ok(Json(service.list_warehouses(&session, query).await?))
}

pub async fn get_warehouse(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(warehouse_id): Path<Uuid>,
) -> AppResult<Json<WarehouseDetail>> {
    let service = StockService::new(state.db.clone());
    Ok(Json(service.warehouse_detail(&session, warehouse_id).await?))
}

/// Stocks in scope, filtered by `crop_type` and `alert`
pub async fn list_stocks(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<StockQuery>,
) -> AppResult<Json<StockList>> {
    let service = StockService::new(state.db.clone());
    Ok(Json(service.list_stocks(&session, query).await?))
}

/// Record an entry or exit, then send the caller back to the warehouse page
pub async fn record_movement(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(stock_id): Path<Uuid>,
    Json(input): Json<RecordMovementInput>,
) -> AppResult<Response> {
    let service = StockService::new(state.db.clone());
    let recorded = service.record_movement(&session, stock_id, input).await?;
    Ok(redirect_with_flash(&recorded.redirect_to, recorded.flash))
}

pub async fn movement_history(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(stock_id): Path<Uuid>,
) -> AppResult<Json<MovementHistory>> {
    let service = StockService::new(state.db.clone());
    Ok(Json(service.movement_history(&session, stock_id).await?))
}
