//! Public contact form

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::services::contact::{ContactInput, ContactReceived};
use crate::services::ContactService;
use crate::AppState;

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(input): Json<ContactInput>,
) -> AppResult<(StatusCode, Json<ContactReceived>)> {
    let service = ContactService::new(state.db.clone(), &state.config, state.notifier.clone());
    let received = service.submit(input).await?;
    Ok((StatusCode::CREATED, Json(received)))
}
