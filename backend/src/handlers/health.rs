//! Liveness and health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub message: String,
    pub service: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Lightweight liveness endpoint for uptime monitors
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    Json(ping_response(&state.config.app.name))
}

pub fn ping_response(app_name: &str) -> PingResponse {
    PingResponse {
        status: "ok",
        message: format!("{} is alive", app_name),
        service: "running",
    }
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::warn!("Health check could not reach the database: {}", e);
            "disconnected".to_string()
        }
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_payload() {
        let json = serde_json::to_value(ping_response("AgriTech-Benin")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "ok",
                "message": "AgriTech-Benin is alive",
                "service": "running"
            })
        );
    }
}
