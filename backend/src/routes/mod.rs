//! Route definitions for the AgriTech-Benin platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Locations used as redirect targets by access and stock errors
pub mod paths {
    use uuid::Uuid;

    pub const DASHBOARD: &str = "/api/v1/dashboard";
    pub const PROFILE: &str = "/api/v1/profile";
    pub const HARVESTS: &str = "/api/v1/harvests";
    pub const WAREHOUSES: &str = "/api/v1/warehouses";

    pub fn warehouse(id: Uuid) -> String {
        format!("{}/{}", WAREHOUSES, id)
    }
}

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/profile", get(handlers::profile))
        .route(
            "/parcels",
            get(handlers::list_parcels).post(handlers::create_parcel),
        )
        .route("/dashboard", get(handlers::get_dashboard))
        .nest("/harvests", harvest_routes())
        .nest("/warehouses", warehouse_routes())
        .nest("/stocks", stock_routes())
        .nest("/admin", admin_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Reference data and public pages
        .nest("/geography", geography_routes())
        .route("/crop-types", get(handlers::list_crop_types))
        .route("/contact", post(handlers::submit_contact))
        .route("/public/stats", get(handlers::public_stats))
        .merge(protected)
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
}

fn geography_routes() -> Router<AppState> {
    Router::new()
        .route("/communes", get(handlers::list_communes))
        .route("/arrondissements", get(handlers::list_arrondissements))
}

/// Harvest routes (protected)
fn harvest_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_harvests).post(handlers::record_harvest),
        )
        .route("/export", get(handlers::export_harvests))
        .route("/:harvest_id", get(handlers::get_harvest))
}

/// Warehouse routes (protected)
fn warehouse_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_warehouses))
        .route("/:warehouse_id", get(handlers::get_warehouse))
}

/// Stock and movement routes (protected)
fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_stocks))
        .route(
            "/:stock_id/movements",
            get(handlers::movement_history).post(handlers::record_movement),
        )
}

/// Administration routes (protected, super-admin only)
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/:user_id/groups", post(handlers::add_user_to_group))
        .route("/communes", post(handlers::create_commune))
        .route("/arrondissements", post(handlers::create_arrondissement))
        .route("/warehouses", post(handlers::create_warehouse))
        .route(
            "/warehouses/:warehouse_id/manager",
            post(handlers::assign_manager),
        )
        .route("/warehouses/:warehouse_id/stocks", post(handlers::create_stock))
        .route("/contacts", get(handlers::list_contacts))
        .route(
            "/contacts/:contact_id/processed",
            post(handlers::mark_contact_processed),
        )
        .route("/export", get(handlers::export_data))
}

#[cfg(test)]
mod tests {
    use super::paths;
    use uuid::Uuid;

    #[test]
    fn test_warehouse_path() {
        let id = Uuid::nil();
        assert_eq!(
            paths::warehouse(id),
            "/api/v1/warehouses/00000000-0000-0000-0000-000000000000"
        );
        assert!(paths::warehouse(id).starts_with(paths::WAREHOUSES));
    }
}
