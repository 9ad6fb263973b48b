//! AgriTech-Benin - Backend Server
//!
//! Cooperative management for Beninese producers: parcels and harvests,
//! warehouse stocks with a movement ledger, role-based dashboards and a
//! public contact form.

use axum::{routing::get, Router};
use shared::Mailbox;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod middleware;
mod routes;
mod services;

pub use config::Config;

use external::BrevoMailer;
use services::{LogMailer, Mailer, NotificationService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Arc<Config>,
    pub notifier: NotificationService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agritech_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting {} server", config.app.name);
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.is_development() {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let notifier = build_notifier(&config)?;

    // Create application state
    let state = AppState {
        db: db_pool,
        config: Arc::new(config.clone()),
        notifier,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Brevo when an API key is configured, otherwise mail is only logged
fn build_notifier(config: &Config) -> anyhow::Result<NotificationService> {
    let default_from = Mailbox::parse(&config.email.default_from)
        .map_err(|e| anyhow::anyhow!("invalid email.default_from: {}", e))?;

    let mailer: Arc<dyn Mailer> = match config.email.brevo_api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {
            tracing::info!("Sending email through Brevo");
            Arc::new(BrevoMailer::with_base_url(
                key.to_string(),
                config.email.sender_name.clone(),
                config.email.brevo_base_url.clone(),
            ))
        }
        _ => {
            tracing::warn!("No Brevo API key configured, outgoing email will only be logged");
            Arc::new(LogMailer)
        }
    };

    Ok(NotificationService::new(mailer, default_from))
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes(state.clone()))
        // Applied as separate router layers (CORS outermost, trace inside, same
        // order as a ServiceBuilder) so the body is boxed between them.
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
