//! Business logic services for the AgriTech-Benin platform

pub mod auth;
pub mod contact;
pub mod dashboard;
pub mod export;
pub mod geography;
pub mod harvest;
pub mod notification;
pub mod producer;
pub mod session;
pub mod stock;

pub use auth::AuthService;
pub use contact::ContactService;
pub use dashboard::DashboardService;
pub use export::ExportService;
pub use geography::GeographyService;
pub use harvest::HarvestService;
pub use notification::{LogMailer, Mailer, NotificationService};
pub use producer::ProducerService;
pub use session::SessionService;
pub use stock::StockService;

use shared::{Role, Session};

use crate::error::{AppError, AppResult};
use crate::routes::paths;

/// Super-admin gate for administration endpoints
pub(crate) fn require_superuser(session: &Session) -> AppResult<()> {
    if session.has_role(Role::SuperAdmin) {
        Ok(())
    } else {
        Err(AppError::access_denied(
            "Cette action est réservée aux administrateurs.",
            paths::DASHBOARD,
        ))
    }
}
