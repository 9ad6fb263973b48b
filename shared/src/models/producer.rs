//! Producers and their land parcels

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// A registered farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub id: Uuid,
    /// Linked user account, at most one producer per account
    pub user_id: Option<Uuid>,
    pub last_name: String,
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub arrondissement_id: Option<Uuid>,
    pub photo_url: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl Producer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

/// A unit of land owned by a producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    /// Area in hectares, divisor of the harvest yield
    pub area_hectares: Decimal,
    pub location: String,
    pub coordinates: Option<GpsCoordinates>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
