//! Producer profiles and parcels

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{GpsCoordinates, Parcel, Producer, RoleFlags, Session};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::routes::paths;

#[derive(Clone)]
pub struct ProducerService {
    db: PgPool,
}

/// Profile page context
#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub display_name: String,
    #[serde(flatten)]
    pub roles: RoleFlags,
    pub producer: Option<ProducerProfile>,
}

#[derive(Debug, Serialize)]
pub struct ProducerProfile {
    #[serde(flatten)]
    pub producer: Producer,
    pub full_name: String,
    pub arrondissement: Option<String>,
    pub parcels: Vec<Parcel>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateParcelInput {
    #[validate(custom = "shared::required_rule")]
    pub name: String,
    #[validate(custom = "shared::area_rule")]
    pub area_hectares: Decimal,
    #[serde(default)]
    pub location: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub photo_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProducerRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub last_name: String,
    pub first_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub arrondissement_id: Option<Uuid>,
    pub photo_url: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl From<ProducerRow> for Producer {
    fn from(row: ProducerRow) -> Self {
        Producer {
            id: row.id,
            user_id: row.user_id,
            last_name: row.last_name,
            first_name: row.first_name,
            phone: row.phone,
            email: row.email,
            arrondissement_id: row.arrondissement_id,
            photo_url: row.photo_url,
            registered_at: row.registered_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ParcelRow {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub name: String,
    pub area_hectares: Decimal,
    pub location: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ParcelRow> for Parcel {
    fn from(row: ParcelRow) -> Self {
        Parcel {
            id: row.id,
            producer_id: row.producer_id,
            name: row.name,
            area_hectares: row.area_hectares,
            location: row.location,
            coordinates: GpsCoordinates::from_columns(row.latitude, row.longitude),
            photo_url: row.photo_url,
            created_at: row.created_at,
        }
    }
}

const PARCEL_COLUMNS: &str =
    "id, producer_id, name, area_hectares, location, latitude, longitude, photo_url, created_at";

impl ProducerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn profile(&self, session: &Session) -> AppResult<ProfileView> {
        let identity = session.identity();

        let producer = match session.producer_id() {
            Some(producer_id) => Some(self.producer_profile(producer_id).await?),
            None => None,
        };

        Ok(ProfileView {
            username: identity.username.clone(),
            display_name: identity.display_name(),
            roles: session.role_flags(),
            producer,
        })
    }

    async fn producer_profile(&self, producer_id: Uuid) -> AppResult<ProducerProfile> {
        let row = sqlx::query_as::<_, ProducerRow>(
            r#"
            SELECT id, user_id, last_name, first_name, phone, email, arrondissement_id,
                   photo_url, registered_at
            FROM producers
            WHERE id = $1
            "#,
        )
        .bind(producer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Producer".to_string()))?;

        let arrondissement = match row.arrondissement_id {
            Some(id) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT a.name || ' - ' || c.name
                FROM arrondissements a
                JOIN communes c ON c.id = a.commune_id
                WHERE a.id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.db)
            .await?,
            None => None,
        };

        let producer = Producer::from(row);
        let parcels = self.parcels_of(producer.id).await?;

        Ok(ProducerProfile {
            full_name: producer.full_name(),
            producer,
            arrondissement,
            parcels,
        })
    }

    /// Parcels of the calling producer
    pub async fn list_parcels(&self, session: &Session) -> AppResult<Vec<Parcel>> {
        let producer_id = require_producer(session, "Seuls les producteurs ont des parcelles.")?;
        self.parcels_of(producer_id).await
    }

    pub async fn create_parcel(
        &self,
        session: &Session,
        input: CreateParcelInput,
    ) -> AppResult<Parcel> {
        let producer_id =
            require_producer(session, "Seuls les producteurs peuvent ajouter des parcelles.")?;
        input.validate()?;

        let coordinates = GpsCoordinates::from_columns(input.latitude, input.longitude);
        if input.latitude.is_some() != input.longitude.is_some()
            || coordinates.is_some_and(|c| !c.is_valid())
        {
            return Err(AppError::validation(
                "latitude",
                "Invalid GPS coordinates",
                "Coordonnées GPS invalides",
            ));
        }

        let row = sqlx::query_as::<_, ParcelRow>(&format!(
            r#"
            INSERT INTO parcels (producer_id, name, area_hectares, location, latitude, longitude, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PARCEL_COLUMNS
        ))
        .bind(producer_id)
        .bind(input.name.trim())
        .bind(input.area_hectares)
        .bind(input.location.trim())
        .bind(input.latitude)
        .bind(input.longitude)
        .bind(&input.photo_url)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Parcel {} created for producer {}", row.id, producer_id);
        Ok(row.into())
    }

    async fn parcels_of(&self, producer_id: Uuid) -> AppResult<Vec<Parcel>> {
        let rows = sqlx::query_as::<_, ParcelRow>(&format!(
            "SELECT {} FROM parcels WHERE producer_id = $1 ORDER BY name",
            PARCEL_COLUMNS
        ))
        .bind(producer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Parcel::from).collect())
    }
}

/// Producer id of the caller, or a redirect to the profile page
fn require_producer(session: &Session, message: &str) -> AppResult<Uuid> {
    session
        .producer_id()
        .ok_or_else(|| AppError::access_denied(message, paths::PROFILE))
}
