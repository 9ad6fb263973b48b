//! Harvest recording, listing and export

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{crop_yield, CropType, CropTypeInfo, Harvest, Role, Session};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::routes::paths;

/// Harvest service
#[derive(Clone)]
pub struct HarvestService {
    db: PgPool,
}

/// Query string of the harvest list
#[derive(Debug, Default, Deserialize)]
pub struct HarvestQuery {
    pub search: Option<String>,
    /// Crop code, e.g. `MAIS`
    pub crop_type: Option<String>,
}

/// A harvest with the names and yield shown in lists
#[derive(Debug, Serialize)]
pub struct HarvestView {
    #[serde(flatten)]
    pub harvest: Harvest,
    pub crop_label: String,
    pub producer_name: String,
    pub parcel_name: String,
    pub parcel_area_hectares: Decimal,
    /// kg per hectare
    pub yield_kg_per_ha: Decimal,
}

#[derive(Debug, Serialize)]
pub struct HarvestList {
    pub harvests: Vec<HarvestView>,
    pub crop_types: Vec<CropTypeInfo>,
    pub is_producer: bool,
    pub search: String,
    pub crop_type_filter: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordHarvestInput {
    pub parcel_id: Uuid,
    pub crop_type: CropType,
    #[validate(custom = "shared::positive_quantity_rule")]
    pub quantity_kg: Decimal,
    pub harvest_date: NaiveDate,
    #[serde(default)]
    pub observations: String,
    pub photo_url: Option<String>,
}

/// One line of the CSV export
#[derive(Debug, Serialize)]
pub struct HarvestExportRow {
    pub id: Uuid,
    pub harvest_date: NaiveDate,
    pub producer: String,
    pub parcel: String,
    pub crop: String,
    pub quantity_kg: Decimal,
    pub area_hectares: Decimal,
    pub yield_kg_per_ha: Decimal,
    pub observations: String,
}

#[derive(Debug, sqlx::FromRow)]
struct HarvestRow {
    id: Uuid,
    producer_id: Uuid,
    parcel_id: Uuid,
    #[sqlx(try_from = "String")]
    crop_type: CropType,
    quantity_kg: Decimal,
    harvest_date: NaiveDate,
    recorded_at: DateTime<Utc>,
    observations: String,
    photo_url: Option<String>,
    producer_name: String,
    parcel_name: String,
    parcel_area_hectares: Decimal,
}

impl From<HarvestRow> for HarvestView {
    fn from(row: HarvestRow) -> Self {
        HarvestView {
            crop_label: row.crop_type.label().to_string(),
            yield_kg_per_ha: crop_yield(row.quantity_kg, row.parcel_area_hectares),
            producer_name: row.producer_name,
            parcel_name: row.parcel_name,
            parcel_area_hectares: row.parcel_area_hectares,
            harvest: Harvest {
                id: row.id,
                producer_id: row.producer_id,
                parcel_id: row.parcel_id,
                crop_type: row.crop_type,
                quantity_kg: row.quantity_kg,
                harvest_date: row.harvest_date,
                recorded_at: row.recorded_at,
                observations: row.observations,
                photo_url: row.photo_url,
            },
        }
    }
}

impl From<HarvestView> for HarvestExportRow {
    fn from(view: HarvestView) -> Self {
        HarvestExportRow {
            id: view.harvest.id,
            harvest_date: view.harvest.harvest_date,
            producer: view.producer_name,
            parcel: view.parcel_name,
            crop: view.crop_label,
            quantity_kg: view.harvest.quantity_kg,
            area_hectares: view.parcel_area_hectares,
            yield_kg_per_ha: view.yield_kg_per_ha,
            observations: view.harvest.observations,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CropTypeRow {
    id: Uuid,
    #[sqlx(try_from = "String")]
    code: CropType,
    description: String,
}

const HARVEST_SELECT: &str = r#"
    SELECT h.id, h.producer_id, h.parcel_id, ct.code AS crop_type, h.quantity_kg,
           h.harvest_date, h.recorded_at, h.observations, h.photo_url,
           p.last_name || ' ' || p.first_name AS producer_name,
           pa.name AS parcel_name,
           pa.area_hectares AS parcel_area_hectares
    FROM harvests h
    JOIN producers p ON p.id = h.producer_id
    JOIN parcels pa ON pa.id = h.parcel_id
    JOIN crop_types ct ON ct.id = h.crop_type_id
"#;

impl HarvestService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Producers see their own harvests; every other user sees all of them
    pub async fn list(&self, session: &Session, query: HarvestQuery) -> AppResult<HarvestList> {
        let search = query.search.unwrap_or_default().trim().to_string();
        let crop_type_filter = query.crop_type.unwrap_or_default().trim().to_string();
        let producer_id = session.producer_id();

        let rows = sqlx::query_as::<_, HarvestRow>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR h.producer_id = $1)
              AND ($2 = '' OR p.last_name ILIKE '%' || $2 || '%'
                           OR p.first_name ILIKE '%' || $2 || '%'
                           OR pa.name ILIKE '%' || $2 || '%')
              AND ($3 = '' OR ct.code = $3)
            ORDER BY h.harvest_date DESC, h.recorded_at DESC
            "#,
            HARVEST_SELECT
        ))
        .bind(producer_id)
        .bind(&search)
        .bind(&crop_type_filter)
        .fetch_all(&self.db)
        .await?;

        Ok(HarvestList {
            harvests: rows.into_iter().map(HarvestView::from).collect(),
            crop_types: self.crop_types().await?,
            is_producer: producer_id.is_some(),
            search,
            crop_type_filter,
        })
    }

    pub async fn crop_types(&self) -> AppResult<Vec<CropTypeInfo>> {
        let rows = sqlx::query_as::<_, CropTypeRow>(
            "SELECT id, code, description FROM crop_types ORDER BY code",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CropTypeInfo {
                id: row.id,
                label: row.code.label().to_string(),
                code: row.code,
                description: row.description,
            })
            .collect())
    }

    /// Record a harvest on one of the caller's parcels
    pub async fn record(&self, session: &Session, input: RecordHarvestInput) -> AppResult<HarvestView> {
        let producer_id = session.producer_id().ok_or_else(|| {
            AppError::access_denied(
                "Seuls les producteurs peuvent ajouter des récoltes.",
                paths::HARVESTS,
            )
        })?;

        input.validate()?;

        let owns_parcel = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM parcels WHERE id = $1 AND producer_id = $2)",
        )
        .bind(input.parcel_id)
        .bind(producer_id)
        .fetch_one(&self.db)
        .await?;

        if !owns_parcel {
            return Err(AppError::validation(
                "parcel_id",
                "Select one of your own parcels",
                "Sélectionnez une de vos parcelles",
            ));
        }

        let crop_type_id = self.crop_type_id(input.crop_type).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO harvests (producer_id, parcel_id, crop_type_id, quantity_kg,
                                  harvest_date, observations, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(producer_id)
        .bind(input.parcel_id)
        .bind(crop_type_id)
        .bind(input.quantity_kg)
        .bind(input.harvest_date)
        .bind(input.observations.trim())
        .bind(&input.photo_url)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            "Harvest {} recorded: {} kg of {} by producer {}",
            id,
            input.quantity_kg,
            input.crop_type.code(),
            producer_id
        );

        self.fetch(id).await
    }

    /// A producer may only open their own harvests
    pub async fn detail(&self, session: &Session, id: Uuid) -> AppResult<HarvestView> {
        let harvest = self.fetch(id).await?;

        if let Some(producer_id) = session.producer_id() {
            if harvest.harvest.producer_id != producer_id {
                return Err(AppError::access_denied(
                    "Vous n'avez pas accès à cette récolte.",
                    paths::HARVESTS,
                ));
            }
        }

        Ok(harvest)
    }

    /// Every harvest as CSV, super-admin only
    pub async fn export_csv(&self, session: &Session) -> AppResult<String> {
        if !session.has_role(Role::SuperAdmin) {
            return Err(AppError::access_denied(
                "Vous n'avez pas accès à cet export.",
                paths::DASHBOARD,
            ));
        }

        let rows = sqlx::query_as::<_, HarvestRow>(&format!(
            "{} ORDER BY h.harvest_date DESC, h.recorded_at DESC",
            HARVEST_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        let records: Vec<HarvestExportRow> = rows
            .into_iter()
            .map(HarvestView::from)
            .map(HarvestExportRow::from)
            .collect();

        export_to_csv(&records)
    }

    /// Most recent harvests of one producer
    pub(crate) async fn latest(&self, producer_id: Uuid, limit: i64) -> AppResult<Vec<HarvestView>> {
        let rows = sqlx::query_as::<_, HarvestRow>(&format!(
            "{} WHERE h.producer_id = $1 ORDER BY h.harvest_date DESC, h.recorded_at DESC LIMIT $2",
            HARVEST_SELECT
        ))
        .bind(producer_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(HarvestView::from).collect())
    }

    async fn fetch(&self, id: Uuid) -> AppResult<HarvestView> {
        let row = sqlx::query_as::<_, HarvestRow>(&format!("{} WHERE h.id = $1", HARVEST_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Harvest".to_string()))?;

        Ok(row.into())
    }

    async fn crop_type_id(&self, crop_type: CropType) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM crop_types WHERE code = $1")
            .bind(crop_type.code())
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Crop type {}", crop_type.code())))
    }
}

/// Serialize records as CSV with a header line
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
