//! Warehouses, stock rows and the movement ledger
//!
//! Every read and write here goes through the warehouse gate: the caller must
//! be a superuser (all warehouses) or a member of the managers group (only the
//! warehouses assigned to them). Anything outside that scope is answered with
//! a redirect, never with the data.
//!
//! A movement reads the stock row with `FOR UPDATE` and writes the new
//! quantity and the ledger line in the same transaction, so two concurrent
//! exits cannot both pass the sufficiency check.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    apply_movement, capacity_totals, CropType, Flash, Group, ManagerContact, Movement,
    MovementDirection, Session, Stock, StockError, Warehouse, WarehouseScope, WarehouseSnapshot,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::routes::paths;
use crate::services::require_superuser;

/// Stock service
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

// ============================================================================
// Views
// ============================================================================

/// A warehouse with its computed figures
#[derive(Debug, Serialize)]
pub struct WarehouseSummary {
    #[serde(flatten)]
    pub warehouse: Warehouse,
    pub arrondissement: String,
    pub manager_name: String,
    pub manager_phone: String,
    pub current_stock_kg: Decimal,
    pub fill_rate: Decimal,
    pub alert_count: usize,
}

#[derive(Debug, Serialize)]
pub struct WarehouseList {
    pub warehouses: Vec<WarehouseSummary>,
    pub search: String,
    pub is_superuser: bool,
    pub total_capacity_kg: Decimal,
    pub total_stock_kg: Decimal,
    /// Percentage rounded to one decimal place
    pub average_fill_rate: Decimal,
}

/// A stock row with display fields
#[derive(Debug, Clone, Serialize)]
pub struct StockView {
    #[serde(flatten)]
    pub stock: Stock,
    pub crop_label: String,
    pub warehouse_name: String,
    pub in_alert: bool,
}

#[derive(Debug, Serialize)]
pub struct WarehouseDetail {
    pub warehouse: WarehouseSummary,
    pub stocks: Vec<StockView>,
    pub alerting_stocks: Vec<StockView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseQuery {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StockQuery {
    /// Crop code, e.g. `SOJA`
    pub crop_type: Option<String>,
    /// Any non-empty value restricts the list to stocks in alert
    pub alert: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StockList {
    pub stocks: Vec<StockView>,
    pub crop_type_filter: String,
    pub alert_only: bool,
    pub stock_count: usize,
    pub alert_count: usize,
    pub total_quantity_kg: Decimal,
}

#[derive(Debug, Serialize)]
pub struct MovementView {
    #[serde(flatten)]
    pub movement: Movement,
    pub direction_label: String,
}

#[derive(Debug, Serialize)]
pub struct MovementHistory {
    pub stock: StockView,
    pub movements: Vec<MovementView>,
}

/// Outcome of an accepted movement
#[derive(Debug, Serialize)]
pub struct MovementRecorded {
    pub flash: Flash,
    pub redirect_to: String,
    pub movement: MovementView,
    pub stock: StockView,
}

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementInput {
    pub direction: MovementDirection,
    #[validate(custom = "shared::positive_quantity_rule")]
    pub quantity_kg: Decimal,
    #[serde(default)]
    #[validate(custom = "shared::required_rule")]
    pub reason: String,
    pub harvest_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWarehouseInput {
    #[validate(custom = "shared::required_rule")]
    pub name: String,
    pub arrondissement_id: Uuid,
    #[validate(custom = "shared::positive_quantity_rule")]
    pub max_capacity_kg: Decimal,
    #[validate(custom = "shared::required_rule")]
    pub address: String,
    pub manager_id: Option<Uuid>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignManagerInput {
    /// `None` unassigns the warehouse
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStockInput {
    pub crop_type: CropType,
    #[validate(custom = "shared::stock_level_rule")]
    pub alert_threshold_kg: Decimal,
    #[serde(default)]
    #[validate(custom = "shared::stock_level_rule")]
    pub current_quantity_kg: Decimal,
}

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct WarehouseRow {
    id: Uuid,
    name: String,
    arrondissement_id: Uuid,
    max_capacity_kg: Decimal,
    address: String,
    manager_id: Option<Uuid>,
    photo_url: Option<String>,
    created_at: DateTime<Utc>,
    arrondissement: String,
    manager_username: Option<String>,
    manager_first_name: Option<String>,
    manager_last_name: Option<String>,
    manager_email: Option<String>,
    manager_producer_phone: Option<String>,
}

struct WarehouseRecord {
    snapshot: WarehouseSnapshot,
    arrondissement: String,
}

impl WarehouseRow {
    fn into_record(self) -> WarehouseRecord {
        let manager = match (self.manager_id, self.manager_username) {
            (Some(user_id), Some(username)) => Some(ManagerContact {
                user_id,
                username,
                full_name: format!(
                    "{} {}",
                    self.manager_first_name.unwrap_or_default(),
                    self.manager_last_name.unwrap_or_default()
                )
                .trim()
                .to_string(),
                email: self.manager_email.unwrap_or_default(),
                producer_phone: self.manager_producer_phone,
            }),
            _ => None,
        };

        WarehouseRecord {
            snapshot: WarehouseSnapshot {
                warehouse: Warehouse {
                    id: self.id,
                    name: self.name,
                    arrondissement_id: self.arrondissement_id,
                    max_capacity_kg: self.max_capacity_kg,
                    address: self.address,
                    manager_id: self.manager_id,
                    photo_url: self.photo_url,
                    created_at: self.created_at,
                },
                manager,
                stocks: Vec::new(),
            },
            arrondissement: self.arrondissement,
        }
    }
}

impl WarehouseRecord {
    fn summary(self) -> WarehouseSummary {
        let snapshot = self.snapshot;
        WarehouseSummary {
            arrondissement: self.arrondissement,
            manager_name: snapshot.manager_display_name(),
            manager_phone: snapshot.manager_phone(),
            current_stock_kg: snapshot.current_stock(),
            fill_rate: snapshot.fill_rate(),
            alert_count: snapshot.alerting_stocks().len(),
            warehouse: snapshot.warehouse,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    id: Uuid,
    warehouse_id: Uuid,
    #[sqlx(try_from = "String")]
    crop_type: CropType,
    current_quantity_kg: Decimal,
    alert_threshold_kg: Decimal,
    updated_at: DateTime<Utc>,
    warehouse_name: String,
    manager_id: Option<Uuid>,
}

impl From<StockRow> for StockView {
    fn from(row: StockRow) -> Self {
        let stock = Stock {
            id: row.id,
            warehouse_id: row.warehouse_id,
            crop_type: row.crop_type,
            current_quantity_kg: row.current_quantity_kg,
            alert_threshold_kg: row.alert_threshold_kg,
            updated_at: row.updated_at,
        };
        StockView {
            crop_label: stock.crop_type.label().to_string(),
            warehouse_name: row.warehouse_name,
            in_alert: stock.is_in_alert(),
            stock,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    stock_id: Uuid,
    harvest_id: Option<Uuid>,
    #[sqlx(try_from = "String")]
    direction: MovementDirection,
    quantity_kg: Decimal,
    moved_at: DateTime<Utc>,
    reason: String,
    operator: String,
}

impl From<MovementRow> for MovementView {
    fn from(row: MovementRow) -> Self {
        MovementView {
            direction_label: row.direction.label().to_string(),
            movement: Movement {
                id: row.id,
                stock_id: row.stock_id,
                harvest_id: row.harvest_id,
                direction: row.direction,
                quantity_kg: row.quantity_kg,
                moved_at: row.moved_at,
                reason: row.reason,
                operator: row.operator,
            },
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LockedStock {
    warehouse_id: Uuid,
    current_quantity_kg: Decimal,
    manager_id: Option<Uuid>,
}

const WAREHOUSE_SELECT: &str = r#"
    SELECT w.id, w.name, w.arrondissement_id, w.max_capacity_kg, w.address, w.manager_id,
           w.photo_url, w.created_at,
           a.name || ' - ' || c.name AS arrondissement,
           u.username AS manager_username,
           u.first_name AS manager_first_name,
           u.last_name AS manager_last_name,
           u.email AS manager_email,
           mp.phone AS manager_producer_phone
    FROM warehouses w
    JOIN arrondissements a ON a.id = w.arrondissement_id
    JOIN communes c ON c.id = a.commune_id
    LEFT JOIN users u ON u.id = w.manager_id
    LEFT JOIN producers mp ON mp.user_id = w.manager_id
"#;

const STOCK_SELECT: &str = r#"
    SELECT s.id, s.warehouse_id, ct.code AS crop_type, s.current_quantity_kg,
           s.alert_threshold_kg, s.updated_at,
           w.name AS warehouse_name, w.manager_id
    FROM stocks s
    JOIN warehouses w ON w.id = s.warehouse_id
    JOIN crop_types ct ON ct.id = s.crop_type_id
"#;

const MOVEMENT_COLUMNS: &str =
    "id, stock_id, harvest_id, direction, quantity_kg, moved_at, reason, operator";

fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Apply the warehouse gate
fn gate(session: &Session) -> AppResult<WarehouseScope> {
    match session.warehouse_scope() {
        WarehouseScope::Denied => Err(AppError::access_denied(
            "Vous n'avez pas accès à la gestion des stocks.",
            paths::DASHBOARD,
        )),
        scope => Ok(scope),
    }
}

impl StockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_warehouses(
        &self,
        session: &Session,
        query: WarehouseQuery,
    ) -> AppResult<WarehouseList> {
        let scope = gate(session)?;
        let search = query.search.unwrap_or_default().trim().to_string();

        let records = self.warehouse_records(scope.manager_filter(), &search).await?;
        let snapshots: Vec<WarehouseSnapshot> =
            records.iter().map(|r| r.snapshot.clone()).collect();
        let totals = capacity_totals(&snapshots);

        Ok(WarehouseList {
            warehouses: records.into_iter().map(WarehouseRecord::summary).collect(),
            search,
            is_superuser: scope == WarehouseScope::All,
            total_capacity_kg: totals.total_capacity_kg,
            total_stock_kg: totals.total_stock_kg,
            average_fill_rate: totals.average_fill_rate.round_dp(1),
        })
    }

    pub async fn warehouse_detail(&self, session: &Session, id: Uuid) -> AppResult<WarehouseDetail> {
        let scope = gate(session)?;

        let row = sqlx::query_as::<_, WarehouseRow>(&format!("{} WHERE w.id = $1", WAREHOUSE_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        if !scope.permits(row.manager_id) {
            return Err(AppError::access_denied(
                "Vous n'avez pas accès à cet entrepôt.",
                paths::WAREHOUSES,
            ));
        }

        let stocks = self.stock_rows(Some(id), None).await?;
        let mut record = row.into_record();
        record.snapshot.stocks = stocks.iter().map(|s| s.stock.clone()).collect();

        let alerting_stocks = stocks.iter().filter(|s| s.in_alert).cloned().collect();

        Ok(WarehouseDetail {
            warehouse: record.summary(),
            stocks,
            alerting_stocks,
        })
    }

    pub async fn list_stocks(&self, session: &Session, query: StockQuery) -> AppResult<StockList> {
        let scope = gate(session)?;
        let crop_type_filter = query.crop_type.unwrap_or_default().trim().to_string();
        let alert_only = query.alert.is_some_and(|a| !a.trim().is_empty());

        let mut stocks = self
            .scoped_stocks(scope.manager_filter(), &crop_type_filter)
            .await?;

        if alert_only {
            stocks.retain(|s| s.in_alert);
        }

        Ok(StockList {
            stock_count: stocks.len(),
            alert_count: stocks.iter().filter(|s| s.in_alert).count(),
            total_quantity_kg: stocks.iter().map(|s| s.stock.current_quantity_kg).sum(),
            stocks,
            crop_type_filter,
            alert_only,
        })
    }

    /// Record an entry or exit on a stock row.
    ///
    /// An exit larger than the current quantity is refused with a redirect to
    /// the warehouse page; neither the stock nor the ledger is touched.
    pub async fn record_movement(
        &self,
        session: &Session,
        stock_id: Uuid,
        input: RecordMovementInput,
    ) -> AppResult<MovementRecorded> {
        let scope = gate(session)?;

        let mut tx = self.db.begin().await?;

        let locked = sqlx::query_as::<_, LockedStock>(
            r#"
            SELECT s.warehouse_id, s.current_quantity_kg, w.manager_id
            FROM stocks s
            JOIN warehouses w ON w.id = s.warehouse_id
            WHERE s.id = $1
            FOR UPDATE OF s
            "#,
        )
        .bind(stock_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        if !scope.permits(locked.manager_id) {
            return Err(AppError::access_denied(
                "Vous n'avez pas accès à ce stock.",
                paths::WAREHOUSES,
            ));
        }

        input.validate()?;

        if let Some(harvest_id) = input.harvest_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM harvests WHERE id = $1)",
            )
            .bind(harvest_id)
            .fetch_one(&mut *tx)
            .await?;

            if !exists {
                return Err(AppError::validation(
                    "harvest_id",
                    "Unknown harvest",
                    "Récolte inconnue",
                ));
            }
        }

        let warehouse_page = paths::warehouse(locked.warehouse_id);

        let new_quantity = apply_movement(
            locked.current_quantity_kg,
            input.direction,
            input.quantity_kg,
        )
        .map_err(|source| match source {
            StockError::Insufficient { .. } => AppError::InsufficientStock {
                source,
                redirect_to: warehouse_page.clone(),
            },
            StockError::NonPositiveQuantity(_) => AppError::validation(
                "quantity_kg",
                source.to_string(),
                "La quantité doit être positive",
            ),
            StockError::Unstorable(_) => AppError::validation(
                "quantity_kg",
                source.to_string(),
                "La quantité doit avoir au plus deux décimales et ne pas dépasser 99 999 999,99 kg",
            ),
        })?;

        sqlx::query("UPDATE stocks SET current_quantity_kg = $2, updated_at = NOW() WHERE id = $1")
            .bind(stock_id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await?;

        let stock_row = sqlx::query_as::<_, StockRow>(&format!("{} WHERE s.id = $1", STOCK_SELECT))
            .bind(stock_id)
            .fetch_one(&mut *tx)
            .await?;

        let operator = session.identity().display_name();

        let movement = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO stock_movements (stock_id, harvest_id, direction, quantity_kg, reason, operator)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(stock_id)
        .bind(input.harvest_id)
        .bind(input.direction.as_str())
        .bind(input.quantity_kg)
        .bind(input.reason.trim())
        .bind(&operator)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Stock {} {} {} kg by {}: {} -> {}",
            stock_id,
            input.direction.as_str(),
            input.quantity_kg,
            operator,
            locked.current_quantity_kg,
            new_quantity
        );

        Ok(MovementRecorded {
            flash: Flash::success("Mouvement de stock enregistré avec succès!"),
            redirect_to: warehouse_page,
            movement: movement.into(),
            stock: stock_row.into(),
        })
    }

    pub async fn movement_history(
        &self,
        session: &Session,
        stock_id: Uuid,
    ) -> AppResult<MovementHistory> {
        let scope = gate(session)?;

        let row = sqlx::query_as::<_, StockRow>(&format!("{} WHERE s.id = $1", STOCK_SELECT))
            .bind(stock_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stock".to_string()))?;

        if !scope.permits(row.manager_id) {
            return Err(AppError::access_denied(
                "Vous n'avez pas accès à cet historique.",
                paths::WAREHOUSES,
            ));
        }

        let movements = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {} FROM stock_movements WHERE stock_id = $1 ORDER BY moved_at DESC",
            MOVEMENT_COLUMNS
        ))
        .bind(stock_id)
        .fetch_all(&self.db)
        .await?;

        Ok(MovementHistory {
            stock: row.into(),
            movements: movements.into_iter().map(MovementView::from).collect(),
        })
    }

    // ------------------------------------------------------------------------
    // Super-admin operations
    // ------------------------------------------------------------------------

    pub async fn create_warehouse(
        &self,
        session: &Session,
        input: CreateWarehouseInput,
    ) -> AppResult<WarehouseSummary> {
        require_superuser(session)?;
        input.validate()?;

        if let Some(manager_id) = input.manager_id {
            self.ensure_manager(manager_id).await?;
        }

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO warehouses (name, arrondissement_id, max_capacity_kg, address, manager_id, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.name.trim())
        .bind(input.arrondissement_id)
        .bind(input.max_capacity_kg)
        .bind(input.address.trim())
        .bind(input.manager_id)
        .bind(&input.photo_url)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::validation(
                    "arrondissement_id",
                    "Unknown arrondissement",
                    "Arrondissement inconnu",
                )
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        tracing::info!("Warehouse {} created", id);
        self.summary(id).await
    }

    pub async fn assign_manager(
        &self,
        session: &Session,
        warehouse_id: Uuid,
        input: AssignManagerInput,
    ) -> AppResult<WarehouseSummary> {
        require_superuser(session)?;

        if let Some(manager_id) = input.manager_id {
            self.ensure_manager(manager_id).await?;
        }

        let updated = sqlx::query("UPDATE warehouses SET manager_id = $2 WHERE id = $1")
            .bind(warehouse_id)
            .bind(input.manager_id)
            .execute(&self.db)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Warehouse".to_string()));
        }

        tracing::info!("Warehouse {} assigned to {:?}", warehouse_id, input.manager_id);
        self.summary(warehouse_id).await
    }

    pub async fn create_stock(
        &self,
        session: &Session,
        warehouse_id: Uuid,
        input: CreateStockInput,
    ) -> AppResult<StockView> {
        require_superuser(session)?;
        input.validate()?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stocks (warehouse_id, crop_type_id, current_quantity_kg, alert_threshold_kg)
            SELECT $1, ct.id, $3, $4 FROM crop_types ct WHERE ct.code = $2
            ON CONFLICT (warehouse_id, crop_type_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(warehouse_id)
        .bind(input.crop_type.code())
        .bind(input.current_quantity_kg)
        .bind(input.alert_threshold_kg)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Warehouse".to_string())
            } else {
                AppError::DatabaseError(e)
            }
        })?
        .ok_or_else(|| AppError::Conflict {
            resource: "stock".to_string(),
            message: format!("This warehouse already holds a {} stock", input.crop_type.code()),
            message_fr: format!("Cet entrepôt a déjà un stock de {}", input.crop_type.label()),
        })?;

        tracing::info!("Stock {} created in warehouse {}", id, warehouse_id);

        let row = sqlx::query_as::<_, StockRow>(&format!("{} WHERE s.id = $1", STOCK_SELECT))
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        Ok(row.into())
    }

    // ------------------------------------------------------------------------
    // Queries shared with the dashboard
    // ------------------------------------------------------------------------

    /// Warehouses with their stocks, optionally limited to one manager
    pub(crate) async fn snapshots(&self, manager: Option<Uuid>) -> AppResult<Vec<WarehouseSnapshot>> {
        Ok(self
            .warehouse_records(manager, "")
            .await?
            .into_iter()
            .map(|r| r.snapshot)
            .collect())
    }

    /// Stock rows, optionally limited to one manager's warehouses and one crop
    pub(crate) async fn scoped_stocks(
        &self,
        manager: Option<Uuid>,
        crop_code: &str,
    ) -> AppResult<Vec<StockView>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR w.manager_id = $1)
              AND ($2 = '' OR ct.code = $2)
            ORDER BY w.name, ct.code
            "#,
            STOCK_SELECT
        ))
        .bind(manager)
        .bind(crop_code)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockView::from).collect())
    }

    async fn warehouse_records(
        &self,
        manager: Option<Uuid>,
        search: &str,
    ) -> AppResult<Vec<WarehouseRecord>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR w.manager_id = $1)
              AND ($2 = '' OR w.name ILIKE '%' || $2 || '%'
                           OR a.name ILIKE '%' || $2 || '%'
                           OR u.username ILIKE '%' || $2 || '%')
            ORDER BY w.name
            "#,
            WAREHOUSE_SELECT
        ))
        .bind(manager)
        .bind(search)
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut stocks = self.stock_rows(None, Some(ids)).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut record = row.into_record();
                let id = record.snapshot.warehouse.id;
                let (own, rest): (Vec<_>, Vec<_>) =
                    stocks.drain(..).partition(|s| s.stock.warehouse_id == id);
                stocks = rest;
                record.snapshot.stocks = own.into_iter().map(|s| s.stock).collect();
                record
            })
            .collect())
    }

    async fn stock_rows(
        &self,
        warehouse_id: Option<Uuid>,
        warehouse_ids: Option<Vec<Uuid>>,
    ) -> AppResult<Vec<StockView>> {
        let rows = sqlx::query_as::<_, StockRow>(&format!(
            r#"
            {}
            WHERE ($1::uuid IS NULL OR s.warehouse_id = $1)
              AND ($2::uuid[] IS NULL OR s.warehouse_id = ANY($2))
            ORDER BY ct.code
            "#,
            STOCK_SELECT
        ))
        .bind(warehouse_id)
        .bind(warehouse_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(StockView::from).collect())
    }

    async fn summary(&self, id: Uuid) -> AppResult<WarehouseSummary> {
        let row = sqlx::query_as::<_, WarehouseRow>(&format!("{} WHERE w.id = $1", WAREHOUSE_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        let mut record = row.into_record();
        record.snapshot.stocks = self
            .stock_rows(Some(id), None)
            .await?
            .into_iter()
            .map(|s| s.stock)
            .collect();

        Ok(record.summary())
    }

    /// A warehouse manager must belong to the managers group
    async fn ensure_manager(&self, user_id: Uuid) -> AppResult<()> {
        let is_manager = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_groups WHERE user_id = $1 AND group_name = $2)",
        )
        .bind(user_id)
        .bind(Group::Managers.as_str())
        .fetch_one(&self.db)
        .await?;

        if is_manager {
            Ok(())
        } else {
            Err(AppError::validation(
                "manager_id",
                "The manager must belong to the managers group",
                "Le gestionnaire doit appartenir au groupe des gestionnaires",
            ))
        }
    }
}
