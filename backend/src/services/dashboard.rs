//! Role-based dashboard and public statistics

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    average_yield, capacity_totals, crop_yield, CropType, DashboardRole, RoleFlags, Session, Stock,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::harvest::{HarvestService, HarvestView};
use crate::services::stock::{StockService, StockView};

const LATEST_HARVESTS: i64 = 5;
const TOP_ZONES: i64 = 10;

#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
    harvests: HarvestService,
    stocks: StockService,
}

/// Dashboard payload, one variant per role
#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    Producer(ProducerDashboard),
    SuperAdmin(AdminDashboard),
    Manager(ManagerDashboard),
    Unassigned {
        #[serde(flatten)]
        roles: RoleFlags,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropTotal {
    pub crop_type: CropType,
    pub label: String,
    pub total_kg: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropYield {
    pub crop_type: CropType,
    pub label: String,
    /// Mean of per-harvest yields, kg per hectare
    pub average_yield: Decimal,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ZoneProduction {
    pub arrondissement: Option<String>,
    pub commune: Option<String>,
    pub total_kg: Decimal,
    pub producer_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ProducerDashboard {
    #[serde(flatten)]
    pub roles: RoleFlags,
    pub producer_id: Uuid,
    pub total_harvests: i64,
    pub total_quantity_kg: Decimal,
    pub harvests_by_crop: Vec<CropTotal>,
    pub latest_harvests: Vec<HarvestView>,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    #[serde(flatten)]
    pub roles: RoleFlags,
    pub total_producers: i64,
    pub total_harvests: i64,
    pub total_warehouses: i64,
    pub total_quantity_kg: Decimal,
    pub harvests_by_crop: Vec<CropTotal>,
    pub production_by_zone: Vec<ZoneProduction>,
    pub alerting_stocks: Vec<StockView>,
    pub yield_by_crop: Vec<CropYield>,
}

#[derive(Debug, Serialize)]
pub struct ManagedWarehouse {
    pub id: Uuid,
    pub name: String,
    pub current_stock_kg: Decimal,
    pub fill_rate: Decimal,
    pub alerting_stocks: Vec<Stock>,
}

#[derive(Debug, Serialize)]
pub struct ManagerDashboard {
    #[serde(flatten)]
    pub roles: RoleFlags,
    pub total_warehouses: usize,
    pub total_capacity_kg: Decimal,
    pub total_stock_kg: Decimal,
    /// Percentage rounded to two decimal places
    pub average_fill_rate: Decimal,
    pub alerting_stocks: Vec<StockView>,
    pub stock_by_crop: Vec<CropTotal>,
    pub warehouses: Vec<ManagedWarehouse>,
}

/// Home page figures, visible without logging in
#[derive(Debug, Serialize)]
pub struct PublicStats {
    pub total_producers: i64,
    pub total_harvests: i64,
    pub total_warehouses: i64,
    pub total_production_kg: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct CropSumRow {
    #[sqlx(try_from = "String")]
    crop_type: CropType,
    total_kg: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct YieldSample {
    #[sqlx(try_from = "String")]
    crop_type: CropType,
    quantity_kg: Decimal,
    area_hectares: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct Counts {
    producers: i64,
    harvests: i64,
    warehouses: i64,
    production_kg: Decimal,
}

impl DashboardService {
    pub fn new(db: PgPool) -> Self {
        Self {
            harvests: HarvestService::new(db.clone()),
            stocks: StockService::new(db.clone()),
            db,
        }
    }

    pub async fn dashboard(&self, session: &Session) -> AppResult<Dashboard> {
        let roles = session.role_flags();

        match session.dashboard_role() {
            DashboardRole::Producer { producer_id } => self
                .producer_view(roles, producer_id)
                .await
                .map(Dashboard::Producer),
            DashboardRole::SuperAdmin => self.admin_view(roles).await.map(Dashboard::SuperAdmin),
            DashboardRole::Manager => self
                .manager_view(roles, session.user_id())
                .await
                .map(Dashboard::Manager),
            DashboardRole::Unassigned => Ok(Dashboard::Unassigned { roles }),
        }
    }

    pub async fn public_stats(&self) -> AppResult<PublicStats> {
        let counts = self.counts().await?;
        Ok(PublicStats {
            total_producers: counts.producers,
            total_harvests: counts.harvests,
            total_warehouses: counts.warehouses,
            total_production_kg: counts.production_kg,
        })
    }

    async fn producer_view(&self, roles: RoleFlags, producer_id: Uuid) -> AppResult<ProducerDashboard> {
        let (total_harvests, total_quantity_kg): (i64, Decimal) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(quantity_kg), 0) FROM harvests WHERE producer_id = $1",
        )
        .bind(producer_id)
        .fetch_one(&self.db)
        .await?;

        Ok(ProducerDashboard {
            roles,
            producer_id,
            total_harvests,
            total_quantity_kg,
            harvests_by_crop: self.harvest_totals(Some(producer_id)).await?,
            latest_harvests: self.harvests.latest(producer_id, LATEST_HARVESTS).await?,
        })
    }

    async fn admin_view(&self, roles: RoleFlags) -> AppResult<AdminDashboard> {
        let counts = self.counts().await?;

        let production_by_zone = sqlx::query_as::<_, ZoneProduction>(
            r#"
            SELECT a.name AS arrondissement, c.name AS commune,
                   SUM(h.quantity_kg) AS total_kg,
                   COUNT(DISTINCT h.producer_id) AS producer_count
            FROM harvests h
            JOIN producers p ON p.id = h.producer_id
            LEFT JOIN arrondissements a ON a.id = p.arrondissement_id
            LEFT JOIN communes c ON c.id = a.commune_id
            GROUP BY a.id, a.name, c.name
            ORDER BY total_kg DESC
            LIMIT $1
            "#,
        )
        .bind(TOP_ZONES)
        .fetch_all(&self.db)
        .await?;

        let samples = sqlx::query_as::<_, YieldSample>(
            r#"
            SELECT ct.code AS crop_type, h.quantity_kg, pa.area_hectares
            FROM harvests h
            JOIN parcels pa ON pa.id = h.parcel_id
            JOIN crop_types ct ON ct.id = h.crop_type_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let alerting_stocks = self
            .stocks
            .scoped_stocks(None, "")
            .await?
            .into_iter()
            .filter(|s| s.in_alert)
            .collect();

        Ok(AdminDashboard {
            roles,
            total_producers: counts.producers,
            total_harvests: counts.harvests,
            total_warehouses: counts.warehouses,
            total_quantity_kg: counts.production_kg,
            harvests_by_crop: self.harvest_totals(None).await?,
            production_by_zone,
            alerting_stocks,
            yield_by_crop: yield_by_crop(
                samples
                    .into_iter()
                    .map(|s| (s.crop_type, s.quantity_kg, s.area_hectares)),
            ),
        })
    }

    /// Figures over the warehouses assigned to this manager
    async fn manager_view(&self, roles: RoleFlags, user_id: Uuid) -> AppResult<ManagerDashboard> {
        let snapshots = self.stocks.snapshots(Some(user_id)).await?;
        let stocks = self.stocks.scoped_stocks(Some(user_id), "").await?;
        let totals = capacity_totals(&snapshots);

        let warehouses = snapshots
            .iter()
            .map(|w| ManagedWarehouse {
                id: w.warehouse.id,
                name: w.warehouse.name.clone(),
                current_stock_kg: w.current_stock(),
                fill_rate: w.fill_rate(),
                alerting_stocks: w.alerting_stocks().into_iter().cloned().collect(),
            })
            .collect();

        Ok(ManagerDashboard {
            roles,
            total_warehouses: snapshots.len(),
            total_capacity_kg: totals.total_capacity_kg,
            total_stock_kg: totals.total_stock_kg,
            average_fill_rate: totals.average_fill_rate.round_dp(2),
            stock_by_crop: crop_totals(
                stocks
                    .iter()
                    .map(|s| (s.stock.crop_type, s.stock.current_quantity_kg)),
            ),
            alerting_stocks: stocks.into_iter().filter(|s| s.in_alert).collect(),
            warehouses,
        })
    }

    async fn harvest_totals(&self, producer_id: Option<Uuid>) -> AppResult<Vec<CropTotal>> {
        let rows = sqlx::query_as::<_, CropSumRow>(
            r#"
            SELECT ct.code AS crop_type, SUM(h.quantity_kg) AS total_kg
            FROM harvests h
            JOIN crop_types ct ON ct.id = h.crop_type_id
            WHERE ($1::uuid IS NULL OR h.producer_id = $1)
            GROUP BY ct.code
            "#,
        )
        .bind(producer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(crop_totals(rows.into_iter().map(|r| (r.crop_type, r.total_kg))))
    }

    async fn counts(&self) -> AppResult<Counts> {
        let counts = sqlx::query_as::<_, Counts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM producers) AS producers,
                (SELECT COUNT(*) FROM harvests) AS harvests,
                (SELECT COUNT(*) FROM warehouses) AS warehouses,
                (SELECT COALESCE(SUM(quantity_kg), 0) FROM harvests) AS production_kg
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(counts)
    }
}

/// Sum quantities per crop, in crop order; crops with no entry are omitted
pub fn crop_totals<I>(entries: I) -> Vec<CropTotal>
where
    I: IntoIterator<Item = (CropType, Decimal)>,
{
    let mut totals: BTreeMap<CropType, Decimal> = BTreeMap::new();
    for (crop, quantity) in entries {
        *totals.entry(crop).or_default() += quantity;
    }

    totals
        .into_iter()
        .map(|(crop_type, total_kg)| CropTotal {
            crop_type,
            label: crop_type.label().to_string(),
            total_kg,
        })
        .collect()
}

/// Average per-harvest yield for each crop that has harvests
pub fn yield_by_crop<I>(samples: I) -> Vec<CropYield>
where
    I: IntoIterator<Item = (CropType, Decimal, Decimal)>,
{
    let mut yields: BTreeMap<CropType, Vec<Decimal>> = BTreeMap::new();
    for (crop, quantity, area) in samples {
        yields.entry(crop).or_default().push(crop_yield(quantity, area));
    }

    yields
        .into_iter()
        .filter_map(|(crop_type, values)| {
            average_yield(values).map(|average_yield| CropYield {
                crop_type,
                label: crop_type.label().to_string(),
                average_yield,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_crop_totals_merge_and_order() {
        let totals = crop_totals(vec![
            (CropType::Pineapple, dec("40")),
            (CropType::Maize, dec("100")),
            (CropType::Maize, dec("50.5")),
        ]);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].crop_type, CropType::Maize);
        assert_eq!(totals[0].total_kg, dec("150.5"));
        assert_eq!(totals[0].label, "Maïs");
        assert_eq!(totals[1].crop_type, CropType::Pineapple);
    }

    #[test]
    fn test_yield_is_mean_of_harvest_yields() {
        // 150/3 = 50 and 100/1 = 100: mean 75, not 250/4
        let yields = yield_by_crop(vec![
            (CropType::Soy, dec("150"), dec("3")),
            (CropType::Soy, dec("100"), dec("1")),
        ]);

        assert_eq!(yields.len(), 1);
        assert_eq!(yields[0].average_yield, dec("75"));
    }

    #[test]
    fn test_yield_counts_zero_area_as_zero() {
        let yields = yield_by_crop(vec![
            (CropType::Maize, dec("100"), dec("0")),
            (CropType::Maize, dec("100"), dec("1")),
        ]);
        assert_eq!(yields[0].average_yield, dec("50"));
    }

    #[test]
    fn test_crops_without_harvests_are_omitted() {
        assert!(yield_by_crop(Vec::new()).is_empty());
        assert!(crop_totals(Vec::new()).is_empty());
    }

    #[test]
    fn test_unassigned_dashboard_serializes_flags() {
        let dashboard = Dashboard::Unassigned {
            roles: RoleFlags {
                is_producer: false,
                is_superuser: false,
                is_manager: false,
            },
        };
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["view"], "unassigned");
        assert_eq!(json["is_manager"], false);
    }
}
