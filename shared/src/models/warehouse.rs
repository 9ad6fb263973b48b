//! Warehouses, stock rows and the movement ledger
//!
//! A stock row holds the current quantity of one crop in one warehouse. Every
//! change of that quantity goes through [`apply_movement`], which is the only
//! place where an exit can be refused.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::validate_storable;

use super::CropType;

/// Label used when a warehouse has no manager
pub const UNASSIGNED_MANAGER: &str = "Non assigné";

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDirection {
    #[serde(rename = "ENTREE")]
    In,
    #[serde(rename = "SORTIE")]
    Out,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown movement direction: {0}")]
pub struct UnknownDirection(pub String);

impl MovementDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementDirection::In => "ENTREE",
            MovementDirection::Out => "SORTIE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovementDirection::In => "Entrée",
            MovementDirection::Out => "Sortie",
        }
    }
}

impl std::str::FromStr for MovementDirection {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTREE" => Ok(MovementDirection::In),
            "SORTIE" => Ok(MovementDirection::Out),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

impl TryFrom<String> for MovementDirection {
    type Error = UnknownDirection;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reasons a movement cannot be applied
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockError {
    #[error("movement quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("insufficient stock: {available} kg available, {requested} kg requested")]
    Insufficient {
        available: Decimal,
        requested: Decimal,
    },

    /// More than two decimals, or beyond what a quantity column holds
    #[error("{0} kg cannot be stored as a stock quantity")]
    Unstorable(Decimal),
}

/// Compute the quantity left after a movement.
///
/// Entries always succeed. An exit succeeds only when the current quantity
/// covers it; otherwise the stock is left untouched and an error is returned.
pub fn apply_movement(
    current: Decimal,
    direction: MovementDirection,
    quantity: Decimal,
) -> Result<Decimal, StockError> {
    if quantity <= Decimal::ZERO {
        return Err(StockError::NonPositiveQuantity(quantity));
    }
    if validate_storable(quantity).is_err() {
        return Err(StockError::Unstorable(quantity));
    }

    let next = match direction {
        MovementDirection::In => current + quantity,
        MovementDirection::Out if current >= quantity => current - quantity,
        MovementDirection::Out => {
            return Err(StockError::Insufficient {
                available: current,
                requested: quantity,
            })
        }
    };

    validate_storable(next)
        .map(|_| next)
        .map_err(|_| StockError::Unstorable(next))
}

/// True iff both values are known and the quantity is strictly below the threshold
pub fn is_in_alert(current: Option<Decimal>, threshold: Option<Decimal>) -> bool {
    match (current, threshold) {
        (Some(current), Some(threshold)) => current < threshold,
        _ => false,
    }
}

/// Percentage of capacity in use, rounded to 2 decimal places; 0 without capacity
pub fn fill_rate(stock: Decimal, capacity: Decimal) -> Decimal {
    if capacity > Decimal::ZERO {
        (stock / capacity * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Name stamped on a movement: full name, or the account identifier when empty
pub fn operator_name(full_name: &str, username: &str) -> String {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        username.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A storage facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub arrondissement_id: Uuid,
    pub max_capacity_kg: Decimal,
    pub address: String,
    pub manager_id: Option<Uuid>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Current quantity of one crop in one warehouse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub crop_type: CropType,
    pub current_quantity_kg: Decimal,
    pub alert_threshold_kg: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    pub fn is_in_alert(&self) -> bool {
        is_in_alert(Some(self.current_quantity_kg), Some(self.alert_threshold_kg))
    }
}

/// One line of the append-only movement ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub stock_id: Uuid,
    pub harvest_id: Option<Uuid>,
    pub direction: MovementDirection,
    pub quantity_kg: Decimal,
    pub moved_at: DateTime<Utc>,
    pub reason: String,
    pub operator: String,
}

/// Manager identity as shown next to a warehouse
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagerContact {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub producer_phone: Option<String>,
}

/// A warehouse with its stock rows, the unit the stock views aggregate over
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseSnapshot {
    pub warehouse: Warehouse,
    pub manager: Option<ManagerContact>,
    pub stocks: Vec<Stock>,
}

impl WarehouseSnapshot {
    /// Sum of the quantities held in this warehouse
    pub fn current_stock(&self) -> Decimal {
        self.stocks.iter().map(|s| s.current_quantity_kg).sum()
    }

    pub fn fill_rate(&self) -> Decimal {
        fill_rate(self.current_stock(), self.warehouse.max_capacity_kg)
    }

    pub fn alerting_stocks(&self) -> Vec<&Stock> {
        self.stocks.iter().filter(|s| s.is_in_alert()).collect()
    }

    pub fn manager_display_name(&self) -> String {
        match &self.manager {
            Some(m) => operator_name(&m.full_name, &m.username),
            None => UNASSIGNED_MANAGER.to_string(),
        }
    }

    /// Phone of the manager when they also hold a producer profile, else their email
    pub fn manager_phone(&self) -> String {
        match &self.manager {
            Some(m) => match &m.producer_phone {
                Some(phone) => phone.clone(),
                None if !m.email.is_empty() => m.email.clone(),
                None => "Non renseigné".to_string(),
            },
            None => "Non renseigné".to_string(),
        }
    }
}

/// Totals over a set of warehouses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityTotals {
    pub total_capacity_kg: Decimal,
    pub total_stock_kg: Decimal,
    /// Unrounded percentage; callers round to the precision they display
    pub average_fill_rate: Decimal,
}

pub fn capacity_totals(warehouses: &[WarehouseSnapshot]) -> CapacityTotals {
    let total_capacity_kg: Decimal = warehouses.iter().map(|w| w.warehouse.max_capacity_kg).sum();
    let total_stock_kg: Decimal = warehouses.iter().map(|w| w.current_stock()).sum();
    let average_fill_rate = if total_capacity_kg > Decimal::ZERO {
        total_stock_kg / total_capacity_kg * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    CapacityTotals {
        total_capacity_kg,
        total_stock_kg,
        average_fill_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    fn stock(quantity: i64, threshold: i64) -> Stock {
        Stock {
            id: Uuid::new_v4(),
            warehouse_id: Uuid::nil(),
            crop_type: CropType::Maize,
            current_quantity_kg: dec(quantity),
            alert_threshold_kg: dec(threshold),
            updated_at: Utc::now(),
        }
    }

    fn snapshot(capacity: i64, stocks: Vec<Stock>) -> WarehouseSnapshot {
        WarehouseSnapshot {
            warehouse: Warehouse {
                id: Uuid::nil(),
                name: "Entrepôt Central".to_string(),
                arrondissement_id: Uuid::nil(),
                max_capacity_kg: dec(capacity),
                address: "Route de Parakou".to_string(),
                manager_id: None,
                photo_url: None,
                created_at: Utc::now(),
            },
            manager: None,
            stocks,
        }
    }

    #[test]
    fn test_entry_adds_quantity() {
        assert_eq!(apply_movement(dec(100), MovementDirection::In, dec(25)), Ok(dec(125)));
    }

    #[test]
    fn test_exit_requires_sufficient_stock() {
        assert_eq!(apply_movement(dec(100), MovementDirection::Out, dec(100)), Ok(dec(0)));
        assert_eq!(
            apply_movement(dec(100), MovementDirection::Out, dec(101)),
            Err(StockError::Insufficient {
                available: dec(100),
                requested: dec(101)
            })
        );
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        assert!(matches!(
            apply_movement(dec(10), MovementDirection::In, dec(0)),
            Err(StockError::NonPositiveQuantity(_))
        ));
    }

    #[test]
    fn test_unstorable_movements_rejected() {
        let sub_cent = Decimal::new(99_995, 3);
        assert_eq!(
            apply_movement(dec(100), MovementDirection::Out, sub_cent),
            Err(StockError::Unstorable(sub_cent))
        );
        assert!(matches!(
            apply_movement(dec(0), MovementDirection::In, Decimal::new(4, 3)),
            Err(StockError::Unstorable(_))
        ));

        let near_max = Decimal::new(9_999_999_900, 2);
        assert_eq!(
            apply_movement(near_max, MovementDirection::In, dec(1)),
            Err(StockError::Unstorable(near_max + dec(1)))
        );
        assert_eq!(
            apply_movement(near_max, MovementDirection::In, Decimal::new(99, 2)),
            Ok(crate::MAX_STORED_AMOUNT)
        );
    }

    #[test]
    fn test_alert_is_strict_and_fail_safe() {
        assert!(is_in_alert(Some(dec(50)), Some(dec(100))));
        assert!(!is_in_alert(Some(dec(100)), Some(dec(100))));
        assert!(!is_in_alert(None, Some(dec(100))));
        assert!(!is_in_alert(Some(dec(50)), None));
    }

    #[test]
    fn test_warehouse_scenario() {
        let warehouse = snapshot(1000, vec![stock(200, 50), stock(300, 50)]);
        assert_eq!(warehouse.current_stock(), dec(500));
        assert_eq!(warehouse.fill_rate(), dec(50));
        assert!(warehouse.alerting_stocks().is_empty());
    }

    #[test]
    fn test_fill_rate_without_capacity() {
        assert_eq!(fill_rate(dec(500), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_manager_fallbacks() {
        let warehouse = snapshot(1000, vec![]);
        assert_eq!(warehouse.manager_display_name(), UNASSIGNED_MANAGER);
        assert_eq!(warehouse.manager_phone(), "Non renseigné");
    }

    #[test]
    fn test_operator_name_fallback() {
        assert_eq!(operator_name("Koffi Adjo", "kadjo"), "Koffi Adjo");
        assert_eq!(operator_name("  ", "kadjo"), "kadjo");
    }
}
