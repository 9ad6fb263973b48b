//! Warehouse aggregation tests
//!
//! - Current stock, fill rate and alert lists per warehouse
//! - Capacity totals across the warehouses a user can see
//! - Manager contact shown on warehouse cards

use chrono::Utc;
use rust_decimal::Decimal;
use shared::{
    capacity_totals, CropType, ManagerContact, Stock, Warehouse, WarehouseSnapshot,
    UNASSIGNED_MANAGER,
};
use uuid::Uuid;

fn dec(n: i64) -> Decimal {
    Decimal::from(n)
}

fn stock(crop_type: CropType, quantity: i64, threshold: i64) -> Stock {
    Stock {
        id: Uuid::new_v4(),
        warehouse_id: Uuid::nil(),
        crop_type,
        current_quantity_kg: dec(quantity),
        alert_threshold_kg: dec(threshold),
        updated_at: Utc::now(),
    }
}

fn snapshot(capacity: i64, stocks: Vec<Stock>, manager: Option<ManagerContact>) -> WarehouseSnapshot {
    WarehouseSnapshot {
        warehouse: Warehouse {
            id: Uuid::new_v4(),
            name: "Magasin de Bohicon".to_string(),
            arrondissement_id: Uuid::new_v4(),
            max_capacity_kg: dec(capacity),
            address: "Route de Cana".to_string(),
            manager_id: manager.as_ref().map(|m| m.user_id),
            photo_url: None,
            created_at: Utc::now(),
        },
        manager,
        stocks,
    }
}

fn manager(phone: Option<&str>, email: &str) -> ManagerContact {
    ManagerContact {
        user_id: Uuid::new_v4(),
        username: "gest_bohicon".to_string(),
        full_name: "Afi Dossou".to_string(),
        email: email.to_string(),
        producer_phone: phone.map(str::to_string),
    }
}

#[test]
fn test_snapshot_totals() {
    let warehouse = snapshot(
        10_000,
        vec![
            stock(CropType::Maize, 2_000, 500),
            stock(CropType::Soy, 300, 500),
            stock(CropType::Pineapple, 500, 500),
        ],
        None,
    );

    assert_eq!(warehouse.current_stock(), dec(2_800));
    assert_eq!(warehouse.fill_rate(), dec(28));
    // Exactly at the threshold is not an alert
    let alerts = warehouse.alerting_stocks();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].crop_type, CropType::Soy);
}

#[test]
fn test_capacity_totals_across_warehouses() {
    let warehouses = vec![
        snapshot(1_000, vec![stock(CropType::Maize, 250, 100)], None),
        snapshot(3_000, vec![stock(CropType::Soy, 750, 100)], None),
    ];

    let totals = capacity_totals(&warehouses);
    assert_eq!(totals.total_capacity_kg, dec(4_000));
    assert_eq!(totals.total_stock_kg, dec(1_000));
    assert_eq!(totals.average_fill_rate, dec(25));
}

#[test]
fn test_capacity_totals_without_warehouses() {
    let totals = capacity_totals(&[]);
    assert_eq!(totals.total_capacity_kg, Decimal::ZERO);
    assert_eq!(totals.average_fill_rate, Decimal::ZERO);
}

#[test]
fn test_average_fill_rate_rounding() {
    let warehouses = vec![snapshot(3_000, vec![stock(CropType::Maize, 1_000, 0)], None)];
    let totals = capacity_totals(&warehouses);
    assert_eq!(totals.average_fill_rate.round_dp(1), Decimal::new(333, 1));
    assert_eq!(totals.average_fill_rate.round_dp(2), Decimal::new(3333, 2));
}

#[test]
fn test_manager_contact_display() {
    let unassigned = snapshot(1_000, vec![], None);
    assert_eq!(unassigned.manager_display_name(), UNASSIGNED_MANAGER);

    let with_phone = snapshot(1_000, vec![], Some(manager(Some("97123456"), "afi@agritech.bj")));
    assert_eq!(with_phone.manager_display_name(), "Afi Dossou");
    assert_eq!(with_phone.manager_phone(), "97123456");

    let email_only = snapshot(1_000, vec![], Some(manager(None, "afi@agritech.bj")));
    assert_eq!(email_only.manager_phone(), "afi@agritech.bj");
}
