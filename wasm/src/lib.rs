//! WebAssembly module for AgriTech-Benin
//!
//! Lets the browser forms preview what the server will compute:
//! - Yield per hectare of a harvest
//! - Alert state and fill rate of a stock
//! - The quantity left after a movement, or the refusal message

use rust_decimal::Decimal;
use shared::{MovementDirection, StockError};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("agritech-wasm ready"));
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim().replace(',', ".").as_str())
        .map_err(|_| format!("Nombre invalide : {}", value))
}

fn optional_decimal(value: &str) -> Option<Decimal> {
    if value.trim().is_empty() {
        None
    } else {
        parse_decimal(value).ok()
    }
}

fn to_js(result: Result<Decimal, String>) -> Result<String, JsValue> {
    result.map(|d| d.to_string()).map_err(|e| {
        web_sys::console::warn_1(&JsValue::from_str(&e));
        JsValue::from_str(&e)
    })
}

fn yield_of(quantity_kg: &str, area_hectares: &str) -> Result<Decimal, String> {
    Ok(shared::crop_yield(
        parse_decimal(quantity_kg)?,
        parse_decimal(area_hectares)?,
    ))
}

fn fill_rate_of(stock_kg: &str, capacity_kg: &str) -> Result<Decimal, String> {
    Ok(shared::fill_rate(
        parse_decimal(stock_kg)?,
        parse_decimal(capacity_kg)?,
    ))
}

fn movement_result(current_kg: &str, direction: &str, quantity_kg: &str) -> Result<Decimal, String> {
    let direction = MovementDirection::from_str(direction.trim()).map_err(|e| e.to_string())?;
    let current = parse_decimal(current_kg)?;
    let quantity = parse_decimal(quantity_kg)?;

    shared::apply_movement(current, direction, quantity).map_err(|e| match e {
        StockError::Insufficient { .. } => "Quantité insuffisante en stock!".to_string(),
        StockError::NonPositiveQuantity(_) => "La quantité doit être positive.".to_string(),
        StockError::Unstorable(_) => {
            "La quantité doit avoir au plus deux décimales et ne pas dépasser 99 999 999,99 kg."
                .to_string()
        }
    })
}

/// Yield in kg/ha as a decimal string, "0" for a parcel without area
#[wasm_bindgen(js_name = cropYield)]
pub fn crop_yield(quantity_kg: &str, area_hectares: &str) -> Result<String, JsValue> {
    to_js(yield_of(quantity_kg, area_hectares))
}

/// Empty or unreadable values never put a stock in alert
#[wasm_bindgen(js_name = isInAlert)]
pub fn is_in_alert(current_kg: &str, threshold_kg: &str) -> bool {
    shared::is_in_alert(optional_decimal(current_kg), optional_decimal(threshold_kg))
}

#[wasm_bindgen(js_name = fillRate)]
pub fn fill_rate(stock_kg: &str, capacity_kg: &str) -> Result<String, JsValue> {
    to_js(fill_rate_of(stock_kg, capacity_kg))
}

/// Quantity left after an `ENTREE` or `SORTIE`; rejects exits the stock cannot cover
#[wasm_bindgen(js_name = previewMovement)]
pub fn preview_movement(current_kg: &str, direction: &str, quantity_kg: &str) -> Result<String, JsValue> {
    to_js(movement_result(current_kg, direction, quantity_kg))
}

/// Crop codes accepted by the harvest and stock forms
#[wasm_bindgen(js_name = cropTypes)]
pub fn crop_types() -> js_sys::Array {
    shared::CropType::ALL
        .iter()
        .map(|crop| JsValue::from_str(crop.code()))
        .collect()
}

#[wasm_bindgen(js_name = isValidPhone)]
pub fn is_valid_phone(phone: &str) -> bool {
    shared::validate_benin_phone(phone).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yield_preview() {
        assert_eq!(yield_of("150", "3").unwrap(), Decimal::from(50));
        assert_eq!(yield_of("1000", "2,5").unwrap(), Decimal::from(400));
        assert_eq!(yield_of("500", "0").unwrap(), Decimal::ZERO);
        assert!(yield_of("beaucoup", "1").is_err());
    }

    #[test]
    fn test_alert_preview() {
        assert!(is_in_alert("40", "50"));
        assert!(!is_in_alert("50", "50"));
        assert!(!is_in_alert("", "50"));
        assert!(!is_in_alert("40", ""));
    }

    #[test]
    fn test_fill_rate_preview() {
        assert_eq!(fill_rate_of("2500", "10000").unwrap(), Decimal::from(25));
        assert_eq!(fill_rate_of("10", "0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_movement_preview() {
        assert_eq!(movement_result("100", "ENTREE", "50").unwrap(), Decimal::from(150));
        assert_eq!(movement_result("100", "SORTIE", "100").unwrap(), Decimal::ZERO);
        assert_eq!(
            movement_result("100", "SORTIE", "150").unwrap_err(),
            "Quantité insuffisante en stock!"
        );
        assert!(movement_result("100", "TRANSFERT", "1").is_err());
        assert!(movement_result("100", "ENTREE", "0").is_err());
        assert_eq!(
            movement_result("100", "SORTIE", "99,995").unwrap_err(),
            "La quantité doit avoir au plus deux décimales et ne pas dépasser 99 999 999,99 kg."
        );
    }
}
