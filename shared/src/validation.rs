//! Validation utilities for AgriTech-Benin
//!
//! Plain checks return `Result<(), &'static str>`; the `*_rule` wrappers adapt
//! them to `validator` custom rules for derive-validated request bodies.

use rust_decimal::Decimal;
use validator::ValidationError;

// ============================================================================
// General Validations
// ============================================================================

/// Validate that a required text field is not blank
pub fn validate_required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        Err("This field is required")
    } else {
        Ok(())
    }
}

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format");
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err("Invalid email format");
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot be entirely numeric");
    }
    Ok(())
}

/// Validate username: 1-150 chars of letters, digits and @ . + - _
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.is_empty() || username.chars().count() > 150 {
        return Err("Username must be between 1 and 150 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("Username may only contain letters, digits and @/./+/-/_");
    }
    Ok(())
}

/// Largest value of a `NUMERIC(10, 2)` column: 99 999 999.99
pub const MAX_STORED_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Validate that an amount is stored exactly by a `NUMERIC(10, 2)` column
pub fn validate_storable(amount: Decimal) -> Result<(), &'static str> {
    if amount.normalize().scale() > 2 {
        return Err("At most two decimal places are allowed");
    }
    if amount.abs() > MAX_STORED_AMOUNT {
        return Err("Value must not exceed 99 999 999.99");
    }
    Ok(())
}

/// Validate that a quantity in kg is strictly positive and storable
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    validate_storable(quantity)
}

/// Validate a stock level or alert threshold in kg
pub fn validate_stock_level(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    validate_storable(quantity)
}

/// Validate a parcel area in hectares
pub fn validate_area(area: Decimal) -> Result<(), &'static str> {
    if area <= Decimal::ZERO {
        return Err("Area must be greater than zero");
    }
    validate_storable(area)
}

// ============================================================================
// Benin-Specific Validations
// ============================================================================

/// Validate Benin phone number format
/// Accepts: 97123456, 0197123456, +229 01 97 12 34 56, 0022997123456
pub fn validate_benin_phone(phone: &str) -> Result<(), &'static str> {
    if phone.len() > 20 {
        return Err("Phone number is too long");
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '.'))
    {
        return Err("Invalid Benin phone number format");
    }

    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = digits
        .strip_prefix("00229")
        .or_else(|| digits.strip_prefix("229").filter(|_| phone.trim_start().starts_with('+')))
        .unwrap_or(&digits);

    // Legacy 8-digit numbering
    if national.len() == 8 {
        return Ok(());
    }
    // 10-digit numbering since 2024 (prefix 01)
    if national.len() == 10 && national.starts_with("01") {
        return Ok(());
    }

    Err("Invalid Benin phone number format")
}

/// Departments of Benin
pub const BENIN_DEPARTMENTS: &[&str] = &[
    "Alibori",
    "Atacora",
    "Atlantique",
    "Borgou",
    "Collines",
    "Couffo",
    "Donga",
    "Littoral",
    "Mono",
    "Ouémé",
    "Plateau",
    "Zou",
];

/// Check whether a department name is one of Benin's twelve departments
pub fn is_benin_department(name: &str) -> bool {
    BENIN_DEPARTMENTS.iter().any(|d| d.eq_ignore_ascii_case(name.trim()))
}

// ============================================================================
// validator custom rules
// ============================================================================

fn rule(code: &'static str, result: Result<(), &'static str>) -> Result<(), ValidationError> {
    result.map_err(|message| {
        let mut error = ValidationError::new(code);
        error.message = Some(message.into());
        error
    })
}

pub fn required_rule(value: &str) -> Result<(), ValidationError> {
    rule("required", validate_required(value))
}

pub fn phone_rule(phone: &str) -> Result<(), ValidationError> {
    rule("phone", validate_benin_phone(phone))
}

pub fn password_rule(password: &str) -> Result<(), ValidationError> {
    rule("password", validate_password(password))
}

pub fn username_rule(username: &str) -> Result<(), ValidationError> {
    rule("username", validate_username(username))
}

pub fn positive_quantity_rule(quantity: &Decimal) -> Result<(), ValidationError> {
    rule("positive", validate_positive_quantity(*quantity))
}

pub fn stock_level_rule(quantity: &Decimal) -> Result<(), ValidationError> {
    rule("stock_level", validate_stock_level(*quantity))
}

pub fn area_rule(area: &Decimal) -> Result<(), ValidationError> {
    rule("area", validate_area(*area))
}
