//! Crop types, harvest records and yield computation

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Crops tracked by the cooperative. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CropType {
    #[serde(rename = "MAIS")]
    Maize,
    #[serde(rename = "SOJA")]
    Soy,
    #[serde(rename = "ANANAS")]
    Pineapple,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown crop type code: {0}")]
pub struct UnknownCropType(pub String);

impl CropType {
    pub const ALL: [CropType; 3] = [CropType::Maize, CropType::Soy, CropType::Pineapple];

    /// Stored code
    pub fn code(&self) -> &'static str {
        match self {
            CropType::Maize => "MAIS",
            CropType::Soy => "SOJA",
            CropType::Pineapple => "ANANAS",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CropType::Maize => "Maïs",
            CropType::Soy => "Soja",
            CropType::Pineapple => "Ananas",
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CropType {
    type Err = UnknownCropType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropType::ALL
            .into_iter()
            .find(|crop| crop.code() == s)
            .ok_or_else(|| UnknownCropType(s.to_string()))
    }
}

impl TryFrom<String> for CropType {
    type Error = UnknownCropType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Reference row for a crop type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropTypeInfo {
    pub id: Uuid,
    pub code: CropType,
    pub label: String,
    pub description: String,
}

/// A recorded harvest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Harvest {
    pub id: Uuid,
    pub producer_id: Uuid,
    pub parcel_id: Uuid,
    pub crop_type: CropType,
    pub quantity_kg: Decimal,
    pub harvest_date: NaiveDate,
    pub recorded_at: DateTime<Utc>,
    pub observations: String,
    pub photo_url: Option<String>,
}

/// Yield in kg per hectare, rounded to 2 decimal places.
///
/// A parcel with a zero or negative area yields 0 instead of failing.
pub fn crop_yield(quantity_kg: Decimal, area_hectares: Decimal) -> Decimal {
    if area_hectares > Decimal::ZERO {
        (quantity_kg / area_hectares).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Mean of per-harvest yields rounded to 2 decimal places, `None` when empty
pub fn average_yield<I>(yields: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let (sum, count) = yields
        .into_iter()
        .fold((Decimal::ZERO, 0u32), |(sum, count), y| (sum + y, count + 1));

    if count == 0 {
        None
    } else {
        Some((sum / Decimal::from(count)).round_dp(2))
    }
}
