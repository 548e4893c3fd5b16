//! Equipment catalog model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Equipment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EquipmentCategory {
    Mechanical,
    Electronics,
    Testing,
    Computing,
    Manufacturing,
}

impl EquipmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::Mechanical => "Mechanical",
            EquipmentCategory::Electronics => "Electronics",
            EquipmentCategory::Testing => "Testing",
            EquipmentCategory::Computing => "Computing",
            EquipmentCategory::Manufacturing => "Manufacturing",
        }
    }
}

impl std::fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mechanical" => Ok(EquipmentCategory::Mechanical),
            "Electronics" => Ok(EquipmentCategory::Electronics),
            "Testing" => Ok(EquipmentCategory::Testing),
            "Computing" => Ok(EquipmentCategory::Computing),
            "Manufacturing" => Ok(EquipmentCategory::Manufacturing),
            _ => Err(format!("Invalid equipment category: {}", s)),
        }
    }
}

// SQLx conversion for EquipmentCategory (stored as text)
impl sqlx::Type<Postgres> for EquipmentCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for EquipmentCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for EquipmentCategory {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Equipment catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub category: EquipmentCategory,
    pub location: String,
    /// Capacity: number of units owned
    pub total_quantity: i32,
    /// Currently bookable units, 0 <= available_quantity <= total_quantity
    pub available_quantity: i32,
    /// Free-form key/value specification sheet
    #[schema(value_type = Option<Object>)]
    pub specifications: Option<serde_json::Value>,
    pub requires_training: bool,
    /// Declared booking-duration ceiling in hours; informational only
    pub max_booking_duration_hours: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short equipment representation embedded in reservation views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentShort {
    pub id: i32,
    pub name: String,
    pub category: EquipmentCategory,
    pub location: String,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    pub category: EquipmentCategory,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    #[validate(range(min = 1, message = "Total quantity must be at least 1"))]
    pub total_quantity: i32,
    #[schema(value_type = Option<Object>)]
    pub specifications: Option<serde_json::Value>,
    #[serde(default)]
    pub requires_training: bool,
    pub max_booking_duration_hours: Option<i32>,
}

/// Update equipment request (partial)
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<EquipmentCategory>,
    pub location: Option<String>,
    pub total_quantity: Option<i32>,
    pub available_quantity: Option<i32>,
    #[schema(value_type = Option<Object>)]
    pub specifications: Option<serde_json::Value>,
    pub requires_training: Option<bool>,
    pub max_booking_duration_hours: Option<i32>,
}

/// Equipment listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    /// Filter by category
    pub category: Option<EquipmentCategory>,
    /// Case-insensitive substring match over name and description
    pub search: Option<String>,
    /// When true, only equipment with available_quantity > 0
    pub available: Option<bool>,
}
