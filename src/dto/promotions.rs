use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{DiscountType, Promotion};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidatePromotionRequest {
    pub code: String,
    /// Cart total in cents.
    pub order_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PromotionSummary {
    pub code: String,
    pub name: String,
    pub discount_type: String,
    pub discount_value: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePromotionRequest {
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub min_order_amount: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePromotionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub discount_value: Option<i64>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub min_order_amount: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PromotionList {
    pub items: Vec<Promotion>,
}

fn default_active() -> bool {
    true
}
