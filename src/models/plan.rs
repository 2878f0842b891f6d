use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: i64,
    pub plan_name: String,
    pub price: f64,
    /// Free text, e.g. "1 month", "2 weeks". Parsed by core::expiry.
    pub duration: String,
    pub subscribers: i32,
    pub is_active: bool,
}
