use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per seat-slot. A row without a subscriber name is a placeholder
/// that only reserves the identifier.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OccupantRecord {
    pub id: i64,
    pub seat_number: String,
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub secondary_id: Option<String>,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub slot: Option<String>,
    pub plan_id: Option<i64>,
    pub join_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub fee_paid: bool,
}

impl OccupantRecord {
    /// Occupied means active with a non-empty subscriber name; everything
    /// else (inactive, placeholder) reads as available.
    pub fn is_occupied(&self) -> bool {
        self.is_active
            && self
                .name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty())
    }

    /// Base seat number with any `_n` sub-seat suffix stripped.
    pub fn base_seat(&self) -> &str {
        self.seat_number
            .split_once('_')
            .map_or(self.seat_number.as_str(), |(base, _)| base)
    }
}
