pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{Admin, OccupantRecord, SubscriptionPlan};

#[derive(Debug, Clone, Default)]
pub struct NewRecord {
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

/// Field-wise changes for update-by-filter. `None` leaves a field unchanged;
/// callers never clear fields through a patch.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub secondary_id: Option<String>,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub slot: Option<String>,
    pub plan_id: Option<i64>,
    pub join_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub fee_paid: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub plan_name: String,
    pub price: f64,
    pub duration: String,
    pub subscribers: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PlanPatch {
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub subscribers: Option<i32>,
    pub is_active: Option<bool>,
}

/// The document-store contract required by the core: exact-field lookup,
/// seat-family lookup, insert with unique violations reported distinctly,
/// update-by-filter returning the post-update row, delete returning a count,
/// and bulk insert. The store enforces uniqueness of seat numbers, active
/// subscriber national ids (sparse) and plan names.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- seat-slot records ---
    async fn find_by_seat(&self, seat: &str) -> Result<Option<OccupantRecord>, StoreError>;
    /// All records for a base seat: the bare id plus any `_n` sub-seats,
    /// in insertion order.
    async fn find_seat_family(&self, base: &str) -> Result<Vec<OccupantRecord>, StoreError>;
    async fn find_active_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<OccupantRecord>, StoreError>;
    /// Count of records whose id belongs to the section, regardless of state.
    async fn count_section_records(&self, section: char) -> Result<u64, StoreError>;
    async fn list_occupants(&self) -> Result<Vec<OccupantRecord>, StoreError>;
    async fn insert_occupant(&self, rec: NewRecord) -> Result<OccupantRecord, StoreError>;
    async fn insert_occupants(&self, recs: Vec<NewRecord>) -> Result<u64, StoreError>;
    async fn update_by_seat(
        &self,
        seat: &str,
        patch: RecordPatch,
    ) -> Result<Option<OccupantRecord>, StoreError>;
    async fn delete_by_seat(&self, seat: &str) -> Result<u64, StoreError>;

    // --- subscription plans ---
    async fn find_plan_by_id(&self, id: i64) -> Result<Option<SubscriptionPlan>, StoreError>;
    async fn find_plan_by_name(&self, name: &str)
        -> Result<Option<SubscriptionPlan>, StoreError>;
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, StoreError>;
    async fn insert_plan(&self, plan: NewPlan) -> Result<SubscriptionPlan, StoreError>;
    async fn update_plan_by_name(
        &self,
        name: &str,
        patch: PlanPatch,
    ) -> Result<Option<SubscriptionPlan>, StoreError>;
    async fn delete_plan(&self, id: i64) -> Result<u64, StoreError>;
    async fn adjust_plan_subscribers(&self, id: i64, delta: i32) -> Result<(), StoreError>;

    // --- admins ---
    async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, StoreError>;
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;
    async fn count_admins(&self) -> Result<u64, StoreError>;
    async fn insert_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError>;
}
