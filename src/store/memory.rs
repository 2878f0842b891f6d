//! In-memory store used by the core test-suite. Mirrors the constraints the
//! Postgres schema enforces: unique seat numbers, unique plan names, and a
//! sparse uniqueness rule on national ids of active rows.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Admin, OccupantRecord, SubscriptionPlan};

use super::{NewPlan, NewRecord, PlanPatch, RecordPatch, RecordStore};

#[derive(Default)]
struct MemState {
    occupants: Vec<OccupantRecord>,
    plans: Vec<SubscriptionPlan>,
    admins: Vec<Admin>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemRecordStore {
    state: Mutex<MemState>,
}

impl MemRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_family(seat_number: &str, base: &str) -> bool {
    seat_number == base || seat_number.starts_with(&format!("{base}_"))
}

fn apply_patch(rec: &mut OccupantRecord, patch: &RecordPatch) {
    if let Some(v) = &patch.name {
        rec.name = Some(v.clone());
    }
    if let Some(v) = &patch.national_id {
        rec.national_id = Some(v.clone());
    }
    if let Some(v) = &patch.secondary_id {
        rec.secondary_id = Some(v.clone());
    }
    if let Some(v) = &patch.father_name {
        rec.father_name = Some(v.clone());
    }
    if let Some(v) = &patch.address {
        rec.address = Some(v.clone());
    }
    if let Some(v) = patch.age {
        rec.age = Some(v);
    }
    if let Some(v) = &patch.slot {
        rec.slot = Some(v.clone());
    }
    if let Some(v) = patch.plan_id {
        rec.plan_id = Some(v);
    }
    if let Some(v) = patch.join_date {
        rec.join_date = Some(v);
    }
    if let Some(v) = patch.is_active {
        rec.is_active = v;
    }
    if let Some(v) = patch.fee_paid {
        rec.fee_paid = v;
    }
}

#[async_trait]
impl RecordStore for MemRecordStore {
    async fn find_by_seat(&self, seat: &str) -> Result<Option<OccupantRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .occupants
            .iter()
            .find(|r| r.seat_number == seat)
            .cloned())
    }

    async fn find_seat_family(&self, base: &str) -> Result<Vec<OccupantRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .occupants
            .iter()
            .filter(|r| in_family(&r.seat_number, base))
            .cloned()
            .collect())
    }

    async fn find_active_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<OccupantRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .occupants
            .iter()
            .find(|r| r.is_active && r.national_id.as_deref() == Some(national_id))
            .cloned())
    }

    async fn count_section_records(&self, section: char) -> Result<u64, StoreError> {
        let state = self.state.lock().unwrap();
        let count = state
            .occupants
            .iter()
            .filter(|r| {
                let mut chars = r.seat_number.chars();
                chars.next() == Some(section)
                    && chars.next().is_some_and(|c| c.is_ascii_digit())
            })
            .count();
        Ok(count as u64)
    }

    async fn list_occupants(&self) -> Result<Vec<OccupantRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.occupants.clone())
    }

    async fn insert_occupant(&self, rec: NewRecord) -> Result<OccupantRecord, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.occupants.iter().any(|r| r.seat_number == rec.seat_number) {
            return Err(StoreError::UniqueViolation("seat_number".to_string()));
        }
        if rec.is_active {
            if let Some(nid) = &rec.national_id {
                if state
                    .occupants
                    .iter()
                    .any(|r| r.is_active && r.national_id.as_deref() == Some(nid))
                {
                    return Err(StoreError::UniqueViolation("national_id".to_string()));
                }
            }
        }
        state.next_id += 1;
        let row = OccupantRecord {
            id: state.next_id,
            seat_number: rec.seat_number,
            name: rec.name,
            national_id: rec.national_id,
            secondary_id: rec.secondary_id,
            father_name: rec.father_name,
            address: rec.address,
            age: rec.age,
            slot: rec.slot,
            plan_id: rec.plan_id,
            join_date: rec.join_date,
            is_active: rec.is_active,
            fee_paid: rec.fee_paid,
        };
        state.occupants.push(row.clone());
        Ok(row)
    }

    async fn insert_occupants(&self, recs: Vec<NewRecord>) -> Result<u64, StoreError> {
        let mut inserted = 0u64;
        for rec in recs {
            self.insert_occupant(rec).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn update_by_seat(
        &self,
        seat: &str,
        patch: RecordPatch,
    ) -> Result<Option<OccupantRecord>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(idx) = state.occupants.iter().position(|r| r.seat_number == seat) else {
            return Ok(None);
        };
        let mut updated = state.occupants[idx].clone();
        apply_patch(&mut updated, &patch);
        if updated.is_active {
            if let Some(nid) = updated.national_id.as_deref() {
                let clash = state.occupants.iter().enumerate().any(|(i, r)| {
                    i != idx && r.is_active && r.national_id.as_deref() == Some(nid)
                });
                if clash {
                    return Err(StoreError::UniqueViolation("national_id".to_string()));
                }
            }
        }
        state.occupants[idx] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete_by_seat(&self, seat: &str) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.occupants.len();
        state.occupants.retain(|r| r.seat_number != seat);
        Ok((before - state.occupants.len()) as u64)
    }

    /* ---------- PLANS ---------- */

    async fn find_plan_by_id(&self, id: i64) -> Result<Option<SubscriptionPlan>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.plans.iter().find(|p| p.id == id).cloned())
    }

    async fn find_plan_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SubscriptionPlan>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.plans.iter().find(|p| p.plan_name == name).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.plans.clone())
    }

    async fn insert_plan(&self, plan: NewPlan) -> Result<SubscriptionPlan, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.plans.iter().any(|p| p.plan_name == plan.plan_name) {
            return Err(StoreError::UniqueViolation("plan_name".to_string()));
        }
        state.next_id += 1;
        let row = SubscriptionPlan {
            id: state.next_id,
            plan_name: plan.plan_name,
            price: plan.price,
            duration: plan.duration,
            subscribers: plan.subscribers,
            is_active: plan.is_active,
        };
        state.plans.push(row.clone());
        Ok(row)
    }

    async fn update_plan_by_name(
        &self,
        name: &str,
        patch: PlanPatch,
    ) -> Result<Option<SubscriptionPlan>, StoreError> {
        let mut state = self.state.lock().unwrap();
        let Some(plan) = state.plans.iter_mut().find(|p| p.plan_name == name) else {
            return Ok(None);
        };
        if let Some(v) = patch.price {
            plan.price = v;
        }
        if let Some(v) = &patch.duration {
            plan.duration = v.clone();
        }
        if let Some(v) = patch.subscribers {
            plan.subscribers = v;
        }
        if let Some(v) = patch.is_active {
            plan.is_active = v;
        }
        Ok(Some(plan.clone()))
    }

    async fn delete_plan(&self, id: i64) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let before = state.plans.len();
        state.plans.retain(|p| p.id != id);
        Ok((before - state.plans.len()) as u64)
    }

    async fn adjust_plan_subscribers(&self, id: i64, delta: i32) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(plan) = state.plans.iter_mut().find(|p| p.id == id) {
            plan.subscribers = (plan.subscribers + delta).max(0);
        }
        Ok(())
    }

    /* ---------- ADMINS ---------- */

    async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn count_admins(&self) -> Result<u64, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.admins.len() as u64)
    }

    async fn insert_admin(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.admins.iter().any(|a| a.email == email) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }
        state.next_id += 1;
        let row = Admin {
            id: state.next_id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.admins.push(row.clone());
        Ok(row)
    }
}
