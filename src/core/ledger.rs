use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{OccupantRecord, SubscriptionPlan};
use crate::store::{NewRecord, RecordPatch, RecordStore};

use super::seat_id::{validate_seat_id, SectionLayout};

/// Reference to a subscription plan by id or by name; resolved against the
/// plan collection before any binding changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlanRef {
    Id(i64),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct NewOccupant {
    pub name: String,
    pub national_id: String,
    pub plan: PlanRef,
    pub slot: Option<String>,
    pub secondary_id: Option<String>,
    pub father_name: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub fee_paid: bool,
    pub join_date: Option<DateTime<Utc>>,
}

/// Enumerated update intents. Each variant's validation and side effects are
/// total, instead of being inferred from which fields a patch happens to
/// carry.
#[derive(Debug, Clone)]
pub enum SeatUpdate {
    ReassignOccupant(NewOccupant),
    ToggleActive(bool),
    SetFeePaid(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeatStatus {
    Available,
    Occupied,
}

/// Point-in-time view of one seat: the base record plus any sub-seat
/// occupants sharing it.
#[derive(Debug, Serialize)]
pub struct SeatView {
    pub seat_number: String,
    pub section: char,
    pub status: SeatStatus,
    pub occupants: Vec<OccupantRecord>,
}

/// The record store abstraction over seat-slot rows. All operations are
/// check-then-write; the narrow race windows are closed by the store's
/// unique constraints, which surface as `Conflict`.
#[derive(Clone)]
pub struct OccupancyLedger {
    store: Arc<dyn RecordStore>,
    layout: SectionLayout,
}

impl OccupancyLedger {
    pub fn new(store: Arc<dyn RecordStore>, layout: SectionLayout) -> Self {
        Self { store, layout }
    }

    async fn resolve_plan(&self, plan: &PlanRef) -> Result<SubscriptionPlan, CoreError> {
        let found = match plan {
            PlanRef::Id(id) => self.store.find_plan_by_id(*id).await?,
            PlanRef::Name(name) => self.store.find_plan_by_name(name).await?,
        };
        found.ok_or_else(|| CoreError::NotFound("Subscription plan not found".to_string()))
    }

    fn require_subscriber_fields(occ: &NewOccupant) -> Result<(), CoreError> {
        if occ.name.trim().is_empty() {
            return Err(CoreError::Validation("Subscriber name is required".to_string()));
        }
        if occ.national_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "Subscriber national id is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Binds a subscriber to an exact seat id, reactivating a placeholder or
    /// previously released row when one exists at that id.
    pub async fn allocate(
        &self,
        seat: &str,
        occ: NewOccupant,
    ) -> Result<OccupantRecord, CoreError> {
        let seat = validate_seat_id(seat, &self.layout)?.to_string();
        Self::require_subscriber_fields(&occ)?;
        let plan = self.resolve_plan(&occ.plan).await?;

        let existing = self.store.find_by_seat(&seat).await?;
        if let Some(current) = &existing {
            if current.is_occupied()
                && current.national_id.as_deref() != Some(occ.national_id.as_str())
            {
                return Err(CoreError::Conflict(format!(
                    "Seat {seat} is already occupied by {}",
                    current.name.as_deref().unwrap_or("another subscriber")
                )));
            }
        }
        if let Some(elsewhere) = self
            .store
            .find_active_by_national_id(&occ.national_id)
            .await?
        {
            if elsewhere.seat_number != seat {
                return Err(CoreError::Conflict(format!(
                    "Subscriber with this national id already holds seat {}",
                    elsewhere.seat_number
                )));
            }
        }

        let prior_plan = existing
            .as_ref()
            .filter(|r| r.is_occupied())
            .and_then(|r| r.plan_id);
        let join_date = occ.join_date.unwrap_or_else(Utc::now);

        let record = match &existing {
            Some(_) => self
                .store
                .update_by_seat(&seat, Self::bind_patch(&occ, plan.id, join_date))
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found")))?,
            None => {
                self.store
                    .insert_occupant(Self::bind_record(&seat, &occ, plan.id, join_date))
                    .await?
            }
        };

        if prior_plan != Some(plan.id) {
            if let Some(old) = prior_plan {
                self.store.adjust_plan_subscribers(old, -1).await?;
            }
            self.store.adjust_plan_subscribers(plan.id, 1).await?;
        }
        Ok(record)
    }

    /// Registers a bare placeholder row, reserving the identifier with no
    /// subscriber. Returns the existing row unchanged when the id is already
    /// registered but available.
    pub async fn register_placeholder(&self, seat: &str) -> Result<OccupantRecord, CoreError> {
        let seat = validate_seat_id(seat, &self.layout)?.to_string();
        if let Some(existing) = self.store.find_by_seat(&seat).await? {
            if existing.is_occupied() {
                return Err(CoreError::Conflict(format!(
                    "Seat {seat} is already occupied by {}",
                    existing.name.as_deref().unwrap_or("another subscriber")
                )));
            }
            return Ok(existing);
        }
        let record = self
            .store
            .insert_occupant(NewRecord {
                seat_number: seat,
                join_date: Some(Utc::now()),
                ..NewRecord::default()
            })
            .await?;
        Ok(record)
    }

    /// Flips the record inactive, keeping every other field for history.
    /// Releasing an already-inactive record is a no-op success.
    pub async fn release(&self, seat: &str) -> Result<OccupantRecord, CoreError> {
        let existing = self
            .store
            .find_by_seat(seat)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found")))?;
        if !existing.is_active {
            return Ok(existing);
        }
        self.store
            .update_by_seat(seat, RecordPatch { is_active: Some(false), ..RecordPatch::default() })
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found")))
    }

    /// Adds another occupant to a physical seat by generating the next
    /// sub-seat suffix: bare base id when the family is empty, `_<count+1>`
    /// otherwise, so the suffix sequence stays gap-free from `_2`.
    pub async fn add_to_shared_seat(
        &self,
        base: &str,
        occ: NewOccupant,
    ) -> Result<OccupantRecord, CoreError> {
        let id = validate_seat_id(base, &self.layout)?;
        if !id.is_base() {
            return Err(CoreError::Validation(
                "Expected a base seat number, not a sub-seat id".to_string(),
            ));
        }
        let base = id.to_string();
        Self::require_subscriber_fields(&occ)?;

        if let Some(active) = self
            .store
            .find_active_by_national_id(&occ.national_id)
            .await?
        {
            return Err(CoreError::Conflict(format!(
                "Subscriber with this national id already holds seat {}",
                active.seat_number
            )));
        }
        let plan = self.resolve_plan(&occ.plan).await?;

        let family = self.store.find_seat_family(&base).await?;
        let seat_number = if family.is_empty() {
            base.clone()
        } else {
            format!("{}_{}", base, family.len() + 1)
        };
        // the count and the write race; re-check the generated id before
        // writing so a lost race reads as a conflict, not an overwrite
        if self.store.find_by_seat(&seat_number).await?.is_some() {
            return Err(CoreError::Conflict(format!(
                "Seat slot {seat_number} was taken concurrently"
            )));
        }

        let join_date = occ.join_date.unwrap_or_else(Utc::now);
        let record = self
            .store
            .insert_occupant(Self::bind_record(&seat_number, &occ, plan.id, join_date))
            .await?;
        self.store.adjust_plan_subscribers(plan.id, 1).await?;
        Ok(record)
    }

    /// Applies one enumerated update intent to the record at `seat`.
    pub async fn update(
        &self,
        seat: &str,
        update: SeatUpdate,
    ) -> Result<OccupantRecord, CoreError> {
        match update {
            SeatUpdate::ToggleActive(active) => self
                .store
                .update_by_seat(
                    seat,
                    RecordPatch { is_active: Some(active), ..RecordPatch::default() },
                )
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found"))),
            SeatUpdate::SetFeePaid(paid) => self
                .store
                .update_by_seat(
                    seat,
                    RecordPatch { fee_paid: Some(paid), ..RecordPatch::default() },
                )
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found"))),
            SeatUpdate::ReassignOccupant(occ) => {
                Self::require_subscriber_fields(&occ)?;
                let plan = self.resolve_plan(&occ.plan).await?;
                let existing = self
                    .store
                    .find_by_seat(seat)
                    .await?
                    .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found")))?;
                if let Some(elsewhere) = self
                    .store
                    .find_active_by_national_id(&occ.national_id)
                    .await?
                {
                    if elsewhere.seat_number != seat {
                        return Err(CoreError::Conflict(format!(
                            "Subscriber with this national id already holds seat {}",
                            elsewhere.seat_number
                        )));
                    }
                }

                let prior_plan = existing
                    .is_occupied()
                    .then_some(existing.plan_id)
                    .flatten();
                let join_date = occ.join_date.unwrap_or_else(Utc::now);
                let record = self
                    .store
                    .update_by_seat(seat, Self::bind_patch(&occ, plan.id, join_date))
                    .await?
                    .ok_or_else(|| CoreError::NotFound(format!("Seat {seat} not found")))?;

                // the same operation that changes the binding keeps the
                // plan-level subscriber counts consistent
                if prior_plan != Some(plan.id) {
                    if let Some(old) = prior_plan {
                        self.store.adjust_plan_subscribers(old, -1).await?;
                    }
                    self.store.adjust_plan_subscribers(plan.id, 1).await?;
                }
                Ok(record)
            }
        }
    }

    /// Permanently deletes the row, reclaiming the identifier. Refused while
    /// the record is active.
    pub async fn remove(&self, seat: &str) -> Result<u64, CoreError> {
        let seat = validate_seat_id(seat, &self.layout)?.to_string();
        if let Some(existing) = self.store.find_by_seat(&seat).await? {
            if existing.is_active {
                return Err(CoreError::Conflict(
                    "Cannot delete a seat currently held by an active subscriber".to_string(),
                ));
            }
        }
        let deleted = self.store.delete_by_seat(&seat).await?;
        if deleted == 0 {
            return Err(CoreError::NotFound(format!("Seat {seat} not found")));
        }
        Ok(deleted)
    }

    /// The seat and everyone sharing it; an empty family reads as the
    /// "Available" shape.
    pub async fn get_by_seat(&self, seat: &str) -> Result<SeatView, CoreError> {
        let id = validate_seat_id(seat, &self.layout)?;
        let occupants = self.store.find_seat_family(&id.to_string()).await?;
        let status = if occupants.iter().any(|r| r.is_occupied()) {
            SeatStatus::Occupied
        } else {
            SeatStatus::Available
        };
        Ok(SeatView {
            seat_number: id.to_string(),
            section: id.section,
            status,
            occupants,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<OccupantRecord>, CoreError> {
        Ok(self.store.list_occupants().await?)
    }

    fn bind_record(
        seat: &str,
        occ: &NewOccupant,
        plan_id: i64,
        join_date: DateTime<Utc>,
    ) -> NewRecord {
        NewRecord {
            seat_number: seat.to_string(),
            name: Some(occ.name.clone()),
            national_id: Some(occ.national_id.clone()),
            secondary_id: occ.secondary_id.clone(),
            father_name: occ.father_name.clone(),
            address: occ.address.clone(),
            age: occ.age,
            slot: occ.slot.clone(),
            plan_id: Some(plan_id),
            join_date: Some(join_date),
            is_active: true,
            fee_paid: occ.fee_paid,
        }
    }

    fn bind_patch(occ: &NewOccupant, plan_id: i64, join_date: DateTime<Utc>) -> RecordPatch {
        RecordPatch {
            name: Some(occ.name.clone()),
            national_id: Some(occ.national_id.clone()),
            secondary_id: occ.secondary_id.clone(),
            father_name: occ.father_name.clone(),
            address: occ.address.clone(),
            age: occ.age,
            slot: occ.slot.clone(),
            plan_id: Some(plan_id),
            join_date: Some(join_date),
            is_active: Some(true),
            fee_paid: Some(occ.fee_paid),
        }
    }
}
