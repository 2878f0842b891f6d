use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::error::CoreError;
use crate::models::OccupantRecord;
use crate::store::{NewRecord, RecordStore};

use super::seat_id::{SeatId, SectionLayout};

/// Section capacity as a pure function over the current record set: the
/// guaranteed minimum or the highest observed index, whichever is larger.
/// Recomputed per call, never cached, and counts active and inactive rows
/// alike so capacity never shrinks beneath what was ever registered.
pub fn observed_capacity(section: char, min_capacity: u32, records: &[OccupantRecord]) -> u32 {
    records
        .iter()
        .filter_map(|r| SeatId::parse(&r.seat_number))
        .filter(|id| id.section == section)
        .map(|id| id.index)
        .fold(min_capacity, u32::max)
}

/// Ordered available ids 1..=capacity, excluding ids with an active record
/// at that exact id. Restartable and finite.
pub fn available_in_section(
    section: char,
    min_capacity: u32,
    records: &[OccupantRecord],
) -> Vec<String> {
    let capacity = observed_capacity(section, min_capacity, records);
    let actively_held: HashSet<&str> = records
        .iter()
        .filter(|r| r.is_active)
        .map(|r| r.seat_number.as_str())
        .collect();
    (1..=capacity)
        .map(|i| format!("{section}{i}"))
        .filter(|id| !actively_held.contains(id.as_str()))
        .collect()
}

/// Enumerates which seat identifiers exist or should exist per section.
#[derive(Clone)]
pub struct SeatRegistry {
    store: Arc<dyn RecordStore>,
    layout: SectionLayout,
}

impl SeatRegistry {
    pub fn new(store: Arc<dyn RecordStore>, layout: SectionLayout) -> Self {
        Self { store, layout }
    }

    pub async fn section_capacity(&self, section: char) -> Result<u32, CoreError> {
        let rule = self
            .layout
            .rule(section)
            .ok_or_else(|| CoreError::Validation(format!("Unknown section {section}")))?;
        let records = self.store.list_occupants().await?;
        Ok(observed_capacity(section, rule.min_capacity, &records))
    }

    /// Available ids for one section, or for every configured section in
    /// layout order.
    pub async fn available_seats(&self, section: Option<char>) -> Result<Vec<String>, CoreError> {
        if let Some(s) = section {
            if self.layout.rule(s).is_none() {
                return Err(CoreError::Validation(format!("Unknown section {s}")));
            }
        }
        let records = self.store.list_occupants().await?;
        let mut available = Vec::new();
        for rule in self.layout.sections() {
            if section.is_none_or(|s| s == rule.letter) {
                available.extend(available_in_section(rule.letter, rule.min_capacity, &records));
            }
        }
        Ok(available)
    }

    /// Seeds placeholder rows 1..=minimum for a section that has no records
    /// at all yet. Once any record exists for the section (even a single
    /// one) this never runs again, so it is safe to call at every startup.
    pub async fn ensure_default_seats(
        &self,
        section: char,
        minimum: u32,
    ) -> Result<u64, CoreError> {
        if self.store.count_section_records(section).await? > 0 {
            return Ok(0);
        }
        let now = Utc::now();
        let rows: Vec<NewRecord> = (1..=minimum)
            .map(|i| NewRecord {
                seat_number: format!("{section}{i}"),
                join_date: Some(now),
                ..NewRecord::default()
            })
            .collect();
        Ok(self.store.insert_occupants(rows).await?)
    }

    /// Seeds every configured section to its guaranteed minimum.
    pub async fn ensure_all_default_seats(&self) -> Result<u64, CoreError> {
        let mut created = 0;
        for rule in self.layout.sections().to_vec() {
            created += self.ensure_default_seats(rule.letter, rule.min_capacity).await?;
        }
        Ok(created)
    }
}
