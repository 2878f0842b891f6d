use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::models::{OccupantRecord, SubscriptionPlan};
use crate::store::RecordStore;

use super::expiry::{classify_bucket, compute_expiry, days_until, ExpiryBucket};
use super::ledger::SeatStatus;
use super::registry::observed_capacity;
use super::seat_id::{SeatId, SectionLayout};

#[derive(Debug, Serialize)]
pub struct SectionStats {
    pub section: char,
    pub total: u32,
    pub occupied: u32,
    pub available: u32,
}

#[derive(Debug, Serialize)]
pub struct SeatOccupantDetail {
    pub name: String,
    pub plan: Option<String>,
    pub slot: Option<String>,
    pub national_id: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub fee_paid: bool,
}

#[derive(Debug, Serialize)]
pub struct SeatDetail {
    pub seat_number: String,
    pub section: char,
    pub status: SeatStatus,
    /// Primary occupant's name, or None for an available seat.
    pub student_name: Option<String>,
    pub plan: Option<String>,
    pub joining_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub fee_paid: bool,
    pub student_count: usize,
    pub students: Vec<SeatOccupantDetail>,
}

#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub total_seats: u32,
    pub occupied_seats: u32,
    pub available_seats: u32,
    pub sections: Vec<SectionStats>,
    pub seats: Vec<SeatDetail>,
}

#[derive(Debug, Serialize)]
pub struct ForecastEntry {
    pub subscriber_name: String,
    pub seat_number: String,
    pub expiry_date: NaiveDate,
    pub days_left: i64,
    pub plan_name: String,
}

#[derive(Debug, Serialize)]
pub struct ExpiryOverview {
    pub record_count: usize,
    pub plan_count: usize,
    pub active_count: usize,
    pub expired_today: u32,
    pub expiring_in_window: u32,
    /// Index 0 holds "expiring in 1 day", up to the window size.
    pub breakdown: Vec<u32>,
}

fn plan_index(plans: &[SubscriptionPlan]) -> HashMap<i64, &SubscriptionPlan> {
    plans.iter().map(|p| (p.id, p)).collect()
}

fn expiry_of(
    rec: &OccupantRecord,
    plans: &HashMap<i64, &SubscriptionPlan>,
) -> Option<DateTime<Utc>> {
    let plan = plans.get(&rec.plan_id?)?;
    compute_expiry(rec.join_date?, &plan.duration)
}

/// Full seat-management view over one scan of the ledger: every id from 1 to
/// each section's capacity is reported, ids without an active named record
/// as Available. A shared seat with several sub-occupants counts as one
/// occupied seat.
pub fn build_snapshot(
    records: &[OccupantRecord],
    plans: &[SubscriptionPlan],
    layout: &SectionLayout,
) -> Snapshot {
    let plans = plan_index(plans);

    // group occupied records under their base seat, keyed by index for order
    let mut occupied_by_section: HashMap<char, BTreeMap<u32, Vec<&OccupantRecord>>> =
        HashMap::new();
    for rec in records {
        if !rec.is_occupied() {
            continue;
        }
        let Some(id) = SeatId::parse(&rec.seat_number) else {
            continue;
        };
        occupied_by_section
            .entry(id.section)
            .or_default()
            .entry(id.index)
            .or_default()
            .push(rec);
    }

    let mut sections = Vec::new();
    let mut seats = Vec::new();
    for rule in layout.sections() {
        let capacity = observed_capacity(rule.letter, rule.min_capacity, records);
        let occupied = occupied_by_section.get(&rule.letter);
        let occupied_count = occupied.map_or(0, |m| m.len()) as u32;
        sections.push(SectionStats {
            section: rule.letter,
            total: capacity,
            occupied: occupied_count,
            available: capacity - occupied_count,
        });

        for index in 1..=capacity {
            let seat_number = format!("{}{}", rule.letter, index);
            match occupied.and_then(|m| m.get(&index)) {
                Some(group) => {
                    let students: Vec<SeatOccupantDetail> = group
                        .iter()
                        .map(|rec| SeatOccupantDetail {
                            name: rec.name.clone().unwrap_or_default(),
                            plan: rec
                                .plan_id
                                .and_then(|id| plans.get(&id))
                                .map(|p| p.plan_name.clone()),
                            slot: rec.slot.clone(),
                            national_id: rec.national_id.clone(),
                            joining_date: rec.join_date.map(|d| d.date_naive()),
                            expiry_date: expiry_of(rec, &plans).map(|d| d.date_naive()),
                            fee_paid: rec.fee_paid,
                        })
                        .collect();
                    let primary = &students[0];
                    seats.push(SeatDetail {
                        seat_number,
                        section: rule.letter,
                        status: SeatStatus::Occupied,
                        student_name: Some(primary.name.clone()),
                        plan: primary.plan.clone(),
                        joining_date: primary.joining_date,
                        expiry_date: primary.expiry_date,
                        fee_paid: students.iter().any(|s| s.fee_paid),
                        student_count: students.len(),
                        students,
                    });
                }
                None => seats.push(SeatDetail {
                    seat_number,
                    section: rule.letter,
                    status: SeatStatus::Available,
                    student_name: None,
                    plan: None,
                    joining_date: None,
                    expiry_date: None,
                    fee_paid: false,
                    student_count: 0,
                    students: Vec::new(),
                }),
            }
        }
    }

    let total_seats: u32 = sections.iter().map(|s| s.total).sum();
    let occupied_seats: u32 = sections.iter().map(|s| s.occupied).sum();
    Snapshot {
        total_seats,
        occupied_seats,
        available_seats: total_seats - occupied_seats,
        sections,
        seats,
    }
}

/// Active, named, plan-bound occupants whose subscription lapses within the
/// window, ascending by days left. Records with a missing plan, join date or
/// unparseable duration are skipped by design, not reported as errors.
pub fn build_forecast(
    records: &[OccupantRecord],
    plans: &[SubscriptionPlan],
    window_days: u32,
    now: DateTime<Utc>,
) -> Vec<ForecastEntry> {
    let plans = plan_index(plans);
    let mut entries: Vec<ForecastEntry> = records
        .iter()
        .filter(|r| r.is_occupied())
        .filter_map(|rec| {
            let plan = plans.get(&rec.plan_id?)?;
            let expiry = compute_expiry(rec.join_date?, &plan.duration)?;
            let days_left = days_until(expiry, now);
            match classify_bucket(days_left, window_days) {
                ExpiryBucket::WithinDays(_) => Some(ForecastEntry {
                    subscriber_name: rec.name.clone().unwrap_or_default(),
                    seat_number: rec.seat_number.clone(),
                    expiry_date: expiry.date_naive(),
                    days_left,
                    plan_name: plan.plan_name.clone(),
                }),
                _ => None,
            }
        })
        .collect();
    entries.sort_by_key(|e| e.days_left);
    entries
}

/// Dashboard counters: record/plan/active totals plus the per-day expiry
/// breakdown for the window.
pub fn build_overview(
    records: &[OccupantRecord],
    plans: &[SubscriptionPlan],
    window_days: u32,
    now: DateTime<Utc>,
) -> ExpiryOverview {
    let plan_map = plan_index(plans);
    let mut expired_today = 0u32;
    let mut breakdown = vec![0u32; window_days as usize];
    for rec in records.iter().filter(|r| r.is_active) {
        let Some(expiry) = expiry_of(rec, &plan_map) else {
            continue;
        };
        match classify_bucket(days_until(expiry, now), window_days) {
            ExpiryBucket::ExpiredOrToday => expired_today += 1,
            ExpiryBucket::WithinDays(d) => breakdown[(d - 1) as usize] += 1,
            ExpiryBucket::Later => {}
        }
    }
    ExpiryOverview {
        record_count: records.len(),
        plan_count: plans.len(),
        active_count: records.iter().filter(|r| r.is_active).count(),
        expired_today,
        expiring_in_window: breakdown.iter().sum(),
        breakdown,
    }
}

/// Read-only composition over a full ledger scan. No transaction spans the
/// scan and concurrent writers, so a snapshot may exhibit read skew; that is
/// an accepted property of the aggregation operations.
#[derive(Clone)]
pub struct DashboardAggregator {
    store: Arc<dyn RecordStore>,
    layout: SectionLayout,
}

impl DashboardAggregator {
    pub const DEFAULT_WINDOW_DAYS: u32 = 5;

    pub fn new(store: Arc<dyn RecordStore>, layout: SectionLayout) -> Self {
        Self { store, layout }
    }

    pub async fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let records = self.store.list_occupants().await?;
        let plans = self.store.list_plans().await?;
        Ok(build_snapshot(&records, &plans, &self.layout))
    }

    pub async fn expiry_forecast(
        &self,
        window_days: Option<u32>,
    ) -> Result<Vec<ForecastEntry>, CoreError> {
        let window = window_days.unwrap_or(Self::DEFAULT_WINDOW_DAYS);
        let records = self.store.list_occupants().await?;
        let plans = self.store.list_plans().await?;
        Ok(build_forecast(&records, &plans, window, Utc::now()))
    }

    pub async fn expiry_overview(&self) -> Result<ExpiryOverview, CoreError> {
        let records = self.store.list_occupants().await?;
        let plans = self.store.list_plans().await?;
        Ok(build_overview(
            &records,
            &plans,
            Self::DEFAULT_WINDOW_DAYS,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn plan(id: i64, name: &str, duration: &str) -> SubscriptionPlan {
        SubscriptionPlan {
            id,
            plan_name: name.to_string(),
            price: 0.0,
            duration: duration.to_string(),
            subscribers: 0,
            is_active: true,
        }
    }

    fn occupant(
        seat: &str,
        name: Option<&str>,
        plan_id: Option<i64>,
        join: Option<DateTime<Utc>>,
        active: bool,
    ) -> OccupantRecord {
        OccupantRecord {
            id: 0,
            seat_number: seat.to_string(),
            name: name.map(str::to_string),
            national_id: None,
            secondary_id: None,
            father_name: None,
            address: None,
            age: None,
            slot: None,
            plan_id,
            join_date: join,
            is_active: active,
            fee_paid: false,
        }
    }

    fn small_layout() -> SectionLayout {
        SectionLayout::new(vec![
            crate::core::seat_id::SectionRule { letter: 'A', min_capacity: 3, ceiling: None },
            crate::core::seat_id::SectionRule { letter: 'B', min_capacity: 2, ceiling: None },
        ])
    }

    #[test]
    fn shared_seat_counts_as_one_occupied() {
        let plans = vec![plan(1, "Monthly", "1 month")];
        let join = at(2024, 3, 1);
        let records = vec![
            occupant("A1", Some("X"), Some(1), Some(join), true),
            occupant("A1_2", Some("Y"), Some(1), Some(join), true),
            occupant("A1_3", Some("Z"), Some(1), Some(join), true),
        ];
        let snap = build_snapshot(&records, &plans, &small_layout());
        assert_eq!(snap.occupied_seats, 1);
        assert_eq!(snap.total_seats, 5);
        assert_eq!(snap.available_seats, 4);

        let a1 = &snap.seats[0];
        assert_eq!(a1.seat_number, "A1");
        assert_eq!(a1.status, SeatStatus::Occupied);
        assert_eq!(a1.student_count, 3);
        assert_eq!(a1.student_name.as_deref(), Some("X"));
    }

    #[test]
    fn grid_enumerates_every_id_up_to_capacity() {
        let records = vec![occupant("A5", Some("X"), None, None, true)];
        let snap = build_snapshot(&records, &[], &small_layout());
        // capacity of A grows to the observed max
        let ids: Vec<&str> = snap.seats.iter().map(|s| s.seat_number.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2", "A3", "A4", "A5", "B1", "B2"]);
        assert_eq!(snap.seats[1].status, SeatStatus::Available);
        assert_eq!(snap.seats[4].status, SeatStatus::Occupied);
    }

    #[test]
    fn inactive_and_placeholder_rows_read_available() {
        let records = vec![
            occupant("A1", Some("gone"), None, None, false),
            occupant("A2", None, None, None, true),
        ];
        let snap = build_snapshot(&records, &[], &small_layout());
        assert_eq!(snap.occupied_seats, 0);
        assert!(snap.seats.iter().all(|s| s.status == SeatStatus::Available));
    }

    #[test]
    fn forecast_two_week_plan_scenario() {
        let plans = vec![plan(1, "Two weeks", "2 weeks")];
        let records = vec![occupant("A1", Some("X"), Some(1), Some(at(2024, 3, 1)), true)];

        let entries = build_forecast(&records, &plans, 5, at(2024, 3, 12));
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.subscriber_name, "X");
        assert_eq!(entry.expiry_date, at(2024, 3, 15).date_naive());
        assert_eq!(entry.days_left, 3);
        assert_eq!(entry.plan_name, "Two weeks");
    }

    #[test]
    fn forecast_skips_incomplete_and_out_of_window_records() {
        let plans = vec![plan(1, "Monthly", "1 month"), plan(2, "Odd", "lifetime")];
        let join = at(2024, 3, 1);
        let records = vec![
            // no plan bound
            occupant("A1", Some("noplan"), None, Some(join), true),
            // no join date
            occupant("A2", Some("nojoin"), Some(1), None, true),
            // unparseable duration
            occupant("A3", Some("odd"), Some(2), Some(join), true),
            // inactive
            occupant("A4", Some("gone"), Some(1), Some(join), false),
            // expires well past the window
            occupant("A5", Some("later"), Some(1), Some(at(2024, 3, 25)), true),
            // in window
            occupant("B1", Some("soon"), Some(1), Some(join), true),
        ];
        let entries = build_forecast(&records, &plans, 5, at(2024, 3, 30));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subscriber_name, "soon");
        assert_eq!(entries[0].days_left, 2);
    }

    #[test]
    fn forecast_sorts_ascending_by_days_left() {
        let plans = vec![plan(1, "Monthly", "1 month")];
        let records = vec![
            occupant("A1", Some("later"), Some(1), Some(at(2024, 3, 5)), true),
            occupant("A2", Some("sooner"), Some(1), Some(at(2024, 3, 3)), true),
        ];
        let entries = build_forecast(&records, &plans, 5, at(2024, 4, 1));
        assert_eq!(entries[0].subscriber_name, "sooner");
        assert_eq!(entries[1].subscriber_name, "later");
    }

    #[test]
    fn overview_buckets_per_exact_day() {
        let plans = vec![plan(1, "Monthly", "1 month")];
        let records = vec![
            // long expired
            occupant("A1", Some("a"), Some(1), Some(at(2024, 1, 30)), true),
            // expires in 1 day
            occupant("A2", Some("b"), Some(1), Some(at(2024, 3, 2)), true),
            // expires in 5 days
            occupant("A3", Some("c"), Some(1), Some(at(2024, 3, 6)), true),
            // expires in 6 days, outside the window
            occupant("B1", Some("d"), Some(1), Some(at(2024, 3, 7)), true),
        ];
        let overview = build_overview(&records, &plans, 5, at(2024, 4, 1));
        assert_eq!(overview.expired_today, 1);
        assert_eq!(overview.breakdown, vec![1, 0, 0, 0, 1]);
        assert_eq!(overview.expiring_in_window, 2);
        assert_eq!(overview.active_count, 4);
        assert_eq!(overview.plan_count, 1);
    }
}
