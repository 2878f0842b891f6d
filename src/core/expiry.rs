use chrono::{DateTime, Duration, Months, Utc};

/// Unit of a plan duration. Matching is by case-insensitive substring in a
/// fixed priority order: day, then week, then month, then year. The first
/// match wins, so malformed text containing several unit words classifies
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DurationUnit {
    fn match_text(lower: &str) -> Option<DurationUnit> {
        const PRIORITY: [(&str, DurationUnit); 4] = [
            ("day", DurationUnit::Day),
            ("week", DurationUnit::Week),
            ("month", DurationUnit::Month),
            ("year", DurationUnit::Year),
        ];
        PRIORITY
            .iter()
            .find(|(word, _)| lower.contains(word))
            .map(|&(_, unit)| unit)
    }

    /// Quantity assumed when the plan text carries a unit word but no
    /// integer, tolerating malformed plan rows.
    fn fallback_quantity(self) -> u32 {
        match self {
            DurationUnit::Day => 30,
            DurationUnit::Week => 4,
            DurationUnit::Month => 1,
            DurationUnit::Year => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanDuration {
    pub quantity: u32,
    pub unit: DurationUnit,
}

/// Parses free text like "1 month", "2 WEEKS", "30 days". Returns None when
/// no unit word is present; the quantity falls back per unit when no integer
/// literal is found.
pub fn parse_duration(text: &str) -> Option<PlanDuration> {
    let unit = DurationUnit::match_text(&text.to_lowercase())?;
    let quantity = first_integer(text).unwrap_or_else(|| unit.fallback_quantity());
    Some(PlanDuration { quantity, unit })
}

fn first_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Start date plus plan duration, calendar-correct. Month and year addition
/// clamp to the last valid day of the target month (2024-01-31 + 1 month is
/// 2024-02-29), which chrono guarantees rather than leaving to platform
/// rollover behavior. None when the duration text has no recognizable unit.
pub fn compute_expiry(start: DateTime<Utc>, duration_text: &str) -> Option<DateTime<Utc>> {
    let d = parse_duration(duration_text)?;
    match d.unit {
        DurationUnit::Day => start.checked_add_signed(Duration::days(i64::from(d.quantity))),
        DurationUnit::Week => {
            start.checked_add_signed(Duration::days(7 * i64::from(d.quantity)))
        }
        DurationUnit::Month => start.checked_add_months(Months::new(d.quantity)),
        DurationUnit::Year => start.checked_add_months(Months::new(d.quantity.checked_mul(12)?)),
    }
}

/// Ceiling-rounded whole-day difference: anything past an exact day boundary
/// counts as the next day, so 4.1 days out reports 5.
pub fn days_until(expiry: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 86_400_000;
    let ms = (expiry - reference).num_milliseconds();
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryBucket {
    /// Lapsed already, or lapses today (days left <= 0).
    ExpiredOrToday,
    /// Expiring soon: exact day value 1..=window, for per-day breakdowns.
    WithinDays(u32),
    Later,
}

pub fn classify_bucket(days_left: i64, window_days: u32) -> ExpiryBucket {
    if days_left <= 0 {
        ExpiryBucket::ExpiredOrToday
    } else if days_left <= i64::from(window_days) {
        ExpiryBucket::WithinDays(days_left as u32)
    } else {
        ExpiryBucket::Later
    }
}
