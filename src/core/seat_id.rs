use std::fmt;

use serde::Deserialize;

use crate::error::CoreError;

/// A parsed seat identifier: section letter, positive index, optional
/// sub-seat slot (`A1`, `B39`, `A1_2`). Sub-seat slots start at 2; the first
/// occupant of a shared seat uses the bare base identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeatId {
    pub section: char,
    pub index: u32,
    pub slot: Option<u32>,
}

impl SeatId {
    /// Strict grammar: `<UppercaseLetter><PositiveInteger>` with no leading
    /// zeros, optionally followed by `_<n>` with n >= 2. Anything else is
    /// rejected, including empty strings, lowercase sections and non-digit
    /// suffixes.
    pub fn parse(s: &str) -> Option<SeatId> {
        let section = s.chars().next()?;
        if !section.is_ascii_uppercase() {
            return None;
        }
        let rest = &s[1..];
        let (index_part, slot_part) = match rest.split_once('_') {
            Some((idx, slot)) => (idx, Some(slot)),
            None => (rest, None),
        };
        let index = parse_positive(index_part)?;
        let slot = match slot_part {
            Some(p) => {
                let n = parse_positive(p)?;
                if n < 2 {
                    return None;
                }
                Some(n)
            }
            None => None,
        };
        Some(SeatId { section, index, slot })
    }

    pub fn is_base(&self) -> bool {
        self.slot.is_none()
    }

    pub fn base(&self) -> SeatId {
        SeatId { slot: None, ..*self }
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(n) => write!(f, "{}{}_{}", self.section, self.index, n),
            None => write!(f, "{}{}", self.section, self.index),
        }
    }
}

fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "0" itself and zero-padded forms like "01" are not seat indexes
    if s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

/// Per-section sizing rule. `min_capacity` is the guaranteed floor the
/// facility was designed with; `ceiling` caps the accepted index, or is
/// open-ended (any positive index accepted, capacity grows from it).
#[derive(Debug, Clone, Deserialize)]
pub struct SectionRule {
    pub letter: char,
    pub min_capacity: u32,
    pub ceiling: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SectionLayout {
    sections: Vec<SectionRule>,
}

impl SectionLayout {
    pub fn new(sections: Vec<SectionRule>) -> Self {
        Self { sections }
    }

    pub fn rule(&self, letter: char) -> Option<&SectionRule> {
        self.sections.iter().find(|s| s.letter == letter)
    }

    pub fn sections(&self) -> &[SectionRule] {
        &self.sections
    }
}

impl Default for SectionLayout {
    // The facility ships with sections A (66 seats) and B (39 seats),
    // both expandable.
    fn default() -> Self {
        Self::new(vec![
            SectionRule { letter: 'A', min_capacity: 66, ceiling: None },
            SectionRule { letter: 'B', min_capacity: 39, ceiling: None },
        ])
    }
}

/// Validates a raw identifier against the section layout. A sub-seat id is
/// valid only if its base is. No side effects.
pub fn validate_seat_id(s: &str, layout: &SectionLayout) -> Result<SeatId, CoreError> {
    let id = SeatId::parse(s).ok_or_else(|| CoreError::invalid_seat(s))?;
    let rule = layout
        .rule(id.section)
        .ok_or_else(|| CoreError::invalid_seat(s))?;
    if let Some(ceiling) = rule.ceiling {
        if id.index > ceiling {
            return Err(CoreError::invalid_seat(s));
        }
    }
    Ok(id)
}

pub fn is_valid_seat_id(s: &str, layout: &SectionLayout) -> bool {
    validate_seat_id(s, layout).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_base_and_sub_seat_ids() {
        let layout = SectionLayout::default();
        for id in ["A1", "B39", "A100", "B1", "A1_2", "A12_10"] {
            assert!(is_valid_seat_id(id, &layout), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_ids() {
        let layout = SectionLayout::default();
        for id in [
            "", "A", "A0", "a1", "b12", "A01", "C1", "1A", "A-1", "A1_1", "A1_0",
            "A1_", "A1_x", "A 1", "A1.5", "AA1", "A1__2",
        ] {
            assert!(!is_valid_seat_id(id, &layout), "{id} should be invalid");
        }
    }

    #[test]
    fn ceiling_caps_the_index() {
        let layout = SectionLayout::new(vec![SectionRule {
            letter: 'A',
            min_capacity: 10,
            ceiling: Some(10),
        }]);
        assert!(is_valid_seat_id("A10", &layout));
        assert!(!is_valid_seat_id("A11", &layout));
        // sub-seat of an out-of-range base is invalid too
        assert!(!is_valid_seat_id("A11_2", &layout));
    }

    #[test]
    fn parse_keeps_structure() {
        let id = SeatId::parse("A7_3").unwrap();
        assert_eq!(id.section, 'A');
        assert_eq!(id.index, 7);
        assert_eq!(id.slot, Some(3));
        assert_eq!(id.base().to_string(), "A7");
        assert!(id.base().is_base());
    }

    proptest! {
        #[test]
        fn any_positive_index_is_valid_when_open_ended(n in 1u32..=100_000) {
            let layout = SectionLayout::default();
            let a_id = format!("A{}", n);
            let b_id = format!("B{}", n);
            prop_assert!(is_valid_seat_id(&a_id, &layout));
            prop_assert!(is_valid_seat_id(&b_id, &layout));
        }

        #[test]
        fn zero_and_lowercase_never_validate(n in 1u32..=100_000) {
            let layout = SectionLayout::default();
            prop_assert!(!is_valid_seat_id("A0", &layout));
            let lower_id = format!("a{}", n);
            prop_assert!(!is_valid_seat_id(&lower_id, &layout));
        }

        #[test]
        fn display_roundtrips(idx in 1u32..=10_000, slot in proptest::option::of(2u32..=50)) {
            let id = SeatId { section: 'B', index: idx, slot };
            prop_assert_eq!(SeatId::parse(&id.to_string()), Some(id));
        }
    }
}
