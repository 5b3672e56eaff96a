//! Session hospital capacity.
//!
//! Only the capacity planner writes to [`CapacityState`]; everything else
//! reads it. Nothing decrements it implicitly.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{BASELINE_BEDS, BASELINE_STAFF};
use crate::readiness::readiness;
use crate::suggestion::CapacitySuggestion;

#[derive(
    Resource,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bitcode::Encode,
    bitcode::Decode,
)]
pub struct CapacityState {
    beds: u32,
    staff: u32,
}

impl Default for CapacityState {
    fn default() -> Self {
        Self::new(BASELINE_BEDS, BASELINE_STAFF)
    }
}

impl CapacityState {
    pub const fn new(beds: u32, staff: u32) -> Self {
        Self { beds, staff }
    }

    pub fn beds(&self) -> u32 {
        self.beds
    }

    pub fn staff(&self) -> u32 {
        self.staff
    }

    pub fn with_beds(self, beds: u32) -> Self {
        Self { beds, ..self }
    }

    pub fn with_staff(self, staff: u32) -> Self {
        Self { staff, ..self }
    }

    /// Add the suggested increments, saturating at `u32::MAX`.
    pub fn with_suggestion(self, s: CapacitySuggestion) -> Self {
        Self {
            beds: self.beds.saturating_add(s.beds_delta),
            staff: self.staff.saturating_add(s.staff_delta),
        }
    }

    /// Readiness against the baseline plus `suggestion`.
    pub fn readiness(&self, suggestion: &CapacitySuggestion) -> u8 {
        readiness(
            self.beds,
            self.staff,
            suggestion.beds_delta,
            suggestion.staff_delta,
        )
    }
}

/// Lenient integer parse for manual capacity entry.
///
/// Reads an optional sign and the leading run of digits; anything that does
/// not start with a digit is 0. Negative values become 0 and overlong values
/// saturate.
pub fn parse_capacity_input(raw: &str) -> u32 {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    let mut value: u32 = 0;
    let mut any = false;
    for d in digits {
        any = true;
        value = value.saturating_mul(10).saturating_add(u32::from(d - b'0'));
    }
    if !any || negative {
        0
    } else {
        value
    }
}
