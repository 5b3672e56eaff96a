use serde::{Deserialize, Serialize};

use crate::capacity::CapacityState;
use crate::config::{HIGH_RISK_THRESHOLD, HIGH_TIER_BEDS, HIGH_TIER_STAFF, LOW_TIER_BEDS, LOW_TIER_STAFF};
use crate::prediction::CapacityPrediction;

/// Bed/staff increments to add to the current capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CapacitySuggestion {
    pub beds_delta: u32,
    pub staff_delta: u32,
}

impl CapacitySuggestion {
    pub const fn new(beds_delta: u32, staff_delta: u32) -> Self {
        Self {
            beds_delta,
            staff_delta,
        }
    }

    /// Risk strictly above the high threshold gets the larger tier. A
    /// non-finite risk gets the smaller one.
    pub fn for_risk(risk: f64) -> Self {
        if risk > HIGH_RISK_THRESHOLD {
            Self::new(HIGH_TIER_BEDS, HIGH_TIER_STAFF)
        } else {
            Self::new(LOW_TIER_BEDS, LOW_TIER_STAFF)
        }
    }

    /// A model prediction used as an increment.
    pub fn from_prediction(prediction: &CapacityPrediction) -> Self {
        Self::new(prediction.beds, prediction.staff)
    }
}

/// Add the suggestion to the state. Not idempotent: applying twice adds twice.
pub fn apply(state: CapacityState, suggestion: CapacitySuggestion) -> CapacityState {
    state.with_suggestion(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundary_is_strict() {
        assert_eq!(CapacitySuggestion::for_risk(0.7), CapacitySuggestion::new(5, 2));
        assert_eq!(CapacitySuggestion::for_risk(0.7001), CapacitySuggestion::new(10, 5));
        assert_eq!(CapacitySuggestion::for_risk(1.0), CapacitySuggestion::new(10, 5));
        assert_eq!(CapacitySuggestion::for_risk(0.0), CapacitySuggestion::new(5, 2));
    }

    #[test]
    fn test_nan_risk_gets_low_tier() {
        assert_eq!(CapacitySuggestion::for_risk(f64::NAN), CapacitySuggestion::new(5, 2));
    }

    #[test]
    fn test_apply_is_additive() {
        let s = CapacitySuggestion::for_risk(0.9);
        let once = apply(CapacityState::default(), s);
        assert_eq!((once.beds(), once.staff()), (60, 25));
        let twice = apply(once, s);
        assert_eq!((twice.beds(), twice.staff()), (70, 30));
    }

    #[test]
    fn test_apply_saturates() {
        let s = CapacitySuggestion::new(10, 5);
        let full = apply(CapacityState::new(u32::MAX - 3, u32::MAX), s);
        assert_eq!(full.beds(), u32::MAX);
        assert_eq!(full.staff(), u32::MAX);
    }
}
