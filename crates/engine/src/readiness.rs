//! Capacity readiness: how far current beds and staff cover the baseline
//! facility plus whatever increments are currently suggested.

use crate::config::{BASELINE_BEDS, BASELINE_STAFF, BEDS_WEIGHT, MAX_READINESS, STAFF_WEIGHT};

/// `min(100, 100 * available / (baseline + suggested))`.
///
/// A zero target is fully covered.
pub fn component_score(available: u32, baseline: u32, suggested: u32) -> f64 {
    let target = u64::from(baseline) + u64::from(suggested);
    if target == 0 {
        return MAX_READINESS;
    }
    (MAX_READINESS * available as f64 / target as f64).min(MAX_READINESS)
}

/// Weighted readiness percentage in [0, 100].
pub fn readiness(beds: u32, staff: u32, suggested_beds: u32, suggested_staff: u32) -> u8 {
    let beds_score = component_score(beds, BASELINE_BEDS, suggested_beds);
    let staff_score = component_score(staff, BASELINE_STAFF, suggested_staff);
    let score = BEDS_WEIGHT * beds_score + STAFF_WEIGHT * staff_score;
    score.round().clamp(0.0, MAX_READINESS) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_with_low_tier_suggestion() {
        // 0.6 * 100*50/55 + 0.4 * 100*20/22 = 54.5454 + 36.3636
        assert_eq!(readiness(50, 20, 5, 2), 91);
    }

    #[test]
    fn test_fully_covered_is_capped_at_100() {
        assert_eq!(readiness(500, 200, 10, 5), 100);
        assert_eq!(readiness(u32::MAX, u32::MAX, u32::MAX, u32::MAX), 100);
    }

    #[test]
    fn test_empty_facility_is_zero() {
        assert_eq!(readiness(0, 0, 0, 0), 0);
    }

    #[test]
    fn test_component_caps_before_weighting() {
        // Surplus beds must not make up for missing staff.
        assert_eq!(readiness(1000, 0, 0, 0), 60);
        assert_eq!(readiness(0, 1000, 0, 0), 40);
    }

    #[test]
    fn test_zero_target_is_full() {
        assert_eq!(component_score(0, 0, 0), 100.0);
    }

    #[test]
    fn test_monotonic_in_beds_and_staff() {
        for suggested in [(5, 2), (10, 5)] {
            let mut prev = 0;
            for beds in 0..120 {
                let r = readiness(beds, 20, suggested.0, suggested.1);
                assert!(r >= prev, "readiness dropped at beds={beds}");
                prev = r;
            }
            let mut prev = 0;
            for staff in 0..60 {
                let r = readiness(50, staff, suggested.0, suggested.1);
                assert!(r >= prev, "readiness dropped at staff={staff}");
                prev = r;
            }
        }
    }

    #[test]
    fn test_larger_suggestion_never_raises_readiness() {
        for beds in (0..100).step_by(7) {
            for staff in (0..40).step_by(3) {
                assert!(readiness(beds, staff, 10, 5) <= readiness(beds, staff, 5, 2));
            }
        }
    }
}
