//! Policy constants for readiness scoring, capacity suggestions and risk bands.

/// Nominal fully-equipped facility size that readiness is measured against,
/// before any climate-driven adjustment.
pub const BASELINE_BEDS: u32 = 50;
pub const BASELINE_STAFF: u32 = 20;

/// Bed availability dominates readiness; staff takes the remaining weight.
pub const BEDS_WEIGHT: f64 = 0.6;
pub const STAFF_WEIGHT: f64 = 0.4;

/// Risk or probability strictly above this is "high": it selects the larger
/// capacity suggestion and the high outlook band.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
/// Probability strictly above this (and not high) is a medium outlook band.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.5;
/// Risk strictly above this (and not elevated) shows as moderate on risk cards.
pub const MODERATE_RISK_THRESHOLD: f64 = 0.3;

/// Suggested increments for the two suggestion tiers.
pub const HIGH_TIER_BEDS: u32 = 10;
pub const HIGH_TIER_STAFF: u32 = 5;
pub const LOW_TIER_BEDS: u32 = 5;
pub const LOW_TIER_STAFF: u32 = 2;

/// Heat score shown before the first risk feed arrives.
pub const DEFAULT_HEAT_RISK: f64 = 0.5;

/// Upper bound of readiness and of each readiness component.
pub const MAX_READINESS: f64 = 100.0;
