//! Per-hazard risk scores.
//!
//! A [`RiskSnapshot`] holds whatever hazards the last feed reported. A hazard
//! that was never reported is *unknown*, which is not the same as zero risk:
//! only [`RiskSnapshot::display_value`] collapses unknown to 0.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_HEAT_RISK, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD, MODERATE_RISK_THRESHOLD,
};

// =============================================================================
// Hazards
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HazardCategory {
    #[serde(rename = "heat")]
    Heat,
    #[serde(rename = "flood")]
    Flood,
    #[serde(rename = "resp", alias = "respiratory")]
    Respiratory,
    #[serde(rename = "vector")]
    Vector,
}

impl HazardCategory {
    pub const ALL: [HazardCategory; 4] = [
        HazardCategory::Heat,
        HazardCategory::Flood,
        HazardCategory::Respiratory,
        HazardCategory::Vector,
    ];

    /// Key used by the risk feed.
    pub fn key(self) -> &'static str {
        match self {
            HazardCategory::Heat => "heat",
            HazardCategory::Flood => "flood",
            HazardCategory::Respiratory => "resp",
            HazardCategory::Vector => "vector",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HazardCategory::Heat => "Heat Stress",
            HazardCategory::Flood => "Flood",
            HazardCategory::Respiratory => "Respiratory",
            HazardCategory::Vector => "Vector-borne",
        }
    }

    /// Accepts the feed key and the long form `respiratory`.
    pub fn from_key(key: &str) -> Option<HazardCategory> {
        match key.trim().to_ascii_lowercase().as_str() {
            "heat" => Some(HazardCategory::Heat),
            "flood" => Some(HazardCategory::Flood),
            "resp" | "respiratory" => Some(HazardCategory::Respiratory),
            "vector" => Some(HazardCategory::Vector),
            _ => None,
        }
    }
}

impl fmt::Display for HazardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Bands
// =============================================================================

/// Display band for a single risk value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Moderate,
    Elevated,
    Critical,
}

impl RiskBand {
    /// Strict `>` on every threshold: 0.7 is elevated, not critical.
    pub fn from_score(score: f64) -> RiskBand {
        if score > HIGH_RISK_THRESHOLD {
            RiskBand::Critical
        } else if score > MEDIUM_RISK_THRESHOLD {
            RiskBand::Elevated
        } else if score > MODERATE_RISK_THRESHOLD {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Moderate => "Moderate",
            RiskBand::Elevated => "Elevated",
            RiskBand::Critical => "Critical",
        }
    }
}

/// Clamp into [0, 1]. Non-finite input has no meaningful score.
pub fn clamp_score(score: f64) -> Option<f64> {
    if score.is_finite() {
        Some(score.clamp(0.0, 1.0))
    } else {
        None
    }
}

// =============================================================================
// RiskSnapshot
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RiskSnapshot {
    scores: BTreeMap<HazardCategory, f64>,
}

impl RiskSnapshot {
    /// Locally held values shown until the first feed lands: heat only.
    pub fn local_defaults() -> Self {
        Self::default().with_score(HazardCategory::Heat, DEFAULT_HEAT_RISK)
    }

    pub fn with_score(mut self, hazard: HazardCategory, score: f64) -> Self {
        self.set(hazard, score);
        self
    }

    /// Store a clamped score. Non-finite scores are ignored and leave the
    /// hazard as it was.
    pub fn set(&mut self, hazard: HazardCategory, score: f64) -> bool {
        match clamp_score(score) {
            Some(score) => {
                self.scores.insert(hazard, score);
                true
            }
            None => false,
        }
    }

    /// Known score, or `None` when the hazard was never reported.
    pub fn get(&self, hazard: HazardCategory) -> Option<f64> {
        self.scores.get(&hazard).copied()
    }

    /// Score for display; unknown reads as 0.
    pub fn display_value(&self, hazard: HazardCategory) -> f64 {
        self.get(hazard).unwrap_or(0.0)
    }

    /// Highest known hazard. Ties go to the earlier category in [`HazardCategory::ALL`].
    pub fn dominant(&self) -> Option<(HazardCategory, f64)> {
        self.scores
            .iter()
            .fold(None, |best: Option<(HazardCategory, f64)>, (&h, &s)| match best {
                Some((_, top)) if top >= s => best,
                _ => Some((h, s)),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (HazardCategory, f64)> + '_ {
        self.scores.iter().map(|(&h, &s)| (h, s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_not_zero() {
        let snap = RiskSnapshot::default().with_score(HazardCategory::Heat, 0.4);
        assert_eq!(snap.get(HazardCategory::Flood), None);
        assert_eq!(snap.display_value(HazardCategory::Flood), 0.0);
        assert_eq!(snap.get(HazardCategory::Heat), Some(0.4));
    }

    #[test]
    fn test_scores_are_clamped() {
        let snap = RiskSnapshot::default()
            .with_score(HazardCategory::Heat, 1.7)
            .with_score(HazardCategory::Flood, -0.2);
        assert_eq!(snap.get(HazardCategory::Heat), Some(1.0));
        assert_eq!(snap.get(HazardCategory::Flood), Some(0.0));
    }

    #[test]
    fn test_non_finite_is_absent() {
        let mut snap = RiskSnapshot::default();
        assert!(!snap.set(HazardCategory::Vector, f64::NAN));
        assert!(!snap.set(HazardCategory::Vector, f64::INFINITY));
        assert!(snap.is_empty());
    }

    #[test]
    fn test_local_defaults_seed_heat_only() {
        let snap = RiskSnapshot::local_defaults();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get(HazardCategory::Heat), Some(DEFAULT_HEAT_RISK));
    }

    #[test]
    fn test_dominant_hazard() {
        let snap = RiskSnapshot::default()
            .with_score(HazardCategory::Heat, 0.3)
            .with_score(HazardCategory::Respiratory, 0.9)
            .with_score(HazardCategory::Flood, 0.9);
        // Flood sorts before Respiratory, so it wins the tie.
        assert_eq!(snap.dominant(), Some((HazardCategory::Flood, 0.9)));
        assert_eq!(RiskSnapshot::default().dominant(), None);
    }

    #[test]
    fn test_band_boundaries_are_strict() {
        assert_eq!(RiskBand::from_score(0.71), RiskBand::Critical);
        assert_eq!(RiskBand::from_score(0.7), RiskBand::Elevated);
        assert_eq!(RiskBand::from_score(0.5), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(0.3), RiskBand::Low);
        assert_eq!(RiskBand::from_score(0.0), RiskBand::Low);
    }

    #[test]
    fn test_hazard_keys() {
        assert_eq!(HazardCategory::from_key("resp"), Some(HazardCategory::Respiratory));
        assert_eq!(
            HazardCategory::from_key("Respiratory"),
            Some(HazardCategory::Respiratory)
        );
        assert_eq!(HazardCategory::from_key("drought"), None);
        for h in HazardCategory::ALL {
            assert_eq!(HazardCategory::from_key(h.key()), Some(h));
        }
    }

    #[test]
    fn test_snapshot_serializes_with_feed_keys() {
        let snap = RiskSnapshot::default()
            .with_score(HazardCategory::Respiratory, 0.25)
            .with_score(HazardCategory::Heat, 0.5);
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["resp"], 0.25);
        assert_eq!(v["heat"], 0.5);
    }
}
