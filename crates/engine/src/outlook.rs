//! ML outlook: open-ended probability map from the model service, banded
//! into low / medium / high for display.

use std::borrow::Cow;
use std::collections::BTreeMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};
use crate::risk::{clamp_score, HazardCategory, RiskBand, RiskSnapshot};

/// Key -> probability in [0, 1]. Keys are not a closed set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MlOutlook {
    probabilities: BTreeMap<String, f64>,
}

impl MlOutlook {
    /// Build from raw pairs, clamping and dropping non-finite values.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let probabilities = pairs
            .into_iter()
            .filter_map(|(k, p)| clamp_score(p).map(|p| (k.into(), p)))
            .collect();
        Self { probabilities }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.probabilities.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.probabilities.iter().map(|(k, &p)| (k.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlookSeverity {
    Low,
    Medium,
    High,
}

impl OutlookSeverity {
    /// `p > 0.7` high, `0.5 < p <= 0.7` medium, else low.
    pub fn classify(probability: f64) -> OutlookSeverity {
        if probability > HIGH_RISK_THRESHOLD {
            OutlookSeverity::High
        } else if probability > MEDIUM_RISK_THRESHOLD {
            OutlookSeverity::Medium
        } else {
            OutlookSeverity::Low
        }
    }
}

/// Display labels for outlook keys. Unmapped keys are shown verbatim.
#[derive(Resource, Debug, Clone)]
pub struct OutlookLabels {
    labels: BTreeMap<String, String>,
}

impl Default for OutlookLabels {
    fn default() -> Self {
        let labels = [
            ("high_heat", "Heat Stress"),
            ("high_flood", "Flooding"),
            ("high_resp", "Respiratory"),
            ("high_vector", "Vector-borne"),
            ("high_drought", "Drought"),
            ("high_storm", "Storms"),
            ("high_air", "Air Pollution"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { labels }
    }
}

impl OutlookLabels {
    pub fn with_label(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(key.into(), label.into());
        self
    }

    pub fn label_for<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        match self.labels.get(key) {
            Some(label) => Cow::Borrowed(label.as_str()),
            None => Cow::Borrowed(key),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlookEntry {
    pub key: String,
    pub label: String,
    pub probability: f64,
    /// `round(probability * 100)`.
    pub percent: u8,
    pub severity: OutlookSeverity,
}

pub const NO_PREDICTIONS_MESSAGE: &str =
    "No ML predictions available. Run model training first.";

/// What the outlook panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum OutlookView {
    /// Absent or empty outlook. Distinct from a map of zeros.
    NoPredictions { message: String },
    Available { entries: Vec<OutlookEntry> },
}

impl OutlookView {
    pub fn is_available(&self) -> bool {
        matches!(self, OutlookView::Available { .. })
    }
}

/// Turn an optional outlook into display entries, highest probability first.
pub fn integrate(outlook: Option<&MlOutlook>, labels: &OutlookLabels) -> OutlookView {
    let outlook = match outlook {
        Some(o) if !o.is_empty() => o,
        _ => {
            return OutlookView::NoPredictions {
                message: NO_PREDICTIONS_MESSAGE.to_string(),
            }
        }
    };

    let mut entries: Vec<OutlookEntry> = outlook
        .iter()
        .map(|(key, probability)| OutlookEntry {
            key: key.to_string(),
            label: labels.label_for(key).into_owned(),
            probability,
            percent: (probability * 100.0).round() as u8,
            severity: OutlookSeverity::classify(probability),
        })
        .collect();
    entries.sort_by(|a, b| {
        b.probability
            .total_cmp(&a.probability)
            .then_with(|| a.key.cmp(&b.key))
    });
    OutlookView::Available { entries }
}

// =============================================================================
// Hazard overview
// =============================================================================

/// One row of the multi-risk panel: live score plus the matching outlook
/// probability (`high_<key>`), each `None` when unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardOverview {
    pub hazard: HazardCategory,
    pub label: &'static str,
    pub score: Option<f64>,
    pub band: RiskBand,
    pub outlook: Option<f64>,
}

pub fn hazard_overview(snapshot: &RiskSnapshot, outlook: Option<&MlOutlook>) -> Vec<HazardOverview> {
    HazardCategory::ALL
        .into_iter()
        .map(|hazard| {
            let score = snapshot.get(hazard);
            HazardOverview {
                hazard,
                label: hazard.label(),
                score,
                band: RiskBand::from_score(score.unwrap_or(0.0)),
                outlook: outlook.and_then(|o| o.get(&format!("high_{}", hazard.key()))),
            }
        })
        .collect()
}

/// Most recent non-empty outlook received from the risk feed.
#[derive(Resource, Debug, Clone, Default)]
pub struct CurrentOutlook(pub Option<MlOutlook>);
