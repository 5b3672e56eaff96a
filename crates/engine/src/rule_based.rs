//! Offline predictor: the rule the model service itself falls back to when
//! no trained model is available.

use serde_json::json;

use crate::capacity::CapacityState;
use crate::config::{BASELINE_BEDS, BASELINE_STAFF};
use crate::environment::{EnvironmentalSample, Region, Season};
use crate::prediction::{
    CapacityPrediction, PredictionBackend, PredictionError, RiskFeed, TrainingReport,
};
use crate::risk::{HazardCategory, RiskSnapshot};

pub const RULE_BASED_METHOD: &str = "rule-based";

/// PM2.5 concentration treated as "normal" load.
const REFERENCE_PM25: f64 = 30.0;
const MONSOON_FACTOR: f64 = 1.2;

pub fn season_factor(season: Season) -> f64 {
    if season == Season::Monsoon {
        MONSOON_FACTOR
    } else {
        1.0
    }
}

pub fn pollution_factor(pm25: f64) -> f64 {
    (pm25 / REFERENCE_PM25).clamp(0.5, 1.5)
}

/// `round(baseline * region * season * pollution)` for beds and staff.
/// Halves round to even, so 12.5 staff is 12.
pub fn rule_based_capacity(sample: &EnvironmentalSample) -> CapacityPrediction {
    let region = sample.region().risk_factor();
    let season = season_factor(sample.season());
    let pollution = pollution_factor(sample.pm25());
    let scale = region * season * pollution;
    CapacityPrediction {
        beds: (f64::from(BASELINE_BEDS) * scale).round_ties_even() as u32,
        staff: (f64::from(BASELINE_STAFF) * scale).round_ties_even() as u32,
        method: RULE_BASED_METHOD.to_string(),
        factors: Some(json!({
            "region": region,
            "season": season,
            "pollution": pollution,
        })),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPredictor;

impl PredictionBackend for RuleBasedPredictor {
    /// The only risk known offline is the region's air-quality tier.
    fn predict_risks(&self, region: Region) -> Result<RiskFeed, PredictionError> {
        Ok(RiskFeed {
            risks: RiskSnapshot::default()
                .with_score(HazardCategory::Respiratory, region.risk_factor()),
            temps: None,
            ml: None,
        })
    }

    fn predict_capacity(
        &self,
        sample: &EnvironmentalSample,
    ) -> Result<CapacityPrediction, PredictionError> {
        Ok(rule_based_capacity(sample))
    }

    fn train_model(&self) -> Result<TrainingReport, PredictionError> {
        Ok(TrainingReport {
            success: false,
            metrics: None,
            error: Some("Training needs the model service; running offline".to_string()),
        })
    }

    fn save_capacity(&self, _state: CapacityState) -> Result<(), PredictionError> {
        Err(PredictionError::RemoteUnavailable(
            "offline: no model service configured".to_string(),
        ))
    }

    fn fetch_report(&self) -> Result<Vec<u8>, PredictionError> {
        Err(PredictionError::RemoteUnavailable(
            "offline: reports are generated by the model service".to_string(),
        ))
    }
}
