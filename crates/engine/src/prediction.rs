// ---------------------------------------------------------------------------
// Prediction boundary: the fallible calls the engine makes to the model service
// ---------------------------------------------------------------------------

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::capacity::CapacityState;
use crate::environment::{EnvironmentalSample, Region};
use crate::http_client::HttpPredictionClient;
use crate::outlook::MlOutlook;
use crate::risk::RiskSnapshot;
use crate::rule_based::RuleBasedPredictor;
use crate::settings::EngineSettings;

/// Errors from a single round trip to the model service.
///
/// Neither variant is fatal: the caller keeps its last known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    /// Network failure, timeout or non-2xx status.
    RemoteUnavailable(String),
    /// The service answered but the body is missing expected fields.
    MalformedResponse(String),
}

impl PredictionError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, PredictionError::MalformedResponse(_))
    }

    pub fn message(&self) -> &str {
        match self {
            PredictionError::RemoteUnavailable(msg) | PredictionError::MalformedResponse(msg) => {
                msg
            }
        }
    }
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionError::RemoteUnavailable(msg) => write!(f, "service unavailable: {msg}"),
            PredictionError::MalformedResponse(msg) => write!(f, "malformed response: {msg}"),
        }
    }
}

impl std::error::Error for PredictionError {}

impl From<reqwest::Error> for PredictionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PredictionError::MalformedResponse(e.to_string())
        } else {
            PredictionError::RemoteUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(e: serde_json::Error) -> Self {
        PredictionError::MalformedResponse(e.to_string())
    }
}

// =============================================================================
// Response types
// =============================================================================

/// Validated `/predict` response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskFeed {
    pub risks: RiskSnapshot,
    /// Temperature trend; `None` when absent or not all numeric.
    pub temps: Option<Vec<f64>>,
    pub ml: Option<MlOutlook>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPrediction {
    pub beds: u32,
    pub staff: u32,
    /// Which model produced the numbers (e.g. "ml", "rule-based").
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub beds_r2: f64,
    pub staff_r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TrainingMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrainingReport {
    /// Status line shown after a training run.
    pub fn summary(&self) -> String {
        if self.success {
            match self.metrics {
                Some(m) => format!(
                    "Model trained successfully! R² scores: Beds={}, Staff={}",
                    m.beds_r2, m.staff_r2
                ),
                None => "Model trained successfully!".to_string(),
            }
        } else {
            format!(
                "Training failed: {}",
                self.error.as_deref().unwrap_or("Unknown error")
            )
        }
    }
}

// =============================================================================
// Backend trait
// =============================================================================

/// One implementation per way of reaching a model: HTTP, the offline rule,
/// or a test stub. Every call is blocking and runs on the async compute pool.
pub trait PredictionBackend: Send + Sync + 'static {
    fn predict_risks(&self, region: Region) -> Result<RiskFeed, PredictionError>;

    fn predict_capacity(
        &self,
        sample: &EnvironmentalSample,
    ) -> Result<CapacityPrediction, PredictionError>;

    fn train_model(&self) -> Result<TrainingReport, PredictionError>;

    fn save_capacity(&self, state: CapacityState) -> Result<(), PredictionError>;

    fn fetch_report(&self) -> Result<Vec<u8>, PredictionError>;
}

/// Shared handle to the active backend.
#[derive(Resource, Clone)]
pub struct PredictionService(Arc<dyn PredictionBackend>);

impl PredictionService {
    pub fn new(backend: impl PredictionBackend) -> Self {
        Self(Arc::new(backend))
    }

    /// HTTP client for the configured service, or the rule-based predictor
    /// when offline or when the client cannot be built.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        if settings.offline {
            info!("Offline mode: using rule-based capacity predictor");
            return Self::new(RuleBasedPredictor);
        }
        match HttpPredictionClient::new(&settings.api_base, settings.request_timeout) {
            Ok(client) => {
                info!("Model service at {}", client.base_url());
                Self::new(client)
            }
            Err(e) => {
                warn!("Could not build HTTP client ({e}); falling back to rule-based predictor");
                Self::new(RuleBasedPredictor)
            }
        }
    }

    pub fn backend(&self) -> Arc<dyn PredictionBackend> {
        Arc::clone(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_summary_success() {
        let report = TrainingReport {
            success: true,
            metrics: Some(TrainingMetrics {
                beds_r2: 0.8123,
                staff_r2: 0.7,
            }),
            error: None,
        };
        assert_eq!(
            report.summary(),
            "Model trained successfully! R² scores: Beds=0.8123, Staff=0.7"
        );
    }

    #[test]
    fn test_training_summary_failure_defaults_to_unknown() {
        let report = TrainingReport {
            success: false,
            metrics: None,
            error: None,
        };
        assert_eq!(report.summary(), "Training failed: Unknown error");
        let report = TrainingReport {
            error: Some("no data".into()),
            ..report
        };
        assert_eq!(report.summary(), "Training failed: no data");
    }

    #[test]
    fn test_prediction_error_display() {
        let err = PredictionError::RemoteUnavailable("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
        assert!(!err.is_malformed());
        let err: PredictionError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_offline_settings_use_rule_based() {
        let settings = EngineSettings {
            offline: true,
            ..Default::default()
        };
        let service = PredictionService::from_settings(&settings);
        let feed = service.backend().predict_risks(Region::Pune).unwrap();
        assert!(feed.ml.is_none());
    }
}
