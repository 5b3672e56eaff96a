//! In-memory `PredictionBackend` with scripted answers and a call log.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::capacity::CapacityState;
use crate::environment::{EnvironmentalSample, Region};
use crate::prediction::{
    CapacityPrediction, PredictionBackend, PredictionError, RiskFeed, TrainingReport,
};
use crate::rule_based::RuleBasedPredictor;

pub struct StubState {
    /// Answer per region; regions without one get `default_risk`.
    pub risk_results: HashMap<Region, Result<RiskFeed, PredictionError>>,
    pub default_risk: Result<RiskFeed, PredictionError>,
    /// Artificial latency per region.
    pub risk_delays: HashMap<Region, Duration>,
    /// `None` answers with the rule-based predictor.
    pub capacity_result: Option<Result<CapacityPrediction, PredictionError>>,
    pub training_result: Result<TrainingReport, PredictionError>,
    pub save_result: Result<(), PredictionError>,
    /// Latency of successive saves, consumed one per call.
    pub save_delays: VecDeque<Duration>,
    pub report_result: Result<Vec<u8>, PredictionError>,

    // Call log
    pub risk_regions: Vec<Region>,
    pub samples: Vec<EnvironmentalSample>,
    pub trainings: usize,
    pub saved: Vec<CapacityState>,
    pub reports: usize,
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            risk_results: HashMap::new(),
            default_risk: Ok(RiskFeed::default()),
            risk_delays: HashMap::new(),
            capacity_result: None,
            training_result: Ok(TrainingReport {
                success: true,
                metrics: None,
                error: None,
            }),
            save_result: Ok(()),
            save_delays: VecDeque::new(),
            report_result: Ok(b"region,heat,flood\nDelhi,0.8,0.1\n".to_vec()),
            risk_regions: Vec::new(),
            samples: Vec::new(),
            trainings: 0,
            saved: Vec::new(),
            reports: 0,
        }
    }
}

/// Cloning shares the same scripted state.
#[derive(Clone, Default)]
pub struct StubBackend {
    state: Arc<Mutex<StubState>>,
}

impl StubBackend {
    /// Lock the scripted state. A poisoned lock means a test already failed.
    pub fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_risk(self, region: Region, result: Result<RiskFeed, PredictionError>) -> Self {
        self.state().risk_results.insert(region, result);
        self
    }

    pub fn with_default_risk(self, result: Result<RiskFeed, PredictionError>) -> Self {
        self.state().default_risk = result;
        self
    }

    pub fn with_risk_delay(self, region: Region, delay: Duration) -> Self {
        self.state().risk_delays.insert(region, delay);
        self
    }

    pub fn with_capacity(self, result: Result<CapacityPrediction, PredictionError>) -> Self {
        self.state().capacity_result = Some(result);
        self
    }

    pub fn with_training(self, result: Result<TrainingReport, PredictionError>) -> Self {
        self.state().training_result = result;
        self
    }

    pub fn with_save(self, result: Result<(), PredictionError>) -> Self {
        self.state().save_result = result;
        self
    }

    pub fn with_save_delay(self, delay: Duration) -> Self {
        self.state().save_delays.push_back(delay);
        self
    }

    pub fn with_report(self, result: Result<Vec<u8>, PredictionError>) -> Self {
        self.state().report_result = result;
        self
    }
}

impl PredictionBackend for StubBackend {
    fn predict_risks(&self, region: Region) -> Result<RiskFeed, PredictionError> {
        let (delay, result) = {
            let mut s = self.state();
            s.risk_regions.push(region);
            let result = s
                .risk_results
                .get(&region)
                .cloned()
                .unwrap_or_else(|| s.default_risk.clone());
            (s.risk_delays.get(&region).copied(), result)
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        result
    }

    fn predict_capacity(
        &self,
        sample: &EnvironmentalSample,
    ) -> Result<CapacityPrediction, PredictionError> {
        let mut s = self.state();
        s.samples.push(*sample);
        match &s.capacity_result {
            Some(result) => result.clone(),
            None => RuleBasedPredictor.predict_capacity(sample),
        }
    }

    fn train_model(&self) -> Result<TrainingReport, PredictionError> {
        let mut s = self.state();
        s.trainings += 1;
        s.training_result.clone()
    }

    /// Records the state once the delay has passed, in arrival order.
    fn save_capacity(&self, state: CapacityState) -> Result<(), PredictionError> {
        let delay = self.state().save_delays.pop_front();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let mut s = self.state();
        s.saved.push(state);
        s.save_result.clone()
    }

    fn fetch_report(&self) -> Result<Vec<u8>, PredictionError> {
        let mut s = self.state();
        s.reports += 1;
        s.report_result.clone()
    }
}
