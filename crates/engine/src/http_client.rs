//! Blocking HTTP client for the model service.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::capacity::CapacityState;
use crate::environment::{EnvironmentalSample, Region};
use crate::prediction::{
    CapacityPrediction, PredictionBackend, PredictionError, RiskFeed, TrainingReport,
};
use crate::wire::{parse_capacity_prediction, parse_risk_feed, parse_training_report};

pub struct HttpPredictionClient {
    client: Client,
    base_url: String,
}

impl HttpPredictionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PredictionError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn post_json(&self, path: &str, body: &Value) -> Result<Value, PredictionError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()?
            .error_for_status()?;
        Ok(response.json::<Value>()?)
    }
}

impl PredictionBackend for HttpPredictionClient {
    fn predict_risks(&self, region: Region) -> Result<RiskFeed, PredictionError> {
        let body = self.post_json("/predict", &json!({ "region": region.name() }))?;
        parse_risk_feed(&body)
    }

    fn predict_capacity(
        &self,
        sample: &EnvironmentalSample,
    ) -> Result<CapacityPrediction, PredictionError> {
        let body = self.post_json("/capacity/predict", &serde_json::to_value(sample)?)?;
        parse_capacity_prediction(&body)
    }

    fn train_model(&self) -> Result<TrainingReport, PredictionError> {
        let response = self
            .client
            .post(self.url("/capacity/train"))
            .send()?
            .error_for_status()?;
        parse_training_report(&response.json::<Value>()?)
    }

    fn save_capacity(&self, state: CapacityState) -> Result<(), PredictionError> {
        // Any 2xx is an ack; the body is not inspected.
        self.client
            .post(self.url("/capacity"))
            .json(&state)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn fetch_report(&self) -> Result<Vec<u8>, PredictionError> {
        let response = self
            .client
            .get(self.url("/reports"))
            .send()?
            .error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }
}
