//! Validation of model-service response bodies.
//!
//! Each parser checks the whole body before returning, so a caller never
//! sees a half-applied response. A body missing the fields it needs is
//! [`PredictionError::MalformedResponse`].

use bevy::prelude::*;
use serde_json::Value;

use crate::outlook::MlOutlook;
use crate::prediction::{
    CapacityPrediction, PredictionError, RiskFeed, TrainingMetrics, TrainingReport,
};
use crate::risk::{HazardCategory, RiskSnapshot};

fn malformed(msg: impl Into<String>) -> PredictionError {
    PredictionError::MalformedResponse(msg.into())
}

/// `/predict` body: `{ risks: {hazard: score}, temps?: [number], ml?: {key: p} }`.
pub fn parse_risk_feed(body: &Value) -> Result<RiskFeed, PredictionError> {
    let risks = body
        .get("risks")
        .and_then(Value::as_object)
        .ok_or_else(|| malformed("response has no `risks` object"))?;

    let mut snapshot = RiskSnapshot::default();
    for (key, value) in risks {
        let Some(hazard) = HazardCategory::from_key(key) else {
            debug!("Ignoring unknown hazard `{key}` in risk feed");
            continue;
        };
        match value.as_f64() {
            Some(score) => {
                if !snapshot.set(hazard, score) {
                    warn!("Non-finite {key} score in risk feed; treating as unknown");
                }
            }
            None => warn!("Non-numeric {key} score in risk feed ({value}); treating as unknown"),
        }
    }

    let temps = body.get("temps").and_then(parse_temps);

    let ml = body.get("ml").and_then(Value::as_object).map(|map| {
        MlOutlook::from_pairs(
            map.iter()
                .filter_map(|(k, v)| v.as_f64().map(|p| (k.clone(), p))),
        )
    });

    Ok(RiskFeed {
        risks: snapshot,
        temps,
        ml,
    })
}

/// The trend is used only when every entry is a finite number.
fn parse_temps(value: &Value) -> Option<Vec<f64>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|v| v.as_f64().filter(|t| t.is_finite()))
        .collect()
}

fn count_field(body: &Value, field: &str) -> Result<u32, PredictionError> {
    let n = body
        .get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| malformed(format!("capacity prediction has no numeric `{field}`")))?;
    if !n.is_finite() || n < 0.0 {
        return Err(malformed(format!("capacity prediction `{field}` is {n}")));
    }
    Ok(n.round().min(u32::MAX as f64) as u32)
}

/// `/capacity/predict` body: `{ beds, staff, method, factors? }`.
pub fn parse_capacity_prediction(body: &Value) -> Result<CapacityPrediction, PredictionError> {
    let beds = count_field(body, "beds")?;
    let staff = count_field(body, "staff")?;
    let method = body
        .get("method")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("capacity prediction has no `method`"))?
        .to_string();
    let factors = body.get("factors").filter(|f| !f.is_null()).cloned();
    Ok(CapacityPrediction {
        beds,
        staff,
        method,
        factors,
    })
}

/// `/capacity/train` body: `{ success, metrics?: { beds_r2, staff_r2 }, error? }`.
pub fn parse_training_report(body: &Value) -> Result<TrainingReport, PredictionError> {
    let success = body
        .get("success")
        .and_then(Value::as_bool)
        .ok_or_else(|| malformed("training response has no boolean `success`"))?;
    let metrics = body.get("metrics").and_then(|m| {
        Some(TrainingMetrics {
            beds_r2: m.get("beds_r2")?.as_f64()?,
            staff_r2: m.get("staff_r2")?.as_f64()?,
        })
    });
    let error = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(TrainingReport {
        success,
        metrics,
        error,
    })
}
