//! Capacity suggestions, predictions, manual edits and saves end to end.

use std::time::Duration;

use crate::actions::EngineAction;
use crate::capacity::CapacityState;
use crate::capacity_predictor::LatestPrediction;
use crate::environment::EnvironmentalSample;
use crate::prediction::{PredictionError, RiskFeed};
use crate::risk::{HazardCategory, RiskSnapshot};
use crate::test_harness::{StubBackend, TestSession};

fn heat_feed(score: f64) -> Result<RiskFeed, PredictionError> {
    Ok(RiskFeed {
        risks: RiskSnapshot::default().with_score(HazardCategory::Heat, score),
        temps: None,
        ml: None,
    })
}

#[test]
fn test_default_session_readiness_is_91() {
    let session = TestSession::new();
    let obs = session.observe();
    assert_eq!(obs.capacity, CapacityState::new(50, 20));
    assert_eq!((obs.suggestion.beds_delta, obs.suggestion.staff_delta), (5, 2));
    assert_eq!(obs.readiness, 91);
}

#[test]
fn test_stubbed_prediction_applied_as_delta() {
    let mut session = TestSession::new();
    session
        .act(EngineAction::PredictCapacity(EnvironmentalSample::default()))
        .settle();

    let prediction = session
        .resource::<LatestPrediction>()
        .0
        .clone()
        .expect("prediction should have landed");
    assert_eq!((prediction.beds, prediction.staff), (40, 16));
    assert_eq!(prediction.method, "rule-based");
    assert_eq!(session.stub().state().samples, vec![EnvironmentalSample::default()]);

    session.act(EngineAction::ApplyPrediction).settle();
    assert_eq!(session.capacity(), CapacityState::new(90, 36));
    assert_eq!(session.stub().state().saved, vec![CapacityState::new(90, 36)]);
    assert!(session.has_status("Prediction applied. Capacity updated!"));
}

#[test]
fn test_double_apply_doubles_the_increment() {
    let mut session = TestSession::new();
    session.act(EngineAction::ApplySuggestion);
    session.act(EngineAction::ApplySuggestion).settle();

    assert_eq!(session.capacity(), CapacityState::new(60, 24));
    // The second push waits for the first, so the service ends on 60/24.
    assert_eq!(
        session.stub().state().saved,
        vec![CapacityState::new(55, 22), CapacityState::new(60, 24)]
    );
    assert!(session.has_status("Suggestions applied. Capacity updated!"));
}

#[test]
fn test_slow_push_does_not_overtake_newer_state() {
    let stub = StubBackend::default().with_save_delay(Duration::from_millis(300));
    let mut session = TestSession::with_stub(stub);
    session.act(EngineAction::ApplySuggestion);
    session.act(EngineAction::ApplySuggestion);
    session.act(EngineAction::ApplySuggestion).settle();

    assert_eq!(session.capacity(), CapacityState::new(65, 26));
    // 60/24 was replaced in the queue by 65/26 while the first push ran.
    assert_eq!(
        session.stub().state().saved,
        vec![CapacityState::new(55, 22), CapacityState::new(65, 26)]
    );
    let updated = session
        .statuses()
        .iter()
        .filter(|s| s.as_str() == "Suggestions applied. Capacity updated!")
        .count();
    assert_eq!(updated, 1);
}

#[test]
fn test_high_heat_selects_large_tier() {
    let stub = StubBackend::default().with_default_risk(heat_feed(0.85));
    let mut session = TestSession::with_stub(stub);
    session.act(EngineAction::RefreshRisk).settle();
    session.act(EngineAction::ApplySuggestion).settle();
    assert_eq!(session.capacity(), CapacityState::new(60, 25));
}

#[test]
fn test_heat_exactly_at_threshold_selects_small_tier() {
    let stub = StubBackend::default().with_default_risk(heat_feed(0.7));
    let mut session = TestSession::with_stub(stub);
    session.act(EngineAction::RefreshRisk).settle();
    session.act(EngineAction::ApplySuggestion).settle();
    assert_eq!(session.capacity(), CapacityState::new(55, 22));
}

#[test]
fn test_backend_failure_keeps_local_state() {
    let stub = StubBackend::default().with_save(Err(PredictionError::RemoteUnavailable(
        "connection refused".into(),
    )));
    let mut session = TestSession::with_stub(stub);

    session.act(EngineAction::ApplySuggestion).settle();
    assert_eq!(session.capacity(), CapacityState::new(55, 22));
    assert!(session.has_status("Updated locally. Backend save failed."));

    session.act(EngineAction::SaveCapacity).settle();
    assert_eq!(session.capacity(), CapacityState::new(55, 22));
    assert!(session.has_status("Saved locally. Backend save failed."));
}

#[test]
fn test_manual_save_persists_verbatim() {
    let mut session = TestSession::new();
    session.act(EngineAction::SaveCapacity).settle();
    assert_eq!(session.capacity(), CapacityState::default());
    assert_eq!(session.stub().state().saved, vec![CapacityState::default()]);
    assert!(session.has_status("Capacity saved!"));
}

#[test]
fn test_manual_edits_are_lenient_and_local() {
    let mut session = TestSession::new();
    session.act_all([
        EngineAction::EditBeds("abc".into()),
        EngineAction::EditStaff("30".into()),
    ]);
    assert_eq!(session.capacity(), CapacityState::new(0, 30));
    session.settle();
    assert!(session.stub().state().saved.is_empty());
}

#[test]
fn test_commands_apply_in_order() {
    let mut session = TestSession::new();
    session
        .act_all([
            EngineAction::EditBeds("10".into()),
            EngineAction::ApplySuggestion,
            EngineAction::EditStaff("1".into()),
        ])
        .settle();
    assert_eq!(session.capacity(), CapacityState::new(15, 1));
}

#[test]
fn test_apply_prediction_without_prediction_warns() {
    let mut session = TestSession::new();
    session.act(EngineAction::ApplyPrediction).settle();
    assert_eq!(session.capacity(), CapacityState::default());
    assert!(session.has_status("No capacity prediction to apply"));
    assert!(session.stub().state().saved.is_empty());
}

#[test]
fn test_readiness_drops_when_suggestion_grows() {
    let stub = StubBackend::default().with_default_risk(heat_feed(0.95));
    let mut session = TestSession::with_stub(stub);
    let before = session.observe().readiness;
    session.act(EngineAction::RefreshRisk).settle();
    let after = session.observe().readiness;
    // 0.6 * 100*50/60 + 0.4 * 100*20/25 = 50 + 32
    assert_eq!(after, 82);
    assert!(after < before);
}
