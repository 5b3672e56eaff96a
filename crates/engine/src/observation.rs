//! Read-only snapshot of everything a dashboard would display.

use bevy::prelude::*;
use serde::Serialize;

use crate::capacity::CapacityState;
use crate::capacity_predictor::{LatestPrediction, LatestTraining};
use crate::environment::Region;
use crate::outlook::{hazard_overview, integrate, CurrentOutlook, HazardOverview, OutlookLabels, OutlookView};
use crate::prediction::{CapacityPrediction, TrainingReport};
use crate::reports::LatestReport;
use crate::risk::{HazardCategory, RiskBand};
use crate::risk_feed::{CurrentRisk, FeedRegion, RiskSource};
use crate::session::{Capability, Role, SessionRole};
use crate::status::{JournalEntry, StatusBanner, StatusLog};
use crate::suggestion::CapacitySuggestion;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardObservation {
    pub role: Role,
    pub capabilities: Vec<Capability>,
    /// Region selected for the risk feed.
    pub region: Region,
    /// Region of the feed currently displayed, if one has landed.
    pub feed_region: Option<Region>,
    pub risk_source: RiskSource,
    pub headline_risk: f64,
    pub headline_band: RiskBand,
    pub hazards: Vec<HazardOverview>,
    pub dominant_hazard: Option<HazardCategory>,
    pub outlook: OutlookView,
    pub temps: Vec<f64>,
    pub capacity: CapacityState,
    pub suggestion: CapacitySuggestion,
    pub readiness: u8,
    pub latest_prediction: Option<CapacityPrediction>,
    pub latest_training: Option<TrainingReport>,
    pub latest_report_bytes: Option<usize>,
    pub statuses: Vec<StatusBanner>,
    pub recent_journal: Vec<JournalEntry>,
    pub requests_in_flight: usize,
}

/// Journal entries included in an observation.
const RECENT_JOURNAL: usize = 10;

/// Build an observation from whatever resources are present. Missing
/// resources read as their defaults.
pub fn observe(world: &World) -> DashboardObservation {
    let role = world.get_resource::<SessionRole>().copied().unwrap_or_default().0;
    let region = world
        .get_resource::<FeedRegion>()
        .map(|r| r.0)
        .unwrap_or_default();
    let default_risk = CurrentRisk::default();
    let risk = world.get_resource::<CurrentRisk>().unwrap_or(&default_risk);
    let default_labels = OutlookLabels::default();
    let labels = world
        .get_resource::<OutlookLabels>()
        .unwrap_or(&default_labels);
    let outlook = world
        .get_resource::<CurrentOutlook>()
        .and_then(|o| o.0.as_ref());
    let capacity = world
        .get_resource::<CapacityState>()
        .copied()
        .unwrap_or_default();

    let suggestion = risk.suggestion();
    let headline = risk.live_risk;

    let (statuses, recent_journal) = match world.get_resource::<StatusLog>() {
        Some(log) => {
            let skip = log.journal.len().saturating_sub(RECENT_JOURNAL);
            (
                log.active.iter().filter(|b| !b.dismissed).cloned().collect(),
                log.journal[skip..].to_vec(),
            )
        }
        None => (Vec::new(), Vec::new()),
    };

    DashboardObservation {
        role,
        capabilities: role.capabilities().to_vec(),
        region,
        feed_region: risk.region,
        risk_source: risk.source,
        headline_risk: headline,
        headline_band: RiskBand::from_score(headline),
        hazards: hazard_overview(&risk.snapshot, outlook),
        dominant_hazard: risk.snapshot.dominant().map(|(h, _)| h),
        outlook: integrate(outlook, labels),
        temps: risk.temps.clone(),
        capacity,
        suggestion,
        readiness: capacity.readiness(&suggestion),
        latest_prediction: world
            .get_resource::<LatestPrediction>()
            .and_then(|p| p.0.clone()),
        latest_training: world
            .get_resource::<LatestTraining>()
            .and_then(|t| t.0.clone()),
        latest_report_bytes: world
            .get_resource::<LatestReport>()
            .and_then(|r| r.bytes),
        statuses,
        recent_journal,
        requests_in_flight: crate::in_flight_requests(world),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_world_observes_defaults() {
        let world = World::new();
        let obs = observe(&world);
        assert_eq!(obs.role, Role::Guest);
        assert_eq!(obs.capacity, CapacityState::default());
        assert_eq!(obs.risk_source, RiskSource::LocalDefaults);
        assert_eq!(obs.suggestion, CapacitySuggestion::new(5, 2));
        assert_eq!(obs.readiness, 91);
        assert!(!obs.outlook.is_available());
        assert_eq!(obs.requests_in_flight, 0);
    }

    #[test]
    fn test_observation_serializes() {
        let world = World::new();
        let json = serde_json::to_value(observe(&world)).unwrap();
        assert_eq!(json["capacity"]["beds"], 50);
        assert_eq!(json["outlook"]["state"], "no_predictions");
        assert_eq!(json["risk_source"], "local_defaults");
    }
}
