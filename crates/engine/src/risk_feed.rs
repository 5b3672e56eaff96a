//! Live risk feed for the selected region.
//!
//! Refreshes are dispatched to the model service in the background. Only the
//! newest request's response is applied: a region switch while an older
//! request is still running makes that older response stale.

use std::time::Duration;

use bevy::prelude::*;
use serde::Serialize;

use crate::environment::Region;
use crate::outlook::{CurrentOutlook, MlOutlook};
use crate::prediction::{PredictionService, RiskFeed};
use crate::remote::{DispatchPolicy, RemoteChannel, RemoteOutcome};
use crate::config::DEFAULT_HEAT_RISK;
use crate::risk::{HazardCategory, RiskSnapshot};
use crate::settings::EngineSettings;
use crate::status::StatusEvent;
use crate::suggestion::CapacitySuggestion;
use crate::EngineSet;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFeedRequest {
    /// Re-fetch for the currently selected region.
    Refresh,
    /// Switch region and fetch for it.
    SelectRegion(Region),
}

/// Region the next feed request is made for.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedRegion(pub Region);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSource {
    /// No feed has landed yet.
    LocalDefaults,
    Remote,
}

#[derive(Resource, Debug, Clone)]
pub struct CurrentRisk {
    pub snapshot: RiskSnapshot,
    pub source: RiskSource,
    /// Heat score from the last feed that reported one. Drives suggestions.
    pub live_risk: f64,
    /// Temperature trend from the last feed that carried a valid one.
    pub temps: Vec<f64>,
    /// Region of the applied feed; `None` until one lands.
    pub region: Option<Region>,
    /// Sequence number of the applied feed.
    pub feed_seq: u64,
}

impl Default for CurrentRisk {
    fn default() -> Self {
        Self {
            snapshot: RiskSnapshot::local_defaults(),
            source: RiskSource::LocalDefaults,
            live_risk: DEFAULT_HEAT_RISK,
            temps: Vec::new(),
            region: None,
            feed_seq: 0,
        }
    }
}

impl CurrentRisk {
    /// Increments suggested for the live risk.
    pub fn suggestion(&self) -> CapacitySuggestion {
        CapacitySuggestion::for_risk(self.live_risk)
    }

    /// Replace the snapshot wholesale with a validated feed. Returns the
    /// outlook when the feed carried a non-empty one.
    pub(crate) fn apply_feed(&mut self, region: Region, seq: u64, feed: RiskFeed) -> Option<MlOutlook> {
        // A feed without heat leaves the live risk where it was.
        if let Some(heat) = feed.risks.get(HazardCategory::Heat) {
            self.live_risk = heat;
        }
        self.snapshot = feed.risks;
        self.source = RiskSource::Remote;
        self.region = Some(region);
        self.feed_seq = seq;
        if let Some(temps) = feed.temps {
            self.temps = temps;
        }
        feed.ml.filter(|ml| !ml.is_empty())
    }
}

#[derive(Resource)]
pub struct RiskFeedRequests(pub(crate) RemoteChannel<RiskFeed, Region>);

impl Default for RiskFeedRequests {
    fn default() -> Self {
        Self(RemoteChannel::new(DispatchPolicy::Supersede))
    }
}

impl RiskFeedRequests {
    pub fn in_flight(&self) -> usize {
        self.0.in_flight()
    }
}

// =============================================================================
// Systems
// =============================================================================

fn request_initial_refresh(settings: Res<EngineSettings>, mut requests: EventWriter<RiskFeedRequest>) {
    if settings.refresh_on_start {
        requests.send(RiskFeedRequest::Refresh);
    }
}

fn request_periodic_refresh(
    settings: Res<EngineSettings>,
    time: Res<Time>,
    mut next_due: Local<Option<Duration>>,
    mut requests: EventWriter<RiskFeedRequest>,
) {
    let Some(interval) = settings.refresh_interval else {
        return;
    };
    let now = time.elapsed();
    match *next_due {
        Some(due) if now < due => {}
        Some(_) => {
            requests.send(RiskFeedRequest::Refresh);
            *next_due = Some(now + interval);
        }
        None => *next_due = Some(now + interval),
    }
}

/// All requests raised in one update collapse into a single fetch for the
/// last selected region.
fn dispatch_risk_requests(
    mut requests: EventReader<RiskFeedRequest>,
    mut region: ResMut<FeedRegion>,
    mut channel: ResMut<RiskFeedRequests>,
    service: Res<PredictionService>,
) {
    let mut wanted = false;
    for request in requests.read() {
        wanted = true;
        if let RiskFeedRequest::SelectRegion(r) = request {
            region.0 = *r;
        }
    }
    if !wanted {
        return;
    }

    let target = region.0;
    let backend = service.backend();
    match channel.0.dispatch(target, move || backend.predict_risks(target)) {
        Ok(seq) => debug!("Risk feed request #{seq} for {target}"),
        Err(busy) => debug!("Risk feed busy with #{}", busy.in_flight_seq),
    }
}

fn collect_risk_feed(
    mut channel: ResMut<RiskFeedRequests>,
    mut risk: ResMut<CurrentRisk>,
    mut outlook: ResMut<CurrentOutlook>,
    mut status: EventWriter<StatusEvent>,
) {
    for done in channel.0.poll() {
        if done.stale {
            debug!("Dropping stale risk feed #{} for {}", done.seq, done.context);
            continue;
        }
        match done.outcome {
            RemoteOutcome::Success(feed) => {
                info!(
                    "Risk feed #{} for {}: {} hazards, outlook {}",
                    done.seq,
                    done.context,
                    feed.risks.len(),
                    if feed.ml.as_ref().is_some_and(|m| !m.is_empty()) {
                        "updated"
                    } else {
                        "kept"
                    }
                );
                if let Some(ml) = risk.apply_feed(done.context, done.seq, feed) {
                    outlook.0 = Some(ml);
                }
            }
            RemoteOutcome::RemoteFailure(msg) => {
                warn!("Risk feed #{} failed: {msg}", done.seq);
                status.send(StatusEvent::error(format!("Failed to fetch prediction: {msg}")));
            }
            RemoteOutcome::MalformedIgnored(msg) => {
                warn!("Risk feed #{} ignored: {msg}", done.seq);
                status.send(StatusEvent::warning(format!(
                    "Risk feed not updated: {msg}"
                )));
            }
        }
    }
}

pub struct RiskFeedPlugin;

impl Plugin for RiskFeedPlugin {
    fn build(&self, app: &mut App) {
        let region = app
            .world()
            .get_resource::<EngineSettings>()
            .map(|s| s.region)
            .unwrap_or_default();
        app.insert_resource(FeedRegion(region))
            .init_resource::<CurrentRisk>()
            .init_resource::<CurrentOutlook>()
            .init_resource::<RiskFeedRequests>()
            .add_event::<RiskFeedRequest>()
            .add_systems(Startup, request_initial_refresh)
            .add_systems(
                Update,
                (
                    request_periodic_refresh.in_set(EngineSet::Route),
                    dispatch_risk_requests.in_set(EngineSet::Dispatch),
                    collect_risk_feed.in_set(EngineSet::Collect),
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_local_heat_seed() {
        let risk = CurrentRisk::default();
        assert_eq!(risk.source, RiskSource::LocalDefaults);
        assert_eq!(risk.suggestion(), CapacitySuggestion::new(5, 2));
        assert!(risk.region.is_none());
    }

    #[test]
    fn test_apply_feed_replaces_snapshot_wholesale() {
        let mut risk = CurrentRisk::default();
        let feed = RiskFeed {
            risks: RiskSnapshot::default().with_score(HazardCategory::Flood, 0.9),
            temps: Some(vec![30.0, 31.0]),
            ml: Some(MlOutlook::default()),
        };
        let outlook = risk.apply_feed(Region::Mumbai, 4, feed);
        assert!(outlook.is_none(), "empty outlook must not be returned");
        assert_eq!(risk.snapshot.get(HazardCategory::Heat), None);
        assert_eq!(risk.snapshot.get(HazardCategory::Flood), Some(0.9));
        assert_eq!(risk.temps, vec![30.0, 31.0]);
        assert_eq!(risk.region, Some(Region::Mumbai));
        assert_eq!(risk.feed_seq, 4);
        // Heat is unknown in this feed, so the seeded live risk stays.
        assert_eq!(risk.live_risk, DEFAULT_HEAT_RISK);
        assert_eq!(risk.suggestion(), CapacitySuggestion::new(5, 2));
    }

    #[test]
    fn test_apply_feed_keeps_temps_when_absent() {
        let mut risk = CurrentRisk {
            temps: vec![29.0],
            ..Default::default()
        };
        let feed = RiskFeed {
            risks: RiskSnapshot::default().with_score(HazardCategory::Heat, 0.95),
            temps: None,
            ml: Some(MlOutlook::from_pairs([("high_heat", 0.8)])),
        };
        let outlook = risk.apply_feed(Region::Delhi, 1, feed);
        assert_eq!(outlook.unwrap().get("high_heat"), Some(0.8));
        assert_eq!(risk.temps, vec![29.0]);
        assert_eq!(risk.suggestion(), CapacitySuggestion::new(10, 5));
    }

    #[test]
    fn test_feed_without_heat_keeps_live_risk() {
        let mut risk = CurrentRisk::default();
        let hot = RiskFeed {
            risks: RiskSnapshot::default().with_score(HazardCategory::Heat, 0.9),
            temps: None,
            ml: None,
        };
        risk.apply_feed(Region::Delhi, 1, hot);
        assert_eq!(risk.suggestion(), CapacitySuggestion::new(10, 5));

        let flood_only = RiskFeed {
            risks: RiskSnapshot::default().with_score(HazardCategory::Flood, 0.9),
            temps: None,
            ml: None,
        };
        risk.apply_feed(Region::Delhi, 2, flood_only);
        assert_eq!(risk.snapshot.get(HazardCategory::Heat), None);
        assert_eq!(risk.live_risk, 0.9);
        assert_eq!(risk.suggestion(), CapacitySuggestion::new(10, 5));
    }
}
