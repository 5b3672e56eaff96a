use bevy::prelude::*;

pub mod actions;
pub mod capacity;
pub mod capacity_planner;
pub mod capacity_predictor;
pub mod command_protocol;
pub mod config;
pub mod environment;
pub mod http_client;
pub mod observation;
pub mod outlook;
pub mod prediction;
pub mod readiness;
pub mod remote;
pub mod reports;
pub mod risk;
pub mod risk_feed;
pub mod rule_based;
pub mod session;
pub mod settings;
pub mod status;
pub mod suggestion;
pub mod wire;

#[cfg(test)]
mod integration_tests;
#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

use capacity_planner::{CapacityPlannerPlugin, CapacitySync};
use capacity_predictor::{CapacityPredictorPlugin, PredictionRequests, TrainingRequests};
use outlook::OutlookLabels;
use prediction::PredictionService;
use reports::{ReportRequests, ReportsPlugin};
use risk_feed::{RiskFeedPlugin, RiskFeedRequests};
use session::SessionRole;
use settings::EngineSettings;
use status::StatusPlugin;

// ---------------------------------------------------------------------------
// Update ordering
// ---------------------------------------------------------------------------

/// Phases of one engine update, run in this order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineSet {
    /// Turn front-end actions into per-plugin requests.
    Route,
    /// Start remote calls and apply capacity commands.
    Dispatch,
    /// Poll finished remote calls.
    Collect,
    /// Write committed state to local storage.
    Persist,
    /// Collect and expire status banners.
    Report,
}

/// Remote calls currently running across every channel.
pub fn in_flight_requests(world: &World) -> usize {
    world
        .get_resource::<RiskFeedRequests>()
        .map_or(0, |c| c.in_flight())
        + world
            .get_resource::<CapacitySync>()
            .map_or(0, |c| c.in_flight())
        + world
            .get_resource::<PredictionRequests>()
            .map_or(0, |c| c.0.in_flight())
        + world
            .get_resource::<TrainingRequests>()
            .map_or(0, |c| c.0.in_flight())
        + world
            .get_resource::<ReportRequests>()
            .map_or(0, |c| c.0.in_flight())
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

/// The planning engine. Uses an `EngineSettings` or `PredictionService`
/// already in the world, otherwise builds them from the environment.
pub struct EnginePlugin;

impl Plugin for EnginePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<EngineSettings>() {
            app.insert_resource(EngineSettings::from_env());
        }
        let settings = app.world().resource::<EngineSettings>().clone();
        info!(
            "Planning engine: region {}, role {}, {}",
            settings.region,
            settings.role,
            if settings.offline {
                "offline".to_string()
            } else {
                format!("model service {}", settings.api_base)
            }
        );

        if !app.world().contains_resource::<PredictionService>() {
            app.insert_resource(PredictionService::from_settings(&settings));
        }

        app.insert_resource(SessionRole(settings.role))
            .init_resource::<OutlookLabels>()
            .add_event::<actions::EngineAction>()
            .configure_sets(
                Update,
                (
                    EngineSet::Route,
                    EngineSet::Dispatch,
                    EngineSet::Collect,
                    EngineSet::Persist,
                    EngineSet::Report,
                )
                    .chain(),
            )
            .add_systems(Update, actions::route_actions.in_set(EngineSet::Route))
            .add_plugins((
                StatusPlugin,
                RiskFeedPlugin,
                CapacityPredictorPlugin,
                CapacityPlannerPlugin,
                ReportsPlugin,
            ));
    }
}
