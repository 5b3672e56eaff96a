//! User-facing actions and role gating.
//!
//! Front ends send `EngineAction`s. `route_actions` drops the ones the
//! session role does not enable and forwards the rest to the plugin that
//! owns them.

use bevy::prelude::*;

use crate::capacity_planner::CapacityCommand;
use crate::capacity_predictor::PredictorRequest;
use crate::environment::{EnvironmentalSample, Region};
use crate::reports::ReportRequest;
use crate::risk_feed::RiskFeedRequest;
use crate::session::{Capability, SessionRole};
use crate::status::StatusEvent;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum EngineAction {
    RefreshRisk,
    SelectRegion(Region),
    PredictCapacity(EnvironmentalSample),
    TrainModel,
    DownloadReport,
    ApplySuggestion,
    ApplyPrediction,
    /// Raw text from the beds field.
    EditBeds(String),
    /// Raw text from the staff field.
    EditStaff(String),
    SaveCapacity,
}

impl EngineAction {
    pub fn required_capability(&self) -> Capability {
        match self {
            EngineAction::RefreshRisk | EngineAction::SelectRegion(_) => Capability::ViewOverview,
            EngineAction::PredictCapacity(_) => Capability::PredictCapacity,
            EngineAction::TrainModel => Capability::TrainModel,
            EngineAction::DownloadReport => Capability::DownloadReports,
            EngineAction::ApplySuggestion
            | EngineAction::ApplyPrediction
            | EngineAction::EditBeds(_)
            | EngineAction::EditStaff(_)
            | EngineAction::SaveCapacity => Capability::ManageCapacity,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EngineAction::RefreshRisk => "refresh",
            EngineAction::SelectRegion(_) => "select_region",
            EngineAction::PredictCapacity(_) => "predict_capacity",
            EngineAction::TrainModel => "train",
            EngineAction::DownloadReport => "report",
            EngineAction::ApplySuggestion => "apply_suggestion",
            EngineAction::ApplyPrediction => "apply_prediction",
            EngineAction::EditBeds(_) => "edit_beds",
            EngineAction::EditStaff(_) => "edit_staff",
            EngineAction::SaveCapacity => "save",
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn route_actions(
    mut actions: EventReader<EngineAction>,
    role: Res<SessionRole>,
    mut feed: EventWriter<RiskFeedRequest>,
    mut predictor: EventWriter<PredictorRequest>,
    mut reports: EventWriter<ReportRequest>,
    mut capacity: EventWriter<CapacityCommand>,
    mut status: EventWriter<StatusEvent>,
) {
    for action in actions.read() {
        if !role.can(action.required_capability()) {
            warn!("Dropping `{}`: not enabled for role {}", action.name(), role.0);
            status.send(StatusEvent::warning(format!(
                "`{}` is not available for the {} role",
                action.name(),
                role.0
            )));
            continue;
        }
        debug!("Routing `{}`", action.name());
        match action {
            EngineAction::RefreshRisk => {
                feed.send(RiskFeedRequest::Refresh);
            }
            EngineAction::SelectRegion(region) => {
                feed.send(RiskFeedRequest::SelectRegion(*region));
            }
            EngineAction::PredictCapacity(sample) => {
                predictor.send(PredictorRequest::PredictCapacity(*sample));
            }
            EngineAction::TrainModel => {
                predictor.send(PredictorRequest::TrainModel);
            }
            EngineAction::DownloadReport => {
                reports.send(ReportRequest);
            }
            EngineAction::ApplySuggestion => {
                capacity.send(CapacityCommand::ApplySuggestion);
            }
            EngineAction::ApplyPrediction => {
                capacity.send(CapacityCommand::ApplyPrediction);
            }
            EngineAction::EditBeds(raw) => {
                capacity.send(CapacityCommand::EditBeds(raw.clone()));
            }
            EngineAction::EditStaff(raw) => {
                capacity.send(CapacityCommand::EditStaff(raw.clone()));
            }
            EngineAction::SaveCapacity => {
                capacity.send(CapacityCommand::Save);
            }
        }
    }
}
