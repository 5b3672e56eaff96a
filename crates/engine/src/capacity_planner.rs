//! Single writer for `CapacityState`.
//!
//! Every mutation arrives as a `CapacityCommand` and is applied in order by
//! `process_capacity_commands`. Each accepted change is announced as a
//! `CapacityCommitted` event. Applies and saves are then pushed to the model
//! service one at a time, so the service always ends on the newest state;
//! the local state stands whatever the service answers.

use std::sync::Arc;

use bevy::prelude::*;
use serde::Serialize;

use crate::capacity::{parse_capacity_input, CapacityState};
use crate::capacity_predictor::LatestPrediction;
use crate::prediction::{PredictionBackend, PredictionService};
use crate::remote::{DispatchPolicy, RemoteChannel, RemoteOutcome};
use crate::risk_feed::CurrentRisk;
use crate::status::StatusEvent;
use crate::suggestion::{apply, CapacitySuggestion};
use crate::EngineSet;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum CapacityCommand {
    /// Add the increments suggested for the current risk.
    ApplySuggestion,
    /// Add the latest capacity prediction as increments.
    ApplyPrediction,
    EditBeds(String),
    EditStaff(String),
    /// Persist the current state verbatim.
    Save,
    /// Replace the state with one loaded from local storage.
    Restore(CapacityState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitCause {
    SuggestionApplied,
    PredictionApplied,
    Edited,
    Saved,
    Restored,
}

impl CommitCause {
    /// Whether this change is pushed to the model service.
    pub fn syncs_remote(self) -> bool {
        matches!(
            self,
            CommitCause::SuggestionApplied | CommitCause::PredictionApplied | CommitCause::Saved
        )
    }

    fn synced_message(self) -> &'static str {
        match self {
            CommitCause::SuggestionApplied => "Suggestions applied. Capacity updated!",
            CommitCause::PredictionApplied => "Prediction applied. Capacity updated!",
            _ => "Capacity saved!",
        }
    }

    fn unsynced_message(self) -> &'static str {
        match self {
            CommitCause::Saved => "Saved locally. Backend save failed.",
            _ => "Updated locally. Backend save failed.",
        }
    }
}

/// A change to `CapacityState` that has been applied.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityCommitted {
    pub state: CapacityState,
    pub cause: CommitCause,
}

/// Pushes of capacity to the model service.
///
/// At most one push runs at a time. A commit made while one is running is
/// queued, and a newer commit replaces the queued one. Only the answer to the
/// last push of a burst is reported.
#[derive(Resource)]
pub struct CapacitySync {
    channel: RemoteChannel<(), CommitCause>,
    queued: Option<(CapacityState, CommitCause)>,
}

impl Default for CapacitySync {
    fn default() -> Self {
        Self {
            channel: RemoteChannel::new(DispatchPolicy::SingleFlight),
            queued: None,
        }
    }
}

impl CapacitySync {
    /// Running pushes plus the queued one.
    pub fn in_flight(&self) -> usize {
        self.channel.in_flight() + usize::from(self.queued.is_some())
    }

    /// Send `state` now, or queue it behind the running push.
    pub(crate) fn push(
        &mut self,
        backend: Arc<dyn PredictionBackend>,
        state: CapacityState,
        cause: CommitCause,
    ) {
        match self
            .channel
            .dispatch(cause, move || backend.save_capacity(state))
        {
            Ok(seq) => debug!("Capacity sync #{seq} sent"),
            Err(busy) => {
                debug!(
                    "Capacity sync busy with #{}, queueing {} beds / {} staff",
                    busy.in_flight_seq,
                    state.beds(),
                    state.staff()
                );
                self.queued = Some((state, cause));
            }
        }
    }

    /// Send the queued state once nothing is running.
    fn flush(&mut self, backend: Arc<dyn PredictionBackend>) {
        if self.channel.in_flight() > 0 {
            return;
        }
        if let Some((state, cause)) = self.queued.take() {
            self.push(backend, state, cause);
        }
    }
}

// =============================================================================
// Systems
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn process_capacity_commands(
    mut commands: EventReader<CapacityCommand>,
    mut capacity: ResMut<CapacityState>,
    risk: Res<CurrentRisk>,
    prediction: Res<LatestPrediction>,
    service: Res<PredictionService>,
    mut sync: ResMut<CapacitySync>,
    mut committed: EventWriter<CapacityCommitted>,
    mut status: EventWriter<StatusEvent>,
) {
    for command in commands.read() {
        let (next, cause) = match command {
            CapacityCommand::ApplySuggestion => {
                let suggestion = risk.suggestion();
                (apply(*capacity, suggestion), CommitCause::SuggestionApplied)
            }
            CapacityCommand::ApplyPrediction => match &prediction.0 {
                Some(p) => (
                    apply(*capacity, CapacitySuggestion::from_prediction(p)),
                    CommitCause::PredictionApplied,
                ),
                None => {
                    status.send(StatusEvent::warning(
                        "No capacity prediction to apply. Run a prediction first.",
                    ));
                    continue;
                }
            },
            CapacityCommand::EditBeds(raw) => (
                capacity.with_beds(parse_capacity_input(raw)),
                CommitCause::Edited,
            ),
            CapacityCommand::EditStaff(raw) => (
                capacity.with_staff(parse_capacity_input(raw)),
                CommitCause::Edited,
            ),
            CapacityCommand::Save => (*capacity, CommitCause::Saved),
            CapacityCommand::Restore(state) => (*state, CommitCause::Restored),
        };

        info!(
            "Capacity {:?}: beds {} -> {}, staff {} -> {}",
            cause,
            capacity.beds(),
            next.beds(),
            capacity.staff(),
            next.staff()
        );
        *capacity = next;
        committed.send(CapacityCommitted { state: next, cause });

        if cause.syncs_remote() {
            sync.push(service.backend(), next, cause);
        }
    }
}

fn collect_capacity_sync(
    mut sync: ResMut<CapacitySync>,
    service: Res<PredictionService>,
    mut status: EventWriter<StatusEvent>,
) {
    for done in sync.channel.poll() {
        if sync.queued.is_some() {
            debug!("Capacity sync #{} superseded by a queued change", done.seq);
            continue;
        }
        match done.outcome {
            RemoteOutcome::Success(()) => {
                info!("Capacity sync #{} acknowledged", done.seq);
                status.send(StatusEvent::success(done.context.synced_message()));
            }
            RemoteOutcome::RemoteFailure(msg) | RemoteOutcome::MalformedIgnored(msg) => {
                warn!("Capacity sync #{} failed: {msg}", done.seq);
                status.send(StatusEvent::warning(done.context.unsynced_message()));
            }
        }
    }
    sync.flush(service.backend());
}

pub struct CapacityPlannerPlugin;

impl Plugin for CapacityPlannerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CapacityState>()
            .init_resource::<CapacitySync>()
            .add_event::<CapacityCommand>()
            .add_event::<CapacityCommitted>()
            .add_systems(
                Update,
                (
                    process_capacity_commands.in_set(EngineSet::Dispatch),
                    collect_capacity_sync.in_set(EngineSet::Collect),
                ),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_applies_and_saves_sync() {
        assert!(CommitCause::SuggestionApplied.syncs_remote());
        assert!(CommitCause::PredictionApplied.syncs_remote());
        assert!(CommitCause::Saved.syncs_remote());
        assert!(!CommitCause::Edited.syncs_remote());
        assert!(!CommitCause::Restored.syncs_remote());
    }

    #[test]
    fn test_sync_messages() {
        assert_eq!(
            CommitCause::SuggestionApplied.synced_message(),
            "Suggestions applied. Capacity updated!"
        );
        assert_eq!(CommitCause::Saved.synced_message(), "Capacity saved!");
        assert_eq!(
            CommitCause::Saved.unsynced_message(),
            "Saved locally. Backend save failed."
        );
        assert_eq!(
            CommitCause::PredictionApplied.unsynced_message(),
            "Updated locally. Backend save failed."
        );
    }
}
