//! Capacity prediction and model training requests.
//!
//! Both are single-flight: while one is running, another request of the
//! same kind is refused with an info banner.

use bevy::prelude::*;

use crate::environment::EnvironmentalSample;
use crate::prediction::{CapacityPrediction, PredictionService, TrainingReport};
use crate::remote::{DispatchPolicy, RemoteChannel, RemoteOutcome};
use crate::status::StatusEvent;
use crate::EngineSet;

#[derive(Event, Debug, Clone, PartialEq)]
pub enum PredictorRequest {
    PredictCapacity(EnvironmentalSample),
    TrainModel,
}

/// Last successful capacity prediction and the sample it was made for.
#[derive(Resource, Debug, Clone, Default)]
pub struct LatestPrediction(pub Option<CapacityPrediction>);

#[derive(Resource, Debug, Clone, Default)]
pub struct LatestSample(pub EnvironmentalSample);

#[derive(Resource, Debug, Clone, Default)]
pub struct LatestTraining(pub Option<TrainingReport>);

#[derive(Resource)]
pub struct PredictionRequests(pub(crate) RemoteChannel<CapacityPrediction, EnvironmentalSample>);

impl Default for PredictionRequests {
    fn default() -> Self {
        Self(RemoteChannel::new(DispatchPolicy::SingleFlight))
    }
}

#[derive(Resource)]
pub struct TrainingRequests(pub(crate) RemoteChannel<TrainingReport>);

impl Default for TrainingRequests {
    fn default() -> Self {
        Self(RemoteChannel::new(DispatchPolicy::SingleFlight))
    }
}

fn dispatch_predictor_requests(
    mut requests: EventReader<PredictorRequest>,
    service: Res<PredictionService>,
    mut predictions: ResMut<PredictionRequests>,
    mut trainings: ResMut<TrainingRequests>,
    mut status: EventWriter<StatusEvent>,
) {
    for request in requests.read() {
        let backend = service.backend();
        let dispatched = match request {
            PredictorRequest::PredictCapacity(sample) => {
                let sample = *sample;
                predictions
                    .0
                    .dispatch(sample, move || backend.predict_capacity(&sample))
            }
            PredictorRequest::TrainModel => trainings.0.dispatch((), move || backend.train_model()),
        };
        match dispatched {
            Ok(seq) => debug!("Predictor request #{seq} dispatched"),
            Err(_) => {
                let what = match request {
                    PredictorRequest::PredictCapacity(_) => "A capacity prediction",
                    PredictorRequest::TrainModel => "Model training",
                };
                status.send(StatusEvent::info(format!("{what} is already running.")));
            }
        }
    }
}

fn collect_predictions(
    mut predictions: ResMut<PredictionRequests>,
    mut latest: ResMut<LatestPrediction>,
    mut sample: ResMut<LatestSample>,
    mut status: EventWriter<StatusEvent>,
) {
    for done in predictions.0.poll() {
        match done.outcome {
            RemoteOutcome::Success(prediction) => {
                info!(
                    "Capacity prediction ({}) for {} {}: {} beds, {} staff",
                    prediction.method,
                    done.context.region(),
                    done.context.season(),
                    prediction.beds,
                    prediction.staff
                );
                latest.0 = Some(prediction);
                sample.0 = done.context;
            }
            RemoteOutcome::RemoteFailure(msg) | RemoteOutcome::MalformedIgnored(msg) => {
                warn!("Capacity prediction failed: {msg}");
                status.send(StatusEvent::error(format!(
                    "Failed to predict capacity: {msg}"
                )));
            }
        }
    }
}

fn collect_training(
    mut trainings: ResMut<TrainingRequests>,
    mut latest: ResMut<LatestTraining>,
    mut status: EventWriter<StatusEvent>,
) {
    for done in trainings.0.poll() {
        match done.outcome {
            RemoteOutcome::Success(report) => {
                let summary = report.summary();
                if report.success {
                    info!("{summary}");
                    status.send(StatusEvent::success(summary));
                } else {
                    warn!("{summary}");
                    status.send(StatusEvent::error(summary));
                }
                latest.0 = Some(report);
            }
            RemoteOutcome::RemoteFailure(msg) | RemoteOutcome::MalformedIgnored(msg) => {
                warn!("Training request failed: {msg}");
                status.send(StatusEvent::error(format!("Training failed: {msg}")));
            }
        }
    }
}

pub struct CapacityPredictorPlugin;

impl Plugin for CapacityPredictorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LatestPrediction>()
            .init_resource::<LatestSample>()
            .init_resource::<LatestTraining>()
            .init_resource::<PredictionRequests>()
            .init_resource::<TrainingRequests>()
            .add_event::<PredictorRequest>()
            .add_systems(
                Update,
                (
                    dispatch_predictor_requests.in_set(EngineSet::Dispatch),
                    (collect_predictions, collect_training).in_set(EngineSet::Collect),
                ),
            );
    }
}
