//! Report download from the model service.

use bevy::prelude::*;

use crate::prediction::PredictionService;
use crate::remote::{DispatchPolicy, RemoteChannel, RemoteOutcome};
use crate::status::StatusEvent;
use crate::EngineSet;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest;

/// Raw report bytes, ready to be written out.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct ReportDownloaded {
    pub bytes: Vec<u8>,
}

/// Size of the last report downloaded this session.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct LatestReport {
    pub bytes: Option<usize>,
}

#[derive(Resource)]
pub struct ReportRequests(pub(crate) RemoteChannel<Vec<u8>>);

impl Default for ReportRequests {
    fn default() -> Self {
        Self(RemoteChannel::new(DispatchPolicy::SingleFlight))
    }
}

fn dispatch_report_requests(
    mut requests: EventReader<ReportRequest>,
    service: Res<PredictionService>,
    mut channel: ResMut<ReportRequests>,
    mut status: EventWriter<StatusEvent>,
) {
    for _ in requests.read() {
        let backend = service.backend();
        if channel.0.dispatch((), move || backend.fetch_report()).is_err() {
            status.send(StatusEvent::info("A report download is already running."));
        }
    }
}

fn collect_reports(
    mut channel: ResMut<ReportRequests>,
    mut latest: ResMut<LatestReport>,
    mut downloaded: EventWriter<ReportDownloaded>,
    mut status: EventWriter<StatusEvent>,
) {
    for done in channel.0.poll() {
        match done.outcome {
            RemoteOutcome::Success(bytes) => {
                info!("Report downloaded ({} bytes)", bytes.len());
                latest.bytes = Some(bytes.len());
                downloaded.send(ReportDownloaded { bytes });
            }
            RemoteOutcome::RemoteFailure(msg) | RemoteOutcome::MalformedIgnored(msg) => {
                warn!("Report download failed: {msg}");
                status.send(StatusEvent::error(format!("Failed to fetch report: {msg}")));
            }
        }
    }
}

pub struct ReportsPlugin;

impl Plugin for ReportsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LatestReport>()
            .init_resource::<ReportRequests>()
            .add_event::<ReportRequest>()
            .add_event::<ReportDownloaded>()
            .add_systems(
                Update,
                (
                    dispatch_report_requests.in_set(EngineSet::Dispatch),
                    collect_reports.in_set(EngineSet::Collect),
                ),
            );
    }
}
