use bevy::prelude::*;

use engine::capacity_planner::{CapacityCommand, CapacityCommitted, CommitCause};
use engine::reports::ReportDownloaded;
use engine::settings::EngineSettings;
use engine::status::StatusEvent;
use engine::EngineSet;

use crate::atomic_write::atomic_write;
use crate::capacity_file::{read_capacity, write_capacity};
use crate::StoreError;

/// Restores capacity from `EngineSettings::store_path` on startup, writes it
/// back after every committed change, and writes downloaded reports to
/// `EngineSettings::report_path`.
pub struct LocalStorePlugin;

impl Plugin for LocalStorePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, restore_capacity).add_systems(
            Update,
            (persist_capacity, write_reports).in_set(EngineSet::Persist),
        );
    }
}

fn restore_capacity(
    settings: Res<EngineSettings>,
    mut commands: EventWriter<CapacityCommand>,
    mut status: EventWriter<StatusEvent>,
) {
    let Some(path) = settings.store_path.as_deref() else {
        return;
    };
    match read_capacity(path) {
        Ok(state) => {
            info!(
                "Restored capacity from {}: {} beds, {} staff",
                path.display(),
                state.beds(),
                state.staff()
            );
            commands.send(CapacityCommand::Restore(state));
        }
        Err(StoreError::NoData) => {
            debug!("No stored capacity at {}", path.display());
        }
        Err(e) => {
            warn!("Ignoring capacity store {}: {e}", path.display());
            status.send(StatusEvent::warning(format!(
                "Stored capacity could not be read: {e}"
            )));
        }
    }
}

fn persist_capacity(
    settings: Res<EngineSettings>,
    mut committed: EventReader<CapacityCommitted>,
    mut status: EventWriter<StatusEvent>,
) {
    // Only the newest state of this update matters.
    let Some(latest) = committed
        .read()
        .filter(|c| c.cause != CommitCause::Restored)
        .last()
    else {
        return;
    };
    let Some(path) = settings.store_path.as_deref() else {
        return;
    };
    match write_capacity(path, &latest.state) {
        Ok(()) => debug!("Capacity stored at {}", path.display()),
        Err(e) => {
            error!("Failed to store capacity at {}: {e}", path.display());
            status.send(StatusEvent::error(format!(
                "Failed to store capacity locally: {e}"
            )));
        }
    }
}

fn write_reports(
    settings: Res<EngineSettings>,
    mut downloaded: EventReader<ReportDownloaded>,
    mut status: EventWriter<StatusEvent>,
) {
    for report in downloaded.read() {
        let path = &settings.report_path;
        match atomic_write(path, &report.bytes) {
            Ok(()) => {
                info!("Report written to {}", path.display());
                status.send(StatusEvent::success(format!(
                    "Report saved to {}",
                    path.display()
                )));
            }
            Err(e) => {
                error!("Failed to write report to {}: {e}", path.display());
                status.send(StatusEvent::error(format!("Failed to save report: {e}")));
            }
        }
    }
}
