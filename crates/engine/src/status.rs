//! Transient status banners and the status journal.
//!
//! Any system can emit a `StatusEvent`; they are collected into `StatusLog`.
//! Banners auto-dismiss after the lifetime configured in `EngineSettings`
//! (errors and warnings linger longer). Every banner is archived in a
//! bounded journal.

use std::time::Duration;

use bevy::prelude::*;
use serde::Serialize;

use crate::settings::EngineSettings;
use crate::EngineSet;

// =============================================================================
// Kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Error,
    Warning,
    Success,
    Info,
}

impl StatusKind {
    pub fn is_problem(self) -> bool {
        matches!(self, StatusKind::Error | StatusKind::Warning)
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusKind::Error => "ERROR",
            StatusKind::Warning => "WARNING",
            StatusKind::Success => "OK",
            StatusKind::Info => "INFO",
        }
    }
}

// =============================================================================
// Event
// =============================================================================

#[derive(Event, Debug, Clone, PartialEq)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusEvent {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }
}

// =============================================================================
// StatusLog
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StatusBanner {
    pub id: u64,
    pub kind: StatusKind,
    pub text: String,
    /// Session time the banner was raised.
    #[serde(skip)]
    pub raised_at: Duration,
    #[serde(skip)]
    pub expires_at: Duration,
    #[serde(skip)]
    pub dismissed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub kind: StatusKind,
    pub text: String,
    /// Seconds since session start.
    pub at_secs: f64,
}

#[derive(Resource, Debug)]
pub struct StatusLog {
    /// Currently visible banners, oldest first.
    pub active: Vec<StatusBanner>,
    pub journal: Vec<JournalEntry>,
    pub max_journal: usize,
    next_id: u64,
}

impl Default for StatusLog {
    fn default() -> Self {
        Self {
            active: Vec::new(),
            journal: Vec::new(),
            max_journal: 200,
            next_id: 1,
        }
    }
}

impl StatusLog {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn push(&mut self, event: &StatusEvent, now: Duration, lifetime: Duration) -> u64 {
        let id = self.next_id();
        self.active.push(StatusBanner {
            id,
            kind: event.kind,
            text: event.text.clone(),
            raised_at: now,
            expires_at: now + lifetime,
            dismissed: false,
        });

        self.journal.push(JournalEntry {
            kind: event.kind,
            text: event.text.clone(),
            at_secs: now.as_secs_f64(),
        });
        if self.journal.len() > self.max_journal {
            let excess = self.journal.len() - self.max_journal;
            self.journal.drain(0..excess);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        if let Some(b) = self.active.iter_mut().find(|b| b.id == id) {
            b.dismissed = true;
        }
    }

    /// Drop dismissed and expired banners.
    pub fn sweep(&mut self, now: Duration) {
        self.active.retain(|b| !b.dismissed && now < b.expires_at);
    }

    /// Most recent visible banner.
    pub fn latest(&self) -> Option<&StatusBanner> {
        self.active.iter().rev().find(|b| !b.dismissed)
    }

    /// Whether any archived status contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.journal.iter().any(|e| e.text.contains(needle))
    }
}

// =============================================================================
// Systems
// =============================================================================

fn collect_status(
    mut events: EventReader<StatusEvent>,
    mut log: ResMut<StatusLog>,
    settings: Res<EngineSettings>,
    time: Res<Time>,
) {
    let now = time.elapsed();
    for event in events.read() {
        match event.kind {
            StatusKind::Error => warn!("status: {}", event.text),
            _ => info!("status: {}", event.text),
        }
        log.push(event, now, settings.status_lifetime(event.kind.is_problem()));
    }
}

fn sweep_status(mut log: ResMut<StatusLog>, time: Res<Time>) {
    log.sweep(time.elapsed());
}

pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StatusLog>()
            .add_event::<StatusEvent>()
            .add_systems(
                Update,
                (collect_status, sweep_status).chain().in_set(EngineSet::Report),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn test_push_archives_in_journal() {
        let mut log = StatusLog::default();
        log.push(&StatusEvent::success("Capacity saved!"), Duration::ZERO, 2 * SEC);
        assert_eq!(log.active.len(), 1);
        assert_eq!(log.journal.len(), 1);
        assert_eq!(log.latest().unwrap().text, "Capacity saved!");
    }

    #[test]
    fn test_banner_expires_after_lifetime() {
        let mut log = StatusLog::default();
        log.push(&StatusEvent::info("hello"), Duration::ZERO, 2 * SEC);
        log.sweep(SEC);
        assert_eq!(log.active.len(), 1);
        log.sweep(2 * SEC);
        assert!(log.active.is_empty());
        assert_eq!(log.journal.len(), 1);
    }

    #[test]
    fn test_dismiss() {
        let mut log = StatusLog::default();
        let id = log.push(&StatusEvent::error("boom"), Duration::ZERO, 5 * SEC);
        log.dismiss(id);
        assert!(log.latest().is_none());
        log.sweep(Duration::ZERO);
        assert!(log.active.is_empty());
        assert!(log.mentions("boom"));
    }

    #[test]
    fn test_journal_is_bounded() {
        let mut log = StatusLog {
            max_journal: 3,
            ..Default::default()
        };
        for i in 0..5 {
            log.push(&StatusEvent::info(format!("n{i}")), Duration::ZERO, SEC);
        }
        assert_eq!(log.journal.len(), 3);
        assert_eq!(log.journal[0].text, "n2");
    }

    #[test]
    fn test_problem_kinds() {
        assert!(StatusKind::Error.is_problem());
        assert!(StatusKind::Warning.is_problem());
        assert!(!StatusKind::Success.is_problem());
        assert_eq!(StatusKind::Info.label(), "INFO");
    }
}
