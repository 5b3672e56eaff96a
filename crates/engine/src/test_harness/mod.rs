//! # TestSession: headless harness for the planning engine
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + `EnginePlugin` and a
//! scripted [`StubBackend`], so tests can send actions, let background calls
//! land, and inspect the resulting resources.

mod stub_backend;

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;

pub use stub_backend::{StubBackend, StubState};

use crate::actions::EngineAction;
use crate::capacity::CapacityState;
use crate::observation::{observe, DashboardObservation};
use crate::prediction::PredictionService;
use crate::session::Role;
use crate::settings::EngineSettings;
use crate::status::StatusLog;
use crate::{in_flight_requests, EnginePlugin};

/// Updates `settle` will run before giving up on outstanding calls.
const SETTLE_MAX_UPDATES: u32 = 2_000;

/// Settings with no startup fetch and no local store.
pub fn test_settings() -> EngineSettings {
    EngineSettings {
        refresh_on_start: false,
        store_path: None,
        ..Default::default()
    }
}

pub struct TestSession {
    app: App,
    stub: StubBackend,
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSession {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Admin session against a stub that answers everything successfully.
    pub fn new() -> Self {
        Self::build(test_settings(), StubBackend::default(), |_| {})
    }

    pub fn with_stub(stub: StubBackend) -> Self {
        Self::build(test_settings(), stub, |_| {})
    }

    pub fn with_role(role: Role) -> Self {
        Self::build(
            EngineSettings {
                role,
                ..test_settings()
            },
            StubBackend::default(),
            |_| {},
        )
    }

    /// Full control: `extra` runs after `EnginePlugin` is added and before
    /// the first update, so other plugins can be layered on.
    pub fn build(settings: EngineSettings, stub: StubBackend, extra: impl FnOnce(&mut App)) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);

        // Insert before EnginePlugin so it does not read the environment or
        // build an HTTP client.
        app.insert_resource(settings);
        app.insert_resource(PredictionService::new(stub.clone()));
        app.add_plugins(EnginePlugin);
        extra(&mut app);

        // Run Startup.
        app.update();

        Self { app, stub }
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Send one action and run one update.
    pub fn act(&mut self, action: EngineAction) -> &mut Self {
        self.app.world_mut().send_event(action);
        self.app.update();
        self
    }

    /// Send several actions in one update, in order.
    pub fn act_all(&mut self, actions: impl IntoIterator<Item = EngineAction>) -> &mut Self {
        for action in actions {
            self.app.world_mut().send_event(action);
        }
        self.app.update();
        self
    }

    pub fn update(&mut self, n: u32) -> &mut Self {
        for _ in 0..n {
            self.app.update();
            std::thread::yield_now();
        }
        self
    }

    /// Run updates until no remote call is outstanding.
    ///
    /// Sleeps briefly between updates so `AsyncComputeTaskPool` threads get
    /// to run on low-core CI runners.
    pub fn settle(&mut self) -> &mut Self {
        for _ in 0..SETTLE_MAX_UPDATES {
            self.app.update();
            if in_flight_requests(self.app.world()) == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        // One more pass so follow-up events raised by the last collection
        // are handled.
        self.app.update();
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn resource<T: Resource>(&self) -> &T {
        self.app.world().resource::<T>()
    }

    pub fn capacity(&self) -> CapacityState {
        *self.resource::<CapacityState>()
    }

    pub fn observe(&self) -> DashboardObservation {
        observe(self.app.world())
    }

    pub fn stub(&self) -> &StubBackend {
        &self.stub
    }

    /// Every status text raised so far, oldest first.
    pub fn statuses(&self) -> Vec<String> {
        self.resource::<StatusLog>()
            .journal
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    pub fn has_status(&self, needle: &str) -> bool {
        self.resource::<StatusLog>().mentions(needle)
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
