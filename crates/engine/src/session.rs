//! Session role and the operations it enables.
//!
//! Roles only decide which actions are offered. The model service does its
//! own authorization.

use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Clinician,
    Analyst,
    /// No recognised role.
    #[default]
    Guest,
}

impl Role {
    /// Case-insensitive; anything unrecognised is a guest.
    pub fn from_name(name: &str) -> Role {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "clinician" => Role::Clinician,
            "analyst" => Role::Analyst,
            _ => Role::Guest,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Clinician => "clinician",
            Role::Analyst => "analyst",
            Role::Guest => "guest",
        }
    }

    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                ViewOverview,
                ManageCapacity,
                PredictCapacity,
                TrainModel,
                DownloadReports,
            ],
            Role::Analyst => &[ViewOverview, DownloadReports],
            Role::Clinician | Role::Guest => &[ViewOverview],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Risk overview, outlook and readiness. Every role has it.
    ViewOverview,
    /// Apply suggestions/predictions, edit and save capacity.
    ManageCapacity,
    PredictCapacity,
    TrainModel,
    DownloadReports,
}

/// Role of the current session.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRole(pub Role);

impl SessionRole {
    pub fn can(&self, capability: Capability) -> bool {
        self.0.can(capability)
    }
}
