//! Command protocol for the headless session binary.
//!
//! Newline-delimited JSON: each stdin line is one `SessionCommand`, each
//! stdout line one `SessionResponse`. The I/O loop lives in
//! `crates/app/src/session_mode.rs`; the types live here so they can be
//! tested without the binary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::EngineAction;
use crate::environment::{EnvironmentalSample, Region};
use crate::observation::DashboardObservation;

// ---------------------------------------------------------------------------
// Commands (stdin -> engine)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum SessionCommand {
    /// Report the current dashboard state without changing anything.
    #[serde(alias = "status")]
    Observe,

    /// Re-fetch the risk feed for the selected region.
    Refresh,

    SelectRegion { region: String },

    /// Predict capacity needs. Omitting the sample uses the default form.
    PredictCapacity {
        #[serde(default)]
        sample: EnvironmentalSample,
    },

    Train,

    ApplySuggestion,

    ApplyPrediction,

    /// Manual capacity entry. Values are read leniently, like a text field:
    /// numbers or strings, anything unreadable becomes 0.
    SetCapacity {
        #[serde(default)]
        beds: Option<Value>,
        #[serde(default)]
        staff: Option<Value>,
    },

    Save,

    Report,

    Quit,
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

impl SessionCommand {
    /// Engine actions this command stands for. `observe` and `quit` map to
    /// none.
    pub fn into_actions(self) -> Result<Vec<EngineAction>, String> {
        let actions = match self {
            SessionCommand::Observe | SessionCommand::Quit => Vec::new(),
            SessionCommand::Refresh => vec![EngineAction::RefreshRisk],
            SessionCommand::SelectRegion { region } => {
                let region: Region = region.parse()?;
                vec![EngineAction::SelectRegion(region)]
            }
            SessionCommand::PredictCapacity { sample } => {
                vec![EngineAction::PredictCapacity(sample)]
            }
            SessionCommand::Train => vec![EngineAction::TrainModel],
            SessionCommand::ApplySuggestion => vec![EngineAction::ApplySuggestion],
            SessionCommand::ApplyPrediction => vec![EngineAction::ApplyPrediction],
            SessionCommand::SetCapacity { beds, staff } => {
                if beds.is_none() && staff.is_none() {
                    return Err("set_capacity needs `beds` and/or `staff`".to_string());
                }
                let mut actions = Vec::new();
                if let Some(beds) = beds {
                    actions.push(EngineAction::EditBeds(field_text(&beds)));
                }
                if let Some(staff) = staff {
                    actions.push(EngineAction::EditStaff(field_text(&staff)));
                }
                actions
            }
            SessionCommand::Save => vec![EngineAction::SaveCapacity],
            SessionCommand::Report => vec![EngineAction::DownloadReport],
        };
        Ok(actions)
    }
}

// ---------------------------------------------------------------------------
// Responses (engine -> stdout)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    /// The session is ready for commands.
    Ready,

    Observation {
        observation: Box<DashboardObservation>,
    },

    /// The command could not be parsed or carried out.
    Error { message: String },

    Goodbye,
}

/// Bump when the command/response schema changes.
pub const PROTOCOL_VERSION: u32 = 1;

pub fn make_response(payload: ResponsePayload) -> SessionResponse {
    SessionResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}
