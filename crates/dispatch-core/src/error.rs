//! Rejection reasons for player intents and content loading errors.

use thiserror::Error;

use crate::enums::{IncidentStatus, ShiftPhase};
use crate::types::{CallId, IncidentId};

/// Why an intent was not applied. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("shift is not running ({0:?})")]
    ShiftNotRunning(ShiftPhase),

    #[error("shift already started ({0:?})")]
    ShiftAlreadyStarted(ShiftPhase),

    #[error("no call template '{0}'")]
    UnknownTemplate(String),

    #[error("already on call {0}")]
    LineBusy(CallId),

    #[error("no active call")]
    NoActiveCall,

    #[error("call {0} is not waiting in the queue")]
    CallNotFound(CallId),

    #[error("question '{0}' is not part of this call's protocol")]
    UnknownQuestion(String),

    #[error("question '{0}' was already asked")]
    QuestionAlreadyAsked(String),

    #[error("route the call to an agency first")]
    RoutingRequired,

    #[error("call does not need routing")]
    RoutingNotNeeded,

    #[error("dispatch locked: {missing} mandatory question(s) still unanswered")]
    DispatchLocked { missing: usize },

    #[error("call {call} already has incident {incident}")]
    IncidentAlreadyCreated { call: CallId, incident: IncidentId },

    #[error("call has no incident yet")]
    NoIncident,

    #[error("no pre-arrival instructions for this call")]
    NoInstructions,

    #[error("instructions already given")]
    InstructionsAlreadyGiven,

    #[error("ask at least one question before giving instructions")]
    InstructionsTooEarly,

    #[error("instruction option {0} does not exist")]
    UnknownInstruction(usize),

    #[error("incident {0} not found")]
    IncidentNotFound(IncidentId),

    #[error("incident {id} cannot take a unit ({status:?})")]
    IncidentUnavailable { id: IncidentId, status: IncidentStatus },

    #[error("unit '{0}' not found")]
    UnitNotFound(String),

    #[error("unit '{0}' is not idle")]
    UnitBusy(String),
}

/// Content catalog failed to parse or validate.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },

    #[error("template '{template}': mandatory question '{question}' is not in its protocol")]
    UnknownMandatoryQuestion { template: String, question: String },

    #[error("template '{template}': hotspot '{hotspot}' is not on the map")]
    UnknownHotspot { template: String, hotspot: String },

    #[error("template '{0}': a non-prank call needs at least one correct role")]
    MissingRoles(String),

    #[error("template '{template}': {field} must be {expected}, got {value}")]
    InvalidValue {
        template: String,
        field: &'static str,
        expected: &'static str,
        value: f64,
    },

    #[error("template '{0}': instruction set has no options")]
    EmptyInstructions(String),

    #[error("city grid must be at least 1x1, got {w}x{h}")]
    InvalidGrid { w: i32, h: i32 },

    #[error("{what} '{name}' at ({x}, {y}) is outside the grid")]
    OutOfBounds {
        what: &'static str,
        name: String,
        x: i32,
        y: i32,
    },

    #[error("no base for agency {0:?}")]
    MissingBase(crate::enums::Agency),

    #[error("{0} catalog is empty")]
    Empty(&'static str),
}
