//! Player intents sent from the presentation layer to the simulation.
//!
//! Queued commands are applied at the next tick boundary. The engine also
//! exposes one method per intent for synchronous use.

use serde::{Deserialize, Serialize};

use crate::enums::Agency;
use crate::types::{CallId, IncidentId, UnitId};

/// All possible player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Shift control ---
    /// Start a shift from the briefing screen.
    StartShift,
    /// End the running shift early.
    EndShift,
    Pause,
    Resume,

    // --- Call handling ---
    /// Force a new call into the queue (normally scheduler driven).
    SpawnCall,
    /// Pick up a waiting call.
    Answer { call_id: CallId },
    /// Put the active call back at the front of the queue.
    Hold,
    /// Transfer the active call to the agency that handles it.
    RouteService { agency: Agency },
    /// Ask one protocol question on the active call.
    AskQuestion { question_id: String },
    /// Create the incident for the active call once the protocol allows it.
    RequestDispatch,
    /// Close the active call without an incident.
    Dismiss,
    /// Hang up on the active call after its incident exists.
    EndCall,
    /// Choose a pre-arrival instruction option.
    GiveInstruction { option: usize },

    // --- Map ---
    /// Send an idle unit to an incident.
    Dispatch {
        incident_id: IncidentId,
        unit_id: UnitId,
    },
    /// Close an incident immediately.
    ResolveIncident { incident_id: IncidentId },
}
