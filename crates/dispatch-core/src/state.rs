//! Shift state snapshot: the complete visible state pulled by the
//! presentation layer once per frame.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::catalog::{Base, Hotspot};
use crate::enums::*;
use crate::events::{Alert, SimEvent};
use crate::types::{CallId, GridSize, IncidentId, SimTime, UnitId};

/// Complete shift state produced after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftSnapshot {
    pub time: SimTime,
    pub phase: ShiftPhase,
    pub difficulty: Difficulty,
    pub shift_remaining_secs: f64,
    pub end_reason: Option<ShiftEndReason>,
    /// Waiting calls, front of the queue first.
    pub queue: Vec<QueueEntryView>,
    pub active_call: Option<ActiveCallView>,
    pub incidents: Vec<IncidentView>,
    pub units: Vec<UnitView>,
    pub map: MapView,
    pub score: ScoreView,
    pub career: Option<CareerView>,
    /// Events emitted since the previous tick.
    pub events: Vec<SimEvent>,
    pub alerts: Vec<Alert>,
}

/// One line of the call transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text: String,
}

/// A call waiting in the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntryView {
    pub call_id: CallId,
    pub title: String,
    pub severity: Severity,
    pub status: CallStatus,
    /// Time before the caller gives up.
    pub queue_ttl_secs: f64,
    pub call_ttl_secs: f64,
}

/// Protocol question state on the active call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: String,
    pub label: String,
    pub prompt: String,
    pub mandatory: bool,
    pub asked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionView {
    pub prompt: String,
    pub options: Vec<String>,
    /// `Some(correct)` once an option was chosen.
    pub given: Option<bool>,
}

/// Full state of the call on the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCallView {
    pub call_id: CallId,
    pub template_id: String,
    pub title: String,
    pub agency: Agency,
    pub severity: Severity,
    pub prank_confidence: i32,
    pub prank_suspected: bool,
    pub call_ttl_secs: f64,
    pub overdue: bool,
    /// Questions and dispatch stay locked until the call is routed.
    pub routing_needed: bool,
    pub routed: Option<Agency>,
    pub transcript: Vec<TranscriptLine>,
    pub questions: Vec<QuestionView>,
    pub unasked_mandatory: Vec<String>,
    pub dispatch_unlocked: bool,
    pub incident: Option<IncidentId>,
    pub waiting_for_dispatch: bool,
    pub instructions: Option<InstructionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentView {
    pub incident_id: IncidentId,
    pub call_id: CallId,
    pub title: String,
    pub required_role: Option<String>,
    pub nice_to_have: Vec<String>,
    pub severity: Severity,
    pub position: IVec2,
    pub status: IncidentStatus,
    pub assigned_unit: Option<UnitId>,
    pub resolve_remaining_secs: f64,
    pub mismatch: bool,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitView {
    pub unit_id: UnitId,
    pub name: String,
    pub role: String,
    pub agency: Agency,
    pub position: IVec2,
    pub status: UnitStatus,
    pub target: Option<IVec2>,
    pub incident: Option<IncidentId>,
}

/// Static map data for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapView {
    pub size: GridSize,
    pub hotspots: Vec<Hotspot>,
    pub bases: Vec<Base>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            size: GridSize::new(1, 1),
            hotspots: Vec::new(),
            bases: Vec::new(),
        }
    }
}

/// Per-category outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCounters {
    pub handled: u32,
    pub dispatched: u32,
    pub correct: u32,
    pub wrong: u32,
    pub expired: u32,
    pub prank_closed: u32,
    pub overdue: u32,
}

/// Running score for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreView {
    pub score: i64,
    pub counters: ScoreCounters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerView {
    pub xp: u32,
    pub rank: RankTier,
    pub warnings: u32,
    pub warning_limit: u32,
}

/// End-of-shift report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub difficulty: Difficulty,
    pub duration_secs: f64,
    pub score: i64,
    pub counters: ScoreCounters,
    pub career: Option<CareerView>,
    pub end_reason: Option<ShiftEndReason>,
}
