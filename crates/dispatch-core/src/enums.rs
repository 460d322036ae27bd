//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Call severity under the total order `Prank < Low < Medium < High`.
///
/// The declaration order is the escalation order; `Ord` is derived from it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Prank,
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Prank,
        Severity::Low,
        Severity::Medium,
        Severity::High,
    ];

    /// Monotonic-max update: the result never sorts below `self`.
    pub fn escalate(self, to: Severity) -> Severity {
        self.max(to)
    }

    pub fn is_prank(self) -> bool {
        self == Severity::Prank
    }

    /// Index into per-severity tables (`[prank, low, medium, high]`).
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Lifecycle status of a call instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallStatus {
    /// Ringing in the queue, never answered.
    #[default]
    Queued,
    /// On the line with the operator.
    Active,
    /// Answered once, put back at the front of the queue.
    Held,
    /// Terminal. Never re-enters the queue.
    Closed,
}

/// Why a call was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// Operator ended the call without creating an incident.
    Dismissed,
    /// The linked incident was resolved.
    IncidentResolved,
    /// Operator hung up after the incident was created.
    HandedOff,
    /// Queue time-to-live ran out before the call was answered.
    Expired,
    /// The shift ended while the call was still open.
    ShiftEnded,
}

/// Incident lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[default]
    Pending,
    Enroute,
    OnScene,
    Resolved,
}

/// Unit availability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    #[default]
    Idle,
    Enroute,
    OnScene,
}

/// Responding agency. Units are based per agency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agency {
    Police,
    Fire,
    Medical,
}

/// Difficulty preset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// Top-level shift phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftPhase {
    #[default]
    Briefing,
    Active,
    Paused,
    Ended,
}

/// Why a shift ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftEndReason {
    /// The shift clock ran out.
    TimeUp,
    /// The operator asked to end the shift.
    Requested,
    /// Warning threshold reached.
    Dismissed,
}

/// Who spoke a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Caller,
    Operator,
    System,
}

/// Career rank tier, ordered by experience.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RankTier {
    #[default]
    Trainee,
    Dispatcher,
    SeniorDispatcher,
    Supervisor,
}

/// Alert severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}
