//! Events emitted by the simulation.
//!
//! Events are the only input of the outcome evaluator and the feed the
//! presentation layer uses for sounds, toasts and logs.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{CallId, IncidentId, UnitId};

/// Scored outcome classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    PrankDismissed,
    RealCallDismissed,
    RoutingCorrect,
    RoutingWrong,
    WastedDispatch,
    ResolvedOnTime,
    ResolvedLate,
    ResolvedMismatch,
    QueueExpired,
    CallOverdue,
    IncidentOverdue,
    InstructionCorrect,
    InstructionWrong,
    IncidentAbandoned,
}

impl Outcome {
    /// Outcomes that earn a career warning.
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            Outcome::RealCallDismissed | Outcome::WastedDispatch | Outcome::ResolvedMismatch
        )
    }
}

/// Simulation event, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    CallQueued {
        call_id: CallId,
        template_id: String,
        severity: Severity,
    },
    CallAnswered {
        call_id: CallId,
    },
    CallHeld {
        call_id: CallId,
        call_ttl_secs: f64,
    },
    ServiceRouted {
        call_id: CallId,
        agency: Agency,
        correct: bool,
    },
    QuestionAsked {
        call_id: CallId,
        question_id: String,
        severity: Severity,
        dispatch_unlocked: bool,
    },
    SeverityEscalated {
        call_id: CallId,
        from: Severity,
        to: Severity,
    },
    /// A scripted update arrived on an open call.
    CallUpdate {
        call_id: CallId,
        text: String,
    },
    InstructionGiven {
        call_id: CallId,
        correct: bool,
    },
    /// Talk time ran out on the active call. The call stays open.
    CallOverdue {
        call_id: CallId,
        severity: Severity,
    },
    CallClosed {
        call_id: CallId,
        reason: CloseReason,
        severity: Severity,
        prank: bool,
    },
    IncidentCreated {
        incident_id: IncidentId,
        call_id: CallId,
        severity: Severity,
    },
    UnitDispatched {
        incident_id: IncidentId,
        unit_id: UnitId,
        severity: Severity,
        prank: bool,
        mismatch: bool,
    },
    UnitArrived {
        incident_id: IncidentId,
        unit_id: UnitId,
    },
    IncidentOverdue {
        incident_id: IncidentId,
        call_id: CallId,
    },
    IncidentResolved {
        incident_id: IncidentId,
        call_id: CallId,
        unit_id: Option<UnitId>,
        severity: Severity,
        prank: bool,
        mismatch: bool,
        /// The mismatched unit's role was on the nice-to-have list.
        tolerated: bool,
        late: bool,
    },
    ScoreChanged {
        outcome: Outcome,
        delta: i64,
        total: i64,
    },
    WarningIssued {
        count: u32,
        limit: u32,
    },
    RankUp {
        rank: RankTier,
    },
    ShiftEnded {
        reason: ShiftEndReason,
    },
}

/// Alert for the UI toast queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    pub tick: u64,
}
