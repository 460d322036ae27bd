//! Scripted operators that play a shift from snapshots alone.
//!
//! An operator sees exactly what a human sees (the `ShiftSnapshot`) and answers
//! with player commands. The game loop queues those commands for the next tick.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use dispatch_core::commands::PlayerCommand;
use dispatch_core::enums::{IncidentStatus, Severity, ShiftPhase, UnitStatus};
use dispatch_core::state::{ActiveCallView, IncidentView, QueueEntryView, ShiftSnapshot, UnitView};
use dispatch_core::types::manhattan;

/// Something that decides player commands from a snapshot.
pub trait Operator: Send {
    fn decide(&mut self, snapshot: &ShiftSnapshot) -> Vec<PlayerCommand>;
}

/// A rule-based operator.
///
/// Works the most severe waiting call, routes it when asked to, walks the
/// mandatory protocol, dismisses
/// suspected pranks, requests dispatch and hands off. Pending incidents get the
/// nearest idle unit of the required role, falling back to a tolerated role.
#[derive(Debug, Clone, Default)]
pub struct AutoOperator {
    /// Instruction option picked when a call offers pre-arrival instructions.
    pub instruction_choice: usize,
}

impl AutoOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One action per tick on the active call.
    fn work_call(&self, call: &ActiveCallView) -> PlayerCommand {
        if call.incident.is_some() {
            let can_instruct = call
                .instructions
                .as_ref()
                .is_some_and(|set| set.given.is_none() && !set.options.is_empty())
                && call.questions.iter().any(|q| q.asked);
            return if can_instruct {
                PlayerCommand::GiveInstruction {
                    option: self.instruction_choice,
                }
            } else {
                PlayerCommand::EndCall
            };
        }

        if call.severity.is_prank() || call.prank_suspected {
            return PlayerCommand::Dismiss;
        }

        if call.routing_needed {
            return PlayerCommand::RouteService {
                agency: call.agency,
            };
        }

        if let Some(question_id) = call.unasked_mandatory.first() {
            return PlayerCommand::AskQuestion {
                question_id: question_id.clone(),
            };
        }

        // A caller that already sounds off gets the remaining questions too.
        if call.prank_confidence > 0 {
            if let Some(q) = call.questions.iter().find(|q| !q.asked) {
                return PlayerCommand::AskQuestion {
                    question_id: q.id.clone(),
                };
            }
        }

        PlayerCommand::RequestDispatch
    }

    fn assign_units(&self, snapshot: &ShiftSnapshot) -> Vec<PlayerCommand> {
        let mut taken: BTreeSet<&str> = BTreeSet::new();
        let mut commands = Vec::new();

        let mut pending: Vec<&IncidentView> = snapshot
            .incidents
            .iter()
            .filter(|i| i.status == IncidentStatus::Pending && i.assigned_unit.is_none())
            .collect();
        pending.sort_by_key(|i| (Reverse(i.severity), i.incident_id));

        for incident in pending {
            if incident.severity == Severity::Prank {
                commands.push(PlayerCommand::ResolveIncident {
                    incident_id: incident.incident_id,
                });
                continue;
            }
            let idle = snapshot
                .units
                .iter()
                .filter(|u| u.status == UnitStatus::Idle && !taken.contains(u.unit_id.as_str()));
            if let Some(unit) = pick_unit(idle, incident) {
                taken.insert(unit.unit_id.as_str());
                commands.push(PlayerCommand::Dispatch {
                    incident_id: incident.incident_id,
                    unit_id: unit.unit_id.clone(),
                });
            }
        }
        commands
    }
}

impl Operator for AutoOperator {
    fn decide(&mut self, snapshot: &ShiftSnapshot) -> Vec<PlayerCommand> {
        if snapshot.phase != ShiftPhase::Active {
            return Vec::new();
        }

        let mut commands = Vec::new();
        match &snapshot.active_call {
            Some(call) => commands.push(self.work_call(call)),
            None => {
                if let Some(entry) = next_call(&snapshot.queue) {
                    commands.push(PlayerCommand::Answer {
                        call_id: entry.call_id,
                    });
                }
            }
        }
        commands.extend(self.assign_units(snapshot));
        commands
    }
}

/// Most severe waiting call; ties go to the front of the queue.
fn next_call(queue: &[QueueEntryView]) -> Option<&QueueEntryView> {
    queue
        .iter()
        .enumerate()
        .max_by_key(|(i, entry)| (entry.severity, Reverse(*i)))
        .map(|(_, entry)| entry)
}

/// Nearest idle unit with the required role, else the nearest tolerated one.
/// Incidents without a required role take the nearest idle unit.
fn pick_unit<'a>(
    idle: impl Iterator<Item = &'a UnitView>,
    incident: &IncidentView,
) -> Option<&'a UnitView> {
    let rank = |unit: &UnitView| -> Option<u8> {
        match incident.required_role.as_deref() {
            None => Some(0),
            Some(role) if unit.role == role => Some(0),
            Some(_) if incident.nice_to_have.contains(&unit.role) => Some(1),
            Some(_) => None,
        }
    };
    idle.filter_map(|unit| {
        rank(unit).map(|r| (r, manhattan(unit.position, incident.position), unit))
    })
    .min_by_key(|(r, d, _)| (*r, *d))
    .map(|(_, _, unit)| unit)
}
