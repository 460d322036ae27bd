//! Snapshot system: builds a complete `ShiftSnapshot` from engine state.
//!
//! This system is read-only. It never modifies the world or the managers.

use glam::IVec2;
use hecs::World;

use dispatch_core::catalog::CityCatalog;
use dispatch_core::components::{Unit, UnitState};
use dispatch_core::constants::PRANK_SUSPECT_THRESHOLD;
use dispatch_core::enums::{Difficulty, ShiftEndReason, ShiftPhase};
use dispatch_core::events::{Alert, SimEvent};
use dispatch_core::state::*;
use dispatch_core::types::SimTime;

use crate::calls::{CallInstance, CallManager};
use crate::dispatch::{DispatchSimulator, Incident};
use crate::scoring::OutcomeEvaluator;

/// Shift-level fields of the snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ShiftHeader {
    pub time: SimTime,
    pub phase: ShiftPhase,
    pub difficulty: Difficulty,
    pub shift_remaining_secs: f64,
    pub end_reason: Option<ShiftEndReason>,
}

/// Build a complete ShiftSnapshot.
pub fn build_snapshot(
    header: ShiftHeader,
    calls: &CallManager,
    dispatch: &DispatchSimulator,
    scoring: &OutcomeEvaluator,
    city: &CityCatalog,
    events: Vec<SimEvent>,
    alerts: Vec<Alert>,
) -> ShiftSnapshot {
    ShiftSnapshot {
        time: header.time,
        phase: header.phase,
        difficulty: header.difficulty,
        shift_remaining_secs: header.shift_remaining_secs,
        end_reason: header.end_reason,
        queue: calls.queue().map(build_queue_entry).collect(),
        active_call: calls.active().map(build_active_call),
        incidents: dispatch
            .incidents()
            .filter(|incident| !incident.is_resolved())
            .map(build_incident)
            .collect(),
        units: build_units(dispatch),
        map: MapView {
            size: city.grid,
            hotspots: city.hotspots.clone(),
            bases: city.bases.clone(),
        },
        score: scoring.score_view(),
        career: scoring.career_view(),
        events,
        alerts,
    }
}

fn build_queue_entry(call: &CallInstance) -> QueueEntryView {
    QueueEntryView {
        call_id: call.id,
        title: call.template.title.clone(),
        severity: call.severity,
        status: call.status,
        queue_ttl_secs: call.queue_ttl_secs,
        call_ttl_secs: call.call_ttl_secs,
    }
}

fn build_active_call(call: &CallInstance) -> ActiveCallView {
    let protocol = &call.template.protocol;
    ActiveCallView {
        call_id: call.id,
        template_id: call.template.id.clone(),
        title: call.template.title.clone(),
        agency: call.template.agency,
        severity: call.severity,
        prank_confidence: call.prank_confidence,
        prank_suspected: call.prank_confidence >= PRANK_SUSPECT_THRESHOLD,
        call_ttl_secs: call.call_ttl_secs,
        overdue: call.overdue,
        routing_needed: call.routing_needed(),
        routed: call.routed,
        transcript: call.transcript.clone(),
        questions: protocol
            .questions()
            .iter()
            .map(|q| QuestionView {
                id: q.id.clone(),
                label: q.label.clone(),
                prompt: q.prompt.clone(),
                mandatory: protocol.is_mandatory(&q.id),
                asked: call.asked.contains(&q.id),
            })
            .collect(),
        unasked_mandatory: call.unasked_mandatory(),
        dispatch_unlocked: call.dispatch_unlocked(),
        incident: call.incident,
        waiting_for_dispatch: call.waiting_for_dispatch,
        instructions: call.template.instructions.as_ref().map(|set| InstructionView {
            prompt: set.prompt.clone(),
            options: set.options.iter().map(|o| o.label.clone()).collect(),
            given: call.instruction,
        }),
    }
}

fn build_incident(incident: &Incident) -> IncidentView {
    IncidentView {
        incident_id: incident.id,
        call_id: incident.call_id,
        title: incident.title.clone(),
        required_role: incident.required_role.clone(),
        nice_to_have: incident.nice_to_have.clone(),
        severity: incident.severity,
        position: incident.position,
        status: incident.status,
        assigned_unit: incident.assigned_unit.clone(),
        resolve_remaining_secs: incident.resolve_remaining_secs,
        mismatch: incident.mismatch,
        overdue: incident.overdue,
    }
}

fn build_units(dispatch: &DispatchSimulator) -> Vec<UnitView> {
    let world: &World = dispatch.world();
    dispatch
        .roster()
        .filter_map(|entity| {
            let mut query = world.query_one::<(&Unit, &IVec2, &UnitState)>(entity).ok()?;
            let (unit, pos, state) = query.get()?;
            Some(UnitView {
                unit_id: unit.id.clone(),
                name: unit.name.clone(),
                role: unit.role.clone(),
                agency: unit.agency,
                position: *pos,
                status: state.status,
                target: state.target.map(|t| t.cell),
                incident: state.target.map(|t| t.incident),
            })
        })
        .collect()
}
