//! Dispatch/Unit Simulator.
//!
//! Units are hecs entities (`Unit`, `IVec2`, `UnitState`, `MoveProgress`).
//! Incidents are stored in an ordered map on the simulator, NOT as ECS
//! entities.

use std::collections::BTreeMap;

use glam::IVec2;
use hecs::{Entity, World};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use dispatch_core::catalog::CityCatalog;
use dispatch_core::components::{MoveProgress, MoveTarget, Unit, UnitState};
use dispatch_core::constants::{HOTSPOT_JITTER, INCIDENT_BUDGET_SECS, RESOLVE_SECS, TIME_EPSILON};
use dispatch_core::enums::{IncidentStatus, Severity, UnitStatus};
use dispatch_core::error::Rejection;
use dispatch_core::events::SimEvent;
use dispatch_core::types::{CallId, GridSize, IncidentId, UnitId};

use crate::calls::CallInstance;
use crate::systems;

/// A dispatchable, location-bound incident.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub id: IncidentId,
    pub call_id: CallId,
    pub title: String,
    pub required_role: Option<String>,
    pub nice_to_have: Vec<String>,
    /// Copied from the call at creation time.
    pub severity: Severity,
    pub position: IVec2,
    pub status: IncidentStatus,
    pub assigned_unit: Option<UnitId>,
    /// On-scene time still needed before the incident resolves.
    pub resolve_remaining_secs: f64,
    /// Response budget left before the incident counts as overdue.
    pub budget_remaining_secs: f64,
    pub mismatch: bool,
    /// The mismatched role was on the nice-to-have list.
    pub tolerated: bool,
    pub overdue: bool,
    /// The call ran past its talk time before dispatch was requested.
    pub call_overdue: bool,
}

impl Incident {
    pub fn is_prank(&self) -> bool {
        self.severity.is_prank()
    }

    pub fn is_resolved(&self) -> bool {
        self.status == IncidentStatus::Resolved
    }

    /// Either the incident or its call exceeded its time budget.
    pub fn is_late(&self) -> bool {
        self.overdue || self.call_overdue
    }
}

/// Result of `resolve_incident`.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// This call resolved the incident.
    Resolved(Incident),
    /// The incident was already resolved; nothing changed.
    AlreadyResolved(Incident),
}

impl Resolution {
    pub fn incident(&self) -> &Incident {
        match self {
            Resolution::Resolved(incident) | Resolution::AlreadyResolved(incident) => incident,
        }
    }
}

/// Grid, unit roster and incident map.
pub struct DispatchSimulator {
    world: World,
    /// Roster order from the city catalog.
    roster: Vec<(UnitId, Entity)>,
    incidents: BTreeMap<IncidentId, Incident>,
    next_incident_id: IncidentId,
    grid: GridSize,
    unit_speed: f64,
    timeout_mult: f64,
}

impl DispatchSimulator {
    /// Spawn every unit of `city` at its agency's base.
    pub fn new(city: &CityCatalog, unit_speed: f64, timeout_mult: f64) -> Self {
        let mut world = World::new();
        let mut roster = Vec::with_capacity(city.units.len());

        for def in &city.units {
            let base = city.base_cell(def.agency).unwrap_or_else(|| {
                warn!(unit = %def.id, "no base for agency, starting at origin");
                IVec2::ZERO
            });
            let entity = world.spawn((
                Unit {
                    id: def.id.clone(),
                    name: def.name.clone(),
                    role: def.role.clone(),
                    agency: def.agency,
                },
                base,
                UnitState::default(),
                MoveProgress::default(),
            ));
            roster.push((def.id.clone(), entity));
        }

        Self {
            world,
            roster,
            incidents: BTreeMap::new(),
            next_incident_id: 1,
            grid: city.grid,
            unit_speed,
            timeout_mult,
        }
    }

    // ---- Queries ----

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Unit entities in roster order.
    pub fn roster(&self) -> impl Iterator<Item = Entity> + '_ {
        self.roster.iter().map(|(_, entity)| *entity)
    }

    pub fn incident(&self, id: IncidentId) -> Option<&Incident> {
        self.incidents.get(&id)
    }

    pub fn incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values()
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn unit_speed(&self) -> f64 {
        self.unit_speed
    }

    pub fn unit_position(&self, unit_id: &str) -> Option<IVec2> {
        let entity = self.unit_entity(unit_id)?;
        self.world.get::<&IVec2>(entity).ok().map(|pos| *pos)
    }

    pub fn unit_status(&self, unit_id: &str) -> Option<UnitStatus> {
        let entity = self.unit_entity(unit_id)?;
        self.world
            .get::<&UnitState>(entity)
            .ok()
            .map(|state| state.status)
    }

    // ---- Operations ----

    /// Place an incident for `call` near its template's hotspot, with
    /// random jitter clamped to the grid.
    pub fn create_incident(
        &mut self,
        call: &CallInstance,
        city: &CityCatalog,
        rng: &mut ChaCha8Rng,
        events: &mut Vec<SimEvent>,
    ) -> IncidentId {
        let template = &call.template;
        let anchor = city
            .hotspot(&template.hotspot)
            .map(|spot| spot.cell())
            .unwrap_or_else(|| {
                warn!(hotspot = %template.hotspot, "unknown hotspot, using map centre");
                IVec2::new(self.grid.w / 2, self.grid.h / 2)
            });
        let jitter = IVec2::new(
            rng.gen_range(-HOTSPOT_JITTER..=HOTSPOT_JITTER),
            rng.gen_range(-HOTSPOT_JITTER..=HOTSPOT_JITTER),
        );
        let position = self.grid.clamp(anchor + jitter);

        let severity = call.severity;
        let id = self.next_incident_id;
        self.next_incident_id += 1;

        let incident = Incident {
            id,
            call_id: call.id,
            title: template.title.clone(),
            required_role: template.response.required().map(str::to_string),
            nice_to_have: template.response.nice_to_have(),
            severity,
            position,
            status: IncidentStatus::Pending,
            assigned_unit: None,
            resolve_remaining_secs: template
                .resolve_secs
                .unwrap_or(RESOLVE_SECS[severity.index()]),
            budget_remaining_secs: INCIDENT_BUDGET_SECS[severity.index()] * self.timeout_mult,
            mismatch: false,
            tolerated: false,
            overdue: false,
            call_overdue: call.overdue,
        };
        self.incidents.insert(id, incident);

        events.push(SimEvent::IncidentCreated {
            incident_id: id,
            call_id: call.id,
            severity,
        });
        info!(incident = id, call_id = call.id, x = position.x, y = position.y, "incident created");
        id
    }

    /// Send an idle unit to a pending incident.
    pub fn dispatch(
        &mut self,
        incident_id: IncidentId,
        unit_id: &str,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), Rejection> {
        let incident = self
            .incidents
            .get(&incident_id)
            .ok_or(Rejection::IncidentNotFound(incident_id))?;
        if incident.status != IncidentStatus::Pending {
            return Err(Rejection::IncidentUnavailable {
                id: incident_id,
                status: incident.status,
            });
        }
        let entity = self
            .unit_entity(unit_id)
            .ok_or_else(|| Rejection::UnitNotFound(unit_id.to_string()))?;

        let role = {
            let mut query = self
                .world
                .query_one::<(&Unit, &UnitState)>(entity)
                .map_err(|_| Rejection::UnitNotFound(unit_id.to_string()))?;
            let (unit, state) = query
                .get()
                .ok_or_else(|| Rejection::UnitNotFound(unit_id.to_string()))?;
            if state.status != UnitStatus::Idle {
                return Err(Rejection::UnitBusy(unit_id.to_string()));
            }
            unit.role.clone()
        };

        let prank = incident.is_prank();
        let mismatch = !prank
            && incident
                .required_role
                .as_deref()
                .is_some_and(|required| required != role);
        let tolerated = mismatch && incident.nice_to_have.contains(&role);
        let target = MoveTarget {
            cell: incident.position,
            incident: incident_id,
        };

        if let Ok((state, progress)) = self
            .world
            .query_one_mut::<(&mut UnitState, &mut MoveProgress)>(entity)
        {
            state.status = UnitStatus::Enroute;
            state.target = Some(target);
            progress.carry = 0.0;
        }

        let Some(incident) = self.incidents.get_mut(&incident_id) else {
            return Err(Rejection::IncidentNotFound(incident_id));
        };
        incident.status = IncidentStatus::Enroute;
        incident.assigned_unit = Some(unit_id.to_string());
        incident.mismatch = mismatch;
        incident.tolerated = tolerated;

        events.push(SimEvent::UnitDispatched {
            incident_id,
            unit_id: unit_id.to_string(),
            severity: incident.severity,
            prank,
            mismatch,
        });
        info!(incident = incident_id, unit = unit_id, mismatch, "unit dispatched");
        Ok(())
    }

    /// Advance movement, on-scene countdowns and response budgets.
    /// Returns the calls whose incidents resolved this tick.
    pub fn tick(&mut self, dt: f64, events: &mut Vec<SimEvent>) -> Vec<CallId> {
        let arrivals = systems::movement::run(&mut self.world, self.unit_speed, dt);
        for (unit_id, incident_id) in arrivals {
            if let Some(incident) = self.incidents.get_mut(&incident_id) {
                if incident.status == IncidentStatus::Enroute {
                    incident.status = IncidentStatus::OnScene;
                }
            }
            debug!(incident = incident_id, unit = %unit_id, "unit on scene");
            events.push(SimEvent::UnitArrived {
                incident_id,
                unit_id,
            });
        }

        let mut finished = Vec::new();
        for incident in self.incidents.values_mut() {
            if incident.is_resolved() {
                continue;
            }
            if !incident.overdue {
                incident.budget_remaining_secs = (incident.budget_remaining_secs - dt).max(0.0);
                if incident.budget_remaining_secs <= TIME_EPSILON {
                    incident.overdue = true;
                    events.push(SimEvent::IncidentOverdue {
                        incident_id: incident.id,
                        call_id: incident.call_id,
                    });
                    debug!(incident = incident.id, "incident overdue");
                }
            }
            if incident.status == IncidentStatus::OnScene {
                incident.resolve_remaining_secs = (incident.resolve_remaining_secs - dt).max(0.0);
                if incident.resolve_remaining_secs <= TIME_EPSILON {
                    finished.push(incident.id);
                }
            }
        }

        let mut resolved_calls = Vec::with_capacity(finished.len());
        for id in finished {
            if let Some(Resolution::Resolved(incident)) = self.resolve_incident(id, events) {
                resolved_calls.push(incident.call_id);
            }
        }
        resolved_calls
    }

    /// Resolve an incident and release its unit where it stands.
    ///
    /// Idempotent: an already resolved incident is returned unchanged as
    /// `AlreadyResolved`. Unknown ids return `None`.
    pub fn resolve_incident(
        &mut self,
        id: IncidentId,
        events: &mut Vec<SimEvent>,
    ) -> Option<Resolution> {
        let incident = self.incidents.get_mut(&id)?;
        if incident.is_resolved() {
            return Some(Resolution::AlreadyResolved(incident.clone()));
        }
        incident.status = IncidentStatus::Resolved;
        incident.resolve_remaining_secs = 0.0;
        let incident = incident.clone();

        if let Some(unit_id) = &incident.assigned_unit {
            if let Some(entity) = self.unit_entity(unit_id) {
                if let Ok((state, progress)) = self
                    .world
                    .query_one_mut::<(&mut UnitState, &mut MoveProgress)>(entity)
                {
                    state.status = UnitStatus::Idle;
                    state.target = None;
                    progress.carry = 0.0;
                }
            }
        }

        events.push(SimEvent::IncidentResolved {
            incident_id: id,
            call_id: incident.call_id,
            unit_id: incident.assigned_unit.clone(),
            severity: incident.severity,
            prank: incident.is_prank(),
            mismatch: incident.mismatch,
            tolerated: incident.tolerated,
            late: incident.is_late(),
        });
        info!(incident = id, late = incident.is_late(), "incident resolved");
        Some(Resolution::Resolved(incident))
    }

    fn unit_entity(&self, unit_id: &str) -> Option<Entity> {
        self.roster
            .iter()
            .find(|(id, _)| id == unit_id)
            .map(|(_, entity)| *entity)
    }
}
