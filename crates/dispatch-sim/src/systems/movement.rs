//! Grid movement system.
//!
//! En-route units accumulate fractional travel (`speed * dt`) and consume
//! it in whole-cell Manhattan steps, horizontal axis first. Path length is
//! always the Manhattan distance to the target.

use glam::IVec2;
use hecs::World;

use dispatch_core::components::{MoveProgress, Unit, UnitState};
use dispatch_core::constants::TIME_EPSILON;
use dispatch_core::enums::UnitStatus;
use dispatch_core::types::{IncidentId, UnitId};

/// One cell toward `to`: x first, then y. Returns `from` when already there.
pub fn step_toward(from: IVec2, to: IVec2) -> IVec2 {
    if from.x != to.x {
        IVec2::new(from.x + (to.x - from.x).signum(), from.y)
    } else if from.y != to.y {
        IVec2::new(from.x, from.y + (to.y - from.y).signum())
    } else {
        from
    }
}

/// Advance every en-route unit. Units that reach their target switch to
/// `OnScene` and are returned as `(unit, incident)` arrivals.
pub fn run(world: &mut World, speed: f64, dt: f64) -> Vec<(UnitId, IncidentId)> {
    let mut arrivals = Vec::new();

    for (_entity, (unit, pos, state, progress)) in
        world.query_mut::<(&Unit, &mut IVec2, &mut UnitState, &mut MoveProgress)>()
    {
        if state.status != UnitStatus::Enroute {
            continue;
        }
        let Some(target) = state.target else {
            continue;
        };

        if *pos != target.cell {
            progress.carry += speed * dt;
            while progress.carry + TIME_EPSILON >= 1.0 && *pos != target.cell {
                *pos = step_toward(*pos, target.cell);
                progress.carry -= 1.0;
            }
        }

        if *pos == target.cell {
            progress.carry = 0.0;
            state.status = UnitStatus::OnScene;
            arrivals.push((unit.id.clone(), target.incident));
        }
    }

    arrivals
}
