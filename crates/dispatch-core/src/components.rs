//! ECS components for unit entities.
//!
//! Components are plain data structs with no methods.
//! Movement and resolution logic lives in the simulator, not here.
//! Grid position is stored as a bare `glam::IVec2` component.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::enums::{Agency, UnitStatus};
use crate::types::{IncidentId, UnitId};

/// Static identity of a response unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    pub name: String,
    /// Role matched against an incident's required role.
    pub role: String,
    pub agency: Agency,
}

/// Where a unit is heading and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveTarget {
    pub cell: IVec2,
    pub incident: IncidentId,
}

/// Dynamic unit state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitState {
    pub status: UnitStatus,
    pub target: Option<MoveTarget>,
}

/// Fractional movement accumulated between whole-cell steps.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MoveProgress {
    /// Cells of travel owed but not yet stepped (always `< 1.0` after a tick).
    pub carry: f64,
}
