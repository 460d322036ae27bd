//! Fundamental identifier, grid and time types.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Runtime identifier of a call instance.
pub type CallId = u32;

/// Runtime identifier of an incident.
pub type IncidentId = u32;

/// Unit identifiers come from the city catalog (e.g. `"P1"`).
pub type UnitId = String;

/// Grid dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub w: i32,
    pub h: i32,
}

impl GridSize {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }

    /// Clamp a cell into `[0, w-1] x [0, h-1]`.
    pub fn clamp(&self, cell: IVec2) -> IVec2 {
        cell.clamp(IVec2::ZERO, IVec2::new(self.w - 1, self.h - 1))
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.w && cell.y < self.h
    }
}

/// Manhattan (taxicab) distance between two cells.
pub fn manhattan(a: IVec2, b: IVec2) -> u32 {
    let d = (b - a).abs();
    (d.x + d.y) as u32
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed shift time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}
