//! Simulation engine for the dispatch shift.
//!
//! Owns the call queue, the incident map and the hecs world of response
//! units, advances them on a fixed tick and produces `ShiftSnapshot`s for
//! the presentation layer.

pub mod calls;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod scoring;
pub mod systems;

pub use dispatch_core as core;
pub use config::SimConfig;
pub use engine::ShiftEngine;
