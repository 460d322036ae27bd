//! Per-tick systems run by the shift engine.
//!
//! Systems are free functions over borrowed state. They do not own state;
//! the engine and its managers do.

pub mod movement;
pub mod snapshot;
pub mod spawner;
