//! Host state shared between the controlling thread and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use dispatch_core::commands::PlayerCommand;
use dispatch_core::state::{ShiftSnapshot, ShiftSummary};

/// Commands sent from the host to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to forward to the shift engine.
    PlayerCommand(PlayerCommand),
    /// Stop the game loop thread after the current tick.
    Shutdown,
}

/// Shared host state.
///
/// - `mpsc::Sender` is wrapped in a `Mutex` so the state is `Sync`
/// - `Option` fields stay `None` until a shift loop is started
/// - the latest snapshot is shared with the game loop thread through an `Arc`
pub struct AppState {
    /// Channel sender for the running game loop. `None` before start.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    /// Latest snapshot, replaced by the game loop after each tick.
    pub latest_snapshot: Arc<Mutex<Option<ShiftSnapshot>>>,
    /// Join handle of the game loop thread; yields the shift summary.
    pub loop_handle: Mutex<Option<JoinHandle<ShiftSummary>>>,
    /// Whether a game loop has been started.
    pub running: Mutex<bool>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
            loop_handle: Mutex::new(None),
            running: Mutex::new(false),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest_snapshot.lock().unwrap().is_none());
        assert!(state.loop_handle.lock().unwrap().is_none());
        assert!(!*state.running.lock().unwrap());
    }
}
