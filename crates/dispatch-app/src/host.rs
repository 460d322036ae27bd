//! Host-side handlers that bridge a controller to the game loop thread.
//!
//! These mirror what a UI would call: start the loop, forward commands, poll the
//! latest snapshot, and stop the loop to collect the summary.

use dispatch_core::commands::PlayerCommand;
use dispatch_core::state::{ShiftSnapshot, ShiftSummary};
use dispatch_sim::ShiftEngine;
use thiserror::Error;

use crate::game_loop::{self, LoopOptions};
use crate::state::{AppState, GameLoopCommand};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("shift loop already running")]
    AlreadyRunning,

    #[error("shift loop not started")]
    NotStarted,

    #[error("game loop channel closed")]
    ChannelClosed,

    #[error("host state lock poisoned")]
    Poisoned,

    #[error("game loop thread panicked")]
    LoopPanicked,

    #[error("failed to spawn game loop thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Start the shift loop. Spawns the game loop thread if not already running.
pub fn start_loop(
    state: &AppState,
    engine: ShiftEngine,
    options: LoopOptions,
) -> Result<(), HostError> {
    let mut running = state.running.lock().map_err(|_| HostError::Poisoned)?;

    if *running {
        return Err(HostError::AlreadyRunning);
    }

    let (cmd_tx, handle) =
        game_loop::spawn_game_loop(engine, options, state.latest_snapshot.clone())?;

    *state.command_tx.lock().map_err(|_| HostError::Poisoned)? = Some(cmd_tx);
    *state.loop_handle.lock().map_err(|_| HostError::Poisoned)? = Some(handle);
    *running = true;

    Ok(())
}

/// Send a player command to the running shift.
pub fn send_command(state: &AppState, command: PlayerCommand) -> Result<(), HostError> {
    let tx_lock = state.command_tx.lock().map_err(|_| HostError::Poisoned)?;

    match tx_lock.as_ref() {
        Some(tx) => tx
            .send(GameLoopCommand::PlayerCommand(command))
            .map_err(|_| HostError::ChannelClosed),
        None => Err(HostError::NotStarted),
    }
}

/// Get the latest snapshot synchronously.
pub fn get_snapshot(state: &AppState) -> Result<Option<ShiftSnapshot>, HostError> {
    let lock = state
        .latest_snapshot
        .lock()
        .map_err(|_| HostError::Poisoned)?;
    Ok(lock.clone())
}

/// Wait for the loop to finish on its own (the shift ended) and return the summary.
pub fn wait_for_summary(state: &AppState) -> Result<ShiftSummary, HostError> {
    let handle = state
        .loop_handle
        .lock()
        .map_err(|_| HostError::Poisoned)?
        .take()
        .ok_or(HostError::NotStarted)?;

    let summary = handle.join().map_err(|_| HostError::LoopPanicked)?;
    reset(state)?;
    Ok(summary)
}

/// Ask the loop to stop after the current tick, then wait for its summary.
pub fn shutdown(state: &AppState) -> Result<ShiftSummary, HostError> {
    {
        let tx_lock = state.command_tx.lock().map_err(|_| HostError::Poisoned)?;
        let tx = tx_lock.as_ref().ok_or(HostError::NotStarted)?;
        // A loop that already finished has dropped its receiver.
        let _ = tx.send(GameLoopCommand::Shutdown);
    }
    wait_for_summary(state)
}

fn reset(state: &AppState) -> Result<(), HostError> {
    *state.command_tx.lock().map_err(|_| HostError::Poisoned)? = None;
    *state.running.lock().map_err(|_| HostError::Poisoned)? = false;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_core::enums::ShiftPhase;
    use dispatch_sim::SimConfig;

    fn engine() -> ShiftEngine {
        ShiftEngine::with_builtin_catalog(SimConfig::scripted(4)).unwrap()
    }

    #[test]
    fn test_send_before_start_is_rejected() {
        let state = AppState::new();
        assert!(matches!(
            send_command(&state, PlayerCommand::StartShift),
            Err(HostError::NotStarted)
        ));
        assert!(get_snapshot(&state).unwrap().is_none());
        assert!(matches!(shutdown(&state), Err(HostError::NotStarted)));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let state = AppState::new();
        start_loop(&state, engine(), LoopOptions::realtime()).unwrap();
        assert!(matches!(
            start_loop(&state, engine(), LoopOptions::realtime()),
            Err(HostError::AlreadyRunning)
        ));
        shutdown(&state).unwrap();
        assert!(!*state.running.lock().unwrap());
    }

    #[test]
    fn test_commands_reach_the_engine() {
        let state = AppState::new();
        start_loop(&state, engine(), LoopOptions::realtime()).unwrap();
        send_command(&state, PlayerCommand::StartShift).unwrap();

        let mut phase = None;
        for _ in 0..200 {
            phase = get_snapshot(&state).unwrap().map(|s| s.phase);
            if phase == Some(ShiftPhase::Active) {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(phase, Some(ShiftPhase::Active));

        let summary = shutdown(&state).unwrap();
        assert_eq!(summary.score, 0);
        assert!(state.command_tx.lock().unwrap().is_none());
    }
}
