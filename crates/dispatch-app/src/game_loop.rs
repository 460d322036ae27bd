//! Game loop thread: runs the shift engine at the tick rate and publishes snapshots.
//!
//! The engine is built by the caller and moved into the thread. Commands arrive via
//! an `mpsc` channel and are queued for the next tick boundary. The latest snapshot
//! is stored in shared state for synchronous polling. When the shift ends the loop
//! stops and the thread yields the end-of-shift summary.

use std::io;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use dispatch_core::constants::{DT, TICK_RATE};
use dispatch_core::enums::ShiftPhase;
use dispatch_core::state::{ShiftSnapshot, ShiftSummary};
use dispatch_sim::ShiftEngine;

use crate::operator::Operator;
use crate::state::GameLoopCommand;

/// Nominal duration of one tick in real time.
pub const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

/// How the loop is driven.
#[derive(Default)]
pub struct LoopOptions {
    /// Wall-clock time per tick. `None` runs as fast as possible.
    pub pace: Option<Duration>,
    /// Scripted operator consulted after every tick.
    pub operator: Option<Box<dyn Operator>>,
}

impl LoopOptions {
    /// Real-time pacing without an operator.
    pub fn realtime() -> Self {
        Self {
            pace: Some(TICK_DURATION),
            operator: None,
        }
    }
}

/// Spawns the game loop in a new thread.
///
/// Returns the command sender and the handle that yields the shift summary.
pub fn spawn_game_loop(
    engine: ShiftEngine,
    options: LoopOptions,
    latest_snapshot: Arc<Mutex<Option<ShiftSnapshot>>>,
) -> io::Result<(mpsc::Sender<GameLoopCommand>, JoinHandle<ShiftSummary>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let handle = std::thread::Builder::new()
        .name("dispatch-game-loop".into())
        .spawn(move || run_game_loop(engine, options, cmd_rx, &latest_snapshot))?;

    Ok((cmd_tx, handle))
}

/// The game loop. Runs until the shift ends, a Shutdown command, or channel disconnect.
fn run_game_loop(
    mut engine: ShiftEngine,
    options: LoopOptions,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &Mutex<Option<ShiftSnapshot>>,
) -> ShiftSummary {
    let LoopOptions { pace, mut operator } = options;
    let mut next_tick_time = Instant::now();

    'ticks: loop {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::PlayerCommand(cmd)) => engine.queue_command(cmd),
                Ok(GameLoopCommand::Shutdown) => {
                    debug!("game loop shutdown requested");
                    break 'ticks;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => break 'ticks,
            }
        }

        // 2. Advance one tick (the engine handles pause internally)
        let snapshot = engine.tick(DT);

        // 3. Let the operator react; its commands land on the next tick
        if let Some(operator) = operator.as_mut() {
            engine.queue_commands(operator.decide(&snapshot));
        }

        let ended = snapshot.phase == ShiftPhase::Ended;

        // 4. Store latest snapshot for synchronous polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        if ended {
            break;
        }

        // 5. Sleep until the next tick when paced
        if let Some(tick_duration) = pace {
            next_tick_time += tick_duration;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > tick_duration * 2 {
                // Too far behind, reset instead of catching up
                next_tick_time = now;
            }
        }
    }

    let summary = engine.summary();
    info!(
        score = summary.score,
        handled = summary.counters.handled,
        end_reason = ?summary.end_reason,
        "game loop finished"
    );
    summary
}
