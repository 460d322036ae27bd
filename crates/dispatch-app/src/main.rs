//! Headless shift runner.
//!
//! Plays one full shift with the scripted auto-operator and prints the
//! end-of-shift summary as JSON on stdout.

use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use dispatch_app::config::sim_config_from_env;
use dispatch_app::game_loop::LoopOptions;
use dispatch_app::host;
use dispatch_app::operator::AutoOperator;
use dispatch_app::state::AppState;
use dispatch_core::commands::PlayerCommand;
use dispatch_sim::ShiftEngine;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = sim_config_from_env()?;
    info!(seed = config.seed, difficulty = ?config.difficulty, "starting shift");

    let engine = ShiftEngine::with_builtin_catalog(config)?;
    let state = AppState::new();
    host::start_loop(
        &state,
        engine,
        LoopOptions {
            pace: None,
            operator: Some(Box::new(AutoOperator::new())),
        },
    )?;
    host::send_command(&state, PlayerCommand::StartShift)?;

    let summary = host::wait_for_summary(&state)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
