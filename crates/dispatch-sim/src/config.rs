//! Shift configuration: difficulty presets and the scoring table.

use serde::{Deserialize, Serialize};

use dispatch_core::constants::{QUEUE_CAPACITY, SCORE_FLOOR, SHIFT_DURATION_SECS, WARNING_LIMIT};
use dispatch_core::enums::{Difficulty, Severity};

/// Tuning derived from a difficulty preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Seconds between scheduled call spawns.
    pub spawn_interval_secs: f64,
    /// Chance of a second call on each scheduled spawn.
    pub extra_spawn_chance: f64,
    /// Multiplier on queue and talk time.
    pub timeout_mult: f64,
    /// Multiplier on every score delta.
    pub score_mult: f64,
    /// Unit travel speed in grid cells per second.
    pub unit_speed: f64,
}

impl DifficultyParams {
    /// Preset tuning for `difficulty`.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                spawn_interval_secs: 18.0,
                extra_spawn_chance: 0.15,
                timeout_mult: 1.25,
                score_mult: 0.9,
                unit_speed: 7.0,
            },
            Difficulty::Normal => Self {
                spawn_interval_secs: 14.0,
                extra_spawn_chance: 0.15,
                timeout_mult: 1.0,
                score_mult: 1.0,
                unit_speed: 6.0,
            },
            Difficulty::Hard => Self {
                spawn_interval_secs: 10.0,
                extra_spawn_chance: 0.35,
                timeout_mult: 0.8,
                score_mult: 1.2,
                unit_speed: 5.0,
            },
        }
    }
}

/// Every reward and penalty the evaluator applies. Penalties are positive
/// magnitudes; the evaluator subtracts them.
///
/// Per-severity tables are indexed `[prank, low, medium, high]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub prank_dismiss_reward: i64,
    pub real_dismiss_penalty: [i64; 4],
    pub wasted_dispatch_penalty: i64,
    pub success_reward: [i64; 4],
    pub mismatch_penalty: [i64; 4],
    /// Divisor applied to the mismatch penalty when the unit's role was
    /// on the incident's nice-to-have list.
    pub tolerated_mismatch_divisor: i64,
    /// Divisor applied to the success reward when the incident ran overdue.
    pub late_reward_divisor: i64,
    pub queue_expired_penalty: i64,
    pub overdue_penalty: i64,
    pub instruction_reward: i64,
    pub instruction_penalty: i64,
    pub routing_reward: i64,
    pub routing_penalty: i64,
    pub abandoned_penalty: i64,
    pub floor: i64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            prank_dismiss_reward: 20,
            real_dismiss_penalty: [0, 25, 35, 50],
            wasted_dispatch_penalty: 30,
            success_reward: [0, 18, 28, 45],
            mismatch_penalty: [0, 18, 28, 55],
            tolerated_mismatch_divisor: 2,
            late_reward_divisor: 2,
            queue_expired_penalty: 10,
            overdue_penalty: 20,
            instruction_reward: 10,
            instruction_penalty: 12,
            routing_reward: 4,
            routing_penalty: 6,
            abandoned_penalty: 4,
            floor: SCORE_FLOOR,
        }
    }
}

impl ScoreTable {
    pub fn success(&self, severity: Severity) -> i64 {
        self.success_reward[severity.index()]
    }

    pub fn mismatch(&self, severity: Severity) -> i64 {
        self.mismatch_penalty[severity.index()]
    }

    pub fn real_dismiss(&self, severity: Severity) -> i64 {
        self.real_dismiss_penalty[severity.index()]
    }
}

/// Configuration for starting a new shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same shift.
    pub seed: u64,
    pub difficulty: Difficulty,
    pub shift_duration_secs: f64,
    /// Spawn calls on the difficulty schedule. Off for scripted tests.
    pub auto_spawn: bool,
    /// Calls seeded into the queue when the shift starts.
    pub initial_calls: usize,
    pub queue_capacity: usize,
    /// Track XP, rank and warnings; the warning limit ends the shift.
    pub career: bool,
    pub warning_limit: u32,
    pub scoring: ScoreTable,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            difficulty: Difficulty::default(),
            shift_duration_secs: SHIFT_DURATION_SECS,
            auto_spawn: true,
            initial_calls: dispatch_core::constants::INITIAL_QUEUE_SEED,
            queue_capacity: QUEUE_CAPACITY,
            career: true,
            warning_limit: WARNING_LIMIT,
            scoring: ScoreTable::default(),
        }
    }
}

impl SimConfig {
    /// A quiet shift: no scheduled or seeded calls. Used by scripted scenarios.
    pub fn scripted(seed: u64) -> Self {
        Self {
            seed,
            auto_spawn: false,
            initial_calls: 0,
            ..Default::default()
        }
    }

    pub fn params(&self) -> DifficultyParams {
        DifficultyParams::for_difficulty(self.difficulty)
    }
}
