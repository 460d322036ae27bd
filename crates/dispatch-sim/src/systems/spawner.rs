//! Call spawning system: picks templates on the difficulty schedule.
//!
//! A fixed chance draws from the prank pool. Otherwise a severity is drawn
//! with weights that drift toward high severity as the shift progresses,
//! then a template of that severity is picked uniformly.

use std::sync::Arc;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use dispatch_core::catalog::CallTemplate;
use dispatch_core::constants::{
    PRANK_SPAWN_CHANCE, SEVERITY_WEIGHTS_DRIFT, SEVERITY_WEIGHTS_START, SEVERITY_WEIGHT_FLOOR,
};
use dispatch_core::enums::Severity;
use dispatch_core::events::SimEvent;

use crate::calls::CallManager;
use crate::config::DifficultyParams;

const REAL_SEVERITIES: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

/// Next scheduled spawn time and the roll for an extra call.
#[derive(Debug, Clone)]
pub struct SpawnSchedule {
    pub interval_secs: f64,
    pub extra_chance: f64,
    pub next_at_secs: f64,
}

impl SpawnSchedule {
    pub fn new(params: &DifficultyParams) -> Self {
        Self {
            interval_secs: params.spawn_interval_secs,
            extra_chance: params.extra_spawn_chance,
            next_at_secs: params.spawn_interval_secs,
        }
    }
}

/// Severity weights `[low, medium, high]` at `progress` (0.0 to 1.0).
pub fn severity_weights(progress: f64) -> [f64; 3] {
    let p = progress.clamp(0.0, 1.0);
    let mut weights = [0.0; 3];
    for (i, w) in weights.iter_mut().enumerate() {
        *w = (SEVERITY_WEIGHTS_START[i] + SEVERITY_WEIGHTS_DRIFT[i] * p).max(SEVERITY_WEIGHT_FLOOR);
    }
    weights
}

/// Weighted template pick. `None` only when `templates` is empty.
pub fn pick_template<'a>(
    templates: &'a [Arc<CallTemplate>],
    progress: f64,
    rng: &mut ChaCha8Rng,
) -> Option<&'a Arc<CallTemplate>> {
    let pranks: Vec<&Arc<CallTemplate>> = templates.iter().filter(|t| t.is_prank()).collect();
    let real: Vec<&Arc<CallTemplate>> = templates.iter().filter(|t| !t.is_prank()).collect();

    if !pranks.is_empty() && (real.is_empty() || rng.gen_bool(PRANK_SPAWN_CHANCE)) {
        return pranks.choose(rng).copied();
    }

    let weights = severity_weights(progress);
    let available: Vec<(Severity, f64)> = REAL_SEVERITIES
        .iter()
        .zip(weights)
        .filter(|(sev, _)| real.iter().any(|t| t.base_severity == **sev))
        .map(|(sev, w)| (*sev, w))
        .collect();
    let dist = WeightedIndex::new(available.iter().map(|(_, w)| *w)).ok()?;
    let severity = available[dist.sample(rng)].0;

    let pool: Vec<&Arc<CallTemplate>> = real
        .into_iter()
        .filter(|t| t.base_severity == severity)
        .collect();
    pool.choose(rng).copied()
}

/// Spawn every call due by `elapsed_secs`.
pub fn run(
    schedule: &mut SpawnSchedule,
    elapsed_secs: f64,
    progress: f64,
    templates: &[Arc<CallTemplate>],
    rng: &mut ChaCha8Rng,
    calls: &mut CallManager,
    events: &mut Vec<SimEvent>,
) {
    while elapsed_secs >= schedule.next_at_secs {
        schedule.next_at_secs += schedule.interval_secs;

        if let Some(template) = pick_template(templates, progress, rng) {
            calls.spawn(Arc::clone(template), events);
        }
        if rng.gen_bool(schedule.extra_chance) {
            if let Some(template) = pick_template(templates, progress, rng) {
                calls.spawn(Arc::clone(template), events);
            }
        }
    }
}
