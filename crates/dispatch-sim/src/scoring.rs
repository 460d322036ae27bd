//! Scoring/Outcome Evaluator.
//!
//! Reads simulation events and turns them into score deltas, counters and
//! career progress. It never touches the queue, incidents or units.

use tracing::{info, warn};

use dispatch_core::constants::RANK_XP_THRESHOLDS;
use dispatch_core::enums::{CloseReason, RankTier};
use dispatch_core::events::{Outcome, SimEvent};
use dispatch_core::state::{CareerView, ScoreCounters, ScoreView};

use crate::config::ScoreTable;

/// Running score tracked by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreState {
    pub score: i64,
    pub counters: ScoreCounters,
}

/// Experience, rank and the warning counter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Career {
    pub xp: u32,
    pub rank: RankTier,
    pub warnings: u32,
}

/// Rank tier reached with `xp` experience.
pub fn rank_for(xp: u32) -> RankTier {
    let tiers = [
        RankTier::Dispatcher,
        RankTier::SeniorDispatcher,
        RankTier::Supervisor,
    ];
    RANK_XP_THRESHOLDS
        .iter()
        .zip(tiers)
        .filter(|(threshold, _)| xp >= **threshold)
        .map(|(_, tier)| tier)
        .last()
        .unwrap_or(RankTier::Trainee)
}

pub struct OutcomeEvaluator {
    table: ScoreTable,
    score_mult: f64,
    state: ScoreState,
    career: Option<Career>,
    warning_limit: u32,
}

impl OutcomeEvaluator {
    pub fn new(table: ScoreTable, score_mult: f64, career: bool, warning_limit: u32) -> Self {
        Self {
            table,
            score_mult,
            state: ScoreState::default(),
            career: career.then(Career::default),
            warning_limit,
        }
    }

    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    pub fn career(&self) -> Option<&Career> {
        self.career.as_ref()
    }

    pub fn score_view(&self) -> ScoreView {
        ScoreView {
            score: self.state.score,
            counters: self.state.counters,
        }
    }

    pub fn career_view(&self) -> Option<CareerView> {
        self.career.as_ref().map(|c| CareerView {
            xp: c.xp,
            rank: c.rank,
            warnings: c.warnings,
            warning_limit: self.warning_limit,
        })
    }

    /// The career warning limit was reached.
    pub fn warnings_exhausted(&self) -> bool {
        self.career
            .as_ref()
            .is_some_and(|c| c.warnings >= self.warning_limit)
    }

    /// Score one event. Derived events (score changes, warnings, rank-ups)
    /// are appended to `out`.
    pub fn apply(&mut self, event: &SimEvent, out: &mut Vec<SimEvent>) {
        let t = &self.table;
        match event {
            SimEvent::CallClosed { reason, prank, severity, .. } => match reason {
                CloseReason::Dismissed if *prank => {
                    self.state.counters.handled += 1;
                    self.state.counters.prank_closed += 1;
                    let reward = t.prank_dismiss_reward;
                    self.award(Outcome::PrankDismissed, reward, out);
                }
                CloseReason::Dismissed => {
                    self.state.counters.handled += 1;
                    self.state.counters.wrong += 1;
                    let penalty = t.real_dismiss(*severity);
                    self.award(Outcome::RealCallDismissed, -penalty, out);
                }
                CloseReason::Expired => {
                    self.state.counters.expired += 1;
                    let penalty = t.queue_expired_penalty;
                    self.award(Outcome::QueueExpired, -penalty, out);
                }
                CloseReason::IncidentResolved | CloseReason::HandedOff => {
                    self.state.counters.handled += 1;
                }
                CloseReason::ShiftEnded => {}
            },
            SimEvent::CallOverdue { .. } => {
                self.state.counters.overdue += 1;
                let penalty = t.overdue_penalty;
                self.award(Outcome::CallOverdue, -penalty, out);
            }
            SimEvent::ServiceRouted { correct, .. } => {
                if *correct {
                    let reward = t.routing_reward;
                    self.award(Outcome::RoutingCorrect, reward, out);
                } else {
                    let penalty = t.routing_penalty;
                    self.award(Outcome::RoutingWrong, -penalty, out);
                }
            }
            SimEvent::InstructionGiven { correct, .. } => {
                if *correct {
                    let reward = t.instruction_reward;
                    self.award(Outcome::InstructionCorrect, reward, out);
                } else {
                    let penalty = t.instruction_penalty;
                    self.award(Outcome::InstructionWrong, -penalty, out);
                }
            }
            SimEvent::UnitDispatched { prank, .. } => {
                self.state.counters.dispatched += 1;
                if *prank {
                    self.state.counters.wrong += 1;
                    let penalty = t.wasted_dispatch_penalty;
                    self.award(Outcome::WastedDispatch, -penalty, out);
                }
            }
            SimEvent::IncidentOverdue { .. } => {
                self.state.counters.overdue += 1;
                let penalty = t.overdue_penalty;
                self.award(Outcome::IncidentOverdue, -penalty, out);
            }
            SimEvent::IncidentResolved {
                unit_id,
                severity,
                prank,
                mismatch,
                tolerated,
                late,
                ..
            } => {
                if *prank {
                    // Already charged as a wasted dispatch.
                    return;
                }
                if unit_id.is_none() {
                    let penalty = t.abandoned_penalty;
                    self.award(Outcome::IncidentAbandoned, -penalty, out);
                } else if *mismatch {
                    self.state.counters.wrong += 1;
                    let divisor = if *tolerated {
                        t.tolerated_mismatch_divisor.max(1)
                    } else {
                        1
                    };
                    let penalty = t.mismatch(*severity) / divisor;
                    self.award(Outcome::ResolvedMismatch, -penalty, out);
                } else {
                    self.state.counters.correct += 1;
                    let reward = t.success(*severity);
                    if *late {
                        let reward = reward / t.late_reward_divisor.max(1);
                        self.award(Outcome::ResolvedLate, reward, out);
                    } else {
                        self.award(Outcome::ResolvedOnTime, reward, out);
                    }
                }
            }
            _ => {}
        }
    }

    fn award(&mut self, outcome: Outcome, base: i64, out: &mut Vec<SimEvent>) {
        let scaled = (base as f64 * self.score_mult).round() as i64;
        let before = self.state.score;
        self.state.score = (before + scaled).max(self.table.floor);
        let delta = self.state.score - before;

        if delta != 0 || outcome.is_warning() {
            out.push(SimEvent::ScoreChanged {
                outcome,
                delta,
                total: self.state.score,
            });
        }
        info!(?outcome, delta, total = self.state.score, "score changed");

        let limit = self.warning_limit;
        let Some(career) = self.career.as_mut() else {
            return;
        };
        if delta > 0 {
            career.xp += delta as u32;
            let rank = rank_for(career.xp);
            if rank > career.rank {
                career.rank = rank;
                out.push(SimEvent::RankUp { rank });
                info!(?rank, xp = career.xp, "rank up");
            }
        }
        if outcome.is_warning() {
            career.warnings += 1;
            out.push(SimEvent::WarningIssued {
                count: career.warnings,
                limit,
            });
            warn!(?outcome, count = career.warnings, limit, "warning issued");
        }
    }
}
