//! Shift engine: the core of the simulation.
//!
//! `ShiftEngine` owns the call manager, the dispatch simulator and the
//! outcome evaluator, processes player commands, runs all systems and
//! produces `ShiftSnapshot`s. Completely headless, enabling deterministic
//! testing.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use dispatch_core::catalog::Catalog;
use dispatch_core::commands::PlayerCommand;
use dispatch_core::constants::TIME_EPSILON;
use dispatch_core::enums::{Agency, AlertLevel, CloseReason, ShiftEndReason, ShiftPhase};
use dispatch_core::error::{CatalogError, Rejection};
use dispatch_core::events::{Alert, SimEvent};
use dispatch_core::state::{ShiftSnapshot, ShiftSummary};
use dispatch_core::types::{CallId, IncidentId, SimTime};

use crate::calls::CallManager;
use crate::config::{DifficultyParams, SimConfig};
use crate::dispatch::{DispatchSimulator, Resolution};
use crate::scoring::OutcomeEvaluator;
use crate::systems;
use crate::systems::snapshot::ShiftHeader;
use crate::systems::spawner::SpawnSchedule;

/// The shift engine. Owns every manager and all simulation state.
pub struct ShiftEngine {
    config: SimConfig,
    params: DifficultyParams,
    catalog: Arc<Catalog>,
    time: SimTime,
    phase: ShiftPhase,
    end_reason: Option<ShiftEndReason>,
    rng: ChaCha8Rng,
    command_queue: VecDeque<PlayerCommand>,
    /// Events since the last tick; `scored` of them went through the evaluator.
    events: Vec<SimEvent>,
    scored: usize,
    alerts: Vec<Alert>,

    calls: CallManager,
    dispatcher: DispatchSimulator,
    scoring: OutcomeEvaluator,
    spawn_schedule: SpawnSchedule,
}

impl ShiftEngine {
    /// Create an engine in the briefing phase.
    pub fn new(config: SimConfig, catalog: Arc<Catalog>) -> Self {
        let params = config.params();
        let city = catalog.city();
        Self {
            calls: CallManager::new(config.queue_capacity, params.timeout_mult, &city.greeting),
            dispatcher: DispatchSimulator::new(city, params.unit_speed, params.timeout_mult),
            scoring: OutcomeEvaluator::new(
                config.scoring.clone(),
                params.score_mult,
                config.career,
                config.warning_limit,
            ),
            spawn_schedule: SpawnSchedule::new(&params),
            time: SimTime::default(),
            phase: ShiftPhase::default(),
            end_reason: None,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            command_queue: VecDeque::new(),
            events: Vec::new(),
            scored: 0,
            alerts: Vec::new(),
            params,
            catalog,
            config,
        }
    }

    /// Create an engine over the built-in content.
    pub fn with_builtin_catalog(config: SimConfig) -> Result<Self, CatalogError> {
        Ok(Self::new(config, Arc::new(Catalog::builtin()?)))
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the shift by `dt` seconds and return the resulting snapshot.
    /// The snapshot carries the events and alerts raised since the last tick.
    pub fn tick(&mut self, dt: f64) -> ShiftSnapshot {
        self.process_commands();

        if self.phase == ShiftPhase::Active {
            let dt = dt.max(0.0);
            self.run_systems(dt);
            self.time.advance(dt);
            self.settle();
            if self.phase == ShiftPhase::Active
                && self.time.elapsed_secs + TIME_EPSILON >= self.config.shift_duration_secs
            {
                self.finish(ShiftEndReason::TimeUp);
            }
        }
        self.settle();

        let events = std::mem::take(&mut self.events);
        self.scored = 0;
        let alerts = std::mem::take(&mut self.alerts);
        systems::snapshot::build_snapshot(
            self.header(),
            &self.calls,
            &self.dispatcher,
            &self.scoring,
            self.catalog.city(),
            events,
            alerts,
        )
    }

    /// Current state without advancing. Pending events and alerts are
    /// included but not drained.
    pub fn snapshot(&self) -> ShiftSnapshot {
        systems::snapshot::build_snapshot(
            self.header(),
            &self.calls,
            &self.dispatcher,
            &self.scoring,
            self.catalog.city(),
            self.events.clone(),
            self.alerts.clone(),
        )
    }

    /// End-of-shift report. Valid at any time.
    pub fn summary(&self) -> ShiftSummary {
        let state = self.scoring.state();
        ShiftSummary {
            difficulty: self.config.difficulty,
            duration_secs: self.time.elapsed_secs,
            score: state.score,
            counters: state.counters,
            career: self.scoring.career_view(),
            end_reason: self.end_reason,
        }
    }

    pub fn phase(&self) -> ShiftPhase {
        self.phase
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn calls(&self) -> &CallManager {
        &self.calls
    }

    pub fn dispatcher(&self) -> &DispatchSimulator {
        &self.dispatcher
    }

    pub fn scoring(&self) -> &OutcomeEvaluator {
        &self.scoring
    }

    /// Events raised since the last tick.
    pub fn pending_events(&self) -> &[SimEvent] {
        &self.events
    }

    // ---- Shift control ----

    pub fn start_shift(&mut self) -> Result<(), Rejection> {
        if self.phase != ShiftPhase::Briefing {
            return Err(Rejection::ShiftAlreadyStarted(self.phase));
        }
        self.phase = ShiftPhase::Active;
        self.time = SimTime::default();
        self.spawn_schedule = SpawnSchedule::new(&self.params);
        info!(
            seed = self.config.seed,
            difficulty = ?self.config.difficulty,
            city = %self.catalog.city().name,
            "shift started"
        );

        for _ in 0..self.config.initial_calls {
            self.spawn_random();
        }
        self.settle();
        Ok(())
    }

    pub fn end_shift(&mut self) -> Result<(), Rejection> {
        match self.phase {
            ShiftPhase::Active | ShiftPhase::Paused => {
                self.finish(ShiftEndReason::Requested);
                self.settle();
                Ok(())
            }
            phase => Err(Rejection::ShiftNotRunning(phase)),
        }
    }

    pub fn pause(&mut self) -> Result<(), Rejection> {
        match self.phase {
            ShiftPhase::Active | ShiftPhase::Paused => {
                self.phase = ShiftPhase::Paused;
                Ok(())
            }
            phase => Err(Rejection::ShiftNotRunning(phase)),
        }
    }

    pub fn resume(&mut self) -> Result<(), Rejection> {
        match self.phase {
            ShiftPhase::Active | ShiftPhase::Paused => {
                self.phase = ShiftPhase::Active;
                Ok(())
            }
            phase => Err(Rejection::ShiftNotRunning(phase)),
        }
    }

    // ---- Call handling ----

    /// Spawn a weighted-random call. `Ok(None)` when the queue is full.
    pub fn spawn_call(&mut self) -> Result<Option<CallId>, Rejection> {
        self.run_intent("spawn_call", |engine| Ok(engine.spawn_random()))
    }

    /// Spawn a call for a specific template. `Ok(None)` when the queue is full.
    pub fn spawn_template(&mut self, template_id: &str) -> Result<Option<CallId>, Rejection> {
        self.run_intent("spawn_template", |engine| {
            let template = engine
                .catalog
                .template(template_id)
                .cloned()
                .ok_or_else(|| Rejection::UnknownTemplate(template_id.to_string()))?;
            Ok(engine.calls.spawn(template, &mut engine.events))
        })
    }

    pub fn answer(&mut self, call_id: CallId) -> Result<(), Rejection> {
        self.run_intent("answer", |engine| engine.calls.answer(call_id, &mut engine.events))
    }

    pub fn hold(&mut self) -> Result<(), Rejection> {
        self.run_intent("hold", |engine| engine.calls.hold(&mut engine.events))
    }

    /// Route the active call. Returns whether the agency was the right one.
    pub fn route_service(&mut self, agency: Agency) -> Result<bool, Rejection> {
        self.run_intent("route_service", |engine| {
            engine.calls.route_service(agency, &mut engine.events)
        })
    }

    pub fn ask_question(&mut self, question_id: &str) -> Result<(), Rejection> {
        self.run_intent("ask_question", |engine| {
            engine.calls.ask_question(question_id, &mut engine.events)
        })
    }

    /// Create the active call's incident, or return the existing one.
    pub fn request_dispatch(&mut self) -> Result<IncidentId, Rejection> {
        self.run_intent("request_dispatch", |engine| {
            let Self {
                calls,
                dispatcher,
                catalog,
                rng,
                events,
                ..
            } = engine;
            calls.request_dispatch(events, |call, events| {
                dispatcher.create_incident(call, catalog.city(), rng, events)
            })
        })
    }

    pub fn dismiss(&mut self) -> Result<(), Rejection> {
        self.run_intent("dismiss", |engine| engine.calls.dismiss(&mut engine.events))
    }

    pub fn end_call(&mut self) -> Result<(), Rejection> {
        self.run_intent("end_call", |engine| engine.calls.end_call(&mut engine.events))
    }

    /// Returns whether the chosen option was correct.
    pub fn give_instruction(&mut self, option: usize) -> Result<bool, Rejection> {
        self.run_intent("give_instruction", |engine| {
            engine.calls.give_instruction(option, &mut engine.events)
        })
    }

    // ---- Map ----

    pub fn dispatch(&mut self, incident_id: IncidentId, unit_id: &str) -> Result<(), Rejection> {
        self.run_intent("dispatch", |engine| {
            engine
                .dispatcher
                .dispatch(incident_id, unit_id, &mut engine.events)
        })
    }

    /// Close an incident now. A second call returns `AlreadyResolved` and
    /// changes nothing.
    pub fn resolve_incident(&mut self, incident_id: IncidentId) -> Result<Resolution, Rejection> {
        self.run_intent("resolve_incident", |engine| {
            let resolution = engine
                .dispatcher
                .resolve_incident(incident_id, &mut engine.events)
                .ok_or(Rejection::IncidentNotFound(incident_id))?;
            if let Resolution::Resolved(incident) = &resolution {
                engine
                    .calls
                    .incident_resolved(incident.call_id, &mut engine.events);
            }
            Ok(resolution)
        })
    }

    // ---- Internals ----

    fn require_running(&self) -> Result<(), Rejection> {
        match self.phase {
            ShiftPhase::Active => Ok(()),
            phase => Err(Rejection::ShiftNotRunning(phase)),
        }
    }

    /// Apply an intent atomically: scored on success, logged on rejection.
    fn run_intent<T>(
        &mut self,
        intent: &'static str,
        apply: impl FnOnce(&mut Self) -> Result<T, Rejection>,
    ) -> Result<T, Rejection> {
        let result = match self.require_running() {
            Ok(()) => apply(self),
            Err(rejection) => Err(rejection),
        };
        match &result {
            Ok(_) => self.settle(),
            Err(rejection) => debug!(intent, %rejection, "intent rejected"),
        }
        result
    }

    fn spawn_random(&mut self) -> Option<CallId> {
        let catalog = Arc::clone(&self.catalog);
        let progress = self.progress();
        let template = systems::spawner::pick_template(catalog.templates(), progress, &mut self.rng)?;
        self.calls.spawn(Arc::clone(template), &mut self.events)
    }

    fn progress(&self) -> f64 {
        if self.config.shift_duration_secs <= 0.0 {
            return 1.0;
        }
        (self.time.elapsed_secs / self.config.shift_duration_secs).clamp(0.0, 1.0)
    }

    fn header(&self) -> ShiftHeader {
        ShiftHeader {
            time: self.time,
            phase: self.phase,
            difficulty: self.config.difficulty,
            shift_remaining_secs: (self.config.shift_duration_secs - self.time.elapsed_secs)
                .max(0.0),
            end_reason: self.end_reason,
        }
    }

    /// Feed unscored events to the evaluator, raise alerts, and end the
    /// shift once the warning limit is reached.
    fn settle(&mut self) {
        loop {
            while self.scored < self.events.len() {
                let event = self.events[self.scored].clone();
                self.scored += 1;
                self.scoring.apply(&event, &mut self.events);
                if let Some(alert) = alert_for(&event, self.time.tick) {
                    self.alerts.push(alert);
                }
            }
            if matches!(self.phase, ShiftPhase::Active | ShiftPhase::Paused)
                && self.scoring.warnings_exhausted()
            {
                self.finish(ShiftEndReason::Dismissed);
                continue;
            }
            break;
        }
    }

    fn finish(&mut self, reason: ShiftEndReason) {
        if self.phase == ShiftPhase::Ended {
            return;
        }
        self.phase = ShiftPhase::Ended;
        self.end_reason = Some(reason);
        self.calls.close_all(CloseReason::ShiftEnded, &mut self.events);
        self.events.push(SimEvent::ShiftEnded { reason });

        let score = self.scoring.state().score;
        match reason {
            ShiftEndReason::Dismissed => {
                warn!(score, "warning limit reached, operator relieved of duty")
            }
            _ => info!(?reason, score, elapsed = self.time.elapsed_secs, "shift ended"),
        }
    }

    /// Process all queued commands. Rejections surface as alerts.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            if let Err(rejection) = self.handle_command(command) {
                self.alerts.push(Alert {
                    level: AlertLevel::Warning,
                    message: rejection.to_string(),
                    tick: self.time.tick,
                });
            }
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) -> Result<(), Rejection> {
        match command {
            PlayerCommand::StartShift => self.start_shift(),
            PlayerCommand::EndShift => self.end_shift(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Resume => self.resume(),
            PlayerCommand::SpawnCall => self.spawn_call().map(|_| ()),
            PlayerCommand::Answer { call_id } => self.answer(call_id),
            PlayerCommand::Hold => self.hold(),
            PlayerCommand::RouteService { agency } => self.route_service(agency).map(|_| ()),
            PlayerCommand::AskQuestion { question_id } => self.ask_question(&question_id),
            PlayerCommand::RequestDispatch => self.request_dispatch().map(|_| ()),
            PlayerCommand::Dismiss => self.dismiss(),
            PlayerCommand::EndCall => self.end_call(),
            PlayerCommand::GiveInstruction { option } => self.give_instruction(option).map(|_| ()),
            PlayerCommand::Dispatch {
                incident_id,
                unit_id,
            } => self.dispatch(incident_id, &unit_id),
            PlayerCommand::ResolveIncident { incident_id } => {
                self.resolve_incident(incident_id).map(|_| ())
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Scheduled call spawning
        if self.config.auto_spawn {
            let progress = self.progress();
            systems::spawner::run(
                &mut self.spawn_schedule,
                self.time.elapsed_secs,
                progress,
                self.catalog.templates(),
                &mut self.rng,
                &mut self.calls,
                &mut self.events,
            );
        }
        // 2. Queue and talk clocks, timed call updates
        self.calls.tick(dt, &mut self.events);
        // 3. Unit movement, on-scene countdowns, response budgets
        let resolved = self.dispatcher.tick(dt, &mut self.events);
        // 4. Close calls whose incidents resolved
        for call_id in resolved {
            self.calls.incident_resolved(call_id, &mut self.events);
        }
    }
}

/// Toast for events the operator should notice.
fn alert_for(event: &SimEvent, tick: u64) -> Option<Alert> {
    let (level, message) = match event {
        SimEvent::CallClosed {
            call_id,
            reason: CloseReason::Expired,
            ..
        } => (AlertLevel::Info, format!("Caller {call_id} hung up in the queue")),
        SimEvent::CallOverdue { call_id, .. } => {
            (AlertLevel::Warning, format!("Call {call_id} is over time"))
        }
        SimEvent::IncidentOverdue { incident_id, .. } => (
            AlertLevel::Warning,
            format!("Incident #{incident_id} is overdue"),
        ),
        SimEvent::WarningIssued { count, limit } => (
            AlertLevel::Critical,
            format!("Supervisor warning {count} of {limit}"),
        ),
        SimEvent::RankUp { rank } => (AlertLevel::Info, format!("Promoted to {rank:?}")),
        SimEvent::ShiftEnded {
            reason: ShiftEndReason::Dismissed,
        } => (
            AlertLevel::Critical,
            "Relieved of duty: too many warnings".to_string(),
        ),
        _ => return None,
    };
    Some(Alert {
        level,
        message,
        tick,
    })
}
