//! Call Lifecycle Manager.
//!
//! Owns the queue of waiting calls and the single active call. Drives the
//! per-call timers, the question protocol and severity evolution, and the
//! hand-over into an incident. Every intent returns `Result<_, Rejection>`
//! and leaves state untouched when it fails.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info};

use dispatch_core::catalog::CallTemplate;
use dispatch_core::constants::*;
use dispatch_core::enums::{Agency, CallStatus, CloseReason, Severity, Speaker};
use dispatch_core::error::Rejection;
use dispatch_core::events::SimEvent;
use dispatch_core::state::TranscriptLine;
use dispatch_core::types::{CallId, IncidentId};

/// One runtime occurrence of a call template.
#[derive(Debug, Clone)]
pub struct CallInstance {
    pub id: CallId,
    pub template: Arc<CallTemplate>,
    /// Starts at the template's base severity and only escalates.
    pub severity: Severity,
    /// Bounded to `[0, PRANK_CONFIDENCE_MAX]`.
    pub prank_confidence: i32,
    pub asked: BTreeSet<String>,
    /// Agency the operator routed the call to, for templates that need routing.
    pub routed: Option<Agency>,
    pub status: CallStatus,
    pub queue_ttl_secs: f64,
    pub call_ttl_secs: f64,
    /// Seconds since the call started ringing. Drives timed updates.
    pub elapsed_secs: f64,
    /// Index of the next timed update to fire.
    pub next_event: usize,
    pub overdue: bool,
    pub incident: Option<IncidentId>,
    /// Dispatch was requested; the talk clock is stopped.
    pub waiting_for_dispatch: bool,
    /// `Some(correct)` once pre-arrival instructions were given.
    pub instruction: Option<bool>,
    pub transcript: Vec<TranscriptLine>,
    pub close_reason: Option<CloseReason>,
}

impl CallInstance {
    fn new(id: CallId, template: Arc<CallTemplate>, timeout_mult: f64) -> Self {
        let severity = template.base_severity;
        let call_ttl = template
            .call_timeout_secs
            .unwrap_or(CALL_TTL_SECS[severity.index()]);
        Self {
            id,
            severity,
            prank_confidence: 0,
            asked: BTreeSet::new(),
            routed: None,
            status: CallStatus::Queued,
            queue_ttl_secs: queue_ttl(severity, timeout_mult),
            call_ttl_secs: call_ttl * timeout_mult,
            elapsed_secs: 0.0,
            next_event: 0,
            overdue: false,
            incident: None,
            waiting_for_dispatch: false,
            instruction: None,
            transcript: Vec::new(),
            close_reason: None,
            template,
        }
    }

    pub fn is_prank(&self) -> bool {
        self.severity.is_prank()
    }

    /// Still waiting to be routed to an agency.
    pub fn routing_needed(&self) -> bool {
        self.template.routing && self.routed.is_none()
    }

    /// True iff every mandatory question has been asked.
    pub fn dispatch_unlocked(&self) -> bool {
        self.template
            .protocol
            .mandatory()
            .iter()
            .all(|q| self.asked.contains(q))
    }

    /// Mandatory questions not yet asked, in protocol order.
    pub fn unasked_mandatory(&self) -> Vec<String> {
        self.template
            .protocol
            .mandatory()
            .iter()
            .filter(|q| !self.asked.contains(*q))
            .cloned()
            .collect()
    }

    fn say(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptLine {
            speaker,
            text: text.into(),
        });
        if self.transcript.len() > MAX_TRANSCRIPT_LINES {
            let excess = self.transcript.len() - MAX_TRANSCRIPT_LINES;
            self.transcript.drain(..excess);
        }
    }

    fn raise_severity(&mut self, to: Severity, events: &mut Vec<SimEvent>) {
        let from = self.severity;
        let next = from.escalate(to);
        if next != from {
            self.severity = next;
            events.push(SimEvent::SeverityEscalated {
                call_id: self.id,
                from,
                to: next,
            });
        }
    }

    fn fire_due_updates(&mut self, events: &mut Vec<SimEvent>) {
        let template = Arc::clone(&self.template);
        while let Some(update) = template.events.get(self.next_event) {
            if update.at_secs > self.elapsed_secs + TIME_EPSILON {
                break;
            }
            self.next_event += 1;
            self.say(Speaker::System, update.text.clone());
            events.push(SimEvent::CallUpdate {
                call_id: self.id,
                text: update.text.clone(),
            });
            if let Some(to) = update.escalate_to {
                self.raise_severity(to, events);
            }
        }
    }
}

fn queue_ttl(severity: Severity, timeout_mult: f64) -> f64 {
    QUEUE_TTL_SECS[severity.index()] * timeout_mult
}

/// Queue, active line and closed-call archive.
#[derive(Debug)]
pub struct CallManager {
    /// Every non-closed call.
    open: BTreeMap<CallId, CallInstance>,
    /// Queued and held calls, front first.
    queue: VecDeque<CallId>,
    active: Option<CallId>,
    closed: Vec<CallInstance>,
    next_id: CallId,
    capacity: usize,
    timeout_mult: f64,
    greeting: String,
}

impl CallManager {
    pub fn new(capacity: usize, timeout_mult: f64, greeting: impl Into<String>) -> Self {
        Self {
            open: BTreeMap::new(),
            queue: VecDeque::new(),
            active: None,
            closed: Vec::new(),
            next_id: 1,
            capacity,
            timeout_mult,
            greeting: greeting.into(),
        }
    }

    // ---- Queries ----

    pub fn active(&self) -> Option<&CallInstance> {
        self.active.and_then(|id| self.open.get(&id))
    }

    /// Waiting calls, front of the queue first.
    pub fn queue(&self) -> impl Iterator<Item = &CallInstance> {
        self.queue.iter().filter_map(|id| self.open.get(id))
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.queue.len() >= self.capacity
    }

    /// Every open call in id order.
    pub fn open(&self) -> impl Iterator<Item = &CallInstance> {
        self.open.values()
    }

    /// A call that is still open (queued, held or active).
    pub fn get(&self, id: CallId) -> Option<&CallInstance> {
        self.open.get(&id)
    }

    /// Closed calls in closing order.
    pub fn closed(&self) -> &[CallInstance] {
        &self.closed
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    // ---- Intents ----

    /// Put a new call for `template` at the back of the queue.
    /// Returns `None` without side effects when the queue is full.
    pub fn spawn(
        &mut self,
        template: Arc<CallTemplate>,
        events: &mut Vec<SimEvent>,
    ) -> Option<CallId> {
        if self.is_full() {
            debug!(template = %template.id, "queue full, call dropped");
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;

        let call = CallInstance::new(id, template, self.timeout_mult);
        events.push(SimEvent::CallQueued {
            call_id: id,
            template_id: call.template.id.clone(),
            severity: call.severity,
        });
        debug!(call_id = id, template = %call.template.id, "call queued");
        self.open.insert(id, call);
        self.queue.push_back(id);
        Some(id)
    }

    pub fn answer(&mut self, call_id: CallId, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        if let Some(active) = self.active {
            return Err(Rejection::LineBusy(active));
        }
        let pos = self
            .queue
            .iter()
            .position(|id| *id == call_id)
            .ok_or(Rejection::CallNotFound(call_id))?;
        let call = self
            .open
            .get_mut(&call_id)
            .ok_or(Rejection::CallNotFound(call_id))?;

        if call.status == CallStatus::Queued {
            if !self.greeting.is_empty() {
                call.say(Speaker::Operator, self.greeting.clone());
            }
            let opening = call.template.opening.clone();
            call.say(Speaker::Caller, opening);
        }
        call.status = CallStatus::Active;
        self.queue.remove(pos);
        self.active = Some(call_id);

        events.push(SimEvent::CallAnswered { call_id });
        info!(call_id, template = %call.template.id, "call answered");
        Ok(())
    }

    /// Return the active call to the front of the queue.
    pub fn hold(&mut self, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        let timeout_mult = self.timeout_mult;
        let call = self.active_mut()?;
        call.call_ttl_secs = (call.call_ttl_secs - HOLD_PENALTY_SECS).max(HOLD_MIN_TTL_SECS);
        call.queue_ttl_secs = queue_ttl(call.severity, timeout_mult);
        call.status = CallStatus::Held;
        call.say(Speaker::Operator, "Please hold.");

        let call_id = call.id;
        let call_ttl_secs = call.call_ttl_secs;
        self.queue.push_front(call_id);
        self.active = None;

        events.push(SimEvent::CallHeld {
            call_id,
            call_ttl_secs,
        });
        debug!(call_id, call_ttl_secs, "call held");
        Ok(())
    }

    /// Transfer the active call to `agency`. A wrong agency costs talk time.
    /// Returns whether the routing was correct.
    pub fn route_service(
        &mut self,
        agency: Agency,
        events: &mut Vec<SimEvent>,
    ) -> Result<bool, Rejection> {
        let call = self.active_mut()?;
        if !call.routing_needed() {
            return Err(Rejection::RoutingNotNeeded);
        }

        let correct = agency == call.template.agency;
        call.routed = Some(agency);
        call.say(Speaker::Operator, format!("Transferring you to {agency:?}."));
        if correct {
            call.say(Speaker::System, "Call routed to the right service.");
        } else {
            let floor = HOLD_MIN_TTL_SECS.min(call.call_ttl_secs);
            call.call_ttl_secs = (call.call_ttl_secs - ROUTING_PENALTY_SECS).max(floor);
            call.say(Speaker::System, "Wrong service. Time lost in the transfer.");
        }

        events.push(SimEvent::ServiceRouted {
            call_id: call.id,
            agency,
            correct,
        });
        debug!(call_id = call.id, ?agency, correct, "call routed");
        Ok(correct)
    }

    pub fn ask_question(
        &mut self,
        question_id: &str,
        events: &mut Vec<SimEvent>,
    ) -> Result<(), Rejection> {
        let call = self.active_mut()?;
        if call.routing_needed() {
            return Err(Rejection::RoutingRequired);
        }
        let template = Arc::clone(&call.template);
        let question = template
            .protocol
            .question(question_id)
            .ok_or_else(|| Rejection::UnknownQuestion(question_id.to_string()))?;
        if call.asked.contains(question_id) {
            return Err(Rejection::QuestionAlreadyAsked(question_id.to_string()));
        }

        call.asked.insert(question.id.clone());
        call.call_ttl_secs = (call.call_ttl_secs - template.question_cost_secs).max(0.0);
        call.prank_confidence = (call.prank_confidence + question.effect.prank_confidence)
            .clamp(0, PRANK_CONFIDENCE_MAX);
        call.say(Speaker::Operator, question.prompt.clone());
        call.say(Speaker::Caller, question.answer.clone());

        let mut escalation = Vec::new();
        if let Some(to) = question.effect.severity {
            call.raise_severity(to, &mut escalation);
        }
        events.push(SimEvent::QuestionAsked {
            call_id: call.id,
            question_id: question.id.clone(),
            severity: call.severity,
            dispatch_unlocked: call.dispatch_unlocked(),
        });
        events.extend(escalation);
        debug!(call_id = call.id, question = %question.id, "question asked");
        Ok(())
    }

    /// Authorize dispatch on the active call. `create` builds the incident
    /// the first time; later requests return the existing incident.
    pub fn request_dispatch<F>(
        &mut self,
        events: &mut Vec<SimEvent>,
        create: F,
    ) -> Result<IncidentId, Rejection>
    where
        F: FnOnce(&CallInstance, &mut Vec<SimEvent>) -> IncidentId,
    {
        let call = self.active_mut()?;
        if call.routing_needed() {
            return Err(Rejection::RoutingRequired);
        }
        if !call.dispatch_unlocked() {
            return Err(Rejection::DispatchLocked {
                missing: call.unasked_mandatory().len(),
            });
        }
        if let Some(existing) = call.incident {
            call.waiting_for_dispatch = true;
            return Ok(existing);
        }

        let incident = create(&*call, events);
        call.incident = Some(incident);
        call.waiting_for_dispatch = true;
        call.say(
            Speaker::System,
            format!("Incident #{incident} created. Waiting for a unit."),
        );
        info!(call_id = call.id, incident, "dispatch requested");
        Ok(incident)
    }

    /// Close the active call without an incident.
    pub fn dismiss(&mut self, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        let call = self.active_mut()?;
        if let Some(incident) = call.incident {
            return Err(Rejection::IncidentAlreadyCreated {
                call: call.id,
                incident,
            });
        }
        let id = call.id;
        self.close(id, CloseReason::Dismissed, events);
        Ok(())
    }

    /// Hang up on the active call once its incident exists.
    pub fn end_call(&mut self, events: &mut Vec<SimEvent>) -> Result<(), Rejection> {
        let call = self.active_mut()?;
        if call.incident.is_none() {
            return Err(Rejection::NoIncident);
        }
        let id = call.id;
        self.close(id, CloseReason::HandedOff, events);
        Ok(())
    }

    /// Give pre-arrival instructions. Returns whether the option was correct.
    pub fn give_instruction(
        &mut self,
        option: usize,
        events: &mut Vec<SimEvent>,
    ) -> Result<bool, Rejection> {
        let call = self.active_mut()?;
        let template = Arc::clone(&call.template);
        let set = template
            .instructions
            .as_ref()
            .ok_or(Rejection::NoInstructions)?;
        if call.instruction.is_some() {
            return Err(Rejection::InstructionsAlreadyGiven);
        }
        if call.asked.is_empty() {
            return Err(Rejection::InstructionsTooEarly);
        }
        let choice = set
            .options
            .get(option)
            .ok_or(Rejection::UnknownInstruction(option))?;

        call.instruction = Some(choice.correct);
        call.say(Speaker::Operator, choice.label.clone());
        events.push(SimEvent::InstructionGiven {
            call_id: call.id,
            correct: choice.correct,
        });
        Ok(choice.correct)
    }

    // ---- Engine hooks ----

    /// Terminal transition. No-op for calls that are not open.
    pub fn close(&mut self, call_id: CallId, reason: CloseReason, events: &mut Vec<SimEvent>) {
        let Some(mut call) = self.open.remove(&call_id) else {
            return;
        };
        self.queue.retain(|id| *id != call_id);
        if self.active == Some(call_id) {
            self.active = None;
        }

        call.status = CallStatus::Closed;
        call.close_reason = Some(reason);
        call.waiting_for_dispatch = false;
        events.push(SimEvent::CallClosed {
            call_id,
            reason,
            severity: call.severity,
            prank: call.is_prank(),
        });
        info!(call_id, ?reason, severity = ?call.severity, "call closed");
        self.closed.push(call);
    }

    /// The incident linked to `call_id` resolved; close the call if still open.
    pub fn incident_resolved(&mut self, call_id: CallId, events: &mut Vec<SimEvent>) {
        if self.open.contains_key(&call_id) {
            self.close(call_id, CloseReason::IncidentResolved, events);
        }
    }

    /// Close every open call, e.g. when the shift ends.
    pub fn close_all(&mut self, reason: CloseReason, events: &mut Vec<SimEvent>) {
        let ids: Vec<CallId> = self.open.keys().copied().collect();
        for id in ids {
            self.close(id, reason, events);
        }
    }

    /// Advance every open call's clocks by `dt`.
    ///
    /// Waiting calls lose queue time and expire at zero unless they already
    /// have an incident. The active call loses talk time until dispatch is
    /// requested; at zero it is marked overdue once and stays open.
    pub fn tick(&mut self, dt: f64, events: &mut Vec<SimEvent>) {
        let mut expired = Vec::new();

        for call in self.open.values_mut() {
            call.elapsed_secs += dt;
            call.fire_due_updates(events);

            match call.status {
                CallStatus::Queued | CallStatus::Held => {
                    if call.incident.is_some() {
                        continue;
                    }
                    call.queue_ttl_secs = (call.queue_ttl_secs - dt).max(0.0);
                    if call.queue_ttl_secs <= TIME_EPSILON {
                        expired.push(call.id);
                    }
                }
                CallStatus::Active => {
                    if call.waiting_for_dispatch || call.overdue {
                        continue;
                    }
                    call.call_ttl_secs = (call.call_ttl_secs - dt).max(0.0);
                    if call.call_ttl_secs <= TIME_EPSILON {
                        call.overdue = true;
                        call.say(Speaker::System, "Call time exceeded.");
                        events.push(SimEvent::CallOverdue {
                            call_id: call.id,
                            severity: call.severity,
                        });
                        debug!(call_id = call.id, "call overdue");
                    }
                }
                CallStatus::Closed => {}
            }
        }

        for id in expired {
            self.close(id, CloseReason::Expired, events);
        }
    }

    fn active_mut(&mut self) -> Result<&mut CallInstance, Rejection> {
        let id = self.active.ok_or(Rejection::NoActiveCall)?;
        self.open.get_mut(&id).ok_or(Rejection::NoActiveCall)
    }
}
