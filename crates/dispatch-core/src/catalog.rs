//! Content catalog: call templates and the city map/roster.
//!
//! Content is authored as JSON with optional sub-structures. It is parsed
//! into a raw schema, then validated once into the types below so that the
//! simulation never has to re-check whether a field exists.

use std::collections::HashSet;
use std::sync::Arc;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_QUESTION_COST_SECS;
use crate::enums::{Agency, Severity};
use crate::error::CatalogError;
use crate::types::GridSize;

pub const BUILTIN_CALLS: &str = include_str!("../data/calls.json");
pub const BUILTIN_CITY: &str = include_str!("../data/city.json");

/// Effect of hearing a question's answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionEffect {
    /// Severity the answer reveals. Only ever escalates the call.
    pub severity: Option<Severity>,
    /// Change to the prank-confidence counter.
    pub prank_confidence: i32,
}

/// One scripted protocol question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub effect: QuestionEffect,
}

/// Questioning protocol of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Protocol {
    /// No questions: dispatch is authorized from the first second.
    Unscripted,
    /// Ordered questions, some of which gate dispatch.
    Scripted {
        questions: Vec<Question>,
        mandatory: Vec<String>,
    },
}

impl Protocol {
    pub fn questions(&self) -> &[Question] {
        match self {
            Protocol::Unscripted => &[],
            Protocol::Scripted { questions, .. } => questions,
        }
    }

    pub fn mandatory(&self) -> &[String] {
        match self {
            Protocol::Unscripted => &[],
            Protocol::Scripted { mandatory, .. } => mandatory,
        }
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions().iter().find(|q| q.id == id)
    }

    pub fn is_mandatory(&self, id: &str) -> bool {
        self.mandatory().iter().any(|m| m == id)
    }
}

/// Unit roles that answer a call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseRoles {
    /// Correct roles, best first. The first is the incident's required role.
    pub correct: Vec<String>,
    /// Acceptable alternatives.
    pub allowed: Vec<String>,
}

impl ResponseRoles {
    pub fn required(&self) -> Option<&str> {
        self.correct.first().map(String::as_str)
    }

    /// Every listed role other than the required one, without duplicates.
    pub fn nice_to_have(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for role in self.correct.iter().skip(1).chain(self.allowed.iter()) {
            if Some(role.as_str()) != self.required() && !out.contains(role) {
                out.push(role.clone());
            }
        }
        out
    }
}

/// A scripted update that fires while a call is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Seconds since the call started ringing.
    pub at_secs: f64,
    pub text: String,
    #[serde(default)]
    pub escalate_to: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionOption {
    pub label: String,
    #[serde(default)]
    pub correct: bool,
}

/// Pre-arrival instructions the operator may give once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionSet {
    pub prompt: String,
    pub options: Vec<InstructionOption>,
}

/// Validated, immutable call scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallTemplate {
    pub id: String,
    pub title: String,
    pub agency: Agency,
    pub opening: String,
    pub base_severity: Severity,
    /// The caller must be routed to an agency before questioning starts.
    pub routing: bool,
    pub protocol: Protocol,
    pub response: ResponseRoles,
    /// Named map hotspot where the incident happens.
    pub hotspot: String,
    /// Overrides the per-severity talk time.
    pub call_timeout_secs: Option<f64>,
    pub question_cost_secs: f64,
    /// Overrides the per-severity on-scene time.
    pub resolve_secs: Option<f64>,
    /// Sorted by `at_secs`.
    pub events: Vec<TimedEvent>,
    pub instructions: Option<InstructionSet>,
}

impl CallTemplate {
    pub fn is_prank(&self) -> bool {
        self.base_severity.is_prank()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub name: String,
    pub x: i32,
    pub y: i32,
}

impl Hotspot {
    pub fn cell(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

/// Station where an agency's units start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base {
    pub agency: Agency,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    pub id: String,
    pub name: String,
    pub role: String,
    pub agency: Agency,
}

/// Map, bases and roster of one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCatalog {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub greeting: String,
    pub grid: GridSize,
    pub hotspots: Vec<Hotspot>,
    pub bases: Vec<Base>,
    pub units: Vec<UnitDef>,
}

impl CityCatalog {
    pub fn hotspot(&self, name: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.name == name)
    }

    pub fn base_cell(&self, agency: Agency) -> Option<IVec2> {
        self.bases
            .iter()
            .find(|b| b.agency == agency)
            .map(|b| IVec2::new(b.x, b.y))
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let GridSize { w, h } = self.grid;
        if w < 1 || h < 1 {
            return Err(CatalogError::InvalidGrid { w, h });
        }
        if self.hotspots.is_empty() {
            return Err(CatalogError::Empty("hotspot"));
        }
        if self.units.is_empty() {
            return Err(CatalogError::Empty("unit"));
        }

        let mut names = HashSet::new();
        for spot in &self.hotspots {
            if !names.insert(spot.name.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "hotspot",
                    id: spot.name.clone(),
                });
            }
            check_bounds(self.grid, "hotspot", &spot.name, spot.x, spot.y)?;
        }
        for base in &self.bases {
            check_bounds(self.grid, "base", &format!("{:?}", base.agency), base.x, base.y)?;
        }

        let mut ids = HashSet::new();
        for unit in &self.units {
            if !ids.insert(unit.id.as_str()) {
                return Err(CatalogError::Duplicate {
                    kind: "unit",
                    id: unit.id.clone(),
                });
            }
            if self.base_cell(unit.agency).is_none() {
                return Err(CatalogError::MissingBase(unit.agency));
            }
        }
        Ok(())
    }
}

fn check_bounds(
    grid: GridSize,
    what: &'static str,
    name: &str,
    x: i32,
    y: i32,
) -> Result<(), CatalogError> {
    if grid.contains(IVec2::new(x, y)) {
        Ok(())
    } else {
        Err(CatalogError::OutOfBounds {
            what,
            name: name.to_string(),
            x,
            y,
        })
    }
}

// --- Raw authored schema ---

#[derive(Debug, Deserialize)]
struct RawCallFile {
    calls: Vec<RawCallTemplate>,
}

#[derive(Debug, Deserialize)]
struct RawProtocol {
    #[serde(default)]
    routing: bool,
    #[serde(default)]
    mandatory: Vec<String>,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct RawCallTemplate {
    id: String,
    title: String,
    agency: Agency,
    opening: String,
    base_severity: Severity,
    #[serde(default)]
    protocol: Option<RawProtocol>,
    #[serde(default)]
    response: ResponseRoles,
    #[serde(default)]
    hotspot: Option<String>,
    #[serde(default)]
    call_timeout_secs: Option<f64>,
    #[serde(default)]
    question_cost_secs: Option<f64>,
    #[serde(default)]
    resolve_secs: Option<f64>,
    #[serde(default)]
    events: Vec<TimedEvent>,
    #[serde(default)]
    instructions: Option<InstructionSet>,
}

impl RawCallTemplate {
    fn check_numbers(&self) -> Result<(), CatalogError> {
        let invalid = |field, expected, value| CatalogError::InvalidValue {
            template: self.id.clone(),
            field,
            expected,
            value,
        };
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if let Some(v) = self.call_timeout_secs.filter(|v| !positive(*v)) {
            return Err(invalid("call_timeout_secs", "positive", v));
        }
        if let Some(v) = self.resolve_secs.filter(|v| !positive(*v)) {
            return Err(invalid("resolve_secs", "positive", v));
        }
        if let Some(v) = self.question_cost_secs.filter(|v| !non_negative(*v)) {
            return Err(invalid("question_cost_secs", "zero or more", v));
        }
        if let Some(event) = self.events.iter().find(|e| !non_negative(e.at_secs)) {
            return Err(invalid("events.at_secs", "zero or more", event.at_secs));
        }
        Ok(())
    }

    fn validate(self, city: &CityCatalog) -> Result<CallTemplate, CatalogError> {
        self.check_numbers()?;

        let routing = self.protocol.as_ref().is_some_and(|p| p.routing);
        let protocol = match self.protocol {
            None => Protocol::Unscripted,
            Some(raw) if raw.questions.is_empty() && raw.mandatory.is_empty() => {
                Protocol::Unscripted
            }
            Some(raw) => {
                let mut seen = HashSet::new();
                for q in &raw.questions {
                    if !seen.insert(q.id.as_str()) {
                        return Err(CatalogError::Duplicate {
                            kind: "question",
                            id: format!("{}/{}", self.id, q.id),
                        });
                    }
                }
                if let Some(missing) = raw.mandatory.iter().find(|m| !seen.contains(m.as_str())) {
                    return Err(CatalogError::UnknownMandatoryQuestion {
                        template: self.id.clone(),
                        question: missing.clone(),
                    });
                }
                Protocol::Scripted {
                    questions: raw.questions,
                    mandatory: raw.mandatory,
                }
            }
        };

        if !self.base_severity.is_prank() && self.response.correct.is_empty() {
            return Err(CatalogError::MissingRoles(self.id));
        }

        // Hotspots are non-empty once the city validated.
        let hotspot = match self.hotspot {
            Some(name) => {
                if city.hotspot(&name).is_none() {
                    return Err(CatalogError::UnknownHotspot {
                        template: self.id,
                        hotspot: name,
                    });
                }
                name
            }
            None => city.hotspots[0].name.clone(),
        };

        if let Some(set) = &self.instructions {
            if set.options.is_empty() {
                return Err(CatalogError::EmptyInstructions(self.id));
            }
        }

        let mut events = self.events;
        events.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));

        Ok(CallTemplate {
            id: self.id,
            title: self.title,
            agency: self.agency,
            opening: self.opening,
            base_severity: self.base_severity,
            routing,
            protocol,
            response: self.response,
            hotspot,
            call_timeout_secs: self.call_timeout_secs,
            question_cost_secs: self
                .question_cost_secs
                .unwrap_or(DEFAULT_QUESTION_COST_SECS),
            resolve_secs: self.resolve_secs,
            events,
            instructions: self.instructions,
        })
    }
}

/// Validated content: every template plus the city it plays in.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<Arc<CallTemplate>>,
    city: CityCatalog,
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_strs(BUILTIN_CALLS, BUILTIN_CITY)
    }

    pub fn from_json_strs(calls_json: &str, city_json: &str) -> Result<Self, CatalogError> {
        let city: CityCatalog =
            serde_json::from_str(city_json).map_err(|source| CatalogError::Parse {
                what: "city",
                source,
            })?;
        city.validate()?;

        let raw: RawCallFile =
            serde_json::from_str(calls_json).map_err(|source| CatalogError::Parse {
                what: "calls",
                source,
            })?;
        Self::new(raw.calls, city)
    }

    fn new(raw: Vec<RawCallTemplate>, city: CityCatalog) -> Result<Self, CatalogError> {
        if raw.is_empty() {
            return Err(CatalogError::Empty("call"));
        }
        let mut seen = HashSet::new();
        let mut templates = Vec::with_capacity(raw.len());
        for entry in raw {
            if !seen.insert(entry.id.clone()) {
                return Err(CatalogError::Duplicate {
                    kind: "template",
                    id: entry.id,
                });
            }
            templates.push(Arc::new(entry.validate(&city)?));
        }
        Ok(Self { templates, city })
    }

    pub fn templates(&self) -> &[Arc<CallTemplate>] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&Arc<CallTemplate>> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn city(&self) -> &CityCatalog {
        &self.city
    }
}
