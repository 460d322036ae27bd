//! Simulation constants and tuning parameters.
//!
//! Per-severity tables are indexed by `Severity::index()`:
//! `[prank, low, medium, high]`.

/// Nominal host tick rate (Hz).
pub const TICK_RATE: u32 = 10;

/// Seconds per tick at the nominal rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Tolerance for countdowns reaching zero under repeated `dt` subtraction.
pub const TIME_EPSILON: f64 = 1e-9;

// --- Shift ---

/// Default shift length in seconds (6 minutes).
pub const SHIFT_DURATION_SECS: f64 = 360.0;

/// Calls seeded into the queue when a shift starts.
pub const INITIAL_QUEUE_SEED: usize = 2;

/// Maximum number of open calls waiting in the queue (queued + held).
pub const QUEUE_CAPACITY: usize = 5;

// --- Call timing ---

/// How long a call may ring in the queue before it is lost.
/// Higher severity callers tolerate less waiting.
pub const QUEUE_TTL_SECS: [f64; 4] = [40.0, 36.0, 28.0, 20.0];

/// Talk time available once a call is answered.
/// Higher severity calls get more time to work the protocol.
pub const CALL_TTL_SECS: [f64; 4] = [25.0, 35.0, 48.0, 60.0];

/// Call-time cost of putting a call on hold.
pub const HOLD_PENALTY_SECS: f64 = 6.0;

/// A held call never drops below this much remaining call time.
pub const HOLD_MIN_TTL_SECS: f64 = 1.0;

/// Call-time cost of routing a call to the wrong agency. Bounded below by
/// `HOLD_MIN_TTL_SECS` like a hold.
pub const ROUTING_PENALTY_SECS: f64 = 8.0;

/// Default call-time cost per question when the template does not set one.
pub const DEFAULT_QUESTION_COST_SECS: f64 = 3.0;

/// Upper bound of the prank-confidence counter.
pub const PRANK_CONFIDENCE_MAX: i32 = 5;

/// Prank confidence at or above which the call is flagged as suspected.
pub const PRANK_SUSPECT_THRESHOLD: i32 = 3;

// --- Spawning ---

/// Fixed probability that a spawned call is drawn from the prank pool.
pub const PRANK_SPAWN_CHANCE: f64 = 0.12;

/// Base severity weights for non-prank templates at shift start `[low, medium, high]`.
pub const SEVERITY_WEIGHTS_START: [f64; 3] = [0.45, 0.35, 0.20];

/// Weight shift applied at shift end (scaled linearly by shift progress).
pub const SEVERITY_WEIGHTS_DRIFT: [f64; 3] = [-0.20, 0.05, 0.25];

/// Minimum weight any non-prank severity can fall to.
pub const SEVERITY_WEIGHT_FLOOR: f64 = 0.10;

// --- Incidents ---

/// On-scene time before an incident resolves.
pub const RESOLVE_SECS: [f64; 4] = [5.0, 10.0, 14.0, 20.0];

/// Time from creation before an unresolved incident counts as overdue.
pub const INCIDENT_BUDGET_SECS: [f64; 4] = [60.0, 90.0, 75.0, 60.0];

/// Maximum jitter (cells, per axis) applied around a hotspot.
pub const HOTSPOT_JITTER: i32 = 1;

// --- Career ---

/// Warnings that end the shift early.
pub const WARNING_LIMIT: u32 = 3;

/// Experience needed for each rank tier above Trainee.
pub const RANK_XP_THRESHOLDS: [u32; 3] = [100, 300, 700];

// --- Score ---

/// Score never drops below this value.
pub const SCORE_FLOOR: i64 = -9999;

/// Lines of transcript kept per call.
pub const MAX_TRANSCRIPT_LINES: usize = 64;
