//! Core types shared across all Stride clients.
//!
//! These types cross the FFI boundary unchanged; the Kotlin and Swift shells
//! render them directly.
//!
//! **FFI Support:** All types are annotated with UniFFI macros.

use serde::{Deserialize, Serialize};

use crate::goals::AggregatedGoals;

// ═══════════════════════════════════════════════════════════════════════════════
// Progress
// ═══════════════════════════════════════════════════════════════════════════════

/// Distance/time accumulated either for the day so far or for one session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, uniffi::Record)]
pub struct TrackingProgress {
    pub distance_meters: f64,
    pub elapsed_seconds: f64,
    pub goal_reached: bool,
}

impl TrackingProgress {
    pub const ZERO: TrackingProgress = TrackingProgress {
        distance_meters: 0.0,
        elapsed_seconds: 0.0,
        goal_reached: false,
    };

    pub fn new(distance_meters: f64, elapsed_seconds: f64) -> Self {
        Self {
            distance_meters,
            elapsed_seconds,
            goal_reached: false,
        }
    }

    /// True when neither distance nor time has accumulated.
    pub fn is_empty(&self) -> bool {
        self.distance_meters <= 0.0 && self.elapsed_seconds <= 0.0
    }

    /// Baseline + session. Distances and times add; the goal flag is the session's.
    pub fn combine(baseline: &TrackingProgress, session: &TrackingProgress) -> TrackingProgress {
        TrackingProgress {
            distance_meters: baseline.distance_meters + session.distance_meters,
            elapsed_seconds: baseline.elapsed_seconds + session.elapsed_seconds,
            goal_reached: session.goal_reached,
        }
    }

    /// Folds a closed session into this baseline.
    pub fn absorb(&mut self, session: &TrackingProgress) {
        self.distance_meters += session.distance_meters;
        self.elapsed_seconds += session.elapsed_seconds;
        self.goal_reached = self.goal_reached || session.goal_reached;
    }
}

/// Whether a session is open and who opened it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Idle,
    Manual,
    Auto,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Persisted Records
// ═══════════════════════════════════════════════════════════════════════════════

/// Activity committed for one calendar day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, uniffi::Record)]
pub struct DailyActivity {
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub goals_reached: bool,
}

/// A session the legacy native store recorded but never handed to the daily log.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct UnsavedSession {
    pub date: String,
    pub distance_meters: f64,
    pub elapsed_seconds: f64,
    pub goals_reached: bool,
}

impl UnsavedSession {
    pub fn progress(&self) -> TrackingProgress {
        TrackingProgress {
            distance_meters: self.distance_meters,
            elapsed_seconds: self.elapsed_seconds,
            goal_reached: self.goals_reached,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Native Tracking Goal
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum GoalKind {
    Distance,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum GoalUnit {
    Meters,
    Seconds,
}

/// Stopping target handed to the native tracking service.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct TrackingGoal {
    pub kind: GoalKind,
    pub value: f64,
    pub unit: GoalUnit,
}

impl TrackingGoal {
    pub fn distance_meters(value: f64) -> Self {
        Self {
            kind: GoalKind::Distance,
            value,
            unit: GoalUnit::Meters,
        }
    }

    pub fn time_seconds(value: f64) -> Self {
        Self {
            kind: GoalKind::Time,
            value,
            unit: GoalUnit::Seconds,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Snapshot
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the UI needs to render tracking state.
///
/// Flat record rather than the internal tagged state for FFI friendliness.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct TrackingSnapshot {
    pub mode: TrackingMode,
    pub is_tracking: bool,
    pub baseline: TrackingProgress,
    pub session: TrackingProgress,
    pub combined: TrackingProgress,
    pub goals: AggregatedGoals,
    pub all_goals_reached: bool,
    /// Why the last manual start was refused, for the debug panel.
    pub start_blocked_reason: Option<String>,
}
