//! # stride-core
//!
//! Core library for Stride, providing the activity-goal tracking and
//! app-blocking reconciliation logic shared by the Android and iOS shells.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Native hosts drive timers and
//!   deliver events by calling into the engine.
//! - **Native collaborators are traits**: GPS/sensor tracking, motion
//!   recognition, the app-blocking overlay, permissions and the fast totals
//!   cache are implemented by the host through UniFFI foreign traits.
//! - **Graceful degradation**: Missing or corrupt files return empty/default
//!   values, not errors.
//! - **FFI-ready**: UniFFI annotations enable Kotlin and Swift bindings.
//!   Prefer additive public API changes; removing or renaming breaks FFI clients.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stride_core::StrideEngine;
//!
//! let engine = StrideEngine::new(root, tracker, motion, blocker, permissions, cache, events)?;
//! engine.initialize()?;
//! let snapshot = engine.start_manual()?;
//! ```

// UniFFI scaffolding for Kotlin/Swift bindings
uniffi::setup_scaffolding!();

pub mod blocker;
pub mod cadence;
pub mod config;
pub mod engine;
pub mod error;
pub mod goals;
pub mod headless;
pub mod motion;
pub mod native;
pub mod plans;
pub mod storage;
pub mod totals;
pub mod tracking;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use blocker::{apply_blocker_decision, decide_blocker_action, BlockerDecision};
pub use config::{load_app_config, save_app_config, AppConfig};
pub use engine::StrideEngine;
pub use error::{Result, StrideError, StrideFfiError};
pub use goals::{
    aggregate_goals, aggregate_unmet_goals, all_goals_reached, remaining_goal, AggregatedGoals,
};
pub use headless::{run_headless_recovery, run_headless_recovery_at, HeadlessOutcome};
pub use motion::{MotionAction, MotionListener};
pub use native::{
    ActivityEvent, AppBlocker, Collaborators, EventChannel, EventSource, MotionRecognizer,
    NativeError, NativeEvent, NativeTracker, PermissionGate, TotalsCache,
};
pub use plans::{
    active_plans_for_today, blocking_plans_for_today, BlockingPlan, Criterion, DistanceUnit,
    PlanDraft, PlanDuration, PlanStore, Weekday,
};
pub use storage::StorageConfig;
pub use totals::{DailyLog, TotalsRepository};
pub use tracking::{AutoTrigger, StartOutcome, TrackingController, TrackingState};
pub use types::*;
