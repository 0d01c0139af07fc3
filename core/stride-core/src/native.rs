//! Native collaborator interfaces.
//!
//! Everything the OS does for us (GPS/sensor tracking, activity recognition,
//! the blocking overlay, permission prompts, the mmap-backed totals cache and
//! event delivery) sits behind these foreign traits. The Kotlin/Swift shells
//! implement them; tests implement them in Rust.
//!
//! Implementors should:
//! - Return `NativeError` rather than throwing across the bridge
//! - Keep reads of the totals cache synchronous and cheap
//! - Never call back into the engine from inside one of these methods

use std::sync::Arc;

use crate::types::{TrackingGoal, TrackingProgress, UnsavedSession};

#[derive(Debug, Clone, PartialEq, thiserror::Error, uniffi::Error)]
pub enum NativeError {
    #[error("{message}")]
    Failed { message: String },
    #[error("native bridge unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for NativeError {
    fn from(err: uniffi::UnexpectedUniFFICallbackError) -> Self {
        NativeError::Unavailable { reason: err.reason }
    }
}

impl NativeError {
    pub fn failed(message: impl Into<String>) -> Self {
        NativeError::Failed {
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Foreign Traits
// ═══════════════════════════════════════════════════════════════════════════════

/// GPS/step-counter tracking service.
#[uniffi::export(with_foreign)]
pub trait NativeTracker: Send + Sync {
    fn start_tracking(&self, goal: TrackingGoal) -> Result<(), NativeError>;
    fn stop_tracking(&self) -> Result<(), NativeError>;
    /// Live progress of the running session; zero when nothing runs.
    fn get_progress(&self) -> Result<TrackingProgress, NativeError>;
    /// Session left behind by app versions that predate the fast cache.
    fn get_unsaved_session(&self) -> Result<Option<UnsavedSession>, NativeError>;
    fn clear_unsaved_session(&self) -> Result<(), NativeError>;
    /// Foreground service that keeps the process alive for motion detection.
    fn start_idle_service(&self) -> Result<(), NativeError>;
    fn stop_idle_service(&self) -> Result<(), NativeError>;
}

/// Activity-transition recognition.
#[uniffi::export(with_foreign)]
pub trait MotionRecognizer: Send + Sync {
    fn start(&self) -> Result<(), NativeError>;
    fn stop(&self) -> Result<(), NativeError>;
}

/// OS-level app blocking overlay.
#[uniffi::export(with_foreign)]
pub trait AppBlocker: Send + Sync {
    fn update_blocker_config(
        &self,
        blocked_package_ids: Vec<String>,
        goals_reached: bool,
        has_permanent_plan: bool,
    ) -> Result<(), NativeError>;
    fn start_blocker(&self) -> Result<(), NativeError>;
    fn stop_blocker(&self) -> Result<(), NativeError>;
    fn has_overlay_permission(&self) -> bool;
    fn has_usage_access_permission(&self) -> bool;
}

/// Activity recognition, fine + background location and notifications.
#[uniffi::export(with_foreign)]
pub trait PermissionGate: Send + Sync {
    /// Prompts the user; true when everything ended up granted.
    fn request_all(&self) -> bool;
    fn check_all(&self) -> bool;
}

/// Zero-latency totals cache shared with the native tracking service.
///
/// The native side writes it at arbitrary times, so callers must re-read it
/// on every use instead of holding values across calls. Each getter maps to
/// the cache key of the same name (`today_date`, `today_distance_meters`,
/// `today_elapsed_seconds`, `today_goals_reached`).
#[uniffi::export(with_foreign)]
pub trait TotalsCache: Send + Sync {
    /// `YYYY-MM-DD` the cached totals belong to, if the native side recorded one.
    fn today_date(&self) -> Option<String>;
    fn today_distance_meters(&self) -> f64;
    fn today_elapsed_seconds(&self) -> f64;
    fn today_goals_reached(&self) -> bool;
    fn write_totals(&self, date: String, totals: TrackingProgress) -> Result<(), NativeError>;
}

/// Native event emitter. Events for a channel are delivered to the engine only
/// while a subscription handle for that channel is held.
#[uniffi::export(with_foreign)]
pub trait EventSource: Send + Sync {
    fn subscribe(&self, channel: EventChannel) -> Result<u64, NativeError>;
    fn unsubscribe(&self, handle: u64) -> Result<(), NativeError>;
}

/// All native collaborators, bundled for constructors.
#[derive(Clone)]
pub struct Collaborators {
    pub tracker: Arc<dyn NativeTracker>,
    pub motion: Arc<dyn MotionRecognizer>,
    pub blocker: Arc<dyn AppBlocker>,
    pub permissions: Arc<dyn PermissionGate>,
    pub cache: Arc<dyn TotalsCache>,
    pub events: Arc<dyn EventSource>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Events
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum EventChannel {
    Progress,
    TrackingStarted,
    TrackingStopped,
    GoalReached,
    ActivityDetected,
}

/// Raw activity-transition payload from the recognizer.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct ActivityEvent {
    /// `WALKING`, `RUNNING`, `CYCLING`, `STILL`, ...
    pub activity: String,
    /// 0-100
    pub confidence: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedActivity {
    Walking,
    Running,
    Cycling,
    Still,
    Other,
}

impl DetectedActivity {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "WALKING" | "ON_FOOT" => DetectedActivity::Walking,
            "RUNNING" => DetectedActivity::Running,
            "CYCLING" | "ON_BICYCLE" => DetectedActivity::Cycling,
            "STILL" => DetectedActivity::Still,
            _ => DetectedActivity::Other,
        }
    }

    /// Activities that count toward a goal and may open a session.
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            DetectedActivity::Walking | DetectedActivity::Running | DetectedActivity::Cycling
        )
    }
}

impl ActivityEvent {
    pub fn detected(&self) -> DetectedActivity {
        DetectedActivity::parse(&self.activity)
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum NativeEvent {
    Progress { progress: TrackingProgress },
    TrackingStarted,
    /// The native service stopped on its own (stationary timer, service destroyed).
    TrackingStopped,
    GoalReached,
    ActivityDetected { event: ActivityEvent },
}

impl NativeEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            NativeEvent::Progress { .. } => EventChannel::Progress,
            NativeEvent::TrackingStarted => EventChannel::TrackingStarted,
            NativeEvent::TrackingStopped => EventChannel::TrackingStopped,
            NativeEvent::GoalReached => EventChannel::GoalReached,
            NativeEvent::ActivityDetected { .. } => EventChannel::ActivityDetected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_labels() {
        assert_eq!(DetectedActivity::parse("WALKING"), DetectedActivity::Walking);
        assert_eq!(DetectedActivity::parse("running"), DetectedActivity::Running);
        assert_eq!(DetectedActivity::parse("ON_BICYCLE"), DetectedActivity::Cycling);
        assert_eq!(DetectedActivity::parse("STILL"), DetectedActivity::Still);
        assert_eq!(DetectedActivity::parse("IN_VEHICLE"), DetectedActivity::Other);

        assert!(DetectedActivity::Cycling.is_motion());
        assert!(!DetectedActivity::Still.is_motion());
        assert!(!DetectedActivity::Other.is_motion());
    }

    #[test]
    fn test_event_channels() {
        assert_eq!(
            NativeEvent::Progress {
                progress: TrackingProgress::ZERO
            }
            .channel(),
            EventChannel::Progress
        );
        assert_eq!(
            NativeEvent::ActivityDetected {
                event: ActivityEvent {
                    activity: "STILL".to_string(),
                    confidence: 90
                }
            }
            .channel(),
            EventChannel::ActivityDetected
        );
    }
}
