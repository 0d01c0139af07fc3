//! Passive motion listener.
//!
//! Listens for activity transitions while background tracking is enabled and
//! at least one plan is active today. Walking, running or cycling asks the
//! controller for an auto session; anything else is ignored.

use std::sync::Arc;

use crate::native::{ActivityEvent, EventChannel, EventSource, MotionRecognizer, NativeTracker};
use crate::tracking::Subscriptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    StartAuto,
    Ignore,
}

pub struct MotionListener {
    recognizer: Arc<dyn MotionRecognizer>,
    scope: Subscriptions,
    listening: bool,
    min_confidence: u8,
}

impl MotionListener {
    pub fn new(
        recognizer: Arc<dyn MotionRecognizer>,
        events: Arc<dyn EventSource>,
        min_confidence: u8,
    ) -> Self {
        Self {
            recognizer,
            scope: Subscriptions::new(events),
            listening: false,
            min_confidence,
        }
    }

    pub fn should_listen(background_enabled: bool, has_active_plans: bool) -> bool {
        background_enabled && has_active_plans
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn set_min_confidence(&mut self, min_confidence: u8) {
        self.min_confidence = min_confidence;
    }

    /// Starts or stops listening to match the current preconditions.
    pub fn update(&mut self, background_enabled: bool, has_active_plans: bool) {
        if Self::should_listen(background_enabled, has_active_plans) {
            self.start();
        } else {
            self.stop();
        }
    }

    fn start(&mut self) {
        if self.listening {
            return;
        }
        // Stays not-listening so the next update retries the subscription.
        if let Err(err) = self.scope.acquire(EventChannel::ActivityDetected) {
            tracing::warn!(error = %err, "Failed to subscribe to activity transitions");
            return;
        }
        if let Err(err) = self.recognizer.start() {
            tracing::warn!(error = %err, "Failed to start motion recognition");
        }
        self.listening = true;
        tracing::debug!("Motion listener started");
    }

    /// Stops recognition and releases the subscription. Errors are swallowed.
    pub fn stop(&mut self) {
        if !self.listening {
            return;
        }
        self.scope.release();
        if let Err(err) = self.recognizer.stop() {
            tracing::warn!(error = %err, "Failed to stop motion recognition");
        }
        self.listening = false;
        tracing::debug!("Motion listener stopped");
    }

    /// Releases the subscription but leaves native recognition running, so
    /// the headless task keeps receiving transitions after the UI goes away.
    pub fn detach(&mut self) {
        self.scope.release();
        self.listening = false;
    }

    pub fn on_activity(&self, event: &ActivityEvent) -> MotionAction {
        if !self.listening || !self.scope.is_subscribed(EventChannel::ActivityDetected) {
            return MotionAction::Ignore;
        }
        let activity = event.detected();
        if !activity.is_motion() {
            tracing::debug!(activity = %event.activity, "Ignoring non-motion activity");
            return MotionAction::Ignore;
        }
        if event.confidence < self.min_confidence {
            tracing::debug!(
                activity = %event.activity,
                confidence = event.confidence,
                min = self.min_confidence,
                "Ignoring low-confidence activity"
            );
            return MotionAction::Ignore;
        }
        MotionAction::StartAuto
    }
}

/// Applies the background-tracking preference to the native idle service.
/// Failures are logged and swallowed so the toggle never gets stuck.
pub fn apply_idle_service(tracker: &dyn NativeTracker, enabled: bool) {
    let result = if enabled {
        tracker.start_idle_service()
    } else {
        tracker.stop_idle_service()
    };
    if let Err(err) = result {
        tracing::warn!(enabled, error = %err, "Idle service toggle failed");
    }
}
