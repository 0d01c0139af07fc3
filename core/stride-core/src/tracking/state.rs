//! Tracking state as one tagged variant.
//!
//! An open session exists only inside `Manual` or `Auto`, so "tracking
//! without a mode" and "two sessions at once" cannot be represented.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::native::{EventChannel, EventSource};
use crate::types::{TrackingMode, TrackingProgress};

use super::subscriptions::Subscriptions;

/// Last native sample and when it arrived; elapsed time is extrapolated from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub sample: TrackingProgress,
    pub at: DateTime<Local>,
}

impl Anchor {
    /// Elapsed seconds at `now`, never earlier than the sample itself.
    pub fn elapsed_at(&self, now: DateTime<Local>) -> f64 {
        let drift = (now - self.at).num_milliseconds().max(0) as f64 / 1000.0;
        self.sample.elapsed_seconds + drift
    }
}

/// One open tracking session.
pub struct Session {
    progress: TrackingProgress,
    anchor: Anchor,
    started_at: DateTime<Local>,
    scope: Subscriptions,
}

impl Session {
    /// Opens a session seeded with `initial` and subscribes to progress events
    /// for its lifetime. A failed subscription is logged; the session still
    /// opens and interpolates from the anchor.
    pub fn open(
        initial: TrackingProgress,
        now: DateTime<Local>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        let mut scope = Subscriptions::new(events);
        if let Err(err) = scope.acquire(EventChannel::Progress) {
            tracing::warn!(error = %err, "Failed to subscribe to progress events");
        }
        Self {
            progress: initial,
            anchor: Anchor {
                sample: initial,
                at: now,
            },
            started_at: now,
            scope,
        }
    }

    pub fn progress(&self) -> TrackingProgress {
        self.progress
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn listens_for(&self, channel: EventChannel) -> bool {
        self.scope.is_subscribed(channel)
    }

    /// Replaces distance and re-anchors elapsed time on a native sample.
    pub fn apply_sample(&mut self, sample: TrackingProgress, now: DateTime<Local>) {
        self.progress = sample;
        self.anchor = Anchor { sample, at: now };
    }

    /// Advances displayed elapsed time from the anchor.
    pub fn interpolate(&mut self, now: DateTime<Local>) {
        self.progress.elapsed_seconds = self.anchor.elapsed_at(now);
    }

    /// Releases the session's subscriptions and returns the last real native
    /// sample. Interpolated elapsed time is display only and never committed.
    pub fn close(mut self) -> TrackingProgress {
        self.scope.release();
        self.anchor.sample
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("progress", &self.progress)
            .field("anchor", &self.anchor)
            .field("started_at", &self.started_at)
            .field("subscribed", &!self.scope.is_empty())
            .finish()
    }
}

#[derive(Debug, Default)]
pub enum TrackingState {
    #[default]
    Idle,
    /// A start is in flight (permissions being requested). Holds the mode it
    /// will open; other starts see this and back off.
    Starting(TrackingMode),
    Manual(Session),
    Auto(Session),
}

impl TrackingState {
    pub fn mode(&self) -> TrackingMode {
        match self {
            TrackingState::Idle | TrackingState::Starting(_) => TrackingMode::Idle,
            TrackingState::Manual(_) => TrackingMode::Manual,
            TrackingState::Auto(_) => TrackingMode::Auto,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            TrackingState::Manual(session) | TrackingState::Auto(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match self {
            TrackingState::Manual(session) | TrackingState::Auto(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session().is_some()
    }

    pub fn is_starting(&self) -> bool {
        matches!(self, TrackingState::Starting(_))
    }

    /// Moves the session out, leaving `Idle`.
    pub fn take_session(&mut self) -> Option<Session> {
        match std::mem::take(self) {
            TrackingState::Manual(session) | TrackingState::Auto(session) => Some(session),
            other => {
                *self = other;
                None
            }
        }
    }
}
