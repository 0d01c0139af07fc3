//! Tracking session state machine and its native subscriptions.

mod controller;
mod state;
mod subscriptions;

pub use controller::{
    ensure_permissions, AutoTrigger, StartOutcome, TrackingController, REASON_AUTO_ACTIVE,
    REASON_MANUAL_ACTIVE, REASON_NO_ACTIVE_PLANS, REASON_PERMISSIONS_DENIED,
    REASON_START_CANCELLED, REASON_START_IN_PROGRESS,
};
pub use state::{Anchor, Session, TrackingState};
pub use subscriptions::Subscriptions;
