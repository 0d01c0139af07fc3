//! Blocking plans: model, persistence, validation and the "applies today"
//! predicates.
//!
//! The tracking controller and blocker sync only ever read plan snapshots;
//! [`PlanStore`] is the single writer.

mod selection;
mod store;
mod types;
mod validation;

pub use selection::{
    active_plans_for_today, blocking_plans_for_today, parse_minutes_of_day, plan_applies_now,
    within_duration,
};
pub use store::{PlanStore, PLAN_STORE_VERSION};
pub use types::{
    BlockingPlan, Criterion, DistanceUnit, PlanDraft, PlanDuration, Weekday, METERS_PER_KILOMETER,
    METERS_PER_MILE, SECONDS_PER_MINUTE,
};
pub use validation::{is_valid_app_id, validate_plan};
