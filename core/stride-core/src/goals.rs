//! Goal aggregation across plans.
//!
//! All functions here are pure. Distance is normalized to meters and time to
//! seconds; permanent plans contribute nothing because activity never
//! releases them.

use serde::{Deserialize, Serialize};

use crate::plans::BlockingPlan;
use crate::types::{TrackingGoal, TrackingProgress};

/// Combined targets for the plans active right now.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, uniffi::Record)]
pub struct AggregatedGoals {
    pub distance_meters: f64,
    pub time_seconds: f64,
    pub has_distance_goal: bool,
    pub has_time_goal: bool,
}

impl AggregatedGoals {
    pub fn has_any_goal(&self) -> bool {
        self.has_distance_goal || self.has_time_goal
    }
}

/// Sums every plan's distance and time targets.
pub fn aggregate_goals(plans: &[BlockingPlan]) -> AggregatedGoals {
    plans
        .iter()
        .fold(AggregatedGoals::default(), |mut goals, plan| {
            if let Some(meters) = plan.criterion.target_meters() {
                goals.distance_meters += meters;
                goals.has_distance_goal = true;
            }
            if let Some(seconds) = plan.criterion.target_seconds() {
                goals.time_seconds += seconds;
                goals.has_time_goal = true;
            }
            goals
        })
}

/// Sums what is still missing per plan given today's combined progress.
///
/// Each plan is measured on its own against the combined total; a plan whose
/// target is already covered contributes zero.
pub fn aggregate_unmet_goals(
    plans: &[BlockingPlan],
    combined: &TrackingProgress,
) -> AggregatedGoals {
    plans
        .iter()
        .fold(AggregatedGoals::default(), |mut goals, plan| {
            if let Some(meters) = plan.criterion.target_meters() {
                let remaining = (meters - combined.distance_meters).max(0.0);
                if remaining > 0.0 {
                    goals.distance_meters += remaining;
                    goals.has_distance_goal = true;
                }
            }
            if let Some(seconds) = plan.criterion.target_seconds() {
                let remaining = (seconds - combined.elapsed_seconds).max(0.0);
                if remaining > 0.0 {
                    goals.time_seconds += remaining;
                    goals.has_time_goal = true;
                }
            }
            goals
        })
}

/// True when every goal type present is satisfied. With no goals at all there
/// is nothing to reach, so this is false.
pub fn all_goals_reached(goals: &AggregatedGoals, combined: &TrackingProgress) -> bool {
    if !goals.has_any_goal() {
        return false;
    }
    let distance_ok =
        !goals.has_distance_goal || combined.distance_meters >= goals.distance_meters;
    let time_ok = !goals.has_time_goal || combined.elapsed_seconds >= goals.time_seconds;
    distance_ok && time_ok
}

/// True when this single plan's own target is covered. Permanent plans never are.
pub fn plan_goal_met(plan: &BlockingPlan, combined: &TrackingProgress) -> bool {
    if let Some(meters) = plan.criterion.target_meters() {
        return combined.distance_meters >= meters;
    }
    if let Some(seconds) = plan.criterion.target_seconds() {
        return combined.elapsed_seconds >= seconds;
    }
    false
}

/// Stopping target for the native service given what is already recorded:
/// the remaining distance when any is left, otherwise the remaining time.
/// `None` once every goal is covered.
pub fn remaining_goal(
    goals: &AggregatedGoals,
    recorded: &TrackingProgress,
) -> Option<TrackingGoal> {
    if goals.has_distance_goal {
        let remaining = goals.distance_meters - recorded.distance_meters;
        if remaining > 0.0 {
            return Some(TrackingGoal::distance_meters(remaining));
        }
    }
    if goals.has_time_goal {
        let remaining = goals.time_seconds - recorded.elapsed_seconds;
        if remaining > 0.0 {
            return Some(TrackingGoal::time_seconds(remaining));
        }
    }
    None
}
