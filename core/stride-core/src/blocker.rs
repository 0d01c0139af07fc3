//! Blocker sync: which apps the native overlay should block right now.
//!
//! Deciding is pure ([`decide_blocker_action`]); pushing the decision to the
//! native blocker is a separate step ([`apply_blocker_decision`]) whose
//! failures go back to the caller.
//!
//! A plan keeps its apps blocked until its own goal is met. Permanent plans
//! are never met, so their apps stay blocked all day.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use crate::error::{Result, StrideError};
use crate::goals::plan_goal_met;
use crate::native::AppBlocker;
use crate::plans::{blocking_plans_for_today, BlockingPlan};
use crate::types::TrackingProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockerDecision {
    /// No plan blocks anything right now.
    Stop,
    /// Every blocking plan's goal is met; nothing to block.
    ClearBlockList,
    /// Block the union of the unmet plans' apps.
    Enforce {
        blocked_apps: Vec<String>,
        has_permanent_plan: bool,
    },
}

pub fn decide_blocker_action(
    plans: &[BlockingPlan],
    combined: &TrackingProgress,
    now: NaiveDateTime,
) -> BlockerDecision {
    let blocking = blocking_plans_for_today(plans, now);
    if blocking.is_empty() {
        return BlockerDecision::Stop;
    }

    let unmet: Vec<&BlockingPlan> = blocking
        .iter()
        .filter(|plan| !plan_goal_met(plan, combined))
        .collect();
    if unmet.is_empty() {
        return BlockerDecision::ClearBlockList;
    }

    let blocked_apps: BTreeSet<&str> = unmet
        .iter()
        .flat_map(|plan| plan.blocked_apps.iter().map(String::as_str))
        .collect();
    BlockerDecision::Enforce {
        blocked_apps: blocked_apps.into_iter().map(str::to_string).collect(),
        has_permanent_plan: unmet.iter().any(|plan| plan.criterion.is_permanent()),
    }
}

/// Pushes a decision to the native blocker.
///
/// The blocker is only started when the overlay and usage-access permissions
/// are both granted; without them the config is still pushed so it is ready
/// once the user grants them.
pub fn apply_blocker_decision(blocker: &dyn AppBlocker, decision: &BlockerDecision) -> Result<()> {
    match decision {
        BlockerDecision::Stop => blocker
            .stop_blocker()
            .map_err(StrideError::native("stop_blocker")),
        BlockerDecision::ClearBlockList => blocker
            .update_blocker_config(Vec::new(), true, false)
            .map_err(StrideError::native("update_blocker_config")),
        BlockerDecision::Enforce {
            blocked_apps,
            has_permanent_plan,
        } => {
            blocker
                .update_blocker_config(blocked_apps.clone(), false, *has_permanent_plan)
                .map_err(StrideError::native("update_blocker_config"))?;

            if !blocker.has_overlay_permission() || !blocker.has_usage_access_permission() {
                tracing::warn!(
                    apps = blocked_apps.len(),
                    "Blocker permissions missing, not starting overlay"
                );
                return Ok(());
            }
            blocker
                .start_blocker()
                .map_err(StrideError::native("start_blocker"))
        }
    }
}
