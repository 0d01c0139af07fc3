//! Headless recovery: starts native tracking from an activity transition
//! while no UI is running.
//!
//! The host invokes this from its background task with a fresh process, so
//! everything is read from disk and the native collaborators. Each skip is a
//! normal outcome, logged for diagnosis.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::config::load_app_config;
use crate::error::{Result, StrideError, StrideFfiError};
use crate::goals::{aggregate_goals, remaining_goal};
use crate::native::{ActivityEvent, NativeTracker, PermissionGate, TotalsCache};
use crate::plans::{active_plans_for_today, PlanStore};
use crate::storage::StorageConfig;
use crate::totals::{DailyLog, TotalsRepository};
use crate::types::TrackingGoal;

#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum HeadlessOutcome {
    Started { goal: TrackingGoal },
    IgnoredActivity,
    BackgroundTrackingDisabled,
    MissingPermissions,
    NoActivePlans,
    NoGoalConfigured,
    GoalAlreadyMet,
    AlreadyTracking,
}

pub fn run_headless_recovery_at(
    storage: &StorageConfig,
    event: &ActivityEvent,
    tracker: Arc<dyn NativeTracker>,
    permissions: &dyn PermissionGate,
    cache: Arc<dyn TotalsCache>,
    now: DateTime<Local>,
) -> Result<HeadlessOutcome> {
    if !event.detected().is_motion() {
        tracing::debug!(activity = %event.activity, "Headless: not a motion activity");
        return Ok(HeadlessOutcome::IgnoredActivity);
    }

    let config = load_app_config(storage);
    if !config.background_tracking_enabled {
        tracing::info!("Headless: background tracking disabled");
        return Ok(HeadlessOutcome::BackgroundTrackingDisabled);
    }
    if event.confidence < config.min_motion_confidence {
        tracing::debug!(
            confidence = event.confidence,
            min = config.min_motion_confidence,
            "Headless: confidence below threshold"
        );
        return Ok(HeadlessOutcome::IgnoredActivity);
    }

    if !permissions.check_all() {
        tracing::info!("Headless: permissions missing");
        return Ok(HeadlessOutcome::MissingPermissions);
    }

    let plans = PlanStore::load(&storage.plans_file()).into_plans();
    let active = active_plans_for_today(&plans, now.naive_local());
    if active.is_empty() {
        tracing::info!(total_plans = plans.len(), "Headless: no active plans today");
        return Ok(HeadlessOutcome::NoActivePlans);
    }

    let goals = aggregate_goals(&active);
    if !goals.has_any_goal() {
        tracing::info!(active_plans = active.len(), "Headless: no goal configured");
        return Ok(HeadlessOutcome::NoGoalConfigured);
    }

    let today = now.format("%Y-%m-%d").to_string();
    let totals = TotalsRepository::new(
        cache,
        tracker.clone(),
        DailyLog::new(&storage.daily_log_file()),
    );
    let recorded = totals.recorded_today(&today);

    let live = tracker
        .get_progress()
        .map_err(StrideError::native("get_progress"))?;
    if !live.is_empty() {
        tracing::info!("Headless: native tracking already running");
        return Ok(HeadlessOutcome::AlreadyTracking);
    }

    let Some(goal) = remaining_goal(&goals, &recorded) else {
        tracing::info!(
            distance_meters = recorded.distance_meters,
            elapsed_seconds = recorded.elapsed_seconds,
            "Headless: goals already met today"
        );
        return Ok(HeadlessOutcome::GoalAlreadyMet);
    };

    tracker
        .start_tracking(goal.clone())
        .map_err(StrideError::native("start_tracking"))?;
    tracing::info!(?goal, activity = %event.activity, "Headless: tracking started");
    Ok(HeadlessOutcome::Started { goal })
}

/// FFI entry point for the host's background task. An empty `storage_root`
/// uses the default data directory.
#[uniffi::export]
pub fn run_headless_recovery(
    storage_root: String,
    event: ActivityEvent,
    tracker: Arc<dyn NativeTracker>,
    permissions: Arc<dyn PermissionGate>,
    cache: Arc<dyn TotalsCache>,
) -> std::result::Result<HeadlessOutcome, StrideFfiError> {
    let storage = if storage_root.is_empty() {
        StorageConfig::default()
    } else {
        StorageConfig::with_root(storage_root)
    };
    Ok(run_headless_recovery_at(
        &storage,
        &event,
        tracker,
        permissions.as_ref(),
        cache,
        Local::now(),
    )?)
}
