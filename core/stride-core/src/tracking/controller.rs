//! Tracking session controller.
//!
//! Owns the tagged [`TrackingState`], today's baseline and the active plans'
//! aggregated goals. Every transition is a method taking an explicit `now`;
//! the engine serializes calls behind one mutex.
//!
//! ## Transitions
//!
//! - `idle → manual`: user request. Needs an active plan today and granted
//!   permissions. Split into [`begin_manual_start`](TrackingController::begin_manual_start)
//!   and [`finish_manual_start`](TrackingController::finish_manual_start) so the
//!   permission prompt can run without the engine lock; in between the state is
//!   `Starting`, which every other start observes and backs off from.
//! - `idle → auto`: motion, a native "tracking started" signal, or a running
//!   native session found at startup. Idempotent and never permission-gated.
//! - `→ idle`: user stop, auto-stop once every goal is met, or the native
//!   service stopping on its own. The session is committed to the daily log,
//!   the fast cache and the baseline.

use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::config::AppConfig;
use crate::error::{Result, StrideError};
use crate::goals::{aggregate_goals, all_goals_reached, remaining_goal, AggregatedGoals};
use crate::native::{
    Collaborators, EventChannel, EventSource, NativeEvent, NativeTracker, PermissionGate,
};
use crate::plans::BlockingPlan;
use crate::totals::TotalsRepository;
use crate::types::{TrackingGoal, TrackingMode, TrackingProgress, TrackingSnapshot};

use super::state::{Session, TrackingState};
use super::subscriptions::Subscriptions;

pub const REASON_PERMISSIONS_DENIED: &str = "permissions denied";
pub const REASON_NO_ACTIVE_PLANS: &str = "no active plans for today";
pub const REASON_START_IN_PROGRESS: &str = "a start is already in progress";
pub const REASON_MANUAL_ACTIVE: &str = "manual tracking already running";
pub const REASON_AUTO_ACTIVE: &str = "auto tracking session already active";
pub const REASON_START_CANCELLED: &str = "start cancelled";

/// Native signals the controller listens to for its whole lifetime.
const LIFECYCLE_CHANNELS: [EventChannel; 3] = [
    EventChannel::TrackingStarted,
    EventChannel::TrackingStopped,
    EventChannel::GoalReached,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(TrackingMode),
    /// A session was already open or starting; nothing changed.
    AlreadyTracking(TrackingMode),
    /// Refused without a state change. The reason is also kept for the snapshot
    /// when the start was manual.
    Rejected(String),
}

/// What caused an `idle → auto` transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTrigger {
    /// Passive motion detection; the native service is not running yet.
    Motion,
    /// The native service reported it started on its own.
    NativeSignal,
    /// A running native session was found at startup.
    Recovery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseReason {
    UserStop,
    GoalsReached,
    NativeStopped,
}

/// Checks permissions and prompts only when something is missing.
pub fn ensure_permissions(gate: &dyn PermissionGate) -> bool {
    gate.check_all() || gate.request_all()
}

fn date_key(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub struct TrackingController {
    state: TrackingState,
    baseline: TrackingProgress,
    /// `YYYY-MM-DD` the baseline belongs to.
    today: String,
    active_plans: Vec<BlockingPlan>,
    goals: AggregatedGoals,
    start_blocked_reason: Option<String>,
    initialized: bool,
    manual_goal_placeholder_meters: f64,
    tracker: Arc<dyn NativeTracker>,
    events: Arc<dyn EventSource>,
    totals: TotalsRepository,
    lifecycle: Subscriptions,
}

impl TrackingController {
    pub fn new(
        collaborators: &Collaborators,
        totals: TotalsRepository,
        config: &AppConfig,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            state: TrackingState::Idle,
            baseline: TrackingProgress::ZERO,
            today: date_key(now),
            active_plans: Vec::new(),
            goals: AggregatedGoals::default(),
            start_blocked_reason: None,
            initialized: false,
            manual_goal_placeholder_meters: config.manual_goal_placeholder_meters,
            tracker: collaborators.tracker.clone(),
            events: collaborators.events.clone(),
            totals,
            lifecycle: Subscriptions::new(collaborators.events.clone()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Startup
    // ─────────────────────────────────────────────────────────────────────

    /// Startup recovery. Runs once per controller; later calls are no-ops.
    ///
    /// 1. Baseline from the fast cache, migrating a legacy unsaved session
    ///    only when the fast cache holds nothing for today.
    /// 2. Lifecycle subscriptions.
    /// 3. A native session that is still running is adopted as `auto`.
    pub fn initialize(&mut self, now: DateTime<Local>) -> Result<()> {
        if self.initialized {
            tracing::debug!("Controller already initialized");
            return Ok(());
        }
        self.initialized = true;
        self.today = date_key(now);

        self.baseline = match self.totals.recover_baseline(&self.today) {
            Ok(recovery) => {
                tracing::info!(
                    today = %self.today,
                    distance_meters = recovery.baseline.distance_meters,
                    elapsed_seconds = recovery.baseline.elapsed_seconds,
                    migrated_from = recovery.migrated.as_ref().map(|s| s.date.as_str()),
                    "Baseline recovered"
                );
                recovery.baseline
            }
            Err(err) => {
                tracing::warn!(error = %err, "Baseline recovery failed, using fast cache only");
                self.totals.fast_totals(&self.today)
            }
        };

        for channel in LIFECYCLE_CHANNELS {
            if let Err(err) = self.lifecycle.acquire(channel) {
                tracing::warn!(?channel, error = %err, "Failed to subscribe to lifecycle events");
            }
        }

        let live = self
            .tracker
            .get_progress()
            .map_err(StrideError::native("get_progress"))?;
        if !live.is_empty() {
            tracing::info!(
                distance_meters = live.distance_meters,
                elapsed_seconds = live.elapsed_seconds,
                "Adopting running native session"
            );
            self.start_auto(AutoTrigger::Recovery, now)?;
        }

        tracing::debug!(
            today = %self.today,
            distance_meters = self.baseline.distance_meters,
            elapsed_seconds = self.baseline.elapsed_seconds,
            "Controller initialized"
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Plans
    // ─────────────────────────────────────────────────────────────────────

    /// Replaces today's active plans and re-evaluates auto-stop.
    /// Returns true when that closed the session.
    pub fn set_active_plans(
        &mut self,
        plans: Vec<BlockingPlan>,
        now: DateTime<Local>,
    ) -> Result<bool> {
        self.goals = aggregate_goals(&plans);
        self.active_plans = plans;
        self.check_auto_stop(now)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Starting
    // ─────────────────────────────────────────────────────────────────────

    /// First half of a manual start: checks the guards and enters `Starting`.
    /// On refusal the reason is recorded and returned; the state is untouched.
    pub fn begin_manual_start(&mut self) -> std::result::Result<(), String> {
        let refusal = match &self.state {
            TrackingState::Idle if self.active_plans.is_empty() => Some(REASON_NO_ACTIVE_PLANS),
            TrackingState::Idle => None,
            TrackingState::Starting(_) => Some(REASON_START_IN_PROGRESS),
            TrackingState::Manual(_) => Some(REASON_MANUAL_ACTIVE),
            TrackingState::Auto(_) => Some(REASON_AUTO_ACTIVE),
        };
        if let Some(reason) = refusal {
            self.record_refusal(reason);
            return Err(reason.to_string());
        }

        self.state = TrackingState::Starting(TrackingMode::Manual);
        tracing::debug!("Manual start pending permissions");
        Ok(())
    }

    /// Second half of a manual start, once permissions are known.
    pub fn finish_manual_start(
        &mut self,
        permissions_granted: bool,
        now: DateTime<Local>,
    ) -> Result<StartOutcome> {
        if !matches!(self.state, TrackingState::Starting(TrackingMode::Manual)) {
            self.record_refusal(REASON_START_CANCELLED);
            return Ok(StartOutcome::Rejected(REASON_START_CANCELLED.to_string()));
        }
        if !permissions_granted {
            self.state = TrackingState::Idle;
            self.record_refusal(REASON_PERMISSIONS_DENIED);
            return Ok(StartOutcome::Rejected(REASON_PERMISSIONS_DENIED.to_string()));
        }

        let goal = TrackingGoal::distance_meters(self.manual_goal_placeholder_meters);
        if let Err(source) = self.tracker.start_tracking(goal) {
            self.state = TrackingState::Idle;
            return Err(StrideError::Native {
                operation: "start_tracking",
                source,
            });
        }

        self.start_blocked_reason = None;
        self.open_session(TrackingMode::Manual, TrackingProgress::ZERO, now);
        Ok(StartOutcome::Started(TrackingMode::Manual))
    }

    /// Both halves of a manual start in one call.
    pub fn start_manual(
        &mut self,
        permissions: &dyn PermissionGate,
        now: DateTime<Local>,
    ) -> Result<StartOutcome> {
        if let Err(reason) = self.begin_manual_start() {
            return Ok(StartOutcome::Rejected(reason));
        }
        let granted = ensure_permissions(permissions);
        self.finish_manual_start(granted, now)
    }

    /// `idle → auto`. A no-op while a session is open or starting.
    pub fn start_auto(
        &mut self,
        trigger: AutoTrigger,
        now: DateTime<Local>,
    ) -> Result<StartOutcome> {
        if let Some(mode) = self.busy_mode() {
            tracing::debug!(?trigger, ?mode, "Auto start ignored, already tracking");
            return Ok(StartOutcome::AlreadyTracking(mode));
        }

        let initial = match trigger {
            AutoTrigger::Motion => {
                if self.active_plans.is_empty() {
                    tracing::debug!("Motion detected but no plans are active today");
                    return Ok(StartOutcome::Rejected(REASON_NO_ACTIVE_PLANS.to_string()));
                }
                let goal = remaining_goal(&self.goals, &self.baseline).unwrap_or_else(|| {
                    TrackingGoal::distance_meters(self.manual_goal_placeholder_meters)
                });
                self.tracker
                    .start_tracking(goal)
                    .map_err(StrideError::native("start_tracking"))?;
                TrackingProgress::ZERO
            }
            AutoTrigger::NativeSignal | AutoTrigger::Recovery => self.live_progress(),
        };

        self.open_session(TrackingMode::Auto, initial, now);
        tracing::debug!(?trigger, "Auto session opened");
        Ok(StartOutcome::Started(TrackingMode::Auto))
    }

    /// Abandons a pending start. The matching `finish_manual_start` reports
    /// the start as cancelled.
    pub fn cancel_start(&mut self) {
        if self.state.is_starting() {
            self.state = TrackingState::Idle;
            tracing::debug!("Pending start cancelled");
        }
    }

    fn busy_mode(&self) -> Option<TrackingMode> {
        match &self.state {
            TrackingState::Idle => None,
            TrackingState::Starting(mode) => Some(*mode),
            TrackingState::Manual(_) => Some(TrackingMode::Manual),
            TrackingState::Auto(_) => Some(TrackingMode::Auto),
        }
    }

    fn record_refusal(&mut self, reason: &str) {
        tracing::debug!(reason, "Start refused");
        self.start_blocked_reason = Some(reason.to_string());
    }

    fn open_session(
        &mut self,
        mode: TrackingMode,
        initial: TrackingProgress,
        now: DateTime<Local>,
    ) {
        let session = Session::open(initial, now, self.events.clone());
        self.state = match mode {
            TrackingMode::Manual => TrackingState::Manual(session),
            _ => TrackingState::Auto(session),
        };
        tracing::info!(
            ?mode,
            baseline_meters = self.baseline.distance_meters,
            baseline_seconds = self.baseline.elapsed_seconds,
            "Tracking session opened"
        );
    }

    // ─────────────────────────────────────────────────────────────────────
    // Progress
    // ─────────────────────────────────────────────────────────────────────

    /// Applies a native progress sample. Returns true when it closed the session.
    pub fn handle_progress(
        &mut self,
        sample: TrackingProgress,
        now: DateTime<Local>,
    ) -> Result<bool> {
        match self.state.session_mut() {
            Some(session) => session.apply_sample(sample, now),
            None => {
                tracing::debug!("Progress sample without an open session");
                return Ok(false);
            }
        }
        self.check_auto_stop(now)
    }

    /// Interpolation tick. While idle, rolls the baseline over at midnight.
    /// Returns true when the tick closed the session.
    pub fn tick(&mut self, now: DateTime<Local>) -> Result<bool> {
        match self.state.session_mut() {
            Some(session) => session.interpolate(now),
            None => {
                self.roll_day(now);
                return Ok(false);
            }
        }
        self.check_auto_stop(now)
    }

    /// Re-reads the baseline when the date changed. Deferred while a session
    /// is open or starting; that session commits to the day it started on.
    pub fn roll_day(&mut self, now: DateTime<Local>) -> bool {
        if self.busy_mode().is_some() {
            return false;
        }
        let date = date_key(now);
        if date == self.today {
            return false;
        }
        tracing::info!(from = %self.today, to = %date, "Day rolled over");
        self.baseline = self.totals.fast_totals(&date);
        self.today = date;
        true
    }

    fn check_auto_stop(&mut self, now: DateTime<Local>) -> Result<bool> {
        if !self.state.is_open() || !all_goals_reached(&self.goals, &self.combined()) {
            return Ok(false);
        }
        tracing::info!("All goals reached, closing session");
        self.close(CloseReason::GoalsReached, now)?;
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stopping
    // ─────────────────────────────────────────────────────────────────────

    /// User stop. Cancels a pending start; returns true when a session closed.
    pub fn stop(&mut self, now: DateTime<Local>) -> Result<bool> {
        if self.state.is_starting() {
            self.cancel_start();
            return Ok(false);
        }
        if !self.state.is_open() {
            tracing::debug!("Stop requested while idle");
            return Ok(false);
        }
        self.close(CloseReason::UserStop, now)?;
        Ok(true)
    }

    /// Close sequence: ground truth, commit, reset, stop native.
    fn close(&mut self, reason: CloseReason, now: DateTime<Local>) -> Result<TrackingProgress> {
        let Some(session) = self.state.take_session() else {
            return Ok(self.baseline);
        };
        let started_at = session.started_at();
        let last_sample = session.close();

        let mut committed = self.ground_truth(last_sample);
        if all_goals_reached(
            &self.goals,
            &TrackingProgress::combine(&self.baseline, &committed),
        ) {
            committed.goal_reached = true;
        }

        self.baseline = match self
            .totals
            .commit_session(&self.today, &self.baseline, &committed)
        {
            Ok(next) => next,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to persist session, keeping it in memory");
                let mut next = self.baseline;
                next.absorb(&committed);
                next
            }
        };

        tracing::info!(
            ?reason,
            distance_meters = committed.distance_meters,
            elapsed_seconds = committed.elapsed_seconds,
            duration_secs = (now - started_at).num_seconds(),
            "Tracking session closed"
        );

        if reason != CloseReason::NativeStopped {
            self.tracker
                .stop_tracking()
                .map_err(StrideError::native("stop_tracking"))?;
        }
        Ok(self.baseline)
    }

    /// Native progress at close time. Falls back to the last real native
    /// sample when the read fails or the service already reset to zero.
    fn ground_truth(&self, last_sample: TrackingProgress) -> TrackingProgress {
        match self.tracker.get_progress() {
            Ok(progress) if !progress.is_empty() => progress,
            Ok(_) => last_sample,
            Err(err) => {
                tracing::warn!(error = %err, "Ground truth read failed, using last sample");
                last_sample
            }
        }
    }

    fn live_progress(&self) -> TrackingProgress {
        self.tracker.get_progress().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to read native progress");
            TrackingProgress::ZERO
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Native Signals
    // ─────────────────────────────────────────────────────────────────────

    /// Routes a native event. Events on channels without a live subscription
    /// are dropped. Activity transitions belong to the motion listener.
    pub fn handle_event(&mut self, event: &NativeEvent, now: DateTime<Local>) -> Result<()> {
        let channel = event.channel();
        let subscribed = match event {
            NativeEvent::Progress { .. } => self
                .state
                .session()
                .is_some_and(|session| session.listens_for(channel)),
            NativeEvent::ActivityDetected { .. } => false,
            _ => self.lifecycle.is_subscribed(channel),
        };
        if !subscribed {
            tracing::debug!(?channel, "Dropping event without subscription");
            return Ok(());
        }

        match event {
            NativeEvent::Progress { progress } => {
                self.handle_progress(*progress, now)?;
            }
            NativeEvent::TrackingStarted => {
                self.handle_tracking_started(now)?;
            }
            NativeEvent::TrackingStopped => {
                self.handle_tracking_stopped(now)?;
            }
            NativeEvent::GoalReached => {
                self.handle_goal_reached(now)?;
            }
            NativeEvent::ActivityDetected { .. } => {}
        }
        Ok(())
    }

    pub fn handle_tracking_started(&mut self, now: DateTime<Local>) -> Result<StartOutcome> {
        self.start_auto(AutoTrigger::NativeSignal, now)
    }

    /// The native service stopped by itself; commit what we last saw.
    pub fn handle_tracking_stopped(&mut self, now: DateTime<Local>) -> Result<bool> {
        if !self.state.is_open() {
            return Ok(false);
        }
        self.close(CloseReason::NativeStopped, now)?;
        Ok(true)
    }

    /// Refreshes session progress from native and re-checks auto-stop.
    pub fn handle_goal_reached(&mut self, now: DateTime<Local>) -> Result<bool> {
        if !self.state.is_open() {
            return Ok(false);
        }
        let sample = self.live_progress();
        if !sample.is_empty() {
            if let Some(session) = self.state.session_mut() {
                session.apply_sample(sample, now);
            }
        }
        self.check_auto_stop(now)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────

    /// Releases every subscription without committing. A session that was open
    /// keeps running natively and is adopted again on the next startup.
    pub fn teardown(&mut self) {
        self.lifecycle.release();
        if let Some(session) = self.state.take_session() {
            session.close();
        }
        self.state = TrackingState::Idle;
        tracing::debug!("Controller torn down");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn mode(&self) -> TrackingMode {
        self.state.mode()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn baseline(&self) -> TrackingProgress {
        self.baseline
    }

    pub fn session_progress(&self) -> TrackingProgress {
        self.state
            .session()
            .map(Session::progress)
            .unwrap_or(TrackingProgress::ZERO)
    }

    pub fn combined(&self) -> TrackingProgress {
        TrackingProgress::combine(&self.baseline, &self.session_progress())
    }

    pub fn goals(&self) -> AggregatedGoals {
        self.goals
    }

    pub fn active_plans(&self) -> &[BlockingPlan] {
        &self.active_plans
    }

    pub fn today(&self) -> &str {
        &self.today
    }

    pub fn start_blocked_reason(&self) -> Option<&str> {
        self.start_blocked_reason.as_deref()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        let session = self.session_progress();
        let combined = TrackingProgress::combine(&self.baseline, &session);
        TrackingSnapshot {
            mode: self.state.mode(),
            is_tracking: self.state.is_open(),
            baseline: self.baseline,
            session,
            combined,
            goals: self.goals,
            all_goals_reached: all_goals_reached(&self.goals, &combined),
            start_blocked_reason: self.start_blocked_reason.clone(),
        }
    }
}
