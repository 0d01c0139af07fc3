//! StrideEngine - the entry point for the mobile shells.
//!
//! Composes storage, config, the tracking controller, the motion listener and
//! blocker sync behind one mutex. It is:
//! - **Synchronous**: the host delivers events and (optionally) lets the
//!   engine run its own ticker thread
//! - **Serialized**: every transition runs under the engine lock, except the
//!   permission prompt of a manual start, which runs with the lock released
//!   while the controller sits in `Starting`
//! - **Stable**: prefer additive API changes to avoid breaking FFI clients
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use stride_core::StrideEngine;
//!
//! let engine = StrideEngine::new(root, tracker, motion, blocker, permissions, cache, events)?;
//! engine.initialize()?;
//! engine.start_timers()?;
//! engine.dispatch_event(event)?;
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Local};

use crate::blocker::{apply_blocker_decision, decide_blocker_action};
use crate::cadence::{IntervalSchedule, Job, Ticker};
use crate::config::{load_app_config, save_app_config, AppConfig};
use crate::error::{Result, StrideFfiError};
use crate::goals::{aggregate_unmet_goals, AggregatedGoals};
use crate::motion::{apply_idle_service, MotionAction, MotionListener};
use crate::native::{
    AppBlocker, Collaborators, EventSource, MotionRecognizer, NativeEvent, NativeTracker,
    PermissionGate, TotalsCache,
};
use crate::plans::{active_plans_for_today, BlockingPlan, PlanDraft, PlanStore};
use crate::storage::StorageConfig;
use crate::totals::{DailyLog, TotalsRepository};
use crate::tracking::{ensure_permissions, AutoTrigger, TrackingController};
use crate::types::{DailyActivity, TrackingSnapshot};

const TICKER_THREAD_NAME: &str = "stride-ticker";

/// State guarded by the engine lock.
struct EngineCore {
    config: AppConfig,
    /// Every stored plan, as of the last reload.
    plans: Vec<BlockingPlan>,
    controller: TrackingController,
    motion: MotionListener,
    schedule: IntervalSchedule,
}

/// Shared between the engine handle and its ticker thread.
struct EngineInner {
    storage: StorageConfig,
    collaborators: Collaborators,
    core: Mutex<EngineCore>,
}

/// The main engine for Stride.
///
/// This is the primary FFI interface for the Kotlin/Swift shells.
#[derive(uniffi::Object)]
pub struct StrideEngine {
    inner: Arc<EngineInner>,
    ticker: Mutex<Option<Ticker>>,
}

impl StrideEngine {
    /// Creates an engine over a custom storage root and collaborators.
    ///
    /// Used by tests and the CLI. Not exposed to FFI - use `new()`.
    pub fn with_storage(
        storage: StorageConfig,
        collaborators: Collaborators,
    ) -> std::result::Result<Self, StrideFfiError> {
        storage.ensure_dirs().map_err(|err| {
            StrideFfiError::from(format!(
                "Failed to create storage directory {}: {}",
                storage.root().display(),
                err
            ))
        })?;

        let config = load_app_config(&storage);
        let totals = TotalsRepository::new(
            collaborators.cache.clone(),
            collaborators.tracker.clone(),
            DailyLog::new(&storage.daily_log_file()),
        );
        let controller = TrackingController::new(&collaborators, totals, &config, Local::now());
        let motion = MotionListener::new(
            collaborators.motion.clone(),
            collaborators.events.clone(),
            config.min_motion_confidence,
        );
        let schedule = IntervalSchedule::new(&config);

        Ok(Self {
            inner: Arc::new(EngineInner {
                storage,
                collaborators,
                core: Mutex::new(EngineCore {
                    config,
                    plans: Vec::new(),
                    controller,
                    motion,
                    schedule,
                }),
            }),
            ticker: Mutex::new(None),
        })
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.inner.storage
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Clock-explicit variants (tests, CLI)
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn initialize_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        self.inner.initialize_at(now)
    }

    /// Manual start. The permission prompt runs without the engine lock.
    pub fn start_manual_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        {
            let mut core = self.inner.lock();
            if core.controller.begin_manual_start().is_err() {
                return Ok(core.controller.snapshot());
            }
        }

        let granted = ensure_permissions(self.inner.collaborators.permissions.as_ref());

        let mut core = self.inner.lock();
        let was_open = core.controller.is_open();
        let result = core.controller.finish_manual_start(granted, now);
        self.inner.after_transition(&mut core, was_open, now);
        result?;
        Ok(core.controller.snapshot())
    }

    pub fn stop_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        let mut core = self.inner.lock();
        let was_open = core.controller.is_open();
        let result = core.controller.stop(now);
        self.inner.after_transition(&mut core, was_open, now);
        result?;
        Ok(core.controller.snapshot())
    }

    pub fn dispatch_event_at(
        &self,
        event: &NativeEvent,
        now: DateTime<Local>,
    ) -> Result<TrackingSnapshot> {
        self.inner.dispatch_event_at(event, now)
    }

    pub fn tick_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        self.inner.tick_at(now)
    }

    pub fn reload_plans_at(&self, now: DateTime<Local>) {
        let mut core = self.inner.lock();
        if self.inner.reload_plans(&mut core, now) {
            self.inner.sync_blocker(&core, now);
        }
    }

    pub fn sync_blocker_at(&self, now: DateTime<Local>) {
        let core = self.inner.lock();
        self.inner.sync_blocker(&core, now);
    }

    pub fn create_plan_at(&self, draft: PlanDraft, now: DateTime<Local>) -> Result<BlockingPlan> {
        self.inner.mutate_plans(now, |store| store.create(draft))
    }

    pub fn update_plan_at(
        &self,
        id: &str,
        draft: PlanDraft,
        now: DateTime<Local>,
    ) -> Result<BlockingPlan> {
        self.inner.mutate_plans(now, |store| store.update(id, draft))
    }

    pub fn duplicate_plan_at(&self, id: &str, now: DateTime<Local>) -> Result<BlockingPlan> {
        self.inner.mutate_plans(now, |store| store.duplicate(id))
    }

    pub fn set_plan_active_at(
        &self,
        id: &str,
        active: bool,
        now: DateTime<Local>,
    ) -> Result<BlockingPlan> {
        self.inner
            .mutate_plans(now, |store| store.set_active(id, active))
    }

    pub fn delete_plan_at(&self, id: &str, now: DateTime<Local>) -> Result<()> {
        self.inner.mutate_plans(now, |store| store.delete(id))
    }

    pub fn is_motion_listening(&self) -> bool {
        self.inner.lock().motion.is_listening()
    }

    pub fn timers_running(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .is_some_and(Ticker::is_running)
    }

    pub fn is_job_armed(&self, job: Job) -> bool {
        self.inner.lock().schedule.is_armed(job)
    }

    fn lock_ticker(&self) -> MutexGuard<'_, Option<Ticker>> {
        self.ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[uniffi::export]
impl StrideEngine {
    /// Creates an engine rooted at `storage_root` (empty for the default data
    /// directory) with the host's native collaborators.
    #[uniffi::constructor]
    pub fn new(
        storage_root: String,
        tracker: Arc<dyn NativeTracker>,
        motion: Arc<dyn MotionRecognizer>,
        blocker: Arc<dyn AppBlocker>,
        permissions: Arc<dyn PermissionGate>,
        cache: Arc<dyn TotalsCache>,
        events: Arc<dyn EventSource>,
    ) -> std::result::Result<Self, StrideFfiError> {
        let storage = if storage_root.is_empty() {
            StorageConfig::default()
        } else {
            StorageConfig::with_root(storage_root)
        };
        Self::with_storage(
            storage,
            Collaborators {
                tracker,
                motion,
                blocker,
                permissions,
                cache,
                events,
            },
        )
    }

    /// Returns the data directory as a string.
    pub fn storage_dir(&self) -> String {
        self.inner.storage.root().to_string_lossy().to_string()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tracking API
    // ─────────────────────────────────────────────────────────────────────────────

    /// Startup recovery, plan load and the first blocker sync. Idempotent.
    pub fn initialize(&self) -> std::result::Result<TrackingSnapshot, StrideFfiError> {
        Ok(self.initialize_at(Local::now())?)
    }

    /// Starts a manual session. A refused start is not an error; the reason
    /// shows up in the snapshot's `start_blocked_reason`.
    pub fn start_manual(&self) -> std::result::Result<TrackingSnapshot, StrideFfiError> {
        Ok(self.start_manual_at(Local::now())?)
    }

    pub fn stop(&self) -> std::result::Result<TrackingSnapshot, StrideFfiError> {
        Ok(self.stop_at(Local::now())?)
    }

    /// Delivers a native event. Events on unsubscribed channels are dropped.
    pub fn dispatch_event(
        &self,
        event: NativeEvent,
    ) -> std::result::Result<TrackingSnapshot, StrideFfiError> {
        Ok(self.dispatch_event_at(&event, Local::now())?)
    }

    /// Runs whatever periodic jobs are due. For hosts that drive timers themselves.
    pub fn tick(&self) -> std::result::Result<TrackingSnapshot, StrideFfiError> {
        Ok(self.tick_at(Local::now())?)
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        self.inner.lock().controller.snapshot()
    }

    /// Persists the preference and toggles the idle service and motion
    /// listener. Native failures are logged, never returned.
    pub fn set_background_tracking(
        &self,
        enabled: bool,
    ) -> std::result::Result<(), StrideFfiError> {
        Ok(self.inner.set_background_tracking(enabled)?)
    }

    pub fn config(&self) -> AppConfig {
        self.inner.lock().config.clone()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Timers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Arms the periodic jobs and spawns the ticker thread. Idempotent.
    pub fn start_timers(&self) -> std::result::Result<(), StrideFfiError> {
        let mut ticker = self.lock_ticker();
        if ticker.is_some() {
            return Ok(());
        }

        let period = {
            let mut core = self.inner.lock();
            let now = Local::now();
            core.schedule.start(now);
            let open = core.controller.is_open();
            core.schedule.set_session_open(open, now);
            base_tick(&core.config)
        };

        let inner = Arc::clone(&self.inner);
        let spawned = Ticker::spawn(TICKER_THREAD_NAME, period, move || {
            if let Err(err) = inner.tick_at(Local::now()) {
                tracing::warn!(error = %err, "Periodic tick failed");
            }
        })
        .map_err(|err| StrideFfiError::from(format!("Failed to spawn ticker: {}", err)))?;

        *ticker = Some(spawned);
        tracing::debug!(period_ms = period.as_millis() as u64, "Timers started");
        Ok(())
    }

    /// Stops timers and releases every native subscription. Native tracking
    /// and motion recognition keep running for the headless task.
    pub fn shutdown(&self) {
        if let Some(mut ticker) = self.lock_ticker().take() {
            ticker.stop();
        }
        let mut core = self.inner.lock();
        core.schedule.stop();
        core.controller.teardown();
        core.motion.detach();
        tracing::info!("Engine shut down");
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Plans API
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn list_plans(&self) -> Vec<BlockingPlan> {
        PlanStore::load(&self.inner.storage.plans_file()).into_plans()
    }

    pub fn get_plan(&self, id: String) -> Option<BlockingPlan> {
        PlanStore::load(&self.inner.storage.plans_file())
            .get(&id)
            .cloned()
    }

    /// Plans whose goal counts toward today's aggregated goals.
    pub fn active_plans(&self) -> Vec<BlockingPlan> {
        self.inner.lock().controller.active_plans().to_vec()
    }

    pub fn create_plan(
        &self,
        draft: PlanDraft,
    ) -> std::result::Result<BlockingPlan, StrideFfiError> {
        Ok(self.create_plan_at(draft, Local::now())?)
    }

    pub fn update_plan(
        &self,
        id: String,
        draft: PlanDraft,
    ) -> std::result::Result<BlockingPlan, StrideFfiError> {
        Ok(self.update_plan_at(&id, draft, Local::now())?)
    }

    pub fn duplicate_plan(&self, id: String) -> std::result::Result<BlockingPlan, StrideFfiError> {
        Ok(self.duplicate_plan_at(&id, Local::now())?)
    }

    pub fn set_plan_active(
        &self,
        id: String,
        active: bool,
    ) -> std::result::Result<BlockingPlan, StrideFfiError> {
        Ok(self.set_plan_active_at(&id, active, Local::now())?)
    }

    pub fn delete_plan(&self, id: String) -> std::result::Result<(), StrideFfiError> {
        Ok(self.delete_plan_at(&id, Local::now())?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Progress API
    // ─────────────────────────────────────────────────────────────────────────────

    /// What is still missing across today's active plans.
    pub fn unmet_goals(&self) -> AggregatedGoals {
        let core = self.inner.lock();
        aggregate_unmet_goals(core.controller.active_plans(), &core.controller.combined())
    }

    /// Most recent `limit` days with activity, newest first.
    pub fn daily_history(&self, limit: u32) -> Vec<DailyActivity> {
        DailyLog::new(&self.inner.storage.daily_log_file()).recent(limit as usize)
    }
}

impl EngineInner {
    fn lock(&self) -> MutexGuard<'_, EngineCore> {
        self.core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn initialize_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        let mut core = self.lock();
        core.controller.initialize(now)?;
        // Always syncs: the blocker may hold yesterday's config.
        self.reload_plans(&mut core, now);
        self.sync_blocker(&core, now);
        Ok(core.controller.snapshot())
    }

    fn dispatch_event_at(
        &self,
        event: &NativeEvent,
        now: DateTime<Local>,
    ) -> Result<TrackingSnapshot> {
        let mut core = self.lock();
        let was_open = core.controller.is_open();
        let result = match event {
            NativeEvent::ActivityDetected { event: activity } => {
                match core.motion.on_activity(activity) {
                    MotionAction::StartAuto => core
                        .controller
                        .start_auto(AutoTrigger::Motion, now)
                        .map(|_| ()),
                    MotionAction::Ignore => Ok(()),
                }
            }
            other => core.controller.handle_event(other, now),
        };
        self.after_transition(&mut core, was_open, now);
        result?;
        Ok(core.controller.snapshot())
    }

    fn tick_at(&self, now: DateTime<Local>) -> Result<TrackingSnapshot> {
        let mut core = self.lock();
        let was_open = core.controller.is_open();
        let mut result = Ok(());

        for job in core.schedule.due(now) {
            match job {
                Job::PlanReload => {
                    core.controller.roll_day(now);
                    if self.reload_plans(&mut core, now) {
                        self.sync_blocker(&core, now);
                    }
                }
                Job::Interpolate => {
                    if let Err(err) = core.controller.tick(now) {
                        result = Err(err);
                    }
                }
                Job::BlockerSync => self.sync_blocker(&core, now),
            }
        }

        self.after_transition(&mut core, was_open, now);
        result?;
        Ok(core.controller.snapshot())
    }

    fn set_background_tracking(&self, enabled: bool) -> Result<()> {
        let mut core = self.lock();
        core.config.background_tracking_enabled = enabled;
        save_app_config(&self.storage, &core.config)?;

        apply_idle_service(self.collaborators.tracker.as_ref(), enabled);
        let has_active = !core.controller.active_plans().is_empty();
        core.motion.update(enabled, has_active);
        tracing::info!(enabled, "Background tracking toggled");
        Ok(())
    }

    fn mutate_plans<T>(
        &self,
        now: DateTime<Local>,
        mutate: impl FnOnce(&mut PlanStore) -> Result<T>,
    ) -> Result<T> {
        let mut core = self.lock();
        let mut store = PlanStore::load(&self.storage.plans_file());
        let value = mutate(&mut store)?;
        if self.reload_plans(&mut core, now) {
            self.sync_blocker(&core, now);
        }
        Ok(value)
    }

    /// Re-reads plans from disk and pushes today's active set to the
    /// controller and motion listener. Returns true when the blocker needs an
    /// immediate sync: the plan set changed or the reload closed the session.
    fn reload_plans(&self, core: &mut EngineCore, now: DateTime<Local>) -> bool {
        let plans = PlanStore::load(&self.storage.plans_file()).into_plans();
        let active = active_plans_for_today(&plans, now.naive_local());
        let changed = core.plans != plans;
        let has_active = !active.is_empty();
        core.plans = plans;

        let was_open = core.controller.is_open();
        if let Err(err) = core.controller.set_active_plans(active, now) {
            tracing::warn!(error = %err, "Auto-stop after plan reload failed");
        }
        let background = core.config.background_tracking_enabled;
        core.motion.update(background, has_active);

        let closed = was_open && !core.controller.is_open();
        core.schedule.set_session_open(core.controller.is_open(), now);
        if changed {
            tracing::debug!(plans = core.plans.len(), "Plan set changed");
        }
        changed || closed
    }

    fn sync_blocker(&self, core: &EngineCore, now: DateTime<Local>) {
        let decision =
            decide_blocker_action(&core.plans, &core.controller.combined(), now.naive_local());
        tracing::debug!(?decision, "Blocker sync");
        if let Err(err) = apply_blocker_decision(self.collaborators.blocker.as_ref(), &decision) {
            tracing::warn!(error = %err, "Blocker sync failed");
        }
    }

    /// Keeps the interpolation timer in step with the session and syncs the
    /// blocker as soon as a session closes.
    fn after_transition(&self, core: &mut EngineCore, was_open: bool, now: DateTime<Local>) {
        let open = core.controller.is_open();
        core.schedule.set_session_open(open, now);
        if was_open && !open {
            self.sync_blocker(core, now);
        }
    }
}

/// The ticker fires at the shortest configured period; the schedule decides
/// which jobs are due on each firing.
fn base_tick(config: &AppConfig) -> StdDuration {
    let secs = config
        .interpolation_interval_secs
        .min(config.blocker_sync_interval_secs)
        .min(config.plan_reload_interval_secs)
        .max(1);
    StdDuration::from_secs(secs)
}
