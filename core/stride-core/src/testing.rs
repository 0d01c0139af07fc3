//! In-process fakes of the native collaborators for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::native::{
    AppBlocker, Collaborators, EventChannel, EventSource, MotionRecognizer, NativeError,
    NativeTracker, PermissionGate, TotalsCache,
};
use crate::types::{TrackingGoal, TrackingProgress, UnsavedSession};

#[derive(Default)]
struct TrackerState {
    running: bool,
    progress: TrackingProgress,
    unsaved: Option<UnsavedSession>,
    started_goals: Vec<TrackingGoal>,
    stop_calls: usize,
    idle_service_running: bool,
}

#[derive(Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
    fail_idle_service: AtomicBool,
}

impl FakeTracker {
    pub fn set_progress(&self, progress: TrackingProgress) {
        self.state.lock().unwrap().progress = progress;
    }

    pub fn set_running(&self, running: bool) {
        self.state.lock().unwrap().running = running;
    }

    pub fn set_unsaved(&self, session: Option<UnsavedSession>) {
        self.state.lock().unwrap().unsaved = session;
    }

    pub fn unsaved(&self) -> Option<UnsavedSession> {
        self.state.lock().unwrap().unsaved.clone()
    }

    pub fn started_goals(&self) -> Vec<TrackingGoal> {
        self.state.lock().unwrap().started_goals.clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().unwrap().stop_calls
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    pub fn idle_service_running(&self) -> bool {
        self.state.lock().unwrap().idle_service_running
    }

    pub fn fail_idle_service(&self, fail: bool) {
        self.fail_idle_service.store(fail, Ordering::SeqCst);
    }
}

impl NativeTracker for FakeTracker {
    fn start_tracking(&self, goal: TrackingGoal) -> Result<(), NativeError> {
        let mut state = self.state.lock().unwrap();
        state.running = true;
        state.started_goals.push(goal);
        Ok(())
    }

    fn stop_tracking(&self) -> Result<(), NativeError> {
        let mut state = self.state.lock().unwrap();
        state.running = false;
        state.stop_calls += 1;
        Ok(())
    }

    fn get_progress(&self) -> Result<TrackingProgress, NativeError> {
        Ok(self.state.lock().unwrap().progress)
    }

    fn get_unsaved_session(&self) -> Result<Option<UnsavedSession>, NativeError> {
        Ok(self.state.lock().unwrap().unsaved.clone())
    }

    fn clear_unsaved_session(&self) -> Result<(), NativeError> {
        self.state.lock().unwrap().unsaved = None;
        Ok(())
    }

    fn start_idle_service(&self) -> Result<(), NativeError> {
        if self.fail_idle_service.load(Ordering::SeqCst) {
            return Err(NativeError::failed("idle service unavailable"));
        }
        self.state.lock().unwrap().idle_service_running = true;
        Ok(())
    }

    fn stop_idle_service(&self) -> Result<(), NativeError> {
        if self.fail_idle_service.load(Ordering::SeqCst) {
            return Err(NativeError::failed("idle service unavailable"));
        }
        self.state.lock().unwrap().idle_service_running = false;
        Ok(())
    }
}

#[derive(Default)]
struct CacheState {
    date: Option<String>,
    totals: TrackingProgress,
    writes: Vec<(String, TrackingProgress)>,
}

#[derive(Default)]
pub struct FakeCache {
    state: Mutex<CacheState>,
}

impl FakeCache {
    pub fn set(&self, date: Option<&str>, totals: TrackingProgress) {
        let mut state = self.state.lock().unwrap();
        state.date = date.map(str::to_string);
        state.totals = totals;
    }

    pub fn writes(&self) -> Vec<(String, TrackingProgress)> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn totals(&self) -> TrackingProgress {
        self.state.lock().unwrap().totals
    }
}

impl TotalsCache for FakeCache {
    fn today_date(&self) -> Option<String> {
        self.state.lock().unwrap().date.clone()
    }

    fn today_distance_meters(&self) -> f64 {
        self.state.lock().unwrap().totals.distance_meters
    }

    fn today_elapsed_seconds(&self) -> f64 {
        self.state.lock().unwrap().totals.elapsed_seconds
    }

    fn today_goals_reached(&self) -> bool {
        self.state.lock().unwrap().totals.goal_reached
    }

    fn write_totals(&self, date: String, totals: TrackingProgress) -> Result<(), NativeError> {
        let mut state = self.state.lock().unwrap();
        state.date = Some(date.clone());
        state.totals = totals;
        state.writes.push((date, totals));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeEvents {
    next_handle: AtomicU64,
    active: Mutex<HashMap<u64, EventChannel>>,
    subscribes: Mutex<Vec<EventChannel>>,
    unsubscribes: AtomicUsize,
    fail: AtomicBool,
}

impl FakeEvents {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self, channel: EventChannel) -> usize {
        self.subscribes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == channel)
            .count()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn is_active(&self, channel: EventChannel) -> bool {
        self.active.lock().unwrap().values().any(|c| *c == channel)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }
}

impl EventSource for FakeEvents {
    fn subscribe(&self, channel: EventChannel) -> Result<u64, NativeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NativeError::failed("event emitter unavailable"));
        }
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.active.lock().unwrap().insert(handle, channel);
        self.subscribes.lock().unwrap().push(channel);
        Ok(handle)
    }

    fn unsubscribe(&self, handle: u64) -> Result<(), NativeError> {
        self.active.lock().unwrap().remove(&handle);
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMotion {
    running: AtomicBool,
    starts: AtomicUsize,
    fail: AtomicBool,
}

impl FakeMotion {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl MotionRecognizer for FakeMotion {
    fn start(&self) -> Result<(), NativeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NativeError::failed("activity recognition unavailable"));
        }
        self.running.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), NativeError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NativeError::failed("activity recognition unavailable"));
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockerCall {
    Update {
        apps: Vec<String>,
        goals_reached: bool,
        has_permanent_plan: bool,
    },
    Start,
    Stop,
}

pub struct FakeBlocker {
    calls: Mutex<Vec<BlockerCall>>,
    overlay: AtomicBool,
}

impl Default for FakeBlocker {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            overlay: AtomicBool::new(true),
        }
    }
}

impl FakeBlocker {
    pub fn calls(&self) -> Vec<BlockerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_overlay_permission(&self, granted: bool) {
        self.overlay.store(granted, Ordering::SeqCst);
    }
}

impl AppBlocker for FakeBlocker {
    fn update_blocker_config(
        &self,
        blocked_package_ids: Vec<String>,
        goals_reached: bool,
        has_permanent_plan: bool,
    ) -> Result<(), NativeError> {
        self.calls.lock().unwrap().push(BlockerCall::Update {
            apps: blocked_package_ids,
            goals_reached,
            has_permanent_plan,
        });
        Ok(())
    }

    fn start_blocker(&self) -> Result<(), NativeError> {
        self.calls.lock().unwrap().push(BlockerCall::Start);
        Ok(())
    }

    fn stop_blocker(&self) -> Result<(), NativeError> {
        self.calls.lock().unwrap().push(BlockerCall::Stop);
        Ok(())
    }

    fn has_overlay_permission(&self) -> bool {
        self.overlay.load(Ordering::SeqCst)
    }

    fn has_usage_access_permission(&self) -> bool {
        true
    }
}

pub struct FakePermissions {
    granted: AtomicBool,
    grant_on_request: AtomicBool,
    requests: AtomicUsize,
}

impl Default for FakePermissions {
    fn default() -> Self {
        Self {
            granted: AtomicBool::new(true),
            grant_on_request: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }
}

impl FakePermissions {
    pub fn deny(&self) {
        self.granted.store(false, Ordering::SeqCst);
        self.grant_on_request.store(false, Ordering::SeqCst);
    }

    pub fn grant_on_request(&self) {
        self.granted.store(false, Ordering::SeqCst);
        self.grant_on_request.store(true, Ordering::SeqCst);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl PermissionGate for FakePermissions {
    fn request_all(&self) -> bool {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let granted = self.grant_on_request.load(Ordering::SeqCst);
        self.granted.store(granted, Ordering::SeqCst);
        granted
    }

    fn check_all(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

/// One of each fake, keeping typed handles for assertions.
#[derive(Clone, Default)]
pub struct Fakes {
    pub tracker: Arc<FakeTracker>,
    pub motion: Arc<FakeMotion>,
    pub blocker: Arc<FakeBlocker>,
    pub permissions: Arc<FakePermissions>,
    pub cache: Arc<FakeCache>,
    pub events: Arc<FakeEvents>,
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            tracker: self.tracker.clone(),
            motion: self.motion.clone(),
            blocker: self.blocker.clone(),
            permissions: self.permissions.clone(),
            cache: self.cache.clone(),
            events: self.events.clone(),
        }
    }
}
