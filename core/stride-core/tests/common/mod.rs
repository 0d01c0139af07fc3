//! A single in-process stand-in for every native collaborator.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone};
use stride_core::{
    AppBlocker, Collaborators, Criterion, DistanceUnit, EventChannel, EventSource,
    MotionRecognizer, NativeError, NativeTracker, PermissionGate, PlanDraft, PlanDuration,
    TotalsCache, TrackingGoal, TrackingProgress, UnsavedSession, Weekday,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BlockerEvent {
    Config {
        apps: Vec<String>,
        goals_reached: bool,
        has_permanent_plan: bool,
    },
    Started,
    Stopped,
}

#[derive(Default)]
struct HostState {
    tracking: bool,
    progress: TrackingProgress,
    unsaved: Option<UnsavedSession>,
    goals_started: Vec<TrackingGoal>,
    idle_service: bool,
    motion_running: bool,
    blocker: Vec<BlockerEvent>,
    cache_date: Option<String>,
    cache_totals: TrackingProgress,
    handles: HashMap<u64, EventChannel>,
    next_handle: u64,
    permissions_denied: bool,
    permission_prompts: usize,
}

/// Behaves like the phone: state survives across engine instances.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<T>(&self, f: impl FnOnce(&mut HostState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set_native_progress(&self, progress: TrackingProgress) {
        self.with(|s| s.progress = progress);
    }

    pub fn set_unsaved(&self, session: UnsavedSession) {
        self.with(|s| s.unsaved = Some(session));
    }

    pub fn set_cache(&self, date: &str, totals: TrackingProgress) {
        self.with(|s| {
            s.cache_date = Some(date.to_string());
            s.cache_totals = totals;
        });
    }

    pub fn cache_totals(&self) -> TrackingProgress {
        self.with(|s| s.cache_totals)
    }

    pub fn deny_permissions(&self) {
        self.with(|s| s.permissions_denied = true);
    }

    pub fn permission_prompts(&self) -> usize {
        self.with(|s| s.permission_prompts)
    }

    pub fn is_tracking(&self) -> bool {
        self.with(|s| s.tracking)
    }

    pub fn goals_started(&self) -> Vec<TrackingGoal> {
        self.with(|s| s.goals_started.clone())
    }

    pub fn blocker_events(&self) -> Vec<BlockerEvent> {
        self.with(|s| s.blocker.clone())
    }

    pub fn last_blocker_config(&self) -> Option<BlockerEvent> {
        self.with(|s| {
            s.blocker
                .iter()
                .rev()
                .find(|event| matches!(event, BlockerEvent::Config { .. }))
                .cloned()
        })
    }

    pub fn subscribed(&self, channel: EventChannel) -> bool {
        self.with(|s| s.handles.values().any(|held| *held == channel))
    }

    pub fn subscription_count(&self) -> usize {
        self.with(|s| s.handles.len())
    }

    pub fn idle_service_running(&self) -> bool {
        self.with(|s| s.idle_service)
    }

    pub fn motion_running(&self) -> bool {
        self.with(|s| s.motion_running)
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            tracker: self.clone(),
            motion: self.clone(),
            blocker: self.clone(),
            permissions: self.clone(),
            cache: self.clone(),
            events: self.clone(),
        }
    }
}

impl NativeTracker for FakeHost {
    fn start_tracking(&self, goal: TrackingGoal) -> Result<(), NativeError> {
        self.with(|s| {
            s.tracking = true;
            s.goals_started.push(goal);
        });
        Ok(())
    }

    fn stop_tracking(&self) -> Result<(), NativeError> {
        self.with(|s| {
            s.tracking = false;
            s.progress = TrackingProgress::ZERO;
        });
        Ok(())
    }

    fn get_progress(&self) -> Result<TrackingProgress, NativeError> {
        Ok(self.with(|s| s.progress))
    }

    fn get_unsaved_session(&self) -> Result<Option<UnsavedSession>, NativeError> {
        Ok(self.with(|s| s.unsaved.clone()))
    }

    fn clear_unsaved_session(&self) -> Result<(), NativeError> {
        self.with(|s| s.unsaved = None);
        Ok(())
    }

    fn start_idle_service(&self) -> Result<(), NativeError> {
        self.with(|s| s.idle_service = true);
        Ok(())
    }

    fn stop_idle_service(&self) -> Result<(), NativeError> {
        self.with(|s| s.idle_service = false);
        Ok(())
    }
}

impl MotionRecognizer for FakeHost {
    fn start(&self) -> Result<(), NativeError> {
        self.with(|s| s.motion_running = true);
        Ok(())
    }

    fn stop(&self) -> Result<(), NativeError> {
        self.with(|s| s.motion_running = false);
        Ok(())
    }
}

impl AppBlocker for FakeHost {
    fn update_blocker_config(
        &self,
        blocked_package_ids: Vec<String>,
        goals_reached: bool,
        has_permanent_plan: bool,
    ) -> Result<(), NativeError> {
        self.with(|s| {
            s.blocker.push(BlockerEvent::Config {
                apps: blocked_package_ids,
                goals_reached,
                has_permanent_plan,
            })
        });
        Ok(())
    }

    fn start_blocker(&self) -> Result<(), NativeError> {
        self.with(|s| s.blocker.push(BlockerEvent::Started));
        Ok(())
    }

    fn stop_blocker(&self) -> Result<(), NativeError> {
        self.with(|s| s.blocker.push(BlockerEvent::Stopped));
        Ok(())
    }

    fn has_overlay_permission(&self) -> bool {
        true
    }

    fn has_usage_access_permission(&self) -> bool {
        true
    }
}

impl PermissionGate for FakeHost {
    fn request_all(&self) -> bool {
        self.with(|s| {
            s.permission_prompts += 1;
            !s.permissions_denied
        })
    }

    fn check_all(&self) -> bool {
        self.with(|s| !s.permissions_denied)
    }
}

impl TotalsCache for FakeHost {
    fn today_date(&self) -> Option<String> {
        self.with(|s| s.cache_date.clone())
    }

    fn today_distance_meters(&self) -> f64 {
        self.with(|s| s.cache_totals.distance_meters)
    }

    fn today_elapsed_seconds(&self) -> f64 {
        self.with(|s| s.cache_totals.elapsed_seconds)
    }

    fn today_goals_reached(&self) -> bool {
        self.with(|s| s.cache_totals.goal_reached)
    }

    fn write_totals(&self, date: String, totals: TrackingProgress) -> Result<(), NativeError> {
        self.with(|s| {
            s.cache_date = Some(date);
            s.cache_totals = totals;
        });
        Ok(())
    }
}

impl EventSource for FakeHost {
    fn subscribe(&self, channel: EventChannel) -> Result<u64, NativeError> {
        Ok(self.with(|s| {
            s.next_handle += 1;
            s.handles.insert(s.next_handle, channel);
            s.next_handle
        }))
    }

    fn unsubscribe(&self, handle: u64) -> Result<(), NativeError> {
        self.with(|s| s.handles.remove(&handle));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

pub const TODAY: &str = "2026-10-19";

/// Monday 2026-10-19 at 07:00 plus `secs`.
pub fn monday(secs: i64) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

pub fn draft(name: &str, criterion: Criterion, apps: &[&str]) -> PlanDraft {
    PlanDraft {
        name: name.to_string(),
        days: Weekday::ALL.to_vec(),
        duration: PlanDuration::AllDay,
        criterion,
        blocked_apps: apps.iter().map(|app| app.to_string()).collect(),
        active: true,
    }
}

pub fn km(value: f64) -> Criterion {
    Criterion::Distance {
        value,
        unit: DistanceUnit::Kilometers,
    }
}

pub fn minutes(value: f64) -> Criterion {
    Criterion::Time { minutes: value }
}
