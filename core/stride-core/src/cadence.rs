//! Timer cadence for the engine's periodic jobs.
//!
//! Three jobs share one base tick:
//!
//! | Job           | Default period | Armed                     |
//! |---------------|----------------|---------------------------|
//! | Interpolation | 1 s            | only while a session is open |
//! | Blocker sync  | 15 s           | always                    |
//! | Plan reload   | 300 s          | always                    |
//!
//! [`IntervalSchedule`] is pure bookkeeping over explicit instants so tests can
//! drive it. [`Ticker`] is the background thread that produces the base tick;
//! it is stopped and joined on drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Local};

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    Interpolate,
    BlockerSync,
    PlanReload,
}

#[derive(Debug, Clone)]
struct Interval {
    period: Duration,
    next_due: Option<DateTime<Local>>,
}

impl Interval {
    fn new(period_secs: u64) -> Self {
        // Clamped to a day; longer periods are configuration mistakes.
        let secs = period_secs.clamp(1, 86_400) as i64;
        Self {
            period: Duration::seconds(secs),
            next_due: None,
        }
    }

    fn arm(&mut self, now: DateTime<Local>) {
        if self.next_due.is_none() {
            self.next_due = Some(now + self.period);
        }
    }

    fn disarm(&mut self) {
        self.next_due = None;
    }

    fn take_due(&mut self, now: DateTime<Local>) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntervalSchedule {
    interpolation: Interval,
    blocker_sync: Interval,
    plan_reload: Interval,
}

impl IntervalSchedule {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            interpolation: Interval::new(config.interpolation_interval_secs),
            blocker_sync: Interval::new(config.blocker_sync_interval_secs),
            plan_reload: Interval::new(config.plan_reload_interval_secs),
        }
    }

    /// Arms the always-on jobs.
    pub fn start(&mut self, now: DateTime<Local>) {
        self.blocker_sync.arm(now);
        self.plan_reload.arm(now);
    }

    /// Arms or disarms the interpolation job to follow session state.
    pub fn set_session_open(&mut self, open: bool, now: DateTime<Local>) {
        if open {
            self.interpolation.arm(now);
        } else {
            self.interpolation.disarm();
        }
    }

    pub fn is_armed(&self, job: Job) -> bool {
        match job {
            Job::Interpolate => self.interpolation.next_due.is_some(),
            Job::BlockerSync => self.blocker_sync.next_due.is_some(),
            Job::PlanReload => self.plan_reload.next_due.is_some(),
        }
    }

    /// Jobs due at `now`, in the order they should run. Each returned job is
    /// rescheduled one period after `now`.
    pub fn due(&mut self, now: DateTime<Local>) -> Vec<Job> {
        let mut jobs = Vec::new();
        if self.plan_reload.take_due(now) {
            jobs.push(Job::PlanReload);
        }
        if self.interpolation.take_due(now) {
            jobs.push(Job::Interpolate);
        }
        if self.blocker_sync.take_due(now) {
            jobs.push(Job::BlockerSync);
        }
        jobs
    }

    pub fn stop(&mut self) {
        self.interpolation.disarm();
        self.blocker_sync.disarm();
        self.plan_reload.disarm();
    }
}

/// Background thread calling `on_tick` every `period` until stopped.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<F>(name: &str, period: StdDuration, mut on_tick: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || loop {
                thread::park_timeout(period);
                if thread_stop.load(Ordering::SeqCst) {
                    break;
                }
                on_tick();
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signals the thread and joins it. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.stop.store(true, Ordering::SeqCst);
            handle.thread().unpark();
            if handle.join().is_err() {
                tracing::warn!("Ticker thread panicked");
            }
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}
