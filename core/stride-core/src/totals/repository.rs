//! One interface over every place today's totals live.
//!
//! # Backends
//!
//! 1. **Fast cache** (native, mmap-backed): authoritative for today. Written
//!    by the native service at arbitrary times, so it is re-read on every call.
//! 2. **Daily log** (`daily-activity.json`): history, upserted on session close.
//! 3. **Legacy unsaved session** (native, plain key-value): left behind by
//!    builds that predate the fast cache.
//!
//! # Precedence
//!
//! The legacy session is consulted only when the fast cache holds nothing for
//! today. Once folded in it is cleared and the migrated totals are written to
//! the fast cache, so a second launch takes the fast path and cannot count it
//! twice.

use std::sync::Arc;

use crate::error::Result;
use crate::native::{NativeTracker, TotalsCache};
use crate::types::{DailyActivity, TrackingProgress, UnsavedSession};

use super::daily_log::DailyLog;

/// Result of the startup baseline read.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineRecovery {
    pub baseline: TrackingProgress,
    /// The legacy session that was folded in, if any.
    pub migrated: Option<UnsavedSession>,
}

#[derive(Clone)]
pub struct TotalsRepository {
    cache: Arc<dyn TotalsCache>,
    tracker: Arc<dyn NativeTracker>,
    log: DailyLog,
}

impl TotalsRepository {
    pub fn new(
        cache: Arc<dyn TotalsCache>,
        tracker: Arc<dyn NativeTracker>,
        log: DailyLog,
    ) -> Self {
        Self {
            cache,
            tracker,
            log,
        }
    }

    pub fn daily_log(&self) -> &DailyLog {
        &self.log
    }

    /// Today's totals from the fast cache. Totals stamped with another date are
    /// yesterday's leftovers and read as zero.
    pub fn fast_totals(&self, today: &str) -> TrackingProgress {
        if let Some(date) = self.cache.today_date() {
            if !date.is_empty() && date != today {
                tracing::debug!(cached = %date, today = %today, "Fast cache is stale");
                return TrackingProgress::ZERO;
            }
        }

        TrackingProgress {
            distance_meters: self.cache.today_distance_meters(),
            elapsed_seconds: self.cache.today_elapsed_seconds(),
            goal_reached: self.cache.today_goals_reached(),
        }
    }

    /// Startup baseline: fast cache first, legacy migration only when it is empty.
    pub fn recover_baseline(&self, today: &str) -> Result<BaselineRecovery> {
        let fast = self.fast_totals(today);
        if !fast.is_empty() {
            return Ok(BaselineRecovery {
                baseline: fast,
                migrated: None,
            });
        }

        let legacy = match self.legacy_session() {
            Some(session) => session,
            None => {
                return Ok(BaselineRecovery {
                    baseline: fast,
                    migrated: None,
                })
            }
        };

        let progress = legacy.progress();
        self.log.upsert(&legacy.date, &progress)?;

        let baseline = if legacy.date == today {
            self.write_fast_totals(today, &progress);
            progress
        } else {
            fast
        };

        if let Err(err) = self.tracker.clear_unsaved_session() {
            tracing::warn!(error = %err, "Failed to clear migrated legacy session");
        }

        tracing::info!(
            date = %legacy.date,
            distance_meters = legacy.distance_meters,
            elapsed_seconds = legacy.elapsed_seconds,
            "Migrated legacy unsaved session"
        );

        Ok(BaselineRecovery {
            baseline,
            migrated: Some(legacy),
        })
    }

    /// What is already recorded for today without migrating anything.
    /// Used by the headless task, which must not write on the legacy path.
    pub fn recorded_today(&self, today: &str) -> TrackingProgress {
        let fast = self.fast_totals(today);
        if !fast.is_empty() {
            return fast;
        }

        match self.legacy_session() {
            Some(session) if session.date == today => session.progress(),
            _ => fast,
        }
    }

    /// Folds a closed session into the daily log and fast cache and returns
    /// the new baseline.
    pub fn commit_session(
        &self,
        today: &str,
        baseline: &TrackingProgress,
        session: &TrackingProgress,
    ) -> Result<TrackingProgress> {
        let mut next = *baseline;
        if session.is_empty() {
            return Ok(next);
        }

        self.log.upsert(today, session)?;
        next.absorb(session);
        self.write_fast_totals(today, &next);
        Ok(next)
    }

    pub fn history(&self, limit: usize) -> Vec<DailyActivity> {
        self.log.recent(limit)
    }

    fn legacy_session(&self) -> Option<UnsavedSession> {
        match self.tracker.get_unsaved_session() {
            Ok(Some(session)) if !session.progress().is_empty() => Some(session),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to read legacy unsaved session");
                None
            }
        }
    }

    fn write_fast_totals(&self, today: &str, totals: &TrackingProgress) {
        if let Err(err) = self.cache.write_totals(today.to_string(), *totals) {
            tracing::warn!(error = %err, "Failed to write fast totals cache");
        }
    }
}
