//! Plan validation before anything reaches `plans.json`.
//!
//! Loading never validates (old files stay readable); create and update do.

use once_cell::sync::Lazy;
use regex::Regex;

use super::selection::parse_minutes_of_day;
use super::types::{Criterion, PlanDraft, PlanDuration};
use crate::error::{Result, StrideError};

/// Android package names and iOS bundle identifiers: dot-separated segments,
/// at least two, first segment starting with a letter.
static APP_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*(\.[A-Za-z0-9_-]+)+$").expect("valid app id regex")
});

pub fn is_valid_app_id(value: &str) -> bool {
    APP_ID_PATTERN.is_match(value)
}

pub fn validate_plan(draft: &PlanDraft) -> Result<()> {
    if draft.days.is_empty() {
        return Err(invalid("plan must be active on at least one day"));
    }

    match &draft.criterion {
        Criterion::Distance { value, .. } if !value.is_finite() || *value <= 0.0 => {
            return Err(invalid("distance goal must be greater than zero"));
        }
        Criterion::Time { minutes } if !minutes.is_finite() || *minutes <= 0.0 => {
            return Err(invalid("time goal must be greater than zero"));
        }
        _ => {}
    }

    if let PlanDuration::SpecificHours { from, to } = &draft.duration {
        let start = parse_minutes_of_day(from)
            .ok_or_else(|| invalid(&format!("invalid start time '{}', expected HH:MM", from)))?;
        let end = parse_minutes_of_day(to)
            .ok_or_else(|| invalid(&format!("invalid end time '{}', expected HH:MM", to)))?;
        if start > end {
            return Err(invalid(&format!(
                "start time {} is after end time {}",
                from, to
            )));
        }
    }

    if let Some(bad) = draft.blocked_apps.iter().find(|app| !is_valid_app_id(app)) {
        return Err(invalid(&format!("invalid app identifier '{}'", bad)));
    }

    Ok(())
}

fn invalid(reason: &str) -> StrideError {
    StrideError::InvalidPlan(reason.to_string())
}
