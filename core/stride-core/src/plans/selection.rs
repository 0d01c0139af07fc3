//! Which plans apply right now.
//!
//! Both predicates take the local wall-clock time explicitly so callers (and
//! tests) control "today".

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike};

use super::types::{BlockingPlan, PlanDuration, Weekday};

/// Parses a 24-hour `HH:MM` string into minutes since midnight.
pub fn parse_minutes_of_day(value: &str) -> Option<u32> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    Some(time.hour() * 60 + time.minute())
}

/// True when `now` falls inside the plan's window. Unparseable hour bounds
/// never match.
pub fn within_duration(duration: &PlanDuration, now: NaiveDateTime) -> bool {
    match duration {
        PlanDuration::AllDay => true,
        PlanDuration::SpecificHours { from, to } => {
            match (parse_minutes_of_day(from), parse_minutes_of_day(to)) {
                (Some(from), Some(to)) => {
                    let current = now.hour() * 60 + now.minute();
                    from <= current && current <= to
                }
                _ => false,
            }
        }
    }
}

/// Active, scheduled for today's weekday, and inside its time window.
pub fn plan_applies_now(plan: &BlockingPlan, now: NaiveDateTime) -> bool {
    let today = Weekday::from(now.weekday());
    plan.active && plan.days.contains(&today) && within_duration(&plan.duration, now)
}

/// Plans whose activity goal is being worked toward right now.
///
/// Permanent plans are excluded; no amount of activity releases them.
pub fn active_plans_for_today(plans: &[BlockingPlan], now: NaiveDateTime) -> Vec<BlockingPlan> {
    plans
        .iter()
        .filter(|plan| plan_applies_now(plan, now) && !plan.criterion.is_permanent())
        .cloned()
        .collect()
}

/// Plans that should be blocking apps right now, permanent ones included.
pub fn blocking_plans_for_today(plans: &[BlockingPlan], now: NaiveDateTime) -> Vec<BlockingPlan> {
    plans
        .iter()
        .filter(|plan| plan_applies_now(plan, now) && !plan.blocked_apps.is_empty())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plans::types::{Criterion, DistanceUnit};
    use chrono::NaiveDate;

    // 2026-10-19 is a Monday.
    fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn plan(
        id: &str,
        days: Vec<Weekday>,
        duration: PlanDuration,
        criterion: Criterion,
    ) -> BlockingPlan {
        BlockingPlan {
            id: id.to_string(),
            name: id.to_string(),
            days,
            duration,
            criterion,
            blocked_apps: vec!["com.example.social".to_string()],
            active: true,
            created_at: String::new(),
        }
    }

    fn walk_5k() -> Criterion {
        Criterion::Distance {
            value: 5.0,
            unit: DistanceUnit::Kilometers,
        }
    }

    fn hours(from: &str, to: &str) -> PlanDuration {
        PlanDuration::SpecificHours {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    #[test]
    fn test_parse_minutes_of_day() {
        assert_eq!(parse_minutes_of_day("00:00"), Some(0));
        assert_eq!(parse_minutes_of_day("09:30"), Some(570));
        assert_eq!(parse_minutes_of_day("23:59"), Some(1439));
        assert_eq!(parse_minutes_of_day("24:00"), None);
        assert_eq!(parse_minutes_of_day("nine"), None);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = hours("09:00", "17:00");
        assert!(within_duration(&window, monday_at(9, 0)));
        assert!(within_duration(&window, monday_at(17, 0)));
        assert!(!within_duration(&window, monday_at(8, 59)));
        assert!(!within_duration(&window, monday_at(17, 1)));
    }

    #[test]
    fn test_malformed_window_never_matches() {
        assert!(!within_duration(&hours("9am", "17:00"), monday_at(12, 0)));
    }

    #[test]
    fn test_active_plans_filters_every_condition() {
        let mut paused = plan("paused", vec![Weekday::Monday], PlanDuration::AllDay, walk_5k());
        paused.active = false;

        let plans = vec![
            plan("match", vec![Weekday::Monday], PlanDuration::AllDay, walk_5k()),
            paused,
            plan("tuesday", vec![Weekday::Tuesday], PlanDuration::AllDay, walk_5k()),
            plan("evening", vec![Weekday::Monday], hours("18:00", "22:00"), walk_5k()),
            plan("permanent", vec![Weekday::Monday], PlanDuration::AllDay, Criterion::Permanent),
            plan(
                "time",
                vec![Weekday::Monday],
                hours("10:00", "14:00"),
                Criterion::Time { minutes: 30.0 },
            ),
        ];

        let ids: Vec<String> = active_plans_for_today(&plans, monday_at(12, 0))
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["match".to_string(), "time".to_string()]);
    }

    #[test]
    fn test_active_plans_matches_predicate_for_every_weekday() {
        let plans: Vec<BlockingPlan> = Weekday::ALL
            .into_iter()
            .map(|day| plan(day.name(), vec![day], PlanDuration::AllDay, walk_5k()))
            .collect();

        for offset in 0..7 {
            let now = monday_at(12, 0) + chrono::Duration::days(offset);
            let today = Weekday::from(now.weekday());
            let active = active_plans_for_today(&plans, now);
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].days, vec![today]);
        }
    }

    #[test]
    fn test_blocking_plans_keep_permanent_and_require_apps() {
        let mut no_apps = plan("no-apps", vec![Weekday::Monday], PlanDuration::AllDay, walk_5k());
        no_apps.blocked_apps.clear();

        let plans = vec![
            plan("permanent", vec![Weekday::Monday], PlanDuration::AllDay, Criterion::Permanent),
            no_apps,
            plan("walk", vec![Weekday::Monday], PlanDuration::AllDay, walk_5k()),
        ];

        let ids: Vec<String> = blocking_plans_for_today(&plans, monday_at(8, 0))
            .into_iter()
            .map(|p| p.id)
            .collect();

        assert_eq!(ids, vec!["permanent".to_string(), "walk".to_string()]);
    }
}
