//! `stride goals` and `stride history`.
//!
//! Only committed sessions are visible here: the live fast cache belongs to
//! the native side, so a session still running on the phone is not counted.

use std::io::Write;

use chrono::NaiveDateTime;
use stride_core::{
    active_plans_for_today, aggregate_goals, aggregate_unmet_goals, AggregatedGoals,
    DailyActivity, DailyLog, DistanceUnit, PlanStore, StorageConfig, TrackingProgress,
};

use crate::CliError;

pub fn goals(
    storage: &StorageConfig,
    unmet: bool,
    now: NaiveDateTime,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let plans = PlanStore::load(&storage.plans_file()).into_plans();
    let active = active_plans_for_today(&plans, now);
    if active.is_empty() {
        writeln!(out, "No active plans right now.")?;
        return Ok(());
    }

    let today = now.format("%Y-%m-%d").to_string();
    let recorded = DailyLog::new(&storage.daily_log_file())
        .get(&today)
        .map(|record| recorded_progress(&record))
        .unwrap_or_default();

    let (label, goals) = if unmet {
        ("Still to go", aggregate_unmet_goals(&active, &recorded))
    } else {
        ("Today's goals", aggregate_goals(&active))
    };

    writeln!(out, "{label} ({} active plan(s)):", active.len())?;
    write_goals(out, &goals)?;
    writeln!(
        out,
        "Recorded today: {}, {}",
        format_distance(recorded.distance_meters),
        format_duration(recorded.elapsed_seconds)
    )?;
    Ok(())
}

pub fn history(
    storage: &StorageConfig,
    days: usize,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let records = DailyLog::new(&storage.daily_log_file()).recent(days);
    if json {
        serde_json::to_writer_pretty(&mut *out, &records)?;
        writeln!(out)?;
        return Ok(());
    }

    if records.is_empty() {
        writeln!(out, "No activity recorded yet.")?;
    }
    for record in &records {
        writeln!(
            out,
            "{}  {:>9}  {:>7}{}",
            record.date,
            format_distance(record.distance_meters),
            format_duration(record.elapsed_seconds),
            if record.goals_reached { "  goals reached" } else { "" }
        )?;
    }
    Ok(())
}

fn recorded_progress(record: &DailyActivity) -> TrackingProgress {
    TrackingProgress {
        distance_meters: record.distance_meters,
        elapsed_seconds: record.elapsed_seconds,
        goal_reached: record.goals_reached,
    }
}

fn write_goals(out: &mut impl Write, goals: &AggregatedGoals) -> Result<(), CliError> {
    if !goals.has_any_goal() {
        writeln!(out, "  nothing left")?;
    }
    if goals.has_distance_goal {
        writeln!(out, "  distance: {}", format_distance(goals.distance_meters))?;
    }
    if goals.has_time_goal {
        writeln!(out, "  time: {}", format_duration(goals.time_seconds))?;
    }
    Ok(())
}

fn format_distance(meters: f64) -> String {
    format!("{:.2} km", DistanceUnit::Kilometers.from_meters(meters))
}

fn format_duration(seconds: f64) -> String {
    format!("{} min", (seconds / 60.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stride_core::{Criterion, PlanDraft, PlanDuration, Weekday};
    use tempfile::TempDir;

    fn monday_noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn storage_with(criteria: &[Criterion]) -> (TempDir, StorageConfig) {
        let temp = TempDir::new().unwrap();
        let storage = StorageConfig::with_root(temp.path());
        storage.ensure_dirs().unwrap();
        let mut store = PlanStore::load(&storage.plans_file());
        for criterion in criteria {
            store
                .create(PlanDraft {
                    name: "plan".to_string(),
                    days: Weekday::ALL.to_vec(),
                    duration: PlanDuration::AllDay,
                    criterion: criterion.clone(),
                    blocked_apps: vec![],
                    active: true,
                })
                .unwrap();
        }
        (temp, storage)
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CliError>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn two_km() -> Criterion {
        Criterion::Distance {
            value: 2.0,
            unit: DistanceUnit::Kilometers,
        }
    }

    #[test]
    fn test_goals_sum_active_plans() {
        let (_temp, storage) =
            storage_with(&[two_km(), two_km(), Criterion::Time { minutes: 15.0 }]);

        let output = render(|out| goals(&storage, false, monday_noon(), out));

        assert_eq!(
            output,
            "Today's goals (3 active plan(s)):\n  distance: 4.00 km\n  time: 15 min\nRecorded today: 0.00 km, 0 min\n"
        );
    }

    #[test]
    fn test_unmet_goals_subtract_recorded_activity() {
        let (_temp, storage) = storage_with(&[two_km(), Criterion::Time { minutes: 15.0 }]);
        DailyLog::new(&storage.daily_log_file())
            .upsert("2026-10-19", &TrackingProgress::new(500.0, 900.0))
            .unwrap();

        let output = render(|out| goals(&storage, true, monday_noon(), out));

        assert_eq!(
            output,
            "Still to go (2 active plan(s)):\n  distance: 1.50 km\nRecorded today: 0.50 km, 15 min\n"
        );
    }

    #[test]
    fn test_no_active_plans() {
        let (_temp, storage) = storage_with(&[Criterion::Permanent]);

        let output = render(|out| goals(&storage, false, monday_noon(), out));

        assert_eq!(output, "No active plans right now.\n");
    }

    #[test]
    fn test_history_lists_newest_first() {
        let (_temp, storage) = storage_with(&[]);
        let log = DailyLog::new(&storage.daily_log_file());
        log.upsert("2026-10-17", &TrackingProgress::new(1200.0, 600.0))
            .unwrap();
        let mut reached = TrackingProgress::new(5000.0, 1800.0);
        reached.goal_reached = true;
        log.upsert("2026-10-18", &reached).unwrap();

        let output = render(|out| history(&storage, 7, false, out));
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2026-10-18"));
        assert!(lines[0].ends_with("goals reached"));
        assert!(lines[1].starts_with("2026-10-17"));
    }

    #[test]
    fn test_history_json_respects_limit() {
        let (_temp, storage) = storage_with(&[]);
        let log = DailyLog::new(&storage.daily_log_file());
        for day in 10..15 {
            log.upsert(&format!("2026-10-{day}"), &TrackingProgress::new(100.0, 60.0))
                .unwrap();
        }

        let output = render(|out| history(&storage, 2, true, out));
        let records: Vec<DailyActivity> = serde_json::from_str(&output).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "2026-10-14");
    }
}
