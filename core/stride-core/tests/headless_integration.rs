//! Integration tests for the headless recovery entry point.

mod common;

use common::{draft, km, FakeHost};
use stride_core::{
    run_headless_recovery, save_app_config, ActivityEvent, AppConfig, HeadlessOutcome,
    PlanStore, StorageConfig, TrackingGoal, TrackingProgress,
};
use tempfile::TempDir;

fn cycling() -> ActivityEvent {
    ActivityEvent {
        activity: "ON_BICYCLE".to_string(),
        confidence: 70,
    }
}

fn prepared_root(background: bool, min_confidence: u8) -> TempDir {
    let temp = TempDir::new().unwrap();
    let storage = StorageConfig::with_root(temp.path());
    storage.ensure_dirs().unwrap();
    save_app_config(
        &storage,
        &AppConfig {
            background_tracking_enabled: background,
            min_motion_confidence: min_confidence,
            ..AppConfig::default()
        },
    )
    .unwrap();
    PlanStore::load(&storage.plans_file())
        .create(draft("Ride", km(10.0), &["com.example.social"]))
        .unwrap();
    temp
}

fn recover(
    temp: &TempDir,
    host: &std::sync::Arc<FakeHost>,
    event: ActivityEvent,
) -> HeadlessOutcome {
    run_headless_recovery(
        temp.path().to_string_lossy().into_owned(),
        event,
        host.clone(),
        host.clone(),
        host.clone(),
    )
    .unwrap()
}

#[test]
fn test_cycling_starts_native_tracking_for_whole_goal() {
    let temp = prepared_root(true, 50);
    let host = FakeHost::new();

    let outcome = recover(&temp, &host, cycling());

    assert_eq!(
        outcome,
        HeadlessOutcome::Started {
            goal: TrackingGoal::distance_meters(10_000.0)
        }
    );
    assert!(host.is_tracking());
}

#[test]
fn test_low_confidence_is_ignored() {
    let temp = prepared_root(true, 80);
    let host = FakeHost::new();

    assert_eq!(
        recover(&temp, &host, cycling()),
        HeadlessOutcome::IgnoredActivity
    );
    assert!(!host.is_tracking());
}

#[test]
fn test_disabled_background_tracking_is_respected() {
    let temp = prepared_root(false, 0);
    let host = FakeHost::new();

    assert_eq!(
        recover(&temp, &host, cycling()),
        HeadlessOutcome::BackgroundTrackingDisabled
    );
}

#[test]
fn test_running_session_is_left_alone() {
    let temp = prepared_root(true, 0);
    let host = FakeHost::new();
    host.set_native_progress(TrackingProgress::new(120.0, 60.0));

    assert_eq!(
        recover(&temp, &host, cycling()),
        HeadlessOutcome::AlreadyTracking
    );
    assert!(host.goals_started().is_empty());
}
