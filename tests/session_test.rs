//! Integration tests for presentation sessions on a paused tokio clock

use fit_engine::domain::{
    FitReport, FitStatus, GarmentMeasurements, GarmentRecord, Measurements, UserProfile, Zone,
};
use fit_engine::infra::Metrics;
use fit_engine::io::FocusEvent;
use fit_engine::services::{analyze, spawn_session_with_log, FocusPhase, SequencerTimings};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

fn sweater() -> GarmentRecord {
    GarmentRecord {
        sku: "knit-sweater-m".to_string(),
        name: "Premium Knit Sweater".to_string(),
        size: "M".to_string(),
        measurements: GarmentMeasurements::new(44.0, 104.0, 100.0, 65.0),
    }
}

fn report_for(shoulder: f64, chest: f64, waist: f64, arm: f64) -> FitReport {
    let profile = UserProfile::new(
        "shopper-1",
        Measurements::default()
            .with(Zone::Shoulder, shoulder)
            .with(Zone::Chest, chest)
            .with(Zone::Waist, waist)
            .with(Zone::Arm, arm),
    );
    analyze(Some(&profile), &sweater())
}

fn assert_near(actual: Duration, expected_ms: u64) {
    let actual_ms = actual.as_millis() as i128;
    assert!(
        (actual_ms - expected_ms as i128).abs() <= 5,
        "expected ~{expected_ms}ms, got {actual_ms}ms"
    );
}

/// Collect log entries until the channel has been quiet for `quiet`
async fn drain(log: &mut mpsc::Receiver<FocusEvent>, quiet: Duration) -> Vec<FocusEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(quiet, log.recv()).await {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn test_nothing_tight_settles_after_initial_delay() {
    let report = report_for(44.0, 96.0, 80.0, 62.0);
    assert!(report.tight_zones().is_empty());

    let metrics = Arc::new(Metrics::new());
    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), metrics.clone(), 16);

    let events = drain(&mut log, Duration::from_secs(10)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].focus.zone, None);
    assert_eq!(events[0].focus.phase, FocusPhase::Settled);
    assert_near(events[0].elapsed, 500);

    handle.close().await.unwrap();
    assert_eq!(metrics.tour_zones_visited(), 0);
    assert_eq!(metrics.verdict_count(FitStatus::Perfect), 2);
    assert_eq!(metrics.verdict_count(FitStatus::Loose), 2);
}

#[tokio::test(start_paused = true)]
async fn test_single_tight_zone_tour() {
    let report = report_for(48.0, 96.0, 80.0, 62.0);
    assert_eq!(report.tight_zones().as_slice(), &[Zone::Shoulder]);

    let timings = SequencerTimings::default();
    let (handle, mut log) =
        spawn_session_with_log(report, timings, Arc::new(Metrics::new()), 16);

    let events = drain(&mut log, Duration::from_secs(10)).await;
    assert_eq!(events.len(), 2);

    let zoom = &events[0];
    assert_eq!(zoom.focus.zone, Some(Zone::Shoulder));
    assert_eq!(zoom.focus.viewport, Zone::Shoulder.viewport());
    assert_eq!(zoom.focus.transition, Duration::from_millis(1000));
    assert_near(zoom.elapsed, 500);

    let settle = &events[1];
    assert_eq!(settle.focus.zone, None);
    assert_eq!(settle.focus.phase, FocusPhase::Settled);
    assert_eq!(settle.focus.transition, Duration::from_millis(1000));
    assert_near(settle.elapsed, 2700);

    // settle animation ends exactly at the documented tour duration
    assert_near(settle.elapsed + settle.focus.transition, timings.tour_duration(1).as_millis() as u64);
    assert_eq!(timings.tour_duration(1), Duration::from_millis(3700));

    handle.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hover_during_zoom_cancels_hold() {
    let report = report_for(48.0, 96.0, 80.0, 62.0);
    let metrics = Arc::new(Metrics::new());
    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), metrics.clone(), 16);
    let start = Instant::now();

    tokio::time::sleep_until(start + Duration::from_millis(1000)).await;
    handle.on_zone_hover_enter(Zone::Waist).await;
    tokio::time::sleep_until(start + Duration::from_millis(4000)).await;
    assert_eq!(handle.focus().zone, Some(Zone::Waist));
    handle.on_zone_hover_leave().await;

    let events = drain(&mut log, Duration::from_secs(10)).await;
    let zones: Vec<_> = events.iter().map(|e| e.focus.zone).collect();
    assert_eq!(zones, vec![Some(Zone::Shoulder), Some(Zone::Waist), None]);
    assert_near(events[1].elapsed, 1000);
    assert_near(events[2].elapsed, 4000);

    // the shoulder step never fired after the hover
    assert_eq!(metrics.timers_cancelled(), 1);
    assert_eq!(metrics.stale_timers(), 0);

    handle.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hover_interrupts_tour_and_it_never_resumes() {
    let report = report_for(48.0, 96.0, 110.0, 62.0);
    assert_eq!(report.tight_zones().as_slice(), &[Zone::Shoulder, Zone::Waist]);

    let metrics = Arc::new(Metrics::new());
    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), metrics.clone(), 16);
    let start = Instant::now();

    tokio::time::sleep_until(start + Duration::from_millis(2000)).await;
    handle.on_zone_hover_enter(Zone::Chest).await;
    tokio::time::sleep_until(start + Duration::from_millis(2500)).await;
    handle.on_zone_hover_leave().await;

    let events = drain(&mut log, Duration::from_secs(10)).await;
    let zones: Vec<_> = events.iter().map(|e| (e.focus.zone, e.focus.phase)).collect();
    assert_eq!(
        zones,
        vec![
            (Some(Zone::Shoulder), FocusPhase::Touring),
            (Some(Zone::Chest), FocusPhase::Manual),
            (None, FocusPhase::Settled),
        ]
    );

    assert_near(events[1].elapsed, 2000);
    assert_eq!(events[1].focus.transition, Duration::from_millis(600));
    assert_near(events[2].elapsed, 2500);
    assert_eq!(events[2].focus.transition, Duration::from_millis(600));

    // waist was never visited
    assert!(events.iter().all(|e| e.focus.zone != Some(Zone::Waist)));
    assert_eq!(metrics.tour_zones_visited(), 1);
    assert_eq!(metrics.manual_focus_total(), 1);
    assert_eq!(metrics.timers_cancelled(), 1);

    let last = handle.close().await.unwrap();
    assert_eq!(last.zone, None);
}

#[tokio::test(start_paused = true)]
async fn test_rehover_same_zone_is_noop() {
    let report = report_for(48.0, 96.0, 110.0, 62.0);
    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), Arc::new(Metrics::new()), 16);

    handle.on_zone_hover_enter(Zone::Arm).await;
    handle.on_zone_hover_enter(Zone::Arm).await;

    let events = drain(&mut log, Duration::from_secs(10)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].focus.zone, Some(Zone::Arm));
    assert_eq!(handle.focus().phase, FocusPhase::Manual);

    handle.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_hover_leave_without_hover_is_ignored() {
    let report = report_for(48.0, 96.0, 80.0, 62.0);
    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), Arc::new(Metrics::new()), 16);

    handle.on_zone_hover_leave().await;

    // tour proceeds as if nothing happened
    let events = drain(&mut log, Duration::from_secs(10)).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].focus.zone, Some(Zone::Shoulder));
    assert_near(events[0].elapsed, 500);

    handle.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_restart_with_new_garment_starts_fresh_tour() {
    let first = report_for(48.0, 96.0, 110.0, 62.0);
    let metrics = Arc::new(Metrics::new());
    let (mut handle, mut log) =
        spawn_session_with_log(first, SequencerTimings::default(), metrics.clone(), 16);

    // mid-hold on shoulder
    tokio::time::sleep(Duration::from_millis(1800)).await;
    let first_session = log.recv().await.unwrap();
    assert_eq!(first_session.focus.zone, Some(Zone::Shoulder));

    let second = report_for(44.0, 110.0, 96.0, 63.0);
    assert_eq!(second.tight_zones().as_slice(), &[Zone::Chest]);
    handle.restart(second).await;
    assert_eq!(handle.report().tight_zones().as_slice(), &[Zone::Chest]);

    let events = drain(&mut log, Duration::from_secs(10)).await;
    let zones: Vec<_> = events.iter().map(|e| e.focus.zone).collect();
    assert_eq!(zones, vec![None, Some(Zone::Chest), None]);
    assert_eq!(events[0].focus.phase, FocusPhase::Idle);
    assert_near(events[1].elapsed, 500);
    assert_ne!(events[1].session_id, first_session.session_id);

    assert_eq!(metrics.sessions_started(), 2);
    handle.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_missing_profile_has_no_tour() {
    let report = analyze(None, &sweater());
    assert!(Zone::ALL.iter().all(|&z| report.status(z) == Some(FitStatus::MissingData)));

    let (handle, mut log) =
        spawn_session_with_log(report, SequencerTimings::default(), Arc::new(Metrics::new()), 16);

    let events = drain(&mut log, Duration::from_secs(10)).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].focus.phase, FocusPhase::Settled);

    handle.close().await.unwrap();
}
