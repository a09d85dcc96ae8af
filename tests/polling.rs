//! Timer behaviour of `RefreshCycle` under paused tokio time
//!
//! - restarting the timer never leaves two timers running
//! - stopping only stops future ticks; a load in flight still renders
//! - a slow response that lands last overwrites a newer one
//! - page visibility stops and restarts polling
//! - a stalled page-load read holds up neither the other reads nor polling

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use common::{reading, FakeSource, RecordingRenderer};
use hydroponic_dashboard::config::SnapshotFeed;
use hydroponic_dashboard::view::Metric;
use hydroponic_dashboard::{CycleSettings, RefreshCycle, SnapshotEndpoint, Visibility};

const INTERVAL: Duration = Duration::from_secs(1);

fn cycle_with(source: Arc<FakeSource>, feed: SnapshotFeed) -> (RefreshCycle, Arc<RecordingRenderer>) {
    let renderer = RecordingRenderer::new();
    let settings = CycleSettings { feed, interval: INTERVAL, default_range: "24h".into() };
    (RefreshCycle::new(source, renderer.clone(), settings), renderer)
}

#[tokio::test(start_paused = true)]
async fn test_restarting_keeps_a_single_timer() {
    let source = FakeSource::new();
    let (cycle, renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(INTERVAL).await;
    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(source.calls().len(), 3);
    assert_eq!(renderer.snapshots().len(), 3);
    cycle.stop_polling().await;
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_interval() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(source.calls().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(source.calls().len(), 1);
    cycle.stop_polling().await;
}

#[tokio::test(start_paused = true)]
async fn test_ticks_read_the_polling_endpoint() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.load_snapshot().await.unwrap();
    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    cycle.stop_polling().await;

    assert_eq!(source.calls(), vec![SnapshotEndpoint::Current, SnapshotEndpoint::Live]);
}

#[tokio::test(start_paused = true)]
async fn test_api_feed_polls_api_current() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Api);

    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    cycle.stop_polling().await;

    assert_eq!(source.calls(), vec![SnapshotEndpoint::ApiCurrent, SnapshotEndpoint::ApiCurrent]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_does_not_cancel_a_load_in_flight() {
    let gate = Arc::new(Notify::new());
    let source = FakeSource::gated(gate.clone());
    let (cycle, renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(source.calls().len(), 1);

    cycle.stop_polling().await;
    assert!(!cycle.is_polling().await);
    assert!(renderer.snapshots().is_empty());

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(renderer.snapshots().len(), 1);
    assert!(cycle.current_snapshot().await.is_some());

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_response_landing_last_wins() {
    let source = FakeSource::new();
    source.push(Duration::from_millis(1_500), reading(10.0));
    source.push(Duration::ZERO, reading(30.0));
    let (cycle, renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(INTERVAL).await;

    // tick 1 at 1.0s (answers at 2.5s), tick 2 at 2.0s (answers at once)
    tokio::time::sleep(Duration::from_millis(2_200)).await;
    assert_eq!(cycle.current_snapshot().await.unwrap().temperature, Some(30.0));

    tokio::time::sleep(Duration::from_millis(500)).await;
    cycle.stop_polling().await;
    assert_eq!(cycle.current_snapshot().await.unwrap().temperature, Some(10.0));

    let shown: Vec<String> =
        renderer.snapshots().iter().map(|v| v.text(Metric::Temperature).unwrap().to_string()).collect();
    assert_eq!(shown, vec!["30.0 °C", "10.0 °C"]);
}

#[tokio::test(start_paused = true)]
async fn test_visibility_pauses_and_resumes_polling() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.set_visibility(Visibility::Visible).await;
    assert!(cycle.is_polling().await);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(source.calls().len(), 1);

    cycle.set_visibility(Visibility::Hidden).await;
    assert!(!cycle.is_polling().await);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(source.calls().len(), 1);

    cycle.set_visibility(Visibility::Visible).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(source.calls().len(), 2);
    cycle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_is_refused() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(Duration::ZERO).await;
    assert!(!cycle.is_polling().await);
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_still_cancels_running_timer() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(source.calls().len(), 1);

    cycle.start_polling(Duration::ZERO).await;
    assert!(!cycle.is_polling().await);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_loads_everything_then_polls() {
    let source = FakeSource::new();
    let (cycle, renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    cycle.start().await;
    assert_eq!(renderer.snapshots().len(), 1);
    assert_eq!(renderer.lamp_lists()[0].len(), 2);
    assert_eq!(renderer.connections().len(), 2);
    assert_eq!(renderer.charts()[0].len(), 3);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(renderer.snapshots().len(), 2);
    cycle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stalled_initial_snapshot_holds_up_nothing_else() {
    let gate = Arc::new(Notify::new());
    let source = FakeSource::gated(gate.clone());
    let (cycle, renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);

    let starter = cycle.clone();
    let start = tokio::spawn(async move { starter.start().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(cycle.is_polling().await);
    assert_eq!(renderer.lamp_lists().len(), 1);
    assert_eq!(renderer.connections().len(), 2);
    assert_eq!(renderer.charts().len(), 1);
    assert!(renderer.snapshots().is_empty());
    assert!(!start.is_finished());

    // ticks keep firing while the first read hangs
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(source.calls(), vec![SnapshotEndpoint::Current, SnapshotEndpoint::Live, SnapshotEndpoint::Live]);

    gate.notify_waiters();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(start.is_finished());
    assert_eq!(renderer.snapshots().len(), 3);
    cycle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_clones_share_one_timer() {
    let source = FakeSource::new();
    let (cycle, _renderer) = cycle_with(source.clone(), SnapshotFeed::Hardware);
    let other = cycle.clone();

    cycle.start_polling(INTERVAL).await;
    other.start_polling(INTERVAL).await;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(source.calls().len(), 2);

    other.stop_polling().await;
    assert!(!cycle.is_polling().await);
}
