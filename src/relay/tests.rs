use super::*;
use crate::error::SolarEdgeError;
use crate::testing::{ScriptedSource, flow, overview, site};
use std::sync::atomic::Ordering;

async fn relay_with(source: Arc<ScriptedSource>) -> Arc<Relay> {
    Arc::new(
        Relay::new(source, RelaySettings::default())
            .await
            .unwrap(),
    )
}

fn scripted() -> Arc<ScriptedSource> {
    let source = ScriptedSource::default();
    source.push_details(Ok(site(1234)));
    Arc::new(source)
}

#[tokio::test]
async fn test_new_fails_without_details() {
    let source = ScriptedSource::default();
    source.push_details(Err(SolarEdgeError::http(403, "Invalid token")));
    let err = Relay::new(Arc::new(source), RelaySettings::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[tokio::test]
async fn test_phase_follows_initialization() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0))).push_overview(Ok(overview(10.0)));
    let relay = relay_with(Arc::clone(&source)).await;

    assert_eq!(relay.details().await.id, 1234);
    assert_eq!(relay.phase().await, RelayPhase::Uninitialized);
    assert_eq!(*relay.power_flow().await, PowerFlow::default());

    assert_eq!(relay.initialize().await, RelayPhase::Ready);
    assert_eq!(*relay.power_flow().await, flow(1.0));
    assert_eq!(*relay.overview().await, overview(10.0));
    assert_eq!(source.flow_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.overview_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_partial_initialization_stays_uninitialized() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0)));
    let relay = relay_with(source).await;

    assert_eq!(relay.initialize().await, RelayPhase::Uninitialized);
    assert_eq!(*relay.power_flow().await, flow(1.0));
    assert_eq!(*relay.overview().await, Overview::default());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0))).push_overview(Ok(overview(10.0)));
    let relay = relay_with(Arc::clone(&source)).await;
    relay.initialize().await;

    let before = serde_json::to_string(&*relay.power_flow().await).unwrap();
    source.push_flow(Err(SolarEdgeError::timeout("request timed out")));
    assert!(!relay.refresh_power_flow().await);

    let after = serde_json::to_string(&*relay.power_flow().await).unwrap();
    assert_eq!(before, after);
    assert_eq!(relay.phase().await, RelayPhase::Degraded);

    source.push_flow(Ok(flow(2.0)));
    assert!(relay.refresh_power_flow().await);
    assert_eq!(*relay.power_flow().await, flow(2.0));
    assert_eq!(relay.phase().await, RelayPhase::Ready);
}

#[tokio::test]
async fn test_failed_details_refresh_degrades() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0))).push_overview(Ok(overview(10.0)));
    let relay = relay_with(Arc::clone(&source)).await;
    relay.initialize().await;

    assert!(!relay.refresh_details().await);
    assert_eq!(relay.details().await.name, "Rooftop");
    assert_eq!(relay.phase().await, RelayPhase::Degraded);

    let mut renamed = site(1234);
    renamed.name = "Carport".to_string();
    source.push_details(Ok(renamed));
    assert!(relay.refresh_details().await);
    assert_eq!(relay.details().await.name, "Carport");
    assert_eq!(relay.phase().await, RelayPhase::Ready);
}

#[tokio::test]
async fn test_refresh_updates_metrics() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0)));
    let relay = relay_with(source).await;
    assert!(relay.refresh_power_flow().await);

    let view = relay.metrics().current();
    assert_eq!(view, relay.flow_view().await);
    assert_eq!(view.pv, 2000.0);
    assert_eq!(view.grid, -100.0);
    assert_eq!(view.battery, -500.0);
    assert_eq!(view.soc, 50.0);
}

#[tokio::test]
async fn test_failed_refresh_leaves_metrics() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0)));
    let relay = relay_with(Arc::clone(&source)).await;
    relay.refresh_power_flow().await;
    let before = relay.metrics().current();

    assert!(!relay.refresh_power_flow().await);
    assert_eq!(relay.metrics().current(), before);
}

#[tokio::test(start_paused = true)]
async fn test_readers_see_old_snapshot_during_slow_refresh() {
    let source = ScriptedSource::with_flow_delay(Duration::from_secs(5));
    source
        .push_details(Ok(site(1234)))
        .push_flow(Ok(flow(1.0)))
        .push_flow(Ok(flow(2.0)))
        .push_overview(Ok(overview(10.0)));
    let source = Arc::new(source);
    let relay = relay_with(source).await;
    relay.initialize().await;

    let refreshing = {
        let relay = Arc::clone(&relay);
        tokio::spawn(async move { relay.refresh_power_flow().await })
    };
    tokio::task::yield_now().await;

    // The fetch is still sleeping; readers are not blocked and see the old value
    assert_eq!(*relay.power_flow().await, flow(1.0));
    assert_eq!(relay.phase().await, RelayPhase::Ready);

    assert!(refreshing.await.unwrap());
    assert_eq!(*relay.power_flow().await, flow(2.0));
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_schedules() {
    let source = scripted();
    source.push_flow(Ok(flow(1.0))).push_overview(Ok(overview(10.0)));
    let relay = relay_with(Arc::clone(&source)).await;
    relay.initialize().await;
    let handle = relay.spawn();

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.flow_calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.overview_calls.load(Ordering::SeqCst), 1);
    assert_eq!(source.details_calls.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_secs(900 - 61 + 1)).await;
    assert_eq!(source.flow_calls.load(Ordering::SeqCst), 16);
    assert_eq!(source.overview_calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.details_calls.load(Ordering::SeqCst), 1);

    // Exhausted scripts fail; the snapshots from initialize are still served
    assert_eq!(*relay.power_flow().await, flow(1.0));
    assert_eq!(*relay.overview().await, overview(10.0));
    assert_eq!(relay.phase().await, RelayPhase::Degraded);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_refreshes_details_when_enabled() {
    let source = scripted();
    let settings = RelaySettings {
        refresh_details: true,
        ..RelaySettings::default()
    };
    let relay = Arc::new(
        Relay::new(Arc::clone(&source) as Arc<dyn SiteSource>, settings)
            .await
            .unwrap(),
    );
    let handle = relay.spawn();

    tokio::time::sleep(settings.poll_interval + Duration::from_secs(1)).await;
    assert_eq!(source.details_calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.overview_calls.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[test]
fn test_settings_from_config() {
    let mut config = RelayConfig::default();
    config.flow_interval_secs = 5;
    config.battery_sign = BatterySignPolicy::DischargingOnly;
    let settings = RelaySettings::from(&config);
    assert_eq!(settings.flow_interval, Duration::from_secs(5));
    assert_eq!(settings.poll_interval, Duration::from_secs(900));
    assert_eq!(settings.battery_sign, BatterySignPolicy::DischargingOnly);
}

#[test]
fn test_phase_serializes_lowercase() {
    assert_eq!(
        serde_json::to_string(&RelayPhase::Degraded).unwrap(),
        "\"degraded\""
    );
    assert_eq!(SnapshotKind::PowerFlow.as_str(), "powerflow");
}
