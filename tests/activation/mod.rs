use notify_engine::adapters::memory::Gate;
use notify_engine::adapters::memory::InMemorySnapshotService;
use notify_engine::Advisory;
use notify_engine::AlertUrgency;
use notify_engine::ProjectionConfig;
use notify_engine::ProjectionFilter;
use notify_engine::Severity;
use notify_engine::Stats;
use notify_engine::BELL_DROPDOWN;
use notify_engine::NOTIFICATION_LIST;
use tokio::time::timeout;

use crate::common::eventually;
use crate::common::ids;
use crate::common::start;
use crate::common::start_with_projection;
use crate::common::threat;
use crate::common::WAIT_TIMEOUT;

fn scenario_service() -> InMemorySnapshotService {
    let service = InMemorySnapshotService::new(vec![threat(2, Severity::High, false), threat(1, Severity::Low, true)]);
    service.set_stats(Stats {
        unread_count: 1,
        total_count: 2,
        severity_counts: [(Severity::High, 1), (Severity::Low, 1)].into_iter().collect(),
    });
    service
}

#[tokio::test]
async fn test_live_arrival_before_snapshot_keeps_its_place() {
    let service = scenario_service();
    service.hold(Gate::Snapshot);
    let mut h = start(service);
    eventually(|| h.channel.join_count() == 1).await;

    assert!(h.channel.publish(threat(3, Severity::High, false)));
    let mut bell = h.handle.projection(BELL_DROPDOWN).unwrap();
    bell.wait_for(|view| view.len() == 1).await.unwrap();

    h.service.release(Gate::Snapshot);
    let view = timeout(WAIT_TIMEOUT, bell.wait_for(|view| view.len() == 3))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(ids(&view), vec!["3", "2", "1"]);
    let alert = timeout(WAIT_TIMEOUT, h.alerts.recv()).await.unwrap().unwrap();
    assert_eq!(alert.urgency, AlertUrgency::Critical);
    assert_eq!(alert.text, "🚨 Threat 3");
    assert!(h.alerts.try_recv().is_err());

    let mut stats = h.handle.stats_receiver();
    let stats = timeout(WAIT_TIMEOUT, stats.wait_for(|s| s.total_count == 3))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(stats.unread_count, 2);
    assert_eq!(stats.severity_count(Severity::High), 2);
    assert_eq!(stats.severity_count(Severity::Low), 1);
}

#[tokio::test]
async fn test_snapshot_entries_never_raise_alerts() {
    let mut h = start(scenario_service());

    let mut list = h.handle.projection(NOTIFICATION_LIST).unwrap();
    timeout(WAIT_TIMEOUT, list.wait_for(|view| view.len() == 2))
        .await
        .unwrap()
        .unwrap();

    assert!(h.alerts.try_recv().is_err());
}

#[tokio::test]
async fn test_unread_only_surfaces_request_unread_snapshot() {
    let service = InMemorySnapshotService::new(vec![
        threat(3, Severity::Medium, false),
        threat(2, Severity::High, true),
        threat(1, Severity::Low, false),
    ]);
    let mut config = notify_engine::EngineConfig::default();
    config.projections = vec![ProjectionConfig::new("inbox", 10).with_filter(ProjectionFilter::Unread)];
    let channel = notify_engine::adapters::memory::LocalEventChannel::new();
    let parts = notify_engine::EngineBuilder::new(config, std::sync::Arc::new(service), std::sync::Arc::new(channel))
        .build()
        .unwrap();
    let mut inbox = parts.handle.projection("inbox").unwrap();
    tokio::spawn(parts.engine.run());

    let view = timeout(WAIT_TIMEOUT, inbox.wait_for(|view| !view.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&view), vec!["3", "1"]);
}

#[tokio::test]
async fn test_failed_fetches_are_advisories_not_fatal() {
    let service = scenario_service();
    service.fail_snapshot(true);
    service.fail_stats(true);
    let mut h = start_with_projection(service, ProjectionConfig::new("everything", 100));

    let mut advisories = Vec::new();
    for _ in 0..2 {
        advisories.push(timeout(WAIT_TIMEOUT, h.advisories.recv()).await.unwrap().unwrap());
    }
    assert!(advisories.iter().any(|a| matches!(a, Advisory::SnapshotUnavailable { .. })));
    assert!(advisories.iter().any(|a| matches!(a, Advisory::StatsUnavailable { .. })));

    eventually(|| h.channel.join_count() == 1).await;
    h.channel.publish(threat(9, Severity::Info, false));
    let mut everything = h.handle.projection("everything").unwrap();
    let view = timeout(WAIT_TIMEOUT, everything.wait_for(|view| !view.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&view), vec!["9"]);
    assert_eq!(h.handle.stats().unread_count, 1);
    assert!(!h.engine_task.is_finished());
}

#[tokio::test]
async fn test_switching_to_unread_fills_from_older_history() {
    let mut notifications: Vec<_> = (3..=52u64).rev().map(|id| threat(id, Severity::Low, true)).collect();
    notifications.push(threat(2, Severity::High, false));
    notifications.push(threat(1, Severity::Medium, false));
    let h = start(InMemorySnapshotService::new(notifications));

    let mut list = h.handle.projection(NOTIFICATION_LIST).unwrap();
    let view = timeout(WAIT_TIMEOUT, list.wait_for(|view| view.len() == 50))
        .await
        .unwrap()
        .unwrap();
    assert!(view.iter().all(|n| n.is_read));

    h.handle.set_filter(NOTIFICATION_LIST, ProjectionFilter::Unread).await.unwrap();
    let view = timeout(WAIT_TIMEOUT, list.wait_for(|view| view.len() == 2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&view), vec!["2", "1"]);

    let mut stats = h.handle.stats_receiver();
    let stats = timeout(WAIT_TIMEOUT, stats.wait_for(|s| s.total_count == 52))
        .await
        .unwrap()
        .unwrap()
        .clone();
    assert_eq!(stats.unread_count, 2);
}
