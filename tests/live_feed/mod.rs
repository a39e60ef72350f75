use std::time::Duration;

use notify_engine::adapters::memory::Gate;
use notify_engine::adapters::memory::InMemorySnapshotService;
use notify_engine::ConnectionState;
use notify_engine::Severity;
use notify_engine::Stats;
use notify_engine::BELL_DROPDOWN;
use notify_engine::LIVE_FEED;
use tokio::time::timeout;

use crate::common::eventually;
use crate::common::ids;
use crate::common::start;
use crate::common::start_live_only;
use crate::common::threat;
use crate::common::WAIT_TIMEOUT;

#[tokio::test]
async fn test_feed_retains_most_recent_fifty() {
    let h = start_live_only();
    eventually(|| h.channel.join_count() == 1).await;

    for id in 0..60u64 {
        assert!(h.channel.publish(threat(id, Severity::Info, false)));
    }

    let mut feed = h.handle.projection(LIVE_FEED).unwrap();
    let view = timeout(WAIT_TIMEOUT, feed.wait_for(|view| view.first().is_some_and(|n| n.id.as_str() == "59")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.len(), 50);
    assert_eq!(ids(&view).last().map(String::as_str), Some("10"));
    assert!(h.service.confirmed().is_empty());
    assert_eq!(h.handle.stats().total_count, 50);
}

#[tokio::test]
async fn test_reconnect_rejoins_and_tracks_connection_state() {
    let h = start_live_only();
    eventually(|| h.channel.join_count() == 1).await;
    let mut connection = h.handle.connection_receiver();

    h.channel.connect();
    timeout(WAIT_TIMEOUT, connection.wait_for(|s| *s == ConnectionState::Connected))
        .await
        .unwrap()
        .unwrap();
    eventually(|| h.channel.join_count() == 2).await;

    h.channel.disconnect();
    timeout(WAIT_TIMEOUT, connection.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();
    // Interest is forgotten while disconnected
    assert!(!h.channel.publish(threat(1, Severity::High, false)));

    h.channel.connect();
    eventually(|| h.channel.join_count() == 3).await;
    assert!(h.channel.publish(threat(2, Severity::High, false)));

    let mut feed = h.handle.projection(LIVE_FEED).unwrap();
    let view = timeout(WAIT_TIMEOUT, feed.wait_for(|view| !view.is_empty()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ids(&view), vec!["2"]);
}

#[tokio::test]
async fn test_deactivation_releases_the_channel() {
    let h = start(Default::default());
    eventually(|| h.channel.is_subscribed()).await;

    h.handle.deactivate();
    timeout(WAIT_TIMEOUT, h.engine_task).await.unwrap().unwrap().unwrap();

    assert!(!h.channel.is_subscribed());
    assert_eq!(h.channel.unsubscribe_count(), 1);
    assert!(!h.channel.publish(threat(1, Severity::High, false)));
    assert!(h.handle.mark_read(1u64).await.is_err());
}

#[tokio::test]
async fn test_snapshot_resolving_after_deactivation_changes_nothing() {
    let service = InMemorySnapshotService::new(vec![threat(2, Severity::High, false), threat(1, Severity::Low, true)]);
    service.hold(Gate::Snapshot);
    service.hold(Gate::Stats);
    let h = start(service);
    eventually(|| h.channel.is_subscribed()).await;

    h.handle.deactivate();
    timeout(WAIT_TIMEOUT, h.engine_task).await.unwrap().unwrap().unwrap();
    h.service.release(Gate::Snapshot);
    h.service.release(Gate::Stats);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(h.handle.projection(BELL_DROPDOWN).unwrap().current_view().is_empty());
    assert_eq!(h.handle.stats(), Stats::default());
}
