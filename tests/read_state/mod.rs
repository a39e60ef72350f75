use notify_engine::adapters::memory::InMemorySnapshotService;
use notify_engine::Advisory;
use notify_engine::Error;
use notify_engine::NotificationId;
use notify_engine::ProjectionConfig;
use notify_engine::ReadStateError;
use notify_engine::Severity;
use notify_engine::NOTIFICATION_LIST;
use tokio::time::timeout;

use crate::common::start;
use crate::common::start_with_projection;
use crate::common::threat;
use crate::common::Harness;
use crate::common::WAIT_TIMEOUT;

fn three_unread() -> InMemorySnapshotService {
    InMemorySnapshotService::new(vec![
        threat(3, Severity::High, false),
        threat(2, Severity::Medium, false),
        threat(1, Severity::Low, false),
    ])
}

async fn loaded(h: &Harness) {
    let mut list = h.handle.projection(NOTIFICATION_LIST).unwrap();
    timeout(WAIT_TIMEOUT, list.wait_for(|view| view.len() == 3))
        .await
        .unwrap()
        .unwrap();
    let mut stats = h.handle.stats_receiver();
    timeout(WAIT_TIMEOUT, stats.wait_for(|s| s.total_count == 3))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_mark_read_is_confirmed_by_the_service() {
    let h = start(three_unread());
    loaded(&h).await;

    h.handle.mark_read(2u64).await.unwrap();
    h.handle.mark_read(2u64).await.unwrap();

    assert_eq!(h.service.is_read(&NotificationId::from(2u64)), Some(true));
    assert_eq!(h.handle.stats().unread_count, 2);
}

#[tokio::test]
async fn test_failed_confirmation_is_not_rolled_back() {
    let service = three_unread();
    service.fail_confirm(2u64);
    let mut h = start_with_projection(
        service,
        ProjectionConfig::new("confirmed-only", 20).with_include_unconfirmed(false),
    );
    loaded(&h).await;

    let result = h.handle.mark_read(2u64).await;

    assert!(matches!(
        result,
        Err(Error::ReadState(ReadStateError::Confirmation { .. }))
    ));
    assert!(result.unwrap_err().is_retryable());
    let list = h.handle.projection(NOTIFICATION_LIST).unwrap().current_view();
    assert!(list.iter().find(|n| n.id.as_str() == "2").unwrap().is_read);
    let strict = h.handle.projection("confirmed-only").unwrap().current_view();
    assert!(!strict.iter().find(|n| n.id.as_str() == "2").unwrap().is_read);
    assert_eq!(h.handle.stats().unread_count, 2);
    assert!(matches!(
        h.advisories.try_recv(),
        Ok(Advisory::ConfirmationFailed { .. })
    ));
}

#[tokio::test]
async fn test_mark_all_read_attempts_every_entry() {
    let service = three_unread();
    service.fail_confirm(3u64);
    let h = start(service);
    loaded(&h).await;

    let report = h.handle.mark_all_read(NOTIFICATION_LIST).await.unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.confirmed, 2);
    assert_eq!(report.failed, vec![NotificationId::from(3u64)]);
    let mut confirmed = h.service.confirmed();
    confirmed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(confirmed, vec![NotificationId::from(1u64), NotificationId::from(2u64)]);
    let list = h.handle.projection(NOTIFICATION_LIST).unwrap().current_view();
    assert!(list.iter().all(|n| n.is_read));
    assert_eq!(h.handle.stats().unread_count, 0);
    assert_eq!(h.handle.stats().unread_badge(), None);
}

#[tokio::test]
async fn test_unknown_id_changes_nothing() {
    let h = start(three_unread());
    loaded(&h).await;

    let result = h.handle.mark_read("does-not-exist").await;

    assert!(matches!(
        result,
        Err(Error::ReadState(ReadStateError::UnknownId(_)))
    ));
    assert_eq!(h.handle.stats().unread_count, 3);
    assert!(h.service.confirmed().is_empty());
}
