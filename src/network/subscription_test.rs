use std::sync::Arc;

use tokio::sync::mpsc;

use crate::ChannelError;
use crate::ChannelEvent;
use crate::Error;
use crate::MockEventChannel;
use crate::Subscription;

#[tokio::test]
async fn test_release_is_idempotent_and_runs_on_drop() {
    let (tx, rx) = mpsc::channel(4);
    let mut channel = MockEventChannel::new();
    channel.expect_subscribe().times(1).return_once(move || Ok(rx));
    channel.expect_unsubscribe().times(1).return_const(());

    let mut subscription = Subscription::open(Arc::new(channel)).expect("subscribe should succeed");
    tx.send(ChannelEvent::Connected).await.unwrap();
    assert_eq!(subscription.recv().await, Some(ChannelEvent::Connected));

    subscription.release();
    subscription.release();
    assert!(!subscription.is_active());
    assert_eq!(subscription.recv().await, None);
    drop(subscription);
}

#[tokio::test]
async fn test_drop_releases_active_subscription() {
    let (_tx, rx) = mpsc::channel(4);
    let mut channel = MockEventChannel::new();
    channel.expect_subscribe().times(1).return_once(move || Ok(rx));
    channel.expect_unsubscribe().times(1).return_const(());

    let subscription = Subscription::open(Arc::new(channel)).expect("subscribe should succeed");
    drop(subscription);
}

#[test]
fn test_open_propagates_subscribe_failure() {
    let mut channel = MockEventChannel::new();
    channel
        .expect_subscribe()
        .times(1)
        .returning(|| Err(ChannelError::AlreadySubscribed.into()));
    channel.expect_unsubscribe().never();

    let result = Subscription::open(Arc::new(channel));
    assert!(matches!(result, Err(Error::Channel(ChannelError::AlreadySubscribed))));
}
