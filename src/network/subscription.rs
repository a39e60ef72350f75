use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;
use tracing::trace;

use super::ChannelEvent;
use super::EventChannel;
use crate::Result;

/// An open subscription on an [`EventChannel`].
///
/// Dropping the subscription releases it on the channel, so a surface that
/// goes away never leaves a dangling listener behind.
pub struct Subscription {
    channel: Arc<dyn EventChannel>,
    receiver: Option<mpsc::Receiver<ChannelEvent>>,
}

impl Subscription {
    pub fn open(channel: Arc<dyn EventChannel>) -> Result<Self> {
        let receiver = channel.subscribe()?;
        debug!("subscribed to event channel");
        Ok(Self {
            channel,
            receiver: Some(receiver),
        })
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn join(&self) -> Result<()> {
        self.channel.join()
    }

    /// Next event, or `None` once released or once the channel hung up
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        match self.receiver.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Releases the subscription. Safe to call any number of times.
    pub fn release(&mut self) {
        if let Some(mut rx) = self.receiver.take() {
            rx.close();
            self.channel.unsubscribe();
            trace!("event channel subscription released");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription").field("active", &self.is_active()).finish()
    }
}
