//! Label channels between translation sessions and label streams.
//!
//! Channels are created on first use from either end. A channel is dropped
//! again once it has neither a publishing connection nor a subscribed stream,
//! so names requested once do not pile up.
use std::collections::HashMap;

use tokio::sync::{broadcast, Mutex};

/// Capacity per channel. Subscribers falling further behind skip stale labels.
const CHANNEL_CAPACITY: usize = 20;

pub type LabelSender = broadcast::Sender<String>;
pub type LabelReceiver = broadcast::Receiver<String>;

struct LabelChannel {
    tx: LabelSender,
    publishers: usize,
}

impl LabelChannel {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx, publishers: 0 }
    }

    fn is_idle(&self) -> bool {
        self.publishers == 0 && self.tx.receiver_count() == 0
    }
}

/// Label channels by name.
#[derive(Default)]
pub struct NamedPubSub {
    map: Mutex<HashMap<String, LabelChannel>>,
}

impl NamedPubSub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a publisher on `name`.
    ///
    /// Each call must be paired with `release_publisher` once the publisher is
    /// gone.
    pub async fn publish(&self, name: &str) -> LabelSender {
        let mut map = self.map.lock().await;
        let channel = map.entry(name.to_owned()).or_insert_with(LabelChannel::new);
        channel.publishers += 1;
        channel.tx.clone()
    }

    pub async fn release_publisher(&self, name: &str) {
        let mut map = self.map.lock().await;
        if let Some(channel) = map.get_mut(name) {
            channel.publishers = channel.publishers.saturating_sub(1);
        }
        prune(&mut map);
    }

    /// Subscribe to `name`. Dropping the receiver unsubscribes.
    pub async fn subscribe(&self, name: &str) -> LabelReceiver {
        let mut map = self.map.lock().await;
        prune(&mut map);
        map.entry(name.to_owned())
            .or_insert_with(LabelChannel::new)
            .tx
            .subscribe()
    }

    /// Number of channels currently kept.
    pub async fn len(&self) -> usize {
        self.map.lock().await.len()
    }
}

fn prune(map: &mut HashMap<String, LabelChannel>) {
    map.retain(|name, channel| {
        let idle = channel.is_idle();
        if idle {
            log::debug!("Dropping idle label channel {}", name);
        }
        !idle
    });
}
