// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Per-chain shared, reference-counted finalized-block streams. At most
//! one upstream subscription exists per `NetworkId`; attaching an
//! observer is cheap and detaching the last observer releases the
//! upstream. Backpressure is bounded by the slowest observer -- the
//! forwarding task blocks (never drops) on a full channel.

use crate::model::NetworkId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Bound on each observer's mailbox. A slow observer stalls delivery to
/// every other observer on the same chain and ultimately the upstream
/// poll -- no message is ever silently dropped.
const OBSERVER_CHANNEL_CAPACITY: usize = 256;

pub type BlockEventStream<T> = mpsc::Receiver<T>;

struct ChainChannel<T> {
    senders: Vec<mpsc::Sender<T>>,
}

impl<T> Default for ChainChannel<T> {
    fn default() -> Self {
        Self { senders: Vec::new() }
    }
}

/// Registry of one shared stream per chain and per stream flavor (events
/// vs. extrinsics), generic over the decoded item type so the hub does
/// not need to know the block-decoding format.
pub struct StreamHub<T: Clone + Send + 'static> {
    channels: Mutex<HashMap<NetworkId, Arc<Mutex<ChainChannel<T>>>>>,
}

impl<T: Clone + Send + 'static> Default for StreamHub<T> {
    fn default() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone + Send + std::fmt::Debug + 'static> StreamHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new observer to `chain`, returning a receiver. Multiple
    /// observers may attach concurrently; each gets its own bounded
    /// mailbox fed by the hub's single forwarding loop for that chain.
    pub async fn attach(&self, chain: NetworkId) -> BlockEventStream<T> {
        let mut channels = self.channels.lock().await;
        let entry = channels.entry(chain).or_default();
        let mut chain_channel = entry.lock().await;
        let (tx, rx) = mpsc::channel(OBSERVER_CHANNEL_CAPACITY);
        chain_channel.senders.push(tx);
        rx
    }

    /// Forwards one decoded item to every live observer on `chain`,
    /// blocking on each send so a slow observer backpressures the
    /// upstream poll rather than silently dropping items. Closed senders
    /// (the observer dropped its receiver) are pruned.
    pub async fn publish(&self, chain: &NetworkId, item: T) {
        let entry = {
            let channels = self.channels.lock().await;
            channels.get(chain).cloned()
        };

        let Some(entry) = entry else {
            debug!(chain = %chain, "publish with no attached observers");
            return;
        };

        let mut chain_channel = entry.lock().await;
        let mut still_alive = Vec::with_capacity(chain_channel.senders.len());
        for sender in chain_channel.senders.drain(..) {
            match sender.send(item.clone()).await {
                Ok(()) => still_alive.push(sender),
                Err(_closed) => {
                    warn!(chain = %chain, "observer channel closed, releasing slot");
                }
            }
        }
        chain_channel.senders = still_alive;
    }

    /// Number of live observers currently attached to `chain`, used by
    /// callers deciding whether to keep an upstream connection alive.
    pub async fn observer_count(&self, chain: &NetworkId) -> usize {
        let channels = self.channels.lock().await;
        match channels.get(chain) {
            Some(entry) => entry.lock().await.senders.len(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn multiple_observers_all_receive() {
        let hub: StreamHub<u32> = StreamHub::new();
        let chain = NetworkId::new("urn:ocn:polkadot:1000");
        let mut rx1 = hub.attach(chain.clone()).await;
        let mut rx2 = hub.attach(chain.clone()).await;

        hub.publish(&chain, 42).await;

        assert_eq!(rx1.recv().await, Some(42));
        assert_eq!(rx2.recv().await, Some(42));
    }

    #[tokio::test]
    async fn dropped_observer_is_pruned() {
        let hub: StreamHub<u32> = StreamHub::new();
        let chain = NetworkId::new("urn:ocn:polkadot:1000");
        let rx = hub.attach(chain.clone()).await;
        assert_eq!(hub.observer_count(&chain).await, 1);
        drop(rx);

        hub.publish(&chain, 1).await;
        assert_eq!(hub.observer_count(&chain).await, 0);
    }

    #[tokio::test]
    async fn separate_chains_do_not_cross_deliver() {
        let hub: StreamHub<u32> = StreamHub::new();
        let a = NetworkId::new("urn:ocn:polkadot:1000");
        let b = NetworkId::new("urn:ocn:polkadot:2004");
        let mut rx_a = hub.attach(a.clone()).await;
        let mut rx_b = hub.attach(b.clone()).await;

        hub.publish(&a, 7).await;

        assert_eq!(rx_a.recv().await, Some(7));
        assert!(rx_b.try_recv().is_err());
    }
}
