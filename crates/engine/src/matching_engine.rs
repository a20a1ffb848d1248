// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! The content-addressed correlator: joins sent-side and received-side
//! (and optional relay-leg) observations of the same XCM message across
//! independent block streams.

use crate::clock::Clock;
use crate::error::StoreError;
use crate::model::{
    sent_received_key, relay_key, MessageHash, PendingContext, PendingEntry, PendingKind,
    SubscriptionId, XcmInbound, XcmNotifyMessage, XcmRelayedContext, XcmSentContext,
};
use crate::pending_store::{Namespace, SharedPendingStore};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Per-(subscription, message hash) bookkeeping that is not itself a
/// pending half-match: whether the base `Sent` notification has already
/// fired, the last observed block hash (for the `(messageHash, blockHash)`
/// duplicate guard), and whether the hash has reached a terminal state
/// (`MATCHED` or `TIMED_OUT`), after which further observations are
/// ignored outright.
#[derive(Debug, Clone)]
struct LegMemo {
    last_block_hash: Option<String>,
    sent_emitted: bool,
    terminal: bool,
    expires_at_millis: u64,
}

impl LegMemo {
    fn new(expires_at_millis: u64) -> Self {
        Self {
            last_block_hash: None,
            sent_emitted: false,
            terminal: false,
            expires_at_millis,
        }
    }
}

type MemoKey = (SubscriptionId, MessageHash);

/// Callback the Switchboard supplies at construction time, breaking the
/// Switchboard <-> MatchingEngine reference cycle.
pub type WaypointCallback = Arc<dyn Fn(XcmNotifyMessage) + Send + Sync>;

pub struct MatchingEngine {
    store: SharedPendingStore,
    clock: Arc<dyn Clock>,
    /// Single process-wide mutex serializing `get -> delete-or-put`
    /// critical sections. Could be sharded by `hash(messageHash)` without
    /// changing semantics; not done here, a single mutex is adequate at
    /// current scale.
    critical_section: Mutex<()>,
    memo: Mutex<HashMap<MemoKey, LegMemo>>,
    inbound_ttl: Duration,
    relay_ttl: Duration,
    on_waypoint_reached: WaypointCallback,
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine").finish_non_exhaustive()
    }
}

impl MatchingEngine {
    pub fn new(
        store: SharedPendingStore,
        clock: Arc<dyn Clock>,
        inbound_ttl: Duration,
        relay_ttl: Duration,
        on_waypoint_reached: WaypointCallback,
    ) -> Self {
        Self {
            store,
            clock,
            critical_section: Mutex::new(()),
            memo: Mutex::new(HashMap::new()),
            inbound_ttl,
            relay_ttl,
            on_waypoint_reached,
        }
    }

    fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    fn emit(&self, message: XcmNotifyMessage) {
        (self.on_waypoint_reached)(message);
    }

    /// Returns `(is_duplicate_or_terminal, first_time_sent)` bookkeeping
    /// for this (subscription, hash, observed block) triple, updating the
    /// memo as a side effect.
    async fn check_memo(
        &self,
        sub: &SubscriptionId,
        hash: MessageHash,
        block_hash: &str,
        ttl: Duration,
        mark_sent_emitted: bool,
    ) -> MemoOutcome {
        let mut memo = self.memo.lock().await;
        let key = (sub.clone(), hash);
        let now = self.now();
        let entry = memo
            .entry(key)
            .or_insert_with(|| LegMemo::new(now + ttl.as_millis() as u64));

        if entry.terminal {
            return MemoOutcome::Terminal;
        }

        if entry.last_block_hash.as_deref() == Some(block_hash) {
            return MemoOutcome::Duplicate;
        }

        entry.last_block_hash = Some(block_hash.to_string());
        entry.expires_at_millis = now + ttl.as_millis() as u64;

        let first_time_sent = mark_sent_emitted && !entry.sent_emitted;
        if mark_sent_emitted {
            entry.sent_emitted = true;
        }

        MemoOutcome::Fresh { first_time_sent }
    }

    async fn mark_terminal(&self, sub: &SubscriptionId, hash: MessageHash) {
        let mut memo = self.memo.lock().await;
        memo.entry((sub.clone(), hash))
            .or_insert_with(|| LegMemo::new(self.now()))
            .terminal = true;
    }

    /// Records a sent-side observation and emits `Sent` the first time
    /// this (subscription, message hash) pair is seen.
    pub async fn on_outbound_message(
        &self,
        sub: SubscriptionId,
        sent: XcmSentContext,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let _guard = self.critical_section.lock().await;
        let hash = sent.message_hash;

        match self
            .check_memo(&sub, hash, &sent.block_hash, ttl, true)
            .await
        {
            MemoOutcome::Terminal | MemoOutcome::Duplicate => return Ok(()),
            MemoOutcome::Fresh { first_time_sent } => {
                if first_time_sent {
                    self.emit(XcmNotifyMessage::Sent {
                        subscription_id: sub.clone(),
                        sender: sent.sender.clone(),
                        sent: sent.clone(),
                    });
                }
            }
        }

        let key = sent_received_key(hash, &sent.destination);

        if let Some(inbound) = self.store.get(Namespace::Inbound, &key).await? {
            self.store.delete(Namespace::Inbound, &key).await?;
            if let PendingContext::Received(received) = inbound.context {
                let mut interested = inbound.subscription_ids;
                interested.insert(sub);
                for interested_sub in interested {
                    self.mark_terminal(&interested_sub, hash).await;
                    self.emit(XcmNotifyMessage::Received {
                        subscription_id: interested_sub,
                        sender: sent.sender.clone(),
                        sent: Some(sent.clone()),
                        received: received.clone(),
                    });
                }
            }
            return Ok(());
        }

        let relay_k = relay_key(hash, &sent.origin, &sent.destination);
        if let Some(relay_entry) = self.store.get(Namespace::Relay, &relay_k).await? {
            self.store.delete(Namespace::Relay, &relay_k).await?;
            if let PendingContext::Relayed(relayed) = relay_entry.context {
                let mut interested = relay_entry.subscription_ids;
                interested.insert(sub.clone());
                for interested_sub in interested {
                    self.emit(XcmNotifyMessage::Relayed {
                        subscription_id: interested_sub,
                        sender: sent.sender.clone(),
                        sent: Some(sent.clone()),
                        relayed: relayed.clone(),
                    });
                }
            }
        }

        let mut subscription_ids = match self.store.get(Namespace::Outbound, &key).await? {
            Some(existing) => existing.subscription_ids,
            None => HashSet::new(),
        };
        subscription_ids.insert(sub);

        let expires_at_millis = self.now() + ttl.as_millis() as u64;
        self.store
            .put(
                Namespace::Outbound,
                &key,
                PendingEntry {
                    key,
                    kind: PendingKind::Sent,
                    context: PendingContext::Sent(sent.clone()),
                    subscription_ids,
                    expires_at_millis,
                    observed_block_hash: sent.block_hash,
                },
            )
            .await
    }

    /// Records a received-side observation, joining it against any
    /// pending sent or relayed half-match for the same message hash.
    pub async fn on_inbound_message(
        &self,
        sub: SubscriptionId,
        inbound: XcmInbound,
    ) -> Result<(), StoreError> {
        let _guard = self.critical_section.lock().await;
        let received = inbound.received;
        let hash = received.message_hash;

        match self
            .check_memo(&sub, hash, &received.block_hash, self.inbound_ttl, false)
            .await
        {
            MemoOutcome::Terminal | MemoOutcome::Duplicate => return Ok(()),
            MemoOutcome::Fresh { .. } => {}
        }

        let key = sent_received_key(hash, &received.destination);

        if let Some(outbound) = self.store.get(Namespace::Outbound, &key).await? {
            self.store.delete(Namespace::Outbound, &key).await?;
            if let PendingContext::Sent(sent) = outbound.context {
                let mut interested = outbound.subscription_ids;
                interested.insert(sub);
                for interested_sub in interested {
                    self.mark_terminal(&interested_sub, hash).await;
                    self.emit(XcmNotifyMessage::Received {
                        subscription_id: interested_sub,
                        sender: sent.sender.clone(),
                        sent: Some(sent.clone()),
                        received: received.clone(),
                    });
                }
            }
            return Ok(());
        }

        let mut subscription_ids = match self.store.get(Namespace::Inbound, &key).await? {
            Some(existing) => existing.subscription_ids,
            None => HashSet::new(),
        };
        subscription_ids.insert(sub);

        let expires_at_millis = self.now() + self.inbound_ttl.as_millis() as u64;
        self.store
            .put(
                Namespace::Inbound,
                &key,
                PendingEntry {
                    key,
                    kind: PendingKind::Received,
                    context: PendingContext::Received(received.clone()),
                    subscription_ids,
                    expires_at_millis,
                    observed_block_hash: received.block_hash,
                },
            )
            .await
    }

    /// Records a relay-leg observation, joining it against a pending
    /// sent half-match and keeping it pending for the eventual received
    /// leg.
    pub async fn on_relayed_message(
        &self,
        sub: SubscriptionId,
        relayed: XcmRelayedContext,
    ) -> Result<(), StoreError> {
        let _guard = self.critical_section.lock().await;
        let hash = relayed.message_hash;

        match self
            .check_memo(&sub, hash, &relayed.relay_block_hash, self.relay_ttl, false)
            .await
        {
            MemoOutcome::Terminal | MemoOutcome::Duplicate => return Ok(()),
            MemoOutcome::Fresh { .. } => {}
        }

        let sent_key = sent_received_key(hash, &relayed.destination);

        if let Some(outbound) = self.store.get(Namespace::Outbound, &sent_key).await? {
            if let PendingContext::Sent(sent) = outbound.context {
                let mut interested = outbound.subscription_ids;
                interested.insert(sub);
                for interested_sub in interested {
                    self.emit(XcmNotifyMessage::Relayed {
                        subscription_id: interested_sub,
                        sender: sent.sender.clone(),
                        sent: Some(sent.clone()),
                        relayed: relayed.clone(),
                    });
                }
            }
            return Ok(());
        }

        let relay_k = relay_key(hash, &relayed.origin, &relayed.destination);
        let mut subscription_ids = match self.store.get(Namespace::Relay, &relay_k).await? {
            Some(existing) => existing.subscription_ids,
            None => HashSet::new(),
        };
        subscription_ids.insert(sub);

        let expires_at_millis = self.now() + self.relay_ttl.as_millis() as u64;
        self.store
            .put(
                Namespace::Relay,
                &relay_k,
                PendingEntry {
                    key: relay_k,
                    kind: PendingKind::Relayed,
                    context: PendingContext::Relayed(relayed.clone()),
                    subscription_ids,
                    expires_at_millis,
                    observed_block_hash: relayed.relay_block_hash,
                },
            )
            .await
    }

    /// Withdraws `sub` from every pending entry and forgets its leg memo
    /// so an unsubscribe racing an in-flight match cannot resurrect it.
    pub async fn clear_pending_states(&self, sub: &SubscriptionId) -> Result<(), StoreError> {
        let _guard = self.critical_section.lock().await;
        self.store.clear_for_subscription(sub).await?;
        let mut memo = self.memo.lock().await;
        memo.retain(|(memo_sub, _), _| memo_sub != sub);
        Ok(())
    }

    /// Background sweep: reaps expired entries, emitting `Timeout` for
    /// outbound (`Sent`-waiting) entries. Inbound and relay entries that
    /// age out are simply dropped -- `Timeout` is only meaningful for a
    /// sender still waiting on a receipt.
    pub async fn sweep(&self, now: u64) -> Result<(), StoreError> {
        let _guard = self.critical_section.lock().await;
        let expired = self.store.iter_expired(now).await?;

        for (ns, key, entry) in expired {
            match ns {
                Namespace::Outbound => {
                    if let PendingContext::Sent(sent) = &entry.context {
                        for sub in &entry.subscription_ids {
                            let memo_key = (sub.clone(), sent.message_hash);
                            let already_terminal = {
                                let memo = self.memo.lock().await;
                                memo.get(&memo_key).is_some_and(|m| m.terminal)
                            };
                            if already_terminal {
                                continue;
                            }
                            self.mark_terminal(sub, sent.message_hash).await;
                            self.emit(XcmNotifyMessage::Timeout {
                                subscription_id: sub.clone(),
                                sender: sent.sender.clone(),
                                context: entry.context.clone(),
                            });
                        }
                    }
                }
                Namespace::Inbound | Namespace::Relay => {
                    debug!(key = %key, "reaping expired half-match with no sender counterpart");
                }
            }
            if let Err(e) = self.store.delete(ns, &key).await {
                crate::metrics::STORE_ERRORS.inc();
                warn!(error = %e, key = %key, "failed to delete swept pending entry");
            }
        }

        Ok(())
    }
}

enum MemoOutcome {
    Terminal,
    Duplicate,
    Fresh { first_time_sent: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::model::{NetworkId, XcmOutcome, XcmReceivedContext};
    use crate::pending_store::InMemoryPendingStore;
    use std::sync::Mutex as StdMutex;

    fn sent_ctx(hash: [u8; 32], origin: &str, dest: &str, block: &str) -> XcmSentContext {
        XcmSentContext {
            message_hash: MessageHash(hash),
            message_id: None,
            origin: NetworkId::new(origin),
            destination: NetworkId::new(dest),
            sender: None,
            block_hash: block.to_string(),
            block_number: 1,
            extrinsic_id: "1-0".to_string(),
            sent_at: 0,
            outcome: XcmOutcome::Complete,
        }
    }

    fn received_ctx(hash: [u8; 32], dest: &str, block: &str) -> XcmReceivedContext {
        XcmReceivedContext {
            message_hash: MessageHash(hash),
            destination: NetworkId::new(dest),
            block_hash: block.to_string(),
            block_number: 2,
            outcome: XcmOutcome::Complete,
            error: None,
        }
    }

    fn build_engine() -> (MatchingEngine, Arc<FakeClock>, Arc<StdMutex<Vec<XcmNotifyMessage>>>) {
        let store: SharedPendingStore = Arc::new(InMemoryPendingStore::new());
        let clock = Arc::new(FakeClock::new(0));
        let events = Arc::new(StdMutex::new(Vec::new()));
        let events_clone = events.clone();
        let engine = MatchingEngine::new(
            store,
            clock.clone(),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            Arc::new(move |msg| events_clone.lock().unwrap().push(msg)),
        );
        (engine, clock, events)
    }

    fn kinds(events: &Arc<StdMutex<Vec<XcmNotifyMessage>>>) -> Vec<&'static str> {
        events
            .lock()
            .unwrap()
            .iter()
            .map(|m| match m {
                XcmNotifyMessage::Sent { .. } => "Sent",
                XcmNotifyMessage::Received { .. } => "Received",
                XcmNotifyMessage::Relayed { .. } => "Relayed",
                XcmNotifyMessage::Timeout { .. } => "Timeout",
                XcmNotifyMessage::Hop { .. } => "Hop",
            })
            .collect()
    }

    #[tokio::test]
    async fn scenario_1_match_in_order() {
        let (engine, _clock, events) = build_engine();
        let sent = sent_ctx([0xAA; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        let received = received_ctx([0xAA; 32], "urn:ocn:polkadot:2004", "0xb2");
        engine
            .on_inbound_message(
                "s1".into(),
                XcmInbound {
                    chain: NetworkId::new("urn:ocn:polkadot:2004"),
                    received,
                },
            )
            .await
            .unwrap();

        assert_eq!(kinds(&events), vec!["Sent", "Received"]);
    }

    #[tokio::test]
    async fn scenario_2_match_out_of_order() {
        let (engine, _clock, events) = build_engine();
        let received = received_ctx([0xBB; 32], "urn:ocn:polkadot:2004", "0xb2");
        engine
            .on_inbound_message(
                "s1".into(),
                XcmInbound {
                    chain: NetworkId::new("urn:ocn:polkadot:2004"),
                    received,
                },
            )
            .await
            .unwrap();

        let sent = sent_ctx([0xBB; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(kinds(&events), vec!["Sent", "Received"]);
    }

    #[tokio::test]
    async fn scenario_3_timeout_on_sweep() {
        let (engine, clock, events) = build_engine();
        let sent = sent_ctx([0xCC; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_millis(1000))
            .await
            .unwrap();

        clock.advance(Duration::from_millis(1100));
        engine.sweep(clock.now_millis()).await.unwrap();

        assert_eq!(kinds(&events), vec!["Sent", "Timeout"]);
    }

    #[tokio::test]
    async fn scenario_4_unsubscribe_race() {
        let (engine, _clock, events) = build_engine();
        let sent = sent_ctx([0xDD; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        engine.clear_pending_states(&"s1".to_string()).await.unwrap();

        let received = received_ctx([0xDD; 32], "urn:ocn:polkadot:2004", "0xb2");
        engine
            .on_inbound_message(
                "s1".into(),
                XcmInbound {
                    chain: NetworkId::new("urn:ocn:polkadot:2004"),
                    received,
                },
            )
            .await
            .unwrap();

        // Only the initial Sent fired; the counterpart after unsubscribe
        // produces no further emission for s1.
        assert_eq!(kinds(&events), vec!["Sent"]);
    }

    #[tokio::test]
    async fn duplicate_block_replay_does_not_re_emit() {
        let (engine, _clock, events) = build_engine();
        let sent = sent_ctx([0xEE; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent.clone(), Duration::from_secs(3600))
            .await
            .unwrap();
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(kinds(&events), vec!["Sent"]);
    }

    #[tokio::test]
    async fn relayed_then_sent_joins() {
        let (engine, _clock, events) = build_engine();
        let relayed = XcmRelayedContext {
            message_hash: MessageHash([0xFF; 32]),
            origin: NetworkId::new("urn:ocn:polkadot:1000"),
            destination: NetworkId::new("urn:ocn:polkadot:2004"),
            relay_block_hash: "0xr1".to_string(),
            relay_block_number: 5,
        };
        engine.on_relayed_message("s1".into(), relayed).await.unwrap();

        let sent = sent_ctx([0xFF; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(kinds(&events), vec!["Sent", "Relayed"]);
    }

    #[tokio::test]
    async fn sent_then_relayed_emits_relayed_without_consuming_sent() {
        let (engine, _clock, events) = build_engine();
        let sent = sent_ctx([0x11; 32], "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1");
        engine
            .on_outbound_message("s1".into(), sent, Duration::from_secs(3600))
            .await
            .unwrap();

        let relayed = XcmRelayedContext {
            message_hash: MessageHash([0x11; 32]),
            origin: NetworkId::new("urn:ocn:polkadot:1000"),
            destination: NetworkId::new("urn:ocn:polkadot:2004"),
            relay_block_hash: "0xr1".to_string(),
            relay_block_number: 5,
        };
        engine.on_relayed_message("s1".into(), relayed).await.unwrap();

        // The sent leg is still pending (not consumed by the relay join);
        // a subsequent Received still completes the match.
        let received = received_ctx([0x11; 32], "urn:ocn:polkadot:2004", "0xb2");
        engine
            .on_inbound_message(
                "s1".into(),
                XcmInbound {
                    chain: NetworkId::new("urn:ocn:polkadot:2004"),
                    received,
                },
            )
            .await
            .unwrap();

        assert_eq!(kinds(&events), vec!["Sent", "Relayed", "Received"]);
    }

    #[tokio::test]
    async fn received_fans_out_to_every_subscription_on_the_corridor() {
        let (engine, _clock, events) = build_engine();
        let hash = [0x22; 32];

        engine
            .on_outbound_message(
                "s1".into(),
                sent_ctx(hash, "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1"),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
        engine
            .on_outbound_message(
                "s2".into(),
                sent_ctx(hash, "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1"),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        let received = received_ctx(hash, "urn:ocn:polkadot:2004", "0xb2");
        engine
            .on_inbound_message(
                "s3".into(),
                XcmInbound {
                    chain: NetworkId::new("urn:ocn:polkadot:2004"),
                    received,
                },
            )
            .await
            .unwrap();

        let received_subs: Vec<String> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m, XcmNotifyMessage::Received { .. }))
            .map(|m| m.subscription_id().to_string())
            .collect();

        assert_eq!(received_subs.len(), 3);
        assert!(received_subs.contains(&"s1".to_string()));
        assert!(received_subs.contains(&"s2".to_string()));
        assert!(received_subs.contains(&"s3".to_string()));
    }

    #[tokio::test]
    async fn relayed_fans_out_to_every_subscription_waiting_on_sent() {
        let (engine, _clock, events) = build_engine();
        let hash = [0x33; 32];

        engine
            .on_outbound_message(
                "s1".into(),
                sent_ctx(hash, "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1"),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();
        engine
            .on_outbound_message(
                "s2".into(),
                sent_ctx(hash, "urn:ocn:polkadot:1000", "urn:ocn:polkadot:2004", "0xb1"),
                Duration::from_secs(3600),
            )
            .await
            .unwrap();

        let relayed = XcmRelayedContext {
            message_hash: MessageHash(hash),
            origin: NetworkId::new("urn:ocn:polkadot:1000"),
            destination: NetworkId::new("urn:ocn:polkadot:2004"),
            relay_block_hash: "0xr1".to_string(),
            relay_block_number: 5,
        };
        engine.on_relayed_message("s3".into(), relayed).await.unwrap();

        let relayed_subs: Vec<String> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|m| matches!(m, XcmNotifyMessage::Relayed { .. }))
            .map(|m| m.subscription_id().to_string())
            .collect();

        assert_eq!(relayed_subs.len(), 3);
        assert!(relayed_subs.contains(&"s1".to_string()));
        assert!(relayed_subs.contains(&"s2".to_string()));
        assert!(relayed_subs.contains(&"s3".to_string()));
    }
}
