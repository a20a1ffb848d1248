// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! The per-subscription monitor: owns the subscription registry,
//! wires origin/destination/relay observer legs per subscription, recovers
//! failing legs, and fans matched notifications out to the `NotifierHub`.

use crate::control_query::{self, ControlQuery, QueryRecord};
use crate::error::SwitchboardError;
use crate::matching_engine::MatchingEngine;
use crate::model::{
    NetworkId, Subscription, SubscriptionId, WaypointKind, XcmInbound, XcmNotifyMessage,
};
use crate::notifier::NotifierHub;
use crate::sources::{
    destination_protocol, origin_protocols, relay_leg_applicable, BlockSource, ExtractorRegistry,
    SignedBlockWithEvents, XcmProtocol,
};
use crate::stream_hub::StreamHub;
use crate::subscription_store::SubscriptionStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Which observer leg failed, so the supervisor knows what to re-derive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LegKind {
    Origin(XcmProtocol),
    Destination(NetworkId),
    Relay,
}

struct LegFailure {
    subscription_id: SubscriptionId,
    leg: LegKind,
}

struct SubscriptionHandler {
    descriptor: Subscription,
    sender_control: Arc<ControlQuery>,
    message_control: Arc<ControlQuery>,
    origin_tasks: HashMap<XcmProtocol, JoinHandle<()>>,
    destination_tasks: HashMap<NetworkId, JoinHandle<()>>,
    relay_task: Option<JoinHandle<()>>,
}

impl SubscriptionHandler {
    fn abort_all(&mut self) {
        for (_, handle) in self.origin_tasks.drain() {
            handle.abort();
        }
        for (_, handle) in self.destination_tasks.drain() {
            handle.abort();
        }
        if let Some(handle) = self.relay_task.take() {
            handle.abort();
        }
    }
}

pub struct Switchboard {
    engine: Arc<MatchingEngine>,
    notifier_hub: Arc<NotifierHub>,
    subscription_store: Arc<dyn SubscriptionStore>,
    block_source: Arc<dyn BlockSource>,
    extractors: Arc<dyn ExtractorRegistry>,
    stream_hub: Arc<StreamHub<Arc<SignedBlockWithEvents>>>,
    subscriptions: Arc<Mutex<HashMap<SubscriptionId, SubscriptionHandler>>>,
    chain_pumps: Mutex<HashSet<NetworkId>>,
    max_ephemeral: u32,
    max_persistent: u32,
    sub_error_retry: Duration,
    fail_tx: mpsc::Sender<LegFailure>,
}

impl Switchboard {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        engine: Arc<MatchingEngine>,
        notifier_hub: Arc<NotifierHub>,
        subscription_store: Arc<dyn SubscriptionStore>,
        block_source: Arc<dyn BlockSource>,
        extractors: Arc<dyn ExtractorRegistry>,
        max_ephemeral: u32,
        max_persistent: u32,
        sub_error_retry: Duration,
    ) -> Arc<Self> {
        let (fail_tx, fail_rx) = mpsc::channel(1024);
        let switchboard = Arc::new(Self {
            engine,
            notifier_hub,
            subscription_store,
            block_source,
            extractors,
            stream_hub: Arc::new(StreamHub::new()),
            subscriptions: Arc::new(Mutex::new(HashMap::new())),
            chain_pumps: Mutex::new(HashSet::new()),
            max_ephemeral,
            max_persistent,
            sub_error_retry,
            fail_tx,
        });
        switchboard.clone().spawn_supervisor(fail_rx);
        switchboard
    }

    fn spawn_supervisor(self: Arc<Self>, mut fail_rx: mpsc::Receiver<LegFailure>) {
        tokio::spawn(async move {
            while let Some(failure) = fail_rx.recv().await {
                let retry_after = self.sub_error_retry;
                let switchboard = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(retry_after).await;
                    switchboard.reattach_leg(failure).await;
                });
            }
        });
    }

    async fn reattach_leg(self: &Arc<Self>, failure: LegFailure) {
        let mut subs = self.subscriptions.lock().await;
        let Some(handler) = subs.get_mut(&failure.subscription_id) else {
            return;
        };
        let descriptor = handler.descriptor.clone();
        let message_control = handler.message_control.clone();

        match failure.leg {
            LegKind::Origin(protocol) => {
                let task = self.spawn_origin_leg(
                    descriptor.id.clone(),
                    descriptor.origin.clone(),
                    protocol,
                    message_control,
                    descriptor.outbound_ttl,
                );
                handler.origin_tasks.insert(protocol, task);
            }
            LegKind::Destination(destination) => {
                let protocol = destination_protocol(&descriptor.origin, &destination);
                let task = self.spawn_destination_leg(
                    descriptor.id.clone(),
                    destination.clone(),
                    protocol,
                    message_control,
                );
                handler.destination_tasks.insert(destination, task);
            }
            LegKind::Relay => {
                let task = self.spawn_relay_leg(
                    descriptor.id.clone(),
                    descriptor.origin.clone(),
                    message_control,
                );
                handler.relay_task = Some(task);
            }
        }
        info!(subscription_id = %failure.subscription_id, "re-attached observer leg after backoff");
    }

    /// Ensures a single upstream pull task is running for `chain`,
    /// forwarding its finalized blocks into the shared `StreamHub`.
    async fn ensure_chain_pump(&self, chain: NetworkId) {
        let mut pumps = self.chain_pumps.lock().await;
        if pumps.contains(&chain) {
            return;
        }
        pumps.insert(chain.clone());
        drop(pumps);

        let block_source = self.block_source.clone();
        let stream_hub = self.stream_hub.clone();
        let chain_for_task = chain.clone();
        tokio::spawn(async move {
            use futures::StreamExt;
            match block_source.finalized_blocks(&chain_for_task).await {
                Ok(mut stream) => {
                    while let Some(block) = stream.next().await {
                        stream_hub.publish(&chain_for_task, Arc::new(block)).await;
                    }
                    crate::metrics::SUBSCRIPTION_ERRORS.inc();
                    warn!(chain = %chain_for_task, "finalized block stream ended");
                }
                Err(e) => {
                    crate::metrics::SUBSCRIPTION_ERRORS.inc();
                    warn!(chain = %chain_for_task, error = %e, "failed to open finalized block stream");
                }
            }
        });
    }

    fn spawn_origin_leg(
        self: &Arc<Self>,
        sub_id: SubscriptionId,
        origin: NetworkId,
        protocol: XcmProtocol,
        message_control: Arc<ControlQuery>,
        ttl: Duration,
    ) -> JoinHandle<()> {
        let switchboard = self.clone();
        tokio::spawn(async move {
            switchboard.ensure_chain_pump(origin.clone()).await;
            let mut rx = switchboard.stream_hub.attach(origin.clone()).await;
            let extractor = switchboard.extractors.extractor_for(protocol);

            loop {
                match rx.recv().await {
                    Some(block) => {
                        for sent in extractor.extract_sent(&origin, &block) {
                            let record = QueryRecord {
                                signer: sent.sender.clone(),
                                extra_signers: vec![],
                                recipient: Some(sent.destination.clone()),
                            };
                            if !message_control.matches(&record) {
                                continue;
                            }
                            if let Err(e) = switchboard
                                .engine
                                .on_outbound_message(sub_id.clone(), sent, ttl)
                                .await
                            {
                                crate::metrics::STORE_ERRORS.inc();
                                warn!(error = %e, "pending store error handling outbound message");
                            }
                        }
                    }
                    None => {
                        let _ = switchboard
                            .fail_tx
                            .send(LegFailure {
                                subscription_id: sub_id,
                                leg: LegKind::Origin(protocol),
                            })
                            .await;
                        return;
                    }
                }
            }
        })
    }

    fn spawn_destination_leg(
        self: &Arc<Self>,
        sub_id: SubscriptionId,
        destination: NetworkId,
        protocol: XcmProtocol,
        message_control: Arc<ControlQuery>,
    ) -> JoinHandle<()> {
        let switchboard = self.clone();
        tokio::spawn(async move {
            switchboard.ensure_chain_pump(destination.clone()).await;
            let mut rx = switchboard.stream_hub.attach(destination.clone()).await;
            let extractor = switchboard.extractors.extractor_for(protocol);

            loop {
                match rx.recv().await {
                    Some(block) => {
                        for received in extractor.extract_received(&destination, &block) {
                            let record = QueryRecord {
                                recipient: Some(received.destination.clone()),
                                ..Default::default()
                            };
                            if !message_control.matches(&record) {
                                continue;
                            }
                            let inbound = XcmInbound {
                                chain: destination.clone(),
                                received,
                            };
                            if let Err(e) = switchboard
                                .engine
                                .on_inbound_message(sub_id.clone(), inbound)
                                .await
                            {
                                crate::metrics::STORE_ERRORS.inc();
                                warn!(error = %e, "pending store error handling inbound message");
                            }
                        }
                    }
                    None => {
                        let _ = switchboard
                            .fail_tx
                            .send(LegFailure {
                                subscription_id: sub_id,
                                leg: LegKind::Destination(destination),
                            })
                            .await;
                        return;
                    }
                }
            }
        })
    }

    fn spawn_relay_leg(
        self: &Arc<Self>,
        sub_id: SubscriptionId,
        origin: NetworkId,
        message_control: Arc<ControlQuery>,
    ) -> JoinHandle<()> {
        let switchboard = self.clone();
        tokio::spawn(async move {
            switchboard.ensure_chain_pump(origin.clone()).await;
            let mut rx = switchboard.stream_hub.attach(origin.clone()).await;
            let extractor = switchboard.extractors.extractor_for(XcmProtocol::Horizontal);

            loop {
                match rx.recv().await {
                    Some(block) => {
                        for relayed in extractor.extract_relayed(&origin, &block) {
                            let record = QueryRecord {
                                recipient: Some(relayed.destination.clone()),
                                ..Default::default()
                            };
                            if !message_control.matches(&record) {
                                continue;
                            }
                            if let Err(e) = switchboard
                                .engine
                                .on_relayed_message(sub_id.clone(), relayed)
                                .await
                            {
                                crate::metrics::STORE_ERRORS.inc();
                                warn!(error = %e, "pending store error handling relayed message");
                            }
                        }
                    }
                    None => {
                        let _ = switchboard
                            .fail_tx
                            .send(LegFailure {
                                subscription_id: sub_id,
                                leg: LegKind::Relay,
                            })
                            .await;
                        return;
                    }
                }
            }
        })
    }

    async fn monitor(self: &Arc<Self>, descriptor: Subscription) {
        let sender_control = Arc::new(control_query::sender_control(&descriptor.senders));
        let message_control = Arc::new(control_query::message_control(&descriptor.destinations));

        let mut origin_tasks = HashMap::new();
        for protocol in origin_protocols(&descriptor.origin) {
            origin_tasks.insert(
                protocol,
                self.spawn_origin_leg(
                    descriptor.id.clone(),
                    descriptor.origin.clone(),
                    protocol,
                    message_control.clone(),
                    descriptor.outbound_ttl,
                ),
            );
        }

        let mut destination_tasks = HashMap::new();
        for destination in &descriptor.destinations {
            let protocol = destination_protocol(&descriptor.origin, destination);
            destination_tasks.insert(
                destination.clone(),
                self.spawn_destination_leg(
                    descriptor.id.clone(),
                    destination.clone(),
                    protocol,
                    message_control.clone(),
                ),
            );
        }

        let relay_task = if descriptor.events.admits(WaypointKind::Relayed)
            && relay_leg_applicable(&descriptor.origin, &descriptor.destinations)
        {
            Some(self.spawn_relay_leg(
                descriptor.id.clone(),
                descriptor.origin.clone(),
                message_control.clone(),
            ))
        } else {
            None
        };

        let handler = SubscriptionHandler {
            descriptor,
            sender_control,
            message_control,
            origin_tasks,
            destination_tasks,
            relay_task,
        };

        let mut subs = self.subscriptions.lock().await;
        subs.insert(handler.descriptor.id.clone(), handler);
    }

    fn ephemeral_count(subs: &HashMap<SubscriptionId, SubscriptionHandler>) -> u32 {
        subs.values().filter(|h| h.descriptor.ephemeral).count() as u32
    }

    fn persistent_count(subs: &HashMap<SubscriptionId, SubscriptionHandler>) -> u32 {
        subs.values().filter(|h| !h.descriptor.ephemeral).count() as u32
    }

    /// Registers a new subscription, rejecting it over the ephemeral or
    /// persistent subscriber cap, then wires its observer legs.
    pub async fn subscribe(self: &Arc<Self>, descriptor: Subscription) -> Result<(), SwitchboardError> {
        {
            let subs = self.subscriptions.lock().await;
            if descriptor.ephemeral && Self::ephemeral_count(&subs) >= self.max_ephemeral {
                return Err(SwitchboardError::TooManySubscribers);
            }
            if !descriptor.ephemeral && Self::persistent_count(&subs) >= self.max_persistent {
                return Err(SwitchboardError::TooManySubscribers);
            }
        }

        if !descriptor.ephemeral {
            self.subscription_store.insert(descriptor.clone()).await?;
        }

        self.monitor(descriptor).await;
        Ok(())
    }

    /// Tears down every observer leg for `id` and removes it from the
    /// registry. Idempotent: removing an unknown id is not an error.
    pub async fn unsubscribe(self: &Arc<Self>, id: &SubscriptionId) -> Result<(), SwitchboardError> {
        let removed = {
            let mut subs = self.subscriptions.lock().await;
            subs.remove(id)
        };

        if let Some(mut handler) = removed {
            handler.abort_all();
        }

        self.engine.clear_pending_states(id).await?;
        self.subscription_store.remove(id).await?;
        Ok(())
    }

    /// Atomically replaces the sender filter and re-derives the sender
    /// control, leaving observer legs untouched.
    pub async fn update_senders(
        self: &Arc<Self>,
        id: &SubscriptionId,
        senders: crate::model::SenderFilter,
    ) -> Result<(), SwitchboardError> {
        let mut subs = self.subscriptions.lock().await;
        let handler = subs
            .get_mut(id)
            .ok_or_else(|| SwitchboardError::UnknownSubscription(id.clone()))?;
        handler.descriptor.senders = senders;
        handler.descriptor.validate()?;
        handler
            .sender_control
            .change(control_query::predicate_from_sender_filter(&handler.descriptor.senders));
        self.persist_if_needed(&handler.descriptor).await?;
        Ok(())
    }

    /// Atomically replaces the destination set, re-derives the message
    /// control, and adds/removes destination observer legs accordingly.
    pub async fn update_destinations(
        self: &Arc<Self>,
        id: &SubscriptionId,
        destinations: HashSet<NetworkId>,
    ) -> Result<(), SwitchboardError> {
        let (origin, old_destinations, message_control, events_admit_relayed) = {
            let mut subs = self.subscriptions.lock().await;
            let handler = subs
                .get_mut(id)
                .ok_or_else(|| SwitchboardError::UnknownSubscription(id.clone()))?;

            let candidate = Subscription {
                destinations: destinations.clone(),
                ..handler.descriptor.clone()
            };
            candidate.validate()?;

            let old_destinations = std::mem::replace(&mut handler.descriptor.destinations, destinations);
            handler
                .message_control
                .change(control_query::predicate_from_destinations(&handler.descriptor.destinations));

            for removed in old_destinations.difference(&handler.descriptor.destinations) {
                if let Some(task) = handler.destination_tasks.remove(removed) {
                    task.abort();
                }
            }

            (
                handler.descriptor.origin.clone(),
                old_destinations,
                handler.message_control.clone(),
                handler.descriptor.events.admits(WaypointKind::Relayed),
            )
        };

        let new_destinations: Vec<NetworkId> = {
            let subs = self.subscriptions.lock().await;
            subs.get(id)
                .map(|h| {
                    h.descriptor
                        .destinations
                        .difference(&old_destinations)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        for destination in new_destinations {
            let protocol = destination_protocol(&origin, &destination);
            let task =
                self.spawn_destination_leg(id.clone(), destination.clone(), protocol, message_control.clone());
            let mut subs = self.subscriptions.lock().await;
            if let Some(handler) = subs.get_mut(id) {
                handler.destination_tasks.insert(destination, task);
            }
        }

        {
            let mut subs = self.subscriptions.lock().await;
            if let Some(handler) = subs.get_mut(id) {
                let wants_relay = events_admit_relayed
                    && relay_leg_applicable(&handler.descriptor.origin, &handler.descriptor.destinations);
                if wants_relay && handler.relay_task.is_none() {
                    handler.relay_task = Some(self.spawn_relay_leg(
                        id.clone(),
                        handler.descriptor.origin.clone(),
                        handler.message_control.clone(),
                    ));
                } else if !wants_relay {
                    if let Some(task) = handler.relay_task.take() {
                        task.abort();
                    }
                }
            }
        }

        let descriptor = {
            let subs = self.subscriptions.lock().await;
            subs.get(id).map(|h| h.descriptor.clone())
        };
        if let Some(descriptor) = descriptor {
            self.persist_if_needed(&descriptor).await?;
        }

        Ok(())
    }

    /// Atomically replaces the event-kind filter, adding or tearing down
    /// the relay observer leg as needed.
    pub async fn update_events(
        self: &Arc<Self>,
        id: &SubscriptionId,
        events: crate::model::EventFilter,
    ) -> Result<(), SwitchboardError> {
        let (origin, destinations, message_control, wants_relay) = {
            let mut subs = self.subscriptions.lock().await;
            let handler = subs
                .get_mut(id)
                .ok_or_else(|| SwitchboardError::UnknownSubscription(id.clone()))?;
            handler.descriptor.events = events;
            let wants_relay = handler.descriptor.events.admits(WaypointKind::Relayed)
                && relay_leg_applicable(&handler.descriptor.origin, &handler.descriptor.destinations);
            (
                handler.descriptor.origin.clone(),
                handler.descriptor.destinations.clone(),
                handler.message_control.clone(),
                wants_relay,
            )
        };
        let _ = destinations;

        let mut subs = self.subscriptions.lock().await;
        if let Some(handler) = subs.get_mut(id) {
            if wants_relay && handler.relay_task.is_none() {
                handler.relay_task = Some(self.spawn_relay_leg(id.clone(), origin, message_control));
            } else if !wants_relay {
                if let Some(task) = handler.relay_task.take() {
                    task.abort();
                }
            }
        }
        drop(subs);

        let descriptor = {
            let subs = self.subscriptions.lock().await;
            subs.get(id).map(|h| h.descriptor.clone())
        };
        if let Some(descriptor) = descriptor {
            self.persist_if_needed(&descriptor).await?;
        }
        Ok(())
    }

    /// Full-descriptor update: unsubscribes and re-subscribes atomically
    /// from the caller's perspective (old legs torn down, new legs wired,
    /// pending state for the old criteria cleared).
    pub async fn update_subscription(self: &Arc<Self>, sub: Subscription) -> Result<(), SwitchboardError> {
        sub.validate()?;
        self.unsubscribe(&sub.id).await?;
        self.subscribe(sub).await
    }

    async fn persist_if_needed(&self, descriptor: &Subscription) -> Result<(), SwitchboardError> {
        if !descriptor.ephemeral {
            self.subscription_store.insert(descriptor.clone()).await?;
        }
        Ok(())
    }

    /// Loads every persisted subscription and begins monitoring it.
    pub async fn start(self: &Arc<Self>) -> Result<(), SwitchboardError> {
        let persisted = self.subscription_store.list_all().await?;
        for descriptor in persisted {
            self.monitor(descriptor).await;
        }
        Ok(())
    }

    /// Detaches every observer leg without touching persisted
    /// subscription records or pending state.
    pub async fn stop(self: &Arc<Self>) {
        let mut subs = self.subscriptions.lock().await;
        for (_, mut handler) in subs.drain() {
            handler.abort_all();
        }
    }

    /// Notification fan-out: re-checks the subscription's current event
    /// and sender filters before forwarding to the `NotifierHub`,
    /// since the descriptor may have mutated since the leg was observed.
    pub async fn dispatch(&self, message: XcmNotifyMessage) {
        let snapshot = {
            let subs = self.subscriptions.lock().await;
            subs.get(message.subscription_id())
                .map(|h| (h.descriptor.clone(), h.sender_control.clone()))
        };

        let Some((descriptor, sender_control)) = snapshot else {
            return;
        };

        if !descriptor.events.admits(message.kind()) {
            return;
        }

        let record = QueryRecord {
            signer: message.sender().cloned(),
            ..Default::default()
        };
        if !sender_control.matches(&record) {
            return;
        }

        self.notifier_hub.dispatch(&descriptor, &message).await;
    }

    pub fn stream_hub(&self) -> Arc<StreamHub<Arc<SignedBlockWithEvents>>> {
        self.stream_hub.clone()
    }

    /// Current descriptor for `id`, read from the live handler map so
    /// ephemeral subscriptions (never persisted) are visible too.
    pub async fn get(&self, id: &SubscriptionId) -> Option<Subscription> {
        self.subscriptions.lock().await.get(id).map(|h| h.descriptor.clone())
    }

    /// Every currently-monitored subscription, persisted or ephemeral.
    pub async fn list(&self) -> Vec<Subscription> {
        self.subscriptions
            .lock()
            .await
            .values()
            .map(|h| h.descriptor.clone())
            .collect()
    }
}

/// Builds the engine's waypoint callback bound to a (not-yet-constructed)
/// `Switchboard`, breaking the Switchboard <-> MatchingEngine reference
/// cycle: the callback is handed to the engine at construction, and the
/// `Switchboard` is wired in afterwards via `bind`.
pub struct WaypointRelay {
    target: Mutex<Option<Arc<Switchboard>>>,
}

impl Default for WaypointRelay {
    fn default() -> Self {
        Self {
            target: Mutex::new(None),
        }
    }
}

impl WaypointRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn bind(&self, switchboard: Arc<Switchboard>) {
        *self.target.lock().await = Some(switchboard);
    }

    pub fn callback(self: &Arc<Self>) -> crate::matching_engine::WaypointCallback {
        let relay = self.clone();
        Arc::new(move |message: XcmNotifyMessage| {
            let relay = relay.clone();
            tokio::spawn(async move {
                let target = relay.target.lock().await.clone();
                if let Some(switchboard) = target {
                    switchboard.dispatch(message).await;
                }
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::model::{
        EventFilter, SenderFilter, XcmReceivedContext, XcmRelayedContext, XcmSentContext,
    };
    use crate::notifier::{ListenerScope, RecordingNotifier};
    use crate::pending_store::InMemoryPendingStore;
    use crate::sources::{ExtractorRegistry, XcmExtractor};
    use crate::subscription_store::InMemorySubscriptionStore;
    use async_trait::async_trait;
    use futures::stream;

    #[derive(Debug)]
    struct NullExtractor(XcmProtocol);

    impl XcmExtractor for NullExtractor {
        fn protocol(&self) -> XcmProtocol {
            self.0
        }
        fn extract_sent(&self, _chain: &NetworkId, _block: &SignedBlockWithEvents) -> Vec<XcmSentContext> {
            vec![]
        }
        fn extract_received(
            &self,
            _chain: &NetworkId,
            _block: &SignedBlockWithEvents,
        ) -> Vec<XcmReceivedContext> {
            vec![]
        }
        fn extract_relayed(
            &self,
            _chain: &NetworkId,
            _block: &SignedBlockWithEvents,
        ) -> Vec<XcmRelayedContext> {
            vec![]
        }
    }

    #[derive(Debug)]
    struct NullRegistry;
    impl ExtractorRegistry for NullRegistry {
        fn extractor_for(&self, protocol: XcmProtocol) -> Arc<dyn XcmExtractor> {
            Arc::new(NullExtractor(protocol))
        }
    }

    #[derive(Debug)]
    struct EmptyBlockSource;

    #[async_trait]
    impl BlockSource for EmptyBlockSource {
        async fn finalized_blocks(
            &self,
            _chain: &NetworkId,
        ) -> Result<futures::stream::BoxStream<'static, SignedBlockWithEvents>, crate::sources::SourceError>
        {
            Ok(Box::pin(stream::pending()))
        }

        async fn get_storage(
            &self,
            _chain: &NetworkId,
            _storage_key: &[u8],
            _block_hash: Option<&str>,
        ) -> Result<Vec<u8>, crate::sources::SourceError> {
            Ok(vec![])
        }
    }

    fn sub(id: &str, destinations: HashSet<NetworkId>) -> Subscription {
        Subscription::new(
            id.to_string(),
            NetworkId::new("urn:ocn:polkadot:1000"),
            SenderFilter::Any,
            destinations,
            EventFilter::Any,
            true,
            Duration::from_secs(3600),
        )
        .unwrap()
    }

    async fn build_switchboard() -> (Arc<Switchboard>, Arc<RecordingNotifier>) {
        let store = Arc::new(InMemoryPendingStore::new());
        let relay = WaypointRelay::new();
        let engine = Arc::new(MatchingEngine::new(
            store,
            Arc::new(SystemClock),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            relay.callback(),
        ));
        let notifier_hub = Arc::new(NotifierHub::new());
        let recorder = Arc::new(RecordingNotifier::default());
        notifier_hub.on(ListenerScope::Any, recorder.clone());

        let switchboard = Switchboard::new(
            engine,
            notifier_hub,
            Arc::new(InMemorySubscriptionStore::new()),
            Arc::new(EmptyBlockSource),
            Arc::new(NullRegistry),
            10_000,
            10_000,
            Duration::from_millis(50),
        );
        relay.bind(switchboard.clone()).await;
        (switchboard, recorder)
    }

    #[tokio::test]
    async fn subscribe_registers_handler_with_legs() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations)).await.unwrap();

        let subs = switchboard.subscriptions.lock().await;
        let handler = subs.get("s1").unwrap();
        assert!(!handler.origin_tasks.is_empty());
        assert_eq!(handler.destination_tasks.len(), 1);
    }

    #[tokio::test]
    async fn too_many_ephemeral_subscribers_rejected() {
        let store = Arc::new(InMemoryPendingStore::new());
        let relay = WaypointRelay::new();
        let engine = Arc::new(MatchingEngine::new(
            store,
            Arc::new(SystemClock),
            Duration::from_secs(3600),
            Duration::from_secs(3600),
            relay.callback(),
        ));
        let switchboard = Switchboard::new(
            engine,
            Arc::new(NotifierHub::new()),
            Arc::new(InMemorySubscriptionStore::new()),
            Arc::new(EmptyBlockSource),
            Arc::new(NullRegistry),
            1,
            10_000,
            Duration::from_millis(50),
        );
        relay.bind(switchboard.clone()).await;

        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations.clone())).await.unwrap();
        let err = switchboard.subscribe(sub("s2", destinations)).await.unwrap_err();
        assert!(matches!(err, SwitchboardError::TooManySubscribers));
    }

    #[tokio::test]
    async fn unsubscribe_removes_handler_and_aborts_legs() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations)).await.unwrap();
        switchboard.unsubscribe(&"s1".to_string()).await.unwrap();

        let subs = switchboard.subscriptions.lock().await;
        assert!(!subs.contains_key("s1"));
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let (switchboard, _recorder) = build_switchboard().await;
        switchboard.unsubscribe(&"does-not-exist".to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn get_returns_live_descriptor() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations)).await.unwrap();

        let found = switchboard.get(&"s1".to_string()).await.unwrap();
        assert_eq!(found.id, "s1");
        assert!(switchboard.get(&"missing".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn list_returns_every_handler() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations.clone())).await.unwrap();
        switchboard.subscribe(sub("s2", destinations)).await.unwrap();

        let mut ids: Vec<_> = switchboard.list().await.into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[tokio::test]
    async fn update_senders_swaps_control_without_new_legs() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations)).await.unwrap();

        let acct = crate::model::AccountRef::from_bytes(vec![7, 7, 7]);
        let mut set = HashSet::new();
        set.insert(acct.clone());
        switchboard
            .update_senders(&"s1".to_string(), SenderFilter::Some(set))
            .await
            .unwrap();

        let subs = switchboard.subscriptions.lock().await;
        let handler = subs.get("s1").unwrap();
        let record = QueryRecord {
            signer: Some(acct),
            ..Default::default()
        };
        assert!(handler.sender_control.matches(&record));
    }

    #[tokio::test]
    async fn update_destinations_adds_new_leg() {
        let (switchboard, _recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        switchboard.subscribe(sub("s1", destinations.clone())).await.unwrap();

        destinations.insert(NetworkId::new("urn:ocn:polkadot:2000"));
        switchboard
            .update_destinations(&"s1".to_string(), destinations)
            .await
            .unwrap();

        let subs = switchboard.subscriptions.lock().await;
        let handler = subs.get("s1").unwrap();
        assert_eq!(handler.destination_tasks.len(), 2);
    }

    #[tokio::test]
    async fn update_unknown_subscription_errors() {
        let (switchboard, _recorder) = build_switchboard().await;
        let err = switchboard
            .update_senders(&"missing".to_string(), SenderFilter::Any)
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::UnknownSubscription(_)));
    }

    #[tokio::test]
    async fn dispatch_suppresses_when_events_do_not_admit_kind() {
        let (switchboard, recorder) = build_switchboard().await;
        let mut destinations = HashSet::new();
        destinations.insert(NetworkId::new("urn:ocn:polkadot:2004"));
        let mut descriptor = sub("s1", destinations);
        descriptor.events = EventFilter::Some(
            [WaypointKind::Timeout].into_iter().collect(),
        );
        switchboard.subscribe(descriptor).await.unwrap();

        switchboard
            .dispatch(XcmNotifyMessage::Sent {
                subscription_id: "s1".to_string(),
                sender: None,
                sent: crate::model::XcmSentContext {
                    message_hash: crate::model::MessageHash([1; 32]),
                    message_id: None,
                    origin: NetworkId::new("urn:ocn:polkadot:1000"),
                    destination: NetworkId::new("urn:ocn:polkadot:2004"),
                    sender: None,
                    block_hash: "0x1".into(),
                    block_number: 1,
                    extrinsic_id: "1-0".into(),
                    sent_at: 0,
                    outcome: crate::model::XcmOutcome::Complete,
                },
            })
            .await;

        assert!(recorder.received.lock().unwrap().is_empty());
    }
}
