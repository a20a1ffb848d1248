// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! The matching engine and subscription switchboard that together
//! implement cross-chain XCM waypoint correlation: content-addressed
//! joining of sent/received/relayed observations, durable pending state,
//! and per-subscription observer lifecycle management.

pub mod clock;
pub mod control_query;
pub mod error;
pub mod matching_engine;
pub mod metrics;
pub mod model;
pub mod notifier;
pub mod pending_store;
pub mod sources;
pub mod stream_hub;
pub mod subscription_store;
pub mod switchboard;

pub use clock::{Clock, FakeClock, SystemClock};
pub use control_query::{ControlQuery, Field, Predicate, QueryRecord};
pub use error::{StoreError, SwitchboardError};
pub use matching_engine::{MatchingEngine, WaypointCallback};
pub use model::{
    AccountRef, AccountRefError, EventFilter, MessageHash, NetworkId, PendingContext, PendingEntry,
    PendingKind, SenderFilter, Subscription, SubscriptionError, SubscriptionId, WaypointKind,
    XcmInbound, XcmNotifyMessage, XcmOutcome, XcmReceivedContext, XcmRelayedContext, XcmSentContext,
};
pub use notifier::{ListenerScope, LogNotifier, Notifier, NotifierHub, NotifyError, RecordingNotifier};
pub use pending_store::{
    InMemoryPendingStore, JsonFilePendingStore, Namespace, PendingStore, SharedPendingStore,
};
pub use sources::{
    destination_protocol, origin_protocols, relay_leg_applicable, BlockEvent, BlockSource,
    ExtractorRegistry, ExtrinsicWithEvents, SignedBlockWithEvents, SourceError, XcmExtractor,
    XcmProtocol,
};
pub use stream_hub::{BlockEventStream, StreamHub};
pub use subscription_store::{InMemorySubscriptionStore, JsonFileSubscriptionStore, SubscriptionStore};
pub use switchboard::{Switchboard, WaypointRelay};
