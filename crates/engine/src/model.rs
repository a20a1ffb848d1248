// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Data model shared by the matching engine and the switchboard: chain and
//! account identities, subscription descriptors, the three observation
//! contexts (sent/received/relayed), pending half-matches, and the emitted
//! lifecycle message.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sp_core::crypto::{AccountId32, Ss58Codec};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Opaque URN identifying a chain within a consensus system, e.g.
/// `urn:ocn:polkadot:1000`. Equality is textual.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn new(urn: impl Into<String>) -> Self {
        Self(urn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recognizes the small set of relay URNs; everything else is treated
    /// as a parachain bound to exactly one relay. A URN is a relay chain
    /// when its final `:`-segment is `0`, matching how the chain config
    /// lists relay chains by para id zero (there being no real parachain
    /// id 0).
    pub fn is_relay(&self) -> bool {
        self.0.rsplit(':').next() == Some("0")
    }

    pub fn is_parachain(&self) -> bool {
        !self.is_relay()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NetworkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AccountRefError {
    #[error("'{0}' is neither valid hex nor a valid SS58 address")]
    Unparseable(String),
}

/// An account identity accepted in either address (SS58) or raw
/// public-key (hex) form. Both forms normalize to the same byte vector so
/// that a sender filter built from one form matches contexts observed in
/// the other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountRef(pub Vec<u8>);

impl AccountRef {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn parse(raw: &str) -> Result<Self, AccountRefError> {
        let trimmed = raw.trim();

        if let Some(hex_str) = trimmed.strip_prefix("0x") {
            if let Ok(bytes) = hex::decode(hex_str) {
                return Ok(Self(bytes));
            }
        }

        if let Ok(account) = AccountId32::from_ss58check(trimmed) {
            return Ok(Self(account.0.to_vec()));
        }

        // Bare hex without the 0x prefix (public keys are sometimes
        // supplied this way by extractors).
        if let Ok(bytes) = hex::decode(trimmed) {
            return Ok(Self(bytes));
        }

        Err(AccountRefError::Unparseable(raw.to_string()))
    }
}

impl Serialize for AccountRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for AccountRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        AccountRef::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Filter over senders: either "any sender matches" or a finite,
/// possibly-empty set of accepted senders. An empty set is distinct from
/// `Any` and matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderFilter {
    Any,
    Some(HashSet<AccountRef>),
}

impl SenderFilter {
    pub fn matches(&self, sender: Option<&AccountRef>) -> bool {
        match self {
            SenderFilter::Any => true,
            SenderFilter::Some(set) => sender.is_some_and(|s| set.contains(s)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SenderFilterWire {
    Wildcard(String),
    List(Vec<String>),
}

impl Serialize for SenderFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        match self {
            SenderFilter::Any => serializer.serialize_str("*"),
            SenderFilter::Some(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for account in set {
                    seq.serialize_element(account)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SenderFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SenderFilterWire::deserialize(deserializer)? {
            SenderFilterWire::Wildcard(wildcard) if wildcard == "*" => Ok(SenderFilter::Any),
            SenderFilterWire::Wildcard(other) => Err(serde::de::Error::custom(format!(
                "invalid senders wildcard '{other}': only '*' is accepted"
            ))),
            SenderFilterWire::List(items) => {
                let mut set = HashSet::with_capacity(items.len());
                for item in items {
                    set.insert(AccountRef::parse(&item).map_err(serde::de::Error::custom)?);
                }
                Ok(SenderFilter::Some(set))
            }
        }
    }
}

/// The kinds of lifecycle waypoints a subscription can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaypointKind {
    Sent,
    Received,
    Relayed,
    Timeout,
    Hop,
}

/// Filter over event kinds: either "any kind matches" or a finite set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    Some(HashSet<WaypointKind>),
}

impl EventFilter {
    pub fn admits(&self, kind: WaypointKind) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Some(set) => set.contains(&kind),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFilterWire {
    Wildcard(String),
    List(Vec<WaypointKind>),
}

impl Serialize for EventFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        match self {
            EventFilter::Any => serializer.serialize_str("*"),
            EventFilter::Some(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for kind in set {
                    seq.serialize_element(kind)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for EventFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match EventFilterWire::deserialize(deserializer)? {
            EventFilterWire::Wildcard(wildcard) if wildcard == "*" => Ok(EventFilter::Any),
            EventFilterWire::Wildcard(other) => Err(serde::de::Error::custom(format!(
                "invalid events wildcard '{other}': only '*' is accepted"
            ))),
            EventFilterWire::List(items) => Ok(EventFilter::Some(items.into_iter().collect())),
        }
    }
}

pub type SubscriptionId = String;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("origin {0} cannot also be a destination")]
    OriginIsDestination(String),

    #[error("destinations must not be empty")]
    EmptyDestinations,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

fn default_outbound_ttl_wire() -> Duration {
    Duration::from_secs(6 * 3600)
}

/// On-the-wire shape of the subscription descriptor: the same fields as
/// `Subscription`, but with JSON-friendly representations
/// (`outboundTTL` in milliseconds, wildcard filters as the literal `"*"`)
/// instead of the validated in-memory types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionWire {
    id: SubscriptionId,
    origin: NetworkId,
    senders: SenderFilter,
    destinations: HashSet<NetworkId>,
    events: EventFilter,
    #[serde(default)]
    ephemeral: bool,
    #[serde(rename = "outboundTTL", with = "duration_millis", default = "default_outbound_ttl_wire")]
    outbound_ttl: Duration,
}

/// A subscriber's declared interest: an origin chain, a sender filter, a
/// set of destination chains, and an event-kind filter.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub origin: NetworkId,
    pub senders: SenderFilter,
    pub destinations: HashSet<NetworkId>,
    pub events: EventFilter,
    pub ephemeral: bool,
    pub outbound_ttl: Duration,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        origin: NetworkId,
        senders: SenderFilter,
        destinations: HashSet<NetworkId>,
        events: EventFilter,
        ephemeral: bool,
        outbound_ttl: Duration,
    ) -> Result<Self, SubscriptionError> {
        let sub = Self {
            id,
            origin,
            senders,
            destinations,
            events,
            ephemeral,
            outbound_ttl,
        };
        sub.validate()?;
        Ok(sub)
    }

    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if self.destinations.is_empty() {
            return Err(SubscriptionError::EmptyDestinations);
        }
        if self.destinations.contains(&self.origin) {
            return Err(SubscriptionError::OriginIsDestination(
                self.origin.to_string(),
            ));
        }
        Ok(())
    }
}

impl Serialize for Subscription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SubscriptionWire {
            id: self.id.clone(),
            origin: self.origin.clone(),
            senders: self.senders.clone(),
            destinations: self.destinations.clone(),
            events: self.events.clone(),
            ephemeral: self.ephemeral,
            outbound_ttl: self.outbound_ttl,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Subscription {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = SubscriptionWire::deserialize(deserializer)?;
        Subscription::new(
            wire.id,
            wire.origin,
            wire.senders,
            wire.destinations,
            wire.events,
            wire.ephemeral,
            wire.outbound_ttl,
        )
        .map_err(serde::de::Error::custom)
    }
}

/// A 32-byte XCM message hash, the content address messages are
/// correlated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHash(pub [u8; 32]);

impl MessageHash {
    pub fn to_hex(self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for MessageHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for MessageHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let stripped = raw.strip_prefix("0x").unwrap_or(&raw);
        let bytes = hex::decode(stripped).map_err(serde::de::Error::custom)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("message hash must be 32 bytes"))?;
        Ok(MessageHash(array))
    }
}

/// The outcome of dispatching an XCM message, as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum XcmOutcome {
    Complete,
    Incomplete,
    Error,
}

/// Observation of an XCM message having been sent from `origin` towards
/// `destination`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XcmSentContext {
    pub message_hash: MessageHash,
    pub message_id: Option<MessageHash>,
    pub origin: NetworkId,
    pub destination: NetworkId,
    pub sender: Option<AccountRef>,
    pub block_hash: String,
    pub block_number: u64,
    pub extrinsic_id: String,
    pub sent_at: u64,
    pub outcome: XcmOutcome,
}

/// Observation of an XCM message having arrived at `destination`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XcmReceivedContext {
    pub message_hash: MessageHash,
    pub destination: NetworkId,
    pub block_hash: String,
    pub block_number: u64,
    pub outcome: XcmOutcome,
    pub error: Option<String>,
}

/// Observation of an XCM message transiting a relay leg between `origin`
/// and `destination`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XcmRelayedContext {
    pub message_hash: MessageHash,
    pub origin: NetworkId,
    pub destination: NetworkId,
    pub relay_block_hash: String,
    pub relay_block_number: u64,
}

/// The chain an inbound observation leg was extracted on — used only to
/// identify which chain reported the receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XcmInbound {
    pub chain: NetworkId,
    pub received: XcmReceivedContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingKind {
    Sent,
    Received,
    Relayed,
}

/// A persisted half-match awaiting its counterpart or TTL expiration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub key: String,
    pub kind: PendingKind,
    pub context: PendingContext,
    pub subscription_ids: HashSet<SubscriptionId>,
    pub expires_at_millis: u64,
    /// Identifies the exact block the leg was observed on, for the
    /// `(messageHash, blockHash)` duplicate-replay guard.
    pub observed_block_hash: String,
}

/// The observation context carried by a pending entry; tagged so a single
/// namespace map can store any of the three leg kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PendingContext {
    Sent(XcmSentContext),
    Received(XcmReceivedContext),
    Relayed(XcmRelayedContext),
}

/// Tagged union of lifecycle events the engine emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum XcmNotifyMessage {
    Sent {
        subscription_id: SubscriptionId,
        sender: Option<AccountRef>,
        sent: XcmSentContext,
    },
    Received {
        subscription_id: SubscriptionId,
        sender: Option<AccountRef>,
        sent: Option<XcmSentContext>,
        received: XcmReceivedContext,
    },
    Relayed {
        subscription_id: SubscriptionId,
        sender: Option<AccountRef>,
        sent: Option<XcmSentContext>,
        relayed: XcmRelayedContext,
    },
    Timeout {
        subscription_id: SubscriptionId,
        sender: Option<AccountRef>,
        context: PendingContext,
    },
    Hop {
        subscription_id: SubscriptionId,
        sender: Option<AccountRef>,
        relayed: XcmRelayedContext,
    },
}

impl XcmNotifyMessage {
    pub fn subscription_id(&self) -> &str {
        match self {
            XcmNotifyMessage::Sent { subscription_id, .. }
            | XcmNotifyMessage::Received { subscription_id, .. }
            | XcmNotifyMessage::Relayed { subscription_id, .. }
            | XcmNotifyMessage::Timeout { subscription_id, .. }
            | XcmNotifyMessage::Hop { subscription_id, .. } => subscription_id,
        }
    }

    pub fn sender(&self) -> Option<&AccountRef> {
        match self {
            XcmNotifyMessage::Sent { sender, .. }
            | XcmNotifyMessage::Received { sender, .. }
            | XcmNotifyMessage::Relayed { sender, .. }
            | XcmNotifyMessage::Timeout { sender, .. }
            | XcmNotifyMessage::Hop { sender, .. } => sender.as_ref(),
        }
    }

    pub fn kind(&self) -> WaypointKind {
        match self {
            XcmNotifyMessage::Sent { .. } => WaypointKind::Sent,
            XcmNotifyMessage::Received { .. } => WaypointKind::Received,
            XcmNotifyMessage::Relayed { .. } => WaypointKind::Relayed,
            XcmNotifyMessage::Timeout { .. } => WaypointKind::Timeout,
            XcmNotifyMessage::Hop { .. } => WaypointKind::Hop,
        }
    }
}

/// Match-key conventions: the sent and received legs of the same message
/// share a key; the relay leg is additionally qualified by both endpoints
/// since a relay only ever observes one hop.
pub fn sent_received_key(message_hash: MessageHash, destination: &NetworkId) -> String {
    format!("{}:{}", message_hash.to_hex(), destination)
}

pub fn relay_key(message_hash: MessageHash, origin: &NetworkId, destination: &NetworkId) -> String {
    format!("{}:{}:{}", message_hash.to_hex(), origin, destination)
}
